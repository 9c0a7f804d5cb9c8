//! Environment name validation and composition.

use std::sync::LazyLock;

use regex::Regex;

use super::error::EnvIdError;

/// Longest accepted environment name.
///
/// Resource names are derived as `{env_id}-{suffix}` and GCP caps them at 63
/// characters.
pub const MAX_NAME_LEN: usize = 45;

/// Prefix of every generated environment name.
pub const GENERATED_PREFIX: &str = "bbl-env";

/// Length of the random suffix on generated names.
pub const SUFFIX_LEN: usize = 7;

/// How many generated names are tried before giving up.
pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

static NAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").ok());

pub const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brisk", "calm", "crisp", "deep", "eager", "fair", "fleet", "gentle",
    "grand", "hardy", "keen", "lively", "lucid", "mellow", "noble", "plain", "proud", "quiet",
    "rapid", "sharp", "silent", "sleek", "steady", "stout", "swift", "tidy", "vivid", "wise",
];

pub const NOUNS: &[&str] = &[
    "anchor", "badger", "beacon", "canyon", "cedar", "comet", "delta", "falcon", "fjord",
    "glacier", "harbor", "heron", "island", "lagoon", "maple", "meadow", "mesa", "otter",
    "pine", "prairie", "quarry", "ridge", "river", "summit", "tundra", "valley", "willow",
];

/// Validate a user-supplied environment name.
///
/// # Errors
///
/// Returns [`EnvIdError::InvalidName`] when the name is empty, too long, or
/// contains characters GCP rejects in resource names.
pub fn validate_name(name: &str) -> Result<(), EnvIdError> {
    let valid = name.len() <= MAX_NAME_LEN
        && NAME_RE.as_ref().is_some_and(|re| re.is_match(name));
    if valid {
        Ok(())
    } else {
        Err(EnvIdError::InvalidName {
            name: name.to_string(),
            max: MAX_NAME_LEN,
        })
    }
}

/// Build a generated environment name from its parts.
#[must_use]
pub fn compose_name(adjective: &str, noun: &str, suffix: &str) -> String {
    format!("{GENERATED_PREFIX}-{adjective}-{noun}-{suffix}")
}
