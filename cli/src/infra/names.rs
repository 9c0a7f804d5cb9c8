//! Random environment name candidates.

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

use crate::application::ports::NameGenerator;
use crate::domain::env_id::{ADJECTIVES, NOUNS, SUFFIX_LEN, compose_name};

/// `rand`-backed [`NameGenerator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNameGenerator;

impl NameGenerator for RandomNameGenerator {
    fn candidate(&self) -> String {
        let mut rng = rand::thread_rng();
        let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("calm");
        let noun = NOUNS.choose(&mut rng).copied().unwrap_or("otter");
        let suffix: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        compose_name(adjective, noun, &suffix)
    }
}
