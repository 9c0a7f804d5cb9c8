//! Application service: single-property state queries.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::Result;

use crate::application::ports::InfrastructureApplier;
use crate::domain::QueryError;
use crate::domain::query::{StateProperty, external_director_address};
use crate::domain::state::EnvironmentState;

/// Resolve one property of the environment.
///
/// For environments without a bbl-managed director only the environment id
/// and director address are available; the latter comes from the
/// infrastructure's `external_ip` output.
///
/// # Errors
///
/// Returns [`QueryError::DirectorNotManaged`] for director properties of a
/// `--no-director` environment and [`QueryError::PropertyUnset`] when the
/// value is empty.
pub async fn query(
    property: StateProperty,
    state: &EnvironmentState,
    applier: &impl InfrastructureApplier,
) -> Result<String> {
    if state.no_director && !property.available_without_director() {
        return Err(QueryError::DirectorNotManaged.into());
    }

    let value = if state.no_director && property == StateProperty::DirectorAddress {
        let outputs = applier.outputs(state).await?;
        outputs
            .get_str("external_ip")
            .filter(|ip| !ip.is_empty())
            .map(external_director_address)
            .unwrap_or_default()
    } else {
        property.read(state).to_string()
    };

    if value.is_empty() {
        return Err(QueryError::PropertyUnset(property.display_name()).into());
    }
    Ok(value)
}
