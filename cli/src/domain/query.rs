//! Single-property projections of the environment state.

use super::state::EnvironmentState;

/// Port the director listens on when it is not managed by bbl.
pub const DIRECTOR_PORT: u16 = 25555;

/// A property that can be printed by one of the query commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateProperty {
    EnvId,
    JumpboxAddress,
    DirectorUsername,
    DirectorPassword,
    DirectorAddress,
    DirectorCaCert,
}

impl StateProperty {
    pub const ALL: [Self; 6] = [
        Self::EnvId,
        Self::JumpboxAddress,
        Self::DirectorUsername,
        Self::DirectorPassword,
        Self::DirectorAddress,
        Self::DirectorCaCert,
    ];

    /// Subcommand name on the command line.
    #[must_use]
    pub fn command(self) -> &'static str {
        match self {
            Self::EnvId => "env-id",
            Self::JumpboxAddress => "jumpbox-address",
            Self::DirectorUsername => "director-username",
            Self::DirectorPassword => "director-password",
            Self::DirectorAddress => "director-address",
            Self::DirectorCaCert => "director-ca-cert",
        }
    }

    /// Human-readable name used in error messages.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::EnvId => "environment id",
            Self::JumpboxAddress => "jumpbox address",
            Self::DirectorUsername => "director username",
            Self::DirectorPassword => "director password",
            Self::DirectorAddress => "director address",
            Self::DirectorCaCert => "director ca cert",
        }
    }

    /// Whether the property is still meaningful when bbl does not manage the
    /// director.
    #[must_use]
    pub fn available_without_director(self) -> bool {
        matches!(self, Self::EnvId | Self::DirectorAddress)
    }

    /// Read the property straight from the state document.
    #[must_use]
    pub fn read(self, state: &EnvironmentState) -> &str {
        match self {
            Self::EnvId => &state.env_id,
            Self::JumpboxAddress => &state.jumpbox.url,
            Self::DirectorUsername => &state.bosh.director_username,
            Self::DirectorPassword => &state.bosh.director_password,
            Self::DirectorAddress => &state.bosh.director_address,
            Self::DirectorCaCert => &state.bosh.director_ssl_ca,
        }
    }
}

/// Director URL for an environment created with `--no-director`.
#[must_use]
pub fn external_director_address(external_ip: &str) -> String {
    format!("https://{external_ip}:{DIRECTOR_PORT}")
}
