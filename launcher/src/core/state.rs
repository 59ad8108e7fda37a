//! Provisioning progress.

use std::fmt;

/// Ordered provisioning stages. Within a run the state only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProvisioningState {
    NotCreated,
    Created,
    DependenciesInstalled,
    OptionalComponentsAttempted,
}

impl ProvisioningState {
    /// Starting state given whether the environment root already exists.
    pub fn observe(environment_exists: bool) -> Self {
        if environment_exists {
            ProvisioningState::Created
        } else {
            ProvisioningState::NotCreated
        }
    }

    /// Move to `next`, never regressing. Returns the resulting state.
    #[must_use]
    pub fn advance(self, next: ProvisioningState) -> ProvisioningState {
        self.max(next)
    }

    pub fn is_terminal(self) -> bool {
        self == ProvisioningState::OptionalComponentsAttempted
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProvisioningState::NotCreated => "not_created",
            ProvisioningState::Created => "created",
            ProvisioningState::DependenciesInstalled => "dependencies_installed",
            ProvisioningState::OptionalComponentsAttempted => "optional_components_attempted",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observe_existing_environment_starts_created() {
        assert_eq!(ProvisioningState::observe(true), ProvisioningState::Created);
        assert_eq!(
            ProvisioningState::observe(false),
            ProvisioningState::NotCreated
        );
    }

    #[test]
    fn advance_moves_forward() {
        let state = ProvisioningState::NotCreated
            .advance(ProvisioningState::Created)
            .advance(ProvisioningState::DependenciesInstalled);
        assert_eq!(state, ProvisioningState::DependenciesInstalled);
    }

    #[test]
    fn advance_never_regresses() {
        let state =
            ProvisioningState::DependenciesInstalled.advance(ProvisioningState::Created);
        assert_eq!(state, ProvisioningState::DependenciesInstalled);
    }

    #[test]
    fn only_last_stage_is_terminal() {
        assert!(ProvisioningState::OptionalComponentsAttempted.is_terminal());
        assert!(!ProvisioningState::DependenciesInstalled.is_terminal());
    }
}
