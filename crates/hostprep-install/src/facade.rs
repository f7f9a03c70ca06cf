//! Shared façade flow: the probe/sequence/verify state machine

use tracing::{debug, info};

/// States of one `ensure_installed` run
///
/// `NotProbed` is initial; `Skipped`, `Verified` and `Failed` are terminal.
/// `Probed` with `installed=true` short-circuits straight to `Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeState {
    NotProbed,
    Probed { installed: bool },
    Skipped,
    Sequencing,
    Verified,
    Failed,
}

impl FacadeState {
    /// Whether moving to `next` is a legal transition
    #[must_use]
    pub fn can_transition_to(self, next: FacadeState) -> bool {
        match (self, next) {
            (FacadeState::NotProbed, FacadeState::Probed { .. }) => true,
            (FacadeState::Probed { installed: true }, FacadeState::Skipped) => true,
            (FacadeState::Probed { installed: false }, FacadeState::Sequencing) => true,
            (FacadeState::Sequencing, FacadeState::Verified | FacadeState::Failed) => true,
            _ => false,
        }
    }

    /// Whether this state ends the run
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FacadeState::Skipped | FacadeState::Verified | FacadeState::Failed
        )
    }
}

impl std::fmt::Display for FacadeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacadeState::NotProbed => write!(f, "not-probed"),
            FacadeState::Probed { installed: true } => write!(f, "probed(installed)"),
            FacadeState::Probed { installed: false } => write!(f, "probed(missing)"),
            FacadeState::Skipped => write!(f, "skipped"),
            FacadeState::Sequencing => write!(f, "sequencing"),
            FacadeState::Verified => write!(f, "verified"),
            FacadeState::Failed => write!(f, "failed"),
        }
    }
}

/// Tracks and logs the state of one façade run
#[derive(Debug)]
pub(crate) struct Flow {
    target: &'static str,
    state: FacadeState,
}

impl Flow {
    pub(crate) fn new(target: &'static str) -> Self {
        Self {
            target,
            state: FacadeState::NotProbed,
        }
    }

    /// Advance the state machine
    ///
    /// Transitions are fixed per façade flow; an illegal one is a bug in the
    /// installer, not an operator error.
    pub(crate) fn to(&mut self, next: FacadeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal facade transition {} -> {}",
            self.state,
            next
        );

        debug!(target = %self.target, from = %self.state, to = %next, "facade transition");
        self.state = next;

        if next.is_terminal() {
            info!(target = %self.target, state = %next, "facade finished");
        }
    }
}

/// Prefix a command with sudo when the session user is unprivileged
#[must_use]
pub(crate) fn maybe_sudo(use_sudo: bool, cmd: &str) -> String {
    if use_sudo {
        format!("sudo {cmd}")
    } else {
        cmd.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_probe_leads_to_skip_only() {
        let probed = FacadeState::Probed { installed: true };
        assert!(probed.can_transition_to(FacadeState::Skipped));
        assert!(!probed.can_transition_to(FacadeState::Sequencing));
    }

    #[test]
    fn test_missing_probe_leads_to_sequencing_only() {
        let probed = FacadeState::Probed { installed: false };
        assert!(probed.can_transition_to(FacadeState::Sequencing));
        assert!(!probed.can_transition_to(FacadeState::Skipped));
    }

    #[test]
    fn test_sequencing_ends_in_verified_or_failed() {
        assert!(FacadeState::Sequencing.can_transition_to(FacadeState::Verified));
        assert!(FacadeState::Sequencing.can_transition_to(FacadeState::Failed));
        assert!(!FacadeState::Sequencing.can_transition_to(FacadeState::Skipped));
    }

    #[test]
    fn test_terminal_states() {
        assert!(FacadeState::Skipped.is_terminal());
        assert!(FacadeState::Verified.is_terminal());
        assert!(FacadeState::Failed.is_terminal());
        assert!(!FacadeState::NotProbed.is_terminal());
        assert!(!FacadeState::Sequencing.is_terminal());
    }

    #[test]
    fn test_maybe_sudo() {
        assert_eq!(maybe_sudo(true, "apt-get update"), "sudo apt-get update");
        assert_eq!(maybe_sudo(false, "apt-get update"), "apt-get update");
    }
}
