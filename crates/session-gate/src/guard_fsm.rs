//! Navigation guard state machine using rust-fsm.
//!
//! ```text
//!            Check               Allow
//! Unknown ──────────► Checking ─────────► Authorized
//!                      ▲    │                 │
//!                      │    │ Deny            │ Check
//!                      │    ▼                 │
//!                      │  Unauthorized        │
//!                      │    │ Check           │
//!                      └────┴─────────────────┘
//! ```
//!
//! There is no terminal state; every auth event re-enters `Checking`.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub guard_machine(Unknown)

    Unknown => {
        Check => Checking
    },
    Checking => {
        Allow => Authorized,
        Deny => Unauthorized
    },
    Authorized => {
        Check => Checking
    },
    Unauthorized => {
        Check => Checking
    }
}

pub use guard_machine::Input as GuardMachineInput;
pub use guard_machine::State as GuardMachineState;
pub use guard_machine::StateMachine as GuardMachine;

/// Guard state for callers outside the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    #[default]
    Unknown,
    Checking,
    Authorized,
    Unauthorized,
}

impl GuardState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardState::Authorized)
    }
}

impl From<&GuardMachineState> for GuardState {
    fn from(state: &GuardMachineState) -> Self {
        match state {
            GuardMachineState::Unknown => GuardState::Unknown,
            GuardMachineState::Checking => GuardState::Checking,
            GuardMachineState::Authorized => GuardState::Authorized,
            GuardMachineState::Unauthorized => GuardState::Unauthorized,
        }
    }
}

impl From<GuardState> for GuardMachineState {
    fn from(state: GuardState) -> Self {
        match state {
            GuardState::Unknown => GuardMachineState::Unknown,
            GuardState::Checking => GuardMachineState::Checking,
            GuardState::Authorized => GuardMachineState::Authorized,
            GuardState::Unauthorized => GuardMachineState::Unauthorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_unknown() {
        let machine = GuardMachine::new();
        assert_eq!(*machine.state(), GuardMachineState::Unknown);
        assert_eq!(GuardState::from(machine.state()), GuardState::default());
    }

    #[test]
    fn test_check_then_allow() {
        let mut machine = GuardMachine::new();
        machine.consume(&GuardMachineInput::Check).unwrap();
        assert_eq!(*machine.state(), GuardMachineState::Checking);
        machine.consume(&GuardMachineInput::Allow).unwrap();
        assert_eq!(*machine.state(), GuardMachineState::Authorized);
    }

    #[test]
    fn test_authorized_can_be_rechecked_and_denied() {
        let mut machine = GuardMachine::from_state(GuardMachineState::Authorized);
        machine.consume(&GuardMachineInput::Check).unwrap();
        machine.consume(&GuardMachineInput::Deny).unwrap();
        assert_eq!(*machine.state(), GuardMachineState::Unauthorized);
    }

    #[test]
    fn test_decision_requires_checking() {
        let mut machine = GuardMachine::new();
        assert!(machine.consume(&GuardMachineInput::Allow).is_err());
        assert_eq!(*machine.state(), GuardMachineState::Unknown);

        let mut machine = GuardMachine::from_state(GuardMachineState::Authorized);
        assert!(machine.consume(&GuardMachineInput::Deny).is_err());
    }

    #[test]
    fn test_checking_cannot_restart_check() {
        let mut machine = GuardMachine::from_state(GuardMachineState::Checking);
        assert!(machine.consume(&GuardMachineInput::Check).is_err());
    }

    #[test]
    fn test_state_mirror_round_trip() {
        for state in [
            GuardState::Unknown,
            GuardState::Checking,
            GuardState::Authorized,
            GuardState::Unauthorized,
        ] {
            assert_eq!(GuardState::from(&GuardMachineState::from(state)), state);
        }
        assert!(GuardState::Authorized.is_authorized());
        assert!(!GuardState::Unauthorized.is_authorized());
    }
}
