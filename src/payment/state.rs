//! Payment Attempt State Machine
//!
//! Defines the attempt states, events, and transition function shared by both rails.

use serde::{Deserialize, Serialize};

/// Attempt FSM states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    /// Nothing opened yet, or returned here after a rejection/cancel
    Idle,
    /// Confirmation modal open, waiting on the user or the payment sheet
    AwaitingUser,
    /// Handed to the wallet or payment sheet; cannot be cancelled any more
    Submitted,
    /// Waiting for inclusion or settlement
    Confirming,
    /// Payment included/settled ✅
    Succeeded,
    /// Reverted, dropped, or rejected by the payment sheet ❌
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Idle => "idle",
            AttemptStatus::AwaitingUser => "awaiting-user",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::Confirming => "confirming",
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(AttemptStatus::Idle),
            "awaiting-user" => Some(AttemptStatus::AwaitingUser),
            "submitted" => Some(AttemptStatus::Submitted),
            "confirming" => Some(AttemptStatus::Confirming),
            "succeeded" => Some(AttemptStatus::Succeeded),
            "failed" => Some(AttemptStatus::Failed),
            _ => None,
        }
    }

    /// Check if this is a terminal state (only an explicit reset leaves it)
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Succeeded | AttemptStatus::Failed)
    }

    /// Before anything reached the wallet or payment sheet
    pub fn is_cancellable(&self) -> bool {
        matches!(self, AttemptStatus::Idle | AttemptStatus::AwaitingUser)
    }
}

/// FSM Events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptEvent {
    /// Confirm pressed, modal opened
    Open,
    /// Transaction signed and sent, or payment sheet accepted
    Submit,
    /// Started watching for inclusion/settlement
    Observe,
    /// Inclusion/settlement confirmed
    Include,
    /// Revert, drop, or sheet failure
    Fail,
    /// User declined to sign
    Reject,
    /// Modal closed before anything was submitted
    Cancel,
    /// Explicit reset (retry, new transfer)
    Reset,
}

/// State transition function
///
/// Given the current state and an event, returns the next state.
/// Invalid transitions return the current state (no change).
pub fn transition(current: AttemptStatus, event: AttemptEvent) -> AttemptStatus {
    use AttemptEvent::*;
    use AttemptStatus::*;

    match (current, event) {
        // Explicit reset always wins
        (_, Reset) => Idle,

        // From Idle
        (Idle, Open) => AwaitingUser,
        (Idle, Cancel) => Idle,

        // From AwaitingUser
        (AwaitingUser, Submit) => Submitted,
        (AwaitingUser, Reject) => Idle,
        (AwaitingUser, Cancel) => Idle,
        (AwaitingUser, Fail) => Failed,

        // From Submitted (a confirmed approval leaves the attempt here for the pay call)
        (Submitted, Submit) => Submitted,
        (Submitted, Observe) => Confirming,
        (Submitted, Reject) => Idle,
        (Submitted, Fail) => Failed,

        // From Confirming
        (Confirming, Include) => Succeeded,
        (Confirming, Fail) => Failed,

        // Invalid transitions - stay in current state
        _ => current,
    }
}
