//! One run of the confirmation flow for a single rail

use serde::Serialize;

use crate::logging::gen_flow_trace_id;
use crate::models::errors::PaymentError;
use crate::models::rail::Rail;
use crate::payment::state::{transition, AttemptEvent, AttemptStatus};

/// Approve-then-pay sub-state for non-native wallet payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletPhase {
    NeedsApproval,
    Approving,
    Approved,
    Paying,
    Paid,
}

impl WalletPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletPhase::NeedsApproval => "needs-approval",
            WalletPhase::Approving => "approving",
            WalletPhase::Approved => "approved",
            WalletPhase::Paying => "paying",
            WalletPhase::Paid => "paid",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentAttempt {
    pub id: String,
    pub rail: Rail,
    pub status: AttemptStatus,
    /// Request id (native) or transaction hash (wallet) of the payment
    pub external_ref: Option<String>,
    /// Hash of the last approval transaction, if one was needed
    pub approval_ref: Option<String>,
    pub wallet_phase: Option<WalletPhase>,
    #[serde(skip)]
    pub last_error: Option<PaymentError>,
}

impl PaymentAttempt {
    pub fn new(rail: Rail, seq: u64) -> Self {
        Self {
            id: gen_flow_trace_id("pay", &seq.to_string()),
            rail,
            status: AttemptStatus::Idle,
            external_ref: None,
            approval_ref: None,
            wallet_phase: None,
            last_error: None,
        }
    }

    /// Feed an event through the FSM; returns the resulting status
    pub fn apply(&mut self, event: AttemptEvent) -> AttemptStatus {
        let next = transition(self.status, event);
        if next == self.status {
            crate::payment_debug!("attempt {} ignored {:?} in {}", self.id, event, self.status.as_str());
        }
        self.status = next;
        next
    }

    /// Record a failure and move the attempt with the given event
    pub fn fail_with(&mut self, event: AttemptEvent, err: PaymentError) -> PaymentError {
        self.apply(event);
        self.last_error = Some(err.clone());
        err
    }

    pub fn expect_status(&self, allowed: &[AttemptStatus], expected: &'static str) -> Result<(), PaymentError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(PaymentError::UnexpectedStatus {
                expected,
                actual: self.status,
            })
        }
    }

    pub fn is_in_flight(&self) -> bool {
        !self.status.is_terminal() && self.status != AttemptStatus::Idle
    }

    /// Back to idle after a failure; the wizard keeps its state
    pub fn reset(&mut self) {
        self.apply(AttemptEvent::Reset);
        self.external_ref = None;
        self.last_error = None;
        if self.wallet_phase != Some(WalletPhase::Approved) {
            self.wallet_phase = None;
        }
    }
}
