//! Success page summary

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::models::errors::PaymentError;
use crate::payment::attempt::PaymentAttempt;
use crate::payment::dispatcher::PaymentDispatcher;
use crate::payment::state::AttemptStatus;
use crate::send::fee::format_cents;
use crate::send::wizard::{PaymentOrder, WizardController};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub recipient: String,
    pub recipient_label: &'static str,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    pub payment_method: &'static str,
    pub asset: Option<&'static str>,
    /// Zero for PayPal payouts
    pub reward: Decimal,
    pub transaction_id: String,
    pub completed_at: DateTime<Utc>,
}

impl TransferSummary {
    /// Only a succeeded attempt has a summary
    pub fn from_attempt(order: &PaymentOrder, attempt: &PaymentAttempt) -> Result<Self, PaymentError> {
        if attempt.status != AttemptStatus::Succeeded {
            return Err(PaymentError::UnexpectedStatus {
                expected: "succeeded",
                actual: attempt.status,
            });
        }

        Ok(Self {
            recipient: order.recipient.display(),
            recipient_label: order.recipient.kind.label(),
            amount: order.quote.amount,
            fee: order.quote.fee,
            total: order.quote.total,
            payment_method: order.rail.label(),
            asset: order.asset.map(|a| a.symbol),
            reward: order.quote.reward_estimate,
            transaction_id: attempt.external_ref.clone().unwrap_or_else(|| attempt.id.clone()),
            completed_at: Utc::now(),
        })
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Payment Successful!")?;
        writeln!(f, "  Recipient        {} ({})", self.recipient, self.recipient_label)?;
        writeln!(f, "  Amount sent      ${}", format_cents(self.amount))?;
        writeln!(f, "  Transaction fee  ${}", format_cents(self.fee))?;
        match self.asset {
            Some(symbol) => writeln!(f, "  Payment method   {} ({})", self.payment_method, symbol)?,
            None => writeln!(f, "  Payment method   {}", self.payment_method)?,
        }
        writeln!(f, "  Total paid       ${}", format_cents(self.total))?;
        if !self.reward.is_zero() {
            writeln!(f, "  Rewards earned   +${}", format_cents(self.reward))?;
        }
        writeln!(f, "  Transaction ID   {}", self.transaction_id)?;
        write!(f, "  Completed        {}", self.completed_at.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
    BackToDashboard,
    SendAnother,
}

/// Leave the success page. Either way the transfer state is gone.
pub fn leave_result(action: ResultAction, wizard: &mut WizardController, dispatcher: &mut PaymentDispatcher) {
    crate::wizard_debug!("leaving result page: {:?}", action);
    wizard.reset();
    dispatcher.reset();
}
