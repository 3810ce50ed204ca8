//! Request-money code
//!
//! The payload behind a "receive" QR code: who to pay, plus an optional amount and note.
//! Scanning it prefills the send wizard.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::errors::PaymentError;
use crate::send::fee::{format_cents, parse_amount, round_cents};
use crate::send::wizard::MIN_USERNAME_LEN;

pub const REQUEST_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyRequest {
    pub version: u8,
    /// PyLink username, without `@`
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MoneyRequest {
    /// Blank amount or note means "not set"
    pub fn new(handle: &str, amount: &str, note: &str) -> Result<Self, PaymentError> {
        let handle = handle.trim().replace('@', "");
        if handle.chars().count() < MIN_USERNAME_LEN {
            return Err(PaymentError::InvalidHandle(handle));
        }

        let amount = if amount.trim().is_empty() {
            None
        } else {
            match parse_amount(amount) {
                Some(value) if value > Decimal::ZERO => Some(round_cents(value)),
                _ => return Err(PaymentError::InvalidAmount(amount.to_string())),
            }
        };

        let note = Some(note.trim()).filter(|n| !n.is_empty()).map(str::to_string);

        Ok(Self {
            version: REQUEST_VERSION,
            handle,
            amount,
            note,
        })
    }

    /// "Requesting" line, e.g. `$12.50`
    pub fn requesting(&self) -> Option<String> {
        self.amount.map(|a| format!("${}", format_cents(a)))
    }

    pub fn encode(&self) -> Result<String, PaymentError> {
        serde_json::to_string(self).map_err(|e| PaymentError::Unknown(e.to_string()))
    }

    /// Parse a scanned payload; the handle and amount are checked again
    pub fn decode(payload: &str) -> Result<Self, PaymentError> {
        let raw: MoneyRequest =
            serde_json::from_str(payload).map_err(|e| PaymentError::InvalidRequestCode(e.to_string()))?;
        if raw.version != REQUEST_VERSION {
            return Err(PaymentError::InvalidRequestCode(format!("unsupported version {}", raw.version)));
        }
        let amount = raw.amount.map(|a| a.to_string()).unwrap_or_default();
        Self::new(&raw.handle, &amount, raw.note.as_deref().unwrap_or(""))
    }
}
