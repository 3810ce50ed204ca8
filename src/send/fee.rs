//! Fee schedule for outgoing transfers
//!
//! PyLink-to-PyLink transfers are free and earn a reward; PayPal payouts pay a flat
//! percentage. All figures are rounded half-up to cents.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::rail::RecipientKind;

const CENTS: u32 = 2;

/// Fee rates per recipient kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeSchedule {
    internal_rate: Decimal,
    external_rate: Decimal,
    reward_rate: Decimal,
}

impl FeeSchedule {
    pub fn new(internal_rate: Decimal, external_rate: Decimal, reward_rate: Decimal) -> Self {
        Self {
            internal_rate,
            external_rate,
            reward_rate,
        }
    }

    /// 0% internal, 2% external, 1% reward on internal transfers
    pub fn default_rates() -> Self {
        Self::new(Decimal::ZERO, Decimal::new(2, 2), Decimal::new(1, 2))
    }

    pub fn rate(&self, kind: RecipientKind) -> Decimal {
        match kind {
            RecipientKind::Internal => self.internal_rate,
            RecipientKind::External => self.external_rate,
        }
    }

    /// Derive the quote for the amount the user typed.
    ///
    /// Empty, malformed, non-positive and overflowing amounts produce an all-zero quote.
    pub fn quote(&self, amount: &str, kind: RecipientKind) -> FeeQuote {
        let amount = match parse_amount(amount) {
            Some(value) if value > Decimal::ZERO => value,
            _ => return FeeQuote::zero(),
        };

        let fee_rate = self.rate(kind);
        let figures = amount.checked_mul(fee_rate).map(round_cents).and_then(|fee| {
            let total = round_cents(amount.checked_add(fee)?);
            let reward_estimate = match kind {
                RecipientKind::Internal => round_cents(amount.checked_mul(self.reward_rate)?),
                RecipientKind::External => Decimal::ZERO,
            };
            Some((fee, total, reward_estimate))
        });

        // out of range for Decimal: treated like any other unusable amount
        match figures {
            Some((fee, total, reward_estimate)) => FeeQuote {
                amount,
                fee_rate,
                fee,
                total,
                reward_estimate,
            },
            None => FeeQuote::zero(),
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::default_rates()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub amount: Decimal,
    pub fee_rate: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    pub reward_estimate: Decimal,
}

impl FeeQuote {
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
            fee_rate: Decimal::ZERO,
            fee: Decimal::ZERO,
            total: Decimal::ZERO,
            reward_estimate: Decimal::ZERO,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Total formatted as currency with exactly two decimals
    pub fn total_display(&self) -> String {
        format_cents(self.total)
    }
}

/// Quote with the default schedule
pub fn calculate_quote(amount: &str, kind: RecipientKind) -> FeeQuote {
    FeeSchedule::default_rates().quote(amount, kind)
}

pub fn parse_amount(amount: &str) -> Option<Decimal> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENTS, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_cents(value: Decimal) -> String {
    let mut rounded = round_cents(value);
    rounded.rescale(CENTS);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ===== Scenarios =====

    #[test]
    fn test_external_fifty() {
        let quote = calculate_quote("50.00", RecipientKind::External);
        assert_eq!(quote.fee, dec("1.00"));
        assert_eq!(quote.total, dec("51.00"));
        assert_eq!(quote.fee_rate, dec("0.02"));
        assert_eq!(quote.reward_estimate, Decimal::ZERO);
    }

    #[test]
    fn test_internal_reward_rounds_half_up() {
        let quote = calculate_quote("125.50", RecipientKind::Internal);
        assert_eq!(quote.fee, Decimal::ZERO);
        assert_eq!(quote.total, dec("125.50"));
        assert_eq!(quote.reward_estimate, dec("1.26"));
        assert_eq!(quote.fee_rate, Decimal::ZERO);
    }

    // ===== Properties =====

    #[test]
    fn test_external_fee_is_two_percent_rounded() {
        for raw in ["0.01", "0.25", "1", "19.99", "33.33", "999.95", "12345.675"] {
            let amount = dec(raw);
            let quote = calculate_quote(raw, RecipientKind::External);
            assert_eq!(quote.fee, round_cents(amount * dec("0.02")), "fee for {}", raw);
            assert_eq!(quote.total, round_cents(amount + quote.fee), "total for {}", raw);
        }
    }

    #[test]
    fn test_internal_never_charges() {
        for raw in ["0.01", "7.5", "100", "2500.555"] {
            let quote = calculate_quote(raw, RecipientKind::Internal);
            assert_eq!(quote.fee, Decimal::ZERO);
            assert_eq!(quote.reward_estimate, round_cents(dec(raw) * dec("0.01")));
        }
    }

    #[test]
    fn test_half_up_on_fee() {
        // 0.25 * 0.02 = 0.005
        let quote = calculate_quote("0.25", RecipientKind::External);
        assert_eq!(quote.fee, dec("0.01"));
        assert_eq!(quote.total, dec("0.26"));
    }

    // ===== Degenerate Input =====

    #[test]
    fn test_empty_amount_is_zero_quote() {
        assert_eq!(calculate_quote("", RecipientKind::External), FeeQuote::zero());
        assert_eq!(calculate_quote("   ", RecipientKind::Internal), FeeQuote::zero());
    }

    #[test]
    fn test_malformed_or_negative_amount_is_zero_quote() {
        assert!(calculate_quote("abc", RecipientKind::External).is_zero());
        assert!(calculate_quote("-5", RecipientKind::External).is_zero());
        assert!(calculate_quote("0", RecipientKind::Internal).is_zero());
    }

    #[test]
    fn test_overflowing_amount_is_zero_quote() {
        let max = Decimal::MAX.to_string();
        assert!(calculate_quote(&max, RecipientKind::External).is_zero());
        // no fee, so the internal total still fits
        let internal = calculate_quote(&max, RecipientKind::Internal);
        assert_eq!(internal.total, Decimal::MAX);
    }

    #[test]
    fn test_total_display() {
        assert_eq!(calculate_quote("50", RecipientKind::External).total_display(), "51.00");
        assert_eq!(FeeQuote::zero().total_display(), "0.00");
        assert_eq!(format_cents(dec("1.255")), "1.26");
    }
}
