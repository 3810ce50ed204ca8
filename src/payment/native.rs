//! Browser payment flow (Apple Pay through the Payment Request API)

use rust_decimal::Decimal;
use std::time::Duration;

use crate::models::errors::PaymentError;
use crate::payment::adapters::traits::{
    CompletionOutcome, CurrencyAmount, MethodData, NativePayCapability, NativePaymentRequest, PaymentDetails,
    PaymentItem, PaymentMethod,
};
use crate::payment::attempt::PaymentAttempt;
use crate::payment::state::{AttemptEvent, AttemptStatus};
use crate::send::fee::format_cents;

pub const APPLE_PAY_METHOD: &str = "https://apple.com/apple-pay";
const APPLE_PAY_VERSION: u8 = 3;
const SUPPORTED_NETWORKS: [&str; 4] = ["visa", "masterCard", "amex", "discover"];

/// Merchant-side fields of the payment sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantProfile {
    pub name: String,
    pub identifier: String,
    pub currency_code: String,
    pub country_code: String,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        Self {
            name: "PyLink".to_string(),
            identifier: "merchant.com.paypayer".to_string(),
            currency_code: "USD".to_string(),
            country_code: "US".to_string(),
        }
    }
}

pub fn build_request(merchant: &MerchantProfile, total: Decimal) -> NativePaymentRequest {
    let amount = CurrencyAmount {
        currency: merchant.currency_code.clone(),
        value: format_cents(total),
    };

    NativePaymentRequest {
        method_data: vec![PaymentMethod {
            supported_methods: APPLE_PAY_METHOD.to_string(),
            data: MethodData {
                version: APPLE_PAY_VERSION,
                merchant_identifier: merchant.identifier.clone(),
                merchant_capabilities: vec!["supports3DS".to_string()],
                supported_networks: SUPPORTED_NETWORKS.iter().map(|n| n.to_string()).collect(),
                country_code: merchant.country_code.clone(),
            },
        }],
        details: PaymentDetails {
            total: PaymentItem {
                label: merchant.name.clone(),
                amount: amount.clone(),
            },
            display_items: vec![PaymentItem {
                label: "Transfer".to_string(),
                amount,
            }],
        },
    }
}

/// Whether the native rail should be offered at all.
///
/// `None` and errors count as unavailable; the rail is then hidden, not reported.
pub async fn is_available(capability: &dyn NativePayCapability, request: &NativePaymentRequest) -> bool {
    match capability.can_make_payment(request).await {
        Ok(answer) => answer.unwrap_or(false),
        Err(e) => {
            crate::payment_debug!("[{}] availability check failed: {}", capability.name(), e);
            false
        }
    }
}

/// Drive one exchange with the payment sheet.
///
/// The attempt must be `AwaitingUser`. On success it ends `Succeeded` with the
/// browser's request id as external reference; any failure ends it `Failed`.
pub async fn run_native_flow(
    capability: &dyn NativePayCapability,
    attempt: &mut PaymentAttempt,
    request: &NativePaymentRequest,
    settlement_delay: Duration,
) -> Result<String, PaymentError> {
    attempt.expect_status(&[AttemptStatus::AwaitingUser], "awaiting-user")?;

    let response = match capability.show(request).await {
        Ok(response) => response,
        Err(e) => {
            crate::payment_warn!("[{}] payment sheet failed: {}", capability.name(), e);
            return Err(attempt.fail_with(AttemptEvent::Fail, e));
        }
    };
    attempt.apply(AttemptEvent::Submit);
    crate::log_attempt_event!("SHEET_ACCEPTED", attempt, "request_id" => response.request_id.as_str());

    // Stand-in for a settlement acknowledgement; there is no backend to ask.
    attempt.apply(AttemptEvent::Observe);
    tokio::time::sleep(settlement_delay).await;

    if let Err(e) = capability.complete(&response, CompletionOutcome::Success).await {
        return Err(attempt.fail_with(AttemptEvent::Fail, e));
    }

    attempt.apply(AttemptEvent::Include);
    attempt.external_ref = Some(response.request_id.clone());
    Ok(response.request_id)
}
