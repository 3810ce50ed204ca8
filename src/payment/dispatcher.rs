//! Payment Rail Dispatcher
//!
//! Owns the single payment attempt and routes it to the rail the wizard chose. All
//! wallet and browser access goes through the injected adapters.

use ethers::types::Address;
use std::sync::Arc;
use std::time::Duration;

use crate::models::assets::{parse_address, CLIENT_CONTRACT, PAYMENT_GATEWAY};
use crate::models::errors::PaymentError;
use crate::models::rail::Rail;
use crate::payment::adapters::calls::to_base_units;
use crate::payment::adapters::traits::{NativePayCapability, WalletChain};
use crate::payment::attempt::PaymentAttempt;
use crate::payment::native::{self, MerchantProfile};
use crate::payment::state::{AttemptEvent, AttemptStatus};
use crate::payment::wallet::{self, WalletOrder, WalletStep};
use crate::send::fee::FeeQuote;
use crate::send::wizard::PaymentOrder;

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub merchant: MerchantProfile,
    /// Placeholder for a settlement acknowledgement on the native rail
    pub settlement_delay: Duration,
    /// `pay` entry point and allowance spender
    pub client_contract: Address,
    /// Used when the recipient handle is not itself an address
    pub default_payee: Address,
}

impl DispatchSettings {
    pub fn mainnet() -> Result<Self, PaymentError> {
        Ok(Self {
            merchant: MerchantProfile::default(),
            settlement_delay: Duration::from_millis(1000),
            client_contract: parse_address(CLIENT_CONTRACT)?,
            default_payee: parse_address(PAYMENT_GATEWAY)?,
        })
    }
}

/// Result of a dispatcher call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Modal open on the wallet rail; waiting for the user to trigger
    AwaitingWalletTrigger,
    /// Approval included; trigger again to pay
    ApprovalConfirmed { tx_hash: String },
    /// Payment done; go to the result page
    Succeeded { external_ref: String },
}

pub struct PaymentDispatcher {
    native: Arc<dyn NativePayCapability>,
    wallet: Arc<dyn WalletChain>,
    settings: DispatchSettings,
    attempt: Option<PaymentAttempt>,
    /// Order frozen at confirm; every trigger of the attempt pays exactly this
    order: Option<PaymentOrder>,
    seq: u64,
}

impl PaymentDispatcher {
    pub fn new(
        native: Arc<dyn NativePayCapability>,
        wallet: Arc<dyn WalletChain>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            native,
            wallet,
            settings,
            attempt: None,
            order: None,
            seq: 0,
        }
    }

    pub fn attempt(&self) -> Option<&PaymentAttempt> {
        self.attempt.as_ref()
    }

    /// The order the open attempt was confirmed with
    pub fn order(&self) -> Option<&PaymentOrder> {
        self.order.as_ref()
    }

    pub fn wallet_connected(&self) -> bool {
        self.wallet.account().is_some()
    }

    /// Rails to show at the payment step. The native rail is left out entirely when
    /// the device cannot pay with it.
    pub async fn available_rails(&self, quote: &FeeQuote) -> Vec<Rail> {
        let request = native::build_request(&self.settings.merchant, quote.total);
        let mut rails = Vec::with_capacity(Rail::ALL.len());
        if native::is_available(self.native.as_ref(), &request).await {
            rails.push(Rail::NativePay);
        }
        rails.push(Rail::Wallet);
        rails
    }

    /// Confirm pressed on the review step: open the attempt. The native rail runs
    /// straight away; the wallet rail waits for `trigger_wallet`.
    pub async fn confirm(&mut self, order: &PaymentOrder) -> Result<DispatchOutcome, PaymentError> {
        if self.attempt.as_ref().map_or(false, |a| a.is_in_flight()) {
            return Err(PaymentError::AttemptInProgress);
        }

        let request = native::build_request(&self.settings.merchant, order.quote.total);
        if order.rail == Rail::NativePay && !native::is_available(self.native.as_ref(), &request).await {
            return Err(PaymentError::CapabilityUnavailable);
        }

        self.seq += 1;
        let mut attempt = PaymentAttempt::new(order.rail, self.seq);
        attempt.apply(AttemptEvent::Open);
        crate::log_attempt_event!("ATTEMPT_OPENED", attempt, "total" => order.quote.total_display());
        self.order = Some(order.clone());
        let attempt = self.attempt.insert(attempt);

        match order.rail {
            Rail::NativePay => {
                let result =
                    native::run_native_flow(self.native.as_ref(), attempt, &request, self.settings.settlement_delay)
                        .await;
                Self::finish(attempt, result)
            }
            Rail::Wallet => Ok(DispatchOutcome::AwaitingWalletTrigger),
        }
    }

    /// User pressed "Confirm Transaction" in the wallet modal. Pays the order given to
    /// `confirm`.
    pub async fn trigger_wallet(&mut self) -> Result<DispatchOutcome, PaymentError> {
        let attempt = self.attempt.as_mut().ok_or(PaymentError::NoActiveAttempt)?;
        let order = self.order.as_ref().ok_or(PaymentError::NoActiveAttempt)?;
        if attempt.rail != Rail::Wallet {
            return Err(PaymentError::UnexpectedStatus {
                expected: "wallet attempt",
                actual: attempt.status,
            });
        }
        // after a declined signature the modal is still open
        if attempt.status == AttemptStatus::Idle {
            attempt.apply(AttemptEvent::Open);
        }

        // Nothing has been attempted yet, so the attempt stays where it is. Checked
        // before the asset: no asset can be picked while disconnected.
        if self.wallet.account().is_none() {
            attempt.last_error = Some(PaymentError::WalletNotConnected);
            return Err(PaymentError::WalletNotConnected);
        }

        let wallet_order = Self::wallet_order(&self.settings, order)?;
        match wallet::run_wallet_flow(self.wallet.as_ref(), attempt, &wallet_order).await {
            Ok(WalletStep::ApprovalConfirmed(tx_hash)) => Ok(DispatchOutcome::ApprovalConfirmed {
                tx_hash: format!("{:?}", tx_hash),
            }),
            Ok(WalletStep::Paid(tx_hash)) => Self::finish(attempt, Ok(format!("{:?}", tx_hash))),
            Err(e) => Self::finish(attempt, Err(e)),
        }
    }

    /// Close the modal. Possible before anything reached the wallet or sheet, and
    /// after a failure, where nothing is in flight any more.
    pub fn cancel(&mut self) -> Result<(), PaymentError> {
        let attempt = match self.attempt.as_mut() {
            Some(attempt) => attempt,
            None => return Ok(()),
        };
        let status = attempt.status;
        match status {
            AttemptStatus::Failed => attempt.reset(),
            status if status.is_cancellable() => {
                attempt.apply(AttemptEvent::Cancel);
            }
            status => return Err(PaymentError::CancelNotAllowed(status)),
        }
        crate::log_attempt_event!("ATTEMPT_CANCELLED", attempt);
        self.clear();
        Ok(())
    }

    /// Clear a failed attempt so the user can confirm again
    pub fn retry(&mut self) -> Result<(), PaymentError> {
        let attempt = self.attempt.as_mut().ok_or(PaymentError::NoActiveAttempt)?;
        attempt.expect_status(&[AttemptStatus::Failed, AttemptStatus::Idle], "failed")?;
        attempt.reset();
        self.clear();
        Ok(())
    }

    /// Drop all attempt state (new transfer, back to dashboard)
    pub fn reset(&mut self) {
        if let Some(attempt) = self.attempt.as_mut() {
            attempt.apply(AttemptEvent::Reset);
        }
        self.clear();
    }

    fn clear(&mut self) {
        self.attempt = None;
        self.order = None;
    }

    fn wallet_order(settings: &DispatchSettings, order: &PaymentOrder) -> Result<WalletOrder, PaymentError> {
        let asset = order.asset.ok_or(PaymentError::AssetRequired)?;
        let payee = parse_address(&order.recipient.handle).unwrap_or(settings.default_payee);
        Ok(WalletOrder {
            asset,
            amount: to_base_units(order.quote.total, asset.decimals)?,
            payee,
            client: settings.client_contract,
        })
    }

    fn finish(attempt: &mut PaymentAttempt, result: Result<String, PaymentError>) -> Result<DispatchOutcome, PaymentError> {
        match result {
            Ok(external_ref) => {
                crate::log_attempt_event!("ATTEMPT_SUCCEEDED", attempt, "external_ref" => external_ref.as_str());
                Ok(DispatchOutcome::Succeeded { external_ref })
            }
            Err(e) => {
                crate::payment_warn!("attempt {} {}: {}", attempt.id, attempt.status.as_str(), e);
                crate::log_attempt_event!("ATTEMPT_FAILED", attempt, "error_code" => e.error_code());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assets::find_asset;
    use crate::models::rail::RecipientKind;
    use crate::payment::adapters::mock::{MockNativePay, MockWallet, SheetOutcome};
    use crate::send::fee::calculate_quote;
    use crate::send::wizard::Recipient;
    use ethers::types::U256;

    fn settings() -> DispatchSettings {
        DispatchSettings {
            settlement_delay: Duration::ZERO,
            ..DispatchSettings::mainnet().unwrap()
        }
    }

    fn order(rail: Rail, asset: Option<&str>) -> PaymentOrder {
        PaymentOrder {
            recipient: Recipient {
                kind: RecipientKind::External,
                handle: "john.doe@paypal.com".to_string(),
            },
            quote: calculate_quote("50.00", RecipientKind::External),
            rail,
            asset: asset.and_then(find_asset),
        }
    }

    fn dispatcher(native: Arc<MockNativePay>, wallet: Arc<MockWallet>) -> PaymentDispatcher {
        PaymentDispatcher::new(native, wallet, settings())
    }

    #[tokio::test]
    async fn test_native_hidden_when_unavailable() {
        let d = dispatcher(
            Arc::new(MockNativePay::unavailable("sheet")),
            Arc::new(MockWallet::disconnected("w")),
        );
        let rails = d.available_rails(&calculate_quote("10", RecipientKind::Internal)).await;
        assert_eq!(rails, vec![Rail::Wallet]);
    }

    #[tokio::test]
    async fn test_native_confirm_runs_immediately() {
        let sheet = Arc::new(MockNativePay::new("sheet"));
        let mut d = dispatcher(sheet.clone(), Arc::new(MockWallet::disconnected("w")));

        let outcome = d.confirm(&order(Rail::NativePay, None)).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));
        assert_eq!(d.attempt().unwrap().status, AttemptStatus::Succeeded);
        assert_eq!(sheet.shown()[0].details.total.amount.value, "51.00");
    }

    #[tokio::test]
    async fn test_native_rejected_then_retry() {
        let sheet = Arc::new(MockNativePay::new("sheet"));
        sheet.set_outcome(SheetOutcome::Reject("Payment cancelled".into()));
        let mut d = dispatcher(sheet.clone(), Arc::new(MockWallet::disconnected("w")));
        let order = order(Rail::NativePay, None);

        let err = d.confirm(&order).await.unwrap_err();
        assert_eq!(err.to_string(), "Payment cancelled");
        assert_eq!(d.attempt().unwrap().status, AttemptStatus::Failed);

        d.retry().unwrap();
        sheet.set_outcome(SheetOutcome::Accept);
        assert!(d.confirm(&order).await.is_ok());
    }

    #[tokio::test]
    async fn test_wallet_confirm_waits_for_trigger() {
        let wallet = Arc::new(MockWallet::new("w", Some(Address::from([1u8; 20]))));
        let mut d = dispatcher(Arc::new(MockNativePay::new("sheet")), wallet.clone());

        let outcome = d.confirm(&order(Rail::Wallet, Some("ETH"))).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::AwaitingWalletTrigger);
        assert_eq!(d.attempt().unwrap().status, AttemptStatus::AwaitingUser);
        assert!(wallet.writes().is_empty());
    }

    #[tokio::test]
    async fn test_second_confirm_while_in_flight_is_rejected() {
        let wallet = Arc::new(MockWallet::new("w", Some(Address::from([1u8; 20]))));
        let mut d = dispatcher(Arc::new(MockNativePay::new("sheet")), wallet);
        let order = order(Rail::Wallet, Some("ETH"));

        d.confirm(&order).await.unwrap();
        assert_eq!(d.confirm(&order).await.unwrap_err(), PaymentError::AttemptInProgress);
    }

    #[tokio::test]
    async fn test_cancel_before_and_after_submission() {
        let wallet = Arc::new(MockWallet::new("w", Some(Address::from([1u8; 20]))));
        let mut d = dispatcher(Arc::new(MockNativePay::new("sheet")), wallet.clone());
        let order = order(Rail::Wallet, Some("PYUSD"));

        d.confirm(&order).await.unwrap();
        d.cancel().unwrap();
        assert!(d.attempt().is_none());
        assert!(wallet.writes().is_empty());

        d.confirm(&order).await.unwrap();
        let outcome = d.trigger_wallet().await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::ApprovalConfirmed { .. }));
        assert_eq!(
            d.cancel().unwrap_err(),
            PaymentError::CancelNotAllowed(AttemptStatus::Submitted)
        );
    }

    #[tokio::test]
    async fn test_payee_from_address_handle() {
        let wallet = Arc::new(MockWallet::new("w", Some(Address::from([1u8; 20]))));
        let mut d = dispatcher(Arc::new(MockNativePay::new("sheet")), wallet.clone());
        let payee = Address::from([0x42u8; 20]);
        let mut order = order(Rail::Wallet, Some("ETH"));
        order.recipient.handle = format!("{:?}", payee);

        d.confirm(&order).await.unwrap();
        d.trigger_wallet().await.unwrap();
        assert_eq!(wallet.writes()[0].address_arg(2), Some(payee));
    }

    #[tokio::test]
    async fn test_confirm_native_when_sheet_vanished() {
        let sheet = Arc::new(MockNativePay::new("sheet"));
        let mut d = dispatcher(sheet.clone(), Arc::new(MockWallet::disconnected("w")));
        sheet.set_available(Some(false));

        let err = d.confirm(&order(Rail::NativePay, None)).await.unwrap_err();
        assert_eq!(err, PaymentError::CapabilityUnavailable);
        assert!(err.user_message().is_none());
        assert!(d.attempt().is_none());
    }

    #[tokio::test]
    async fn test_disconnected_checked_before_asset() {
        let mut d = dispatcher(
            Arc::new(MockNativePay::new("sheet")),
            Arc::new(MockWallet::disconnected("w")),
        );
        d.confirm(&order(Rail::Wallet, None)).await.unwrap();

        let err = d.trigger_wallet().await.unwrap_err();
        assert_eq!(err, PaymentError::WalletNotConnected);
        assert_eq!(d.attempt().unwrap().status, AttemptStatus::AwaitingUser);
    }

    #[tokio::test]
    async fn test_trigger_pays_confirmed_order() {
        let owner = Address::from([1u8; 20]);
        let wallet = Arc::new(MockWallet::new("w", Some(owner)));
        let mut d = dispatcher(Arc::new(MockNativePay::new("sheet")), wallet.clone());
        let confirmed = order(Rail::Wallet, Some("USDC"));

        d.confirm(&confirmed).await.unwrap();
        assert_eq!(d.order(), Some(&confirmed));
        d.trigger_wallet().await.unwrap();
        d.trigger_wallet().await.unwrap();

        let writes = wallet.writes();
        // approval and payment carry the same confirmed total
        assert_eq!(writes[0].uint_arg(1), Some(U256::from(51_000_000u64)));
        assert_eq!(writes[1].uint_arg(1), Some(U256::from(51_000_000u64)));

        d.reset();
        assert!(d.order().is_none());
    }

    #[tokio::test]
    async fn test_cancel_after_failure_closes_modal() {
        let sheet = Arc::new(MockNativePay::new("sheet"));
        sheet.set_outcome(SheetOutcome::Reject("Payment cancelled".into()));
        let mut d = dispatcher(sheet, Arc::new(MockWallet::disconnected("w")));

        d.confirm(&order(Rail::NativePay, None)).await.unwrap_err();
        assert_eq!(d.attempt().unwrap().status, AttemptStatus::Failed);

        d.cancel().unwrap();
        assert!(d.attempt().is_none());
        assert!(d.order().is_none());
    }

    #[tokio::test]
    async fn test_cancel_after_success_is_refused() {
        let mut d = dispatcher(
            Arc::new(MockNativePay::new("sheet")),
            Arc::new(MockWallet::disconnected("w")),
        );
        d.confirm(&order(Rail::NativePay, None)).await.unwrap();
        assert_eq!(
            d.cancel().unwrap_err(),
            PaymentError::CancelNotAllowed(AttemptStatus::Succeeded)
        );
    }

    #[tokio::test]
    async fn test_trigger_without_attempt() {
        let mut d = dispatcher(
            Arc::new(MockNativePay::new("sheet")),
            Arc::new(MockWallet::disconnected("w")),
        );
        let err = d.trigger_wallet().await.unwrap_err();
        assert_eq!(err, PaymentError::NoActiveAttempt);
    }
}
