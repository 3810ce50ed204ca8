// End-to-end send-money flows through the wizard, dispatcher and result page,
// with the mock payment sheet and the in-memory wallet.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, TxHash, U256};
use pylink::models::errors::PaymentError;
use pylink::models::rail::{Rail, RecipientKind};
use pylink::payment::adapters::mock::{MockNativePay, MockWallet, SheetOutcome};
use pylink::payment::{AttemptStatus, DispatchOutcome, DispatchSettings, PaymentDispatcher};
use pylink::send::{leave_result, ResultAction, TransferSummary, WizardController, WizardStep};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn owner() -> Address {
    Address::from([0x11; 20])
}

fn settings() -> DispatchSettings {
    DispatchSettings {
        settlement_delay: Duration::ZERO,
        ..DispatchSettings::mainnet().unwrap()
    }
}

fn setup(native: MockNativePay, wallet: MockWallet) -> (Arc<MockNativePay>, Arc<MockWallet>, PaymentDispatcher) {
    let native = Arc::new(native);
    let wallet = Arc::new(wallet);
    let dispatcher = PaymentDispatcher::new(native.clone(), wallet.clone(), settings());
    (native, wallet, dispatcher)
}

/// Walk steps 1-3 and stop on the review step
async fn fill_wizard(
    dispatcher: &PaymentDispatcher,
    kind: RecipientKind,
    handle: &str,
    amount: &str,
    rail: Rail,
    asset: Option<&str>,
) -> WizardController {
    let mut wizard = WizardController::new();
    wizard.set_recipient_kind(kind);
    wizard.set_handle(handle);
    assert_eq!(wizard.advance(), WizardStep::Amount);

    wizard.set_amount(amount);
    assert_eq!(wizard.advance(), WizardStep::Payment);

    let quote = wizard.quote();
    wizard.set_rail_options(dispatcher.available_rails(&quote).await);
    wizard.set_wallet_connected(dispatcher.wallet_connected());
    wizard.select_rail(rail).unwrap();
    if let Some(asset) = asset {
        wizard.select_asset(asset).unwrap();
    }
    assert_eq!(wizard.advance(), WizardStep::Review);
    wizard
}

// ===== Native payment sheet =====

#[tokio::test]
async fn test_internal_transfer_with_native_sheet() {
    let (native, _wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::disconnected("w"));
    let mut wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "@alice", "50", Rail::NativePay, None).await;

    let order = wizard.review().unwrap();
    assert_eq!(order.recipient.handle, "alice");
    assert_eq!(order.quote.fee, Decimal::ZERO);
    assert_eq!(order.quote.total, dec("50"));

    let outcome = dispatcher.confirm(&order).await.unwrap();
    let external_ref = match outcome {
        DispatchOutcome::Succeeded { external_ref } => external_ref,
        other => panic!("unexpected outcome {:?}", other),
    };

    let shown = native.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].details.total.amount.value, "50.00");

    let summary = TransferSummary::from_attempt(&order, dispatcher.attempt().unwrap()).unwrap();
    assert_eq!(summary.transaction_id, external_ref);
    assert_eq!(summary.payment_method, "Apple Pay");
    assert_eq!(summary.recipient, "@alice");
    assert_eq!(summary.reward, dec("0.50"));
    assert!(summary.to_string().contains("Payment Successful!"));

    leave_result(ResultAction::SendAnother, &mut wizard, &mut dispatcher);
    assert_eq!(wizard.step(), WizardStep::Recipient);
    assert!(wizard.state().handle.is_empty());
    assert!(dispatcher.attempt().is_none());
}

#[tokio::test]
async fn test_native_sheet_hidden_when_device_cannot_pay() {
    let (_native, _wallet, dispatcher) = setup(MockNativePay::unavailable("sheet"), MockWallet::disconnected("w"));

    let mut wizard = WizardController::new();
    wizard.set_recipient_kind(RecipientKind::External);
    wizard.set_handle("john.doe@paypal.com");
    wizard.advance();
    wizard.set_amount("50.00");
    wizard.advance();

    wizard.set_rail_options(dispatcher.available_rails(&wizard.quote()).await);
    assert_eq!(wizard.rail_options(), &[Rail::Wallet]);
    assert_eq!(
        wizard.select_rail(Rail::NativePay),
        Err(PaymentError::RailNotOffered(Rail::NativePay))
    );
}

#[tokio::test]
async fn test_closed_sheet_fails_attempt_until_retry() {
    let sheet = MockNativePay::new("sheet");
    sheet.set_outcome(SheetOutcome::Reject("Payment sheet closed".into()));
    let (native, _wallet, mut dispatcher) = setup(sheet, MockWallet::disconnected("w"));
    let wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "alice", "25", Rail::NativePay, None).await;
    let order = wizard.review().unwrap();

    let err = dispatcher.confirm(&order).await.unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::Failed);
    // the sheet was never completed
    assert!(native.completions().is_empty());

    dispatcher.retry().unwrap();
    assert!(dispatcher.attempt().is_none());

    native.set_outcome(SheetOutcome::Accept);
    let outcome = dispatcher.confirm(&order).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));
}

// ===== Wallet =====

#[tokio::test]
async fn test_paypal_payout_with_usdc_approve_then_pay() {
    let (_native, wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::new("w", Some(owner())));
    let wizard = fill_wizard(
        &dispatcher,
        RecipientKind::External,
        "john.doe@paypal.com",
        "50.00",
        Rail::Wallet,
        Some("usdc"),
    )
    .await;
    let order = wizard.review().unwrap();
    assert_eq!(order.quote.total, dec("51.00"));

    assert_eq!(dispatcher.confirm(&order).await.unwrap(), DispatchOutcome::AwaitingWalletTrigger);
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::AwaitingUser);

    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::ApprovalConfirmed { .. }));
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::Submitted);

    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));

    let writes = wallet.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].uint_arg(1), Some(U256::from(51_000_000u64)));
    let pay = &writes[1];
    // USDC has 6 decimals
    assert_eq!(pay.uint_arg(1), Some(U256::from(51_000_000u64)));
    assert_eq!(pay.address_arg(2), Some(settings().default_payee));
    assert!(pay.value.is_zero());

    let summary = TransferSummary::from_attempt(&order, dispatcher.attempt().unwrap()).unwrap();
    assert_eq!(summary.asset, Some("USDC"));
    assert_eq!(summary.transaction_id, format!("{:?}", TxHash::from_low_u64_be(2)));
    assert_eq!(summary.reward, Decimal::ZERO);
}

#[tokio::test]
async fn test_eth_pays_in_one_transaction() {
    let (_native, wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::new("w", Some(owner())));
    let wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "alice", "10", Rail::Wallet, Some("ETH")).await;
    let order = wizard.review().unwrap();

    dispatcher.confirm(&order).await.unwrap();
    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));

    let writes = wallet.writes();
    assert_eq!(writes.len(), 1);
    let ten_ether = U256::exp10(19);
    assert_eq!(writes[0].value, ten_ether);
    assert!(wallet.reads().is_empty());
}

#[tokio::test]
async fn test_declined_signature_keeps_modal_open() {
    let (_native, wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::new("w", Some(owner())));
    let wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "alice", "20", Rail::Wallet, Some("DAI")).await;
    let order = wizard.review().unwrap();
    dispatcher.confirm(&order).await.unwrap();

    wallet.reject_next_write("User rejected the request.");
    let err = dispatcher.trigger_wallet().await.unwrap_err();
    assert_eq!(err, PaymentError::UserRejected("User rejected the request.".into()));
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::Idle);
    assert!(wallet.writes().is_empty());

    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::ApprovalConfirmed { .. }));
    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));
}

#[tokio::test]
async fn test_disconnected_wallet_does_not_advance_attempt() {
    let (_native, wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::disconnected("w"));
    // without a connected wallet the asset picker is not shown
    let wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "alice", "20", Rail::Wallet, Some("USDT")).await;
    let order = wizard.review().unwrap();
    dispatcher.confirm(&order).await.unwrap();

    let err = dispatcher.trigger_wallet().await.unwrap_err();
    assert_eq!(err, PaymentError::WalletNotConnected);
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::AwaitingUser);

    wallet.connect(owner());
    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::ApprovalConfirmed { .. }));
}

#[tokio::test]
async fn test_disconnected_wallet_without_asset_reports_not_connected() {
    let (_native, wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::disconnected("w"));
    let wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "alice", "20", Rail::Wallet, None).await;
    let order = wizard.review().unwrap();
    assert!(order.asset.is_none());
    dispatcher.confirm(&order).await.unwrap();

    let err = dispatcher.trigger_wallet().await.unwrap_err();
    assert_eq!(err, PaymentError::WalletNotConnected);
    assert_eq!(err.user_message().as_deref(), Some("Wallet not connected"));
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::AwaitingUser);
    assert!(wallet.reads().is_empty());
}

#[tokio::test]
async fn test_reverted_payment_fails_then_modal_closes() {
    let (_native, wallet, mut dispatcher) = setup(MockNativePay::new("sheet"), MockWallet::new("w", Some(owner())));
    let wizard = fill_wizard(&dispatcher, RecipientKind::Internal, "alice", "5", Rail::Wallet, Some("ETH")).await;
    let order = wizard.review().unwrap();
    dispatcher.confirm(&order).await.unwrap();

    wallet.revert_next_inclusion("execution reverted");
    let err = dispatcher.trigger_wallet().await.unwrap_err();
    assert_eq!(err, PaymentError::OnChainFailure("execution reverted".into()));
    assert_eq!(dispatcher.attempt().unwrap().status, AttemptStatus::Failed);
    assert!(err.user_message().is_some());

    // nothing is in flight after a failure, so closing the modal just clears it
    dispatcher.cancel().unwrap();
    assert!(dispatcher.attempt().is_none());
    assert!(dispatcher.order().is_none());

    dispatcher.confirm(&order).await.unwrap();
    let outcome = dispatcher.trigger_wallet().await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));
}
