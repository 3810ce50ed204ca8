//! Wallet transaction flow
//!
//! Non-native assets go through approve-then-pay: a trigger that finds the allowance
//! short sends `approve` and stops once it is included. The next trigger re-reads the
//! allowance and sends `pay`. Operations within one attempt are strictly sequential.

use ethers::types::{Address, TxHash, U256};
use serde::Serialize;

use crate::models::assets::{AssetDescriptor, PAYMENT_ASSETS};
use crate::models::errors::{ErrorKind, PaymentError};
use crate::payment::adapters::calls::{
    allowance_call, approve_call, balance_of_call, from_base_units, pay_call, ContractCall,
};
use crate::payment::adapters::traits::WalletChain;
use crate::payment::attempt::{PaymentAttempt, WalletPhase};
use crate::payment::state::{AttemptEvent, AttemptStatus};

/// Addresses and amounts for one wallet payment
#[derive(Debug, Clone)]
pub struct WalletOrder {
    pub asset: &'static AssetDescriptor,
    /// In the asset's base units
    pub amount: U256,
    pub payee: Address,
    /// Client contract: allowance spender and `pay` target
    pub client: Address,
}

/// How a trigger ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStep {
    /// Approval included; trigger again to pay
    ApprovalConfirmed(TxHash),
    /// Payment included
    Paid(TxHash),
}

pub async fn run_wallet_flow(
    wallet: &dyn WalletChain,
    attempt: &mut PaymentAttempt,
    order: &WalletOrder,
) -> Result<WalletStep, PaymentError> {
    attempt.expect_status(&[AttemptStatus::AwaitingUser, AttemptStatus::Submitted], "awaiting-user")?;

    // Nothing has been attempted yet, so the attempt stays where it is.
    let account = match wallet.account() {
        Some(account) => account,
        None => {
            attempt.last_error = Some(PaymentError::WalletNotConnected);
            return Err(PaymentError::WalletNotConnected);
        }
    };

    if !order.asset.is_native() {
        let token = order.asset.address()?;
        let allowance = match wallet.read(&allowance_call(token, account, order.client)).await {
            Ok(allowance) => allowance,
            Err(e) => return Err(attempt.fail_with(AttemptEvent::Fail, e)),
        };
        crate::payment_debug!(
            "[{}] allowance {} {} for {} (need {})",
            wallet.name(),
            allowance,
            order.asset.symbol,
            account,
            order.amount
        );

        if allowance < order.amount {
            attempt.wallet_phase = Some(WalletPhase::NeedsApproval);
            let tx_hash = approve(wallet, attempt, token, order).await?;
            return Ok(WalletStep::ApprovalConfirmed(tx_hash));
        }
    }

    attempt.wallet_phase = Some(WalletPhase::Approved);
    let call = pay_call(order.client, order.asset, order.amount, order.payee)?;
    let tx_hash = pay(wallet, attempt, &call).await?;
    Ok(WalletStep::Paid(tx_hash))
}

async fn approve(
    wallet: &dyn WalletChain,
    attempt: &mut PaymentAttempt,
    token: Address,
    order: &WalletOrder,
) -> Result<TxHash, PaymentError> {
    let call = approve_call(token, order.client, order.amount);
    let tx_hash = submit(wallet, attempt, &call, WalletPhase::Approving, WalletPhase::NeedsApproval).await?;
    attempt.approval_ref = Some(format!("{:?}", tx_hash));

    match wallet.wait_for_inclusion(tx_hash).await {
        Ok(receipt) if receipt.success => {
            attempt.wallet_phase = Some(WalletPhase::Approved);
            crate::log_attempt_event!("APPROVAL_INCLUDED", attempt, "tx_hash" => format!("{:?}", tx_hash));
            Ok(tx_hash)
        }
        Ok(_) => Err(attempt.fail_with(
            AttemptEvent::Fail,
            PaymentError::OnChainFailure(format!("approval {:?} reverted", tx_hash)),
        )),
        Err(e) => Err(attempt.fail_with(AttemptEvent::Fail, e)),
    }
}

async fn pay(wallet: &dyn WalletChain, attempt: &mut PaymentAttempt, call: &ContractCall) -> Result<TxHash, PaymentError> {
    let tx_hash = submit(wallet, attempt, call, WalletPhase::Paying, WalletPhase::Approved).await?;
    attempt.external_ref = Some(format!("{:?}", tx_hash));
    attempt.apply(AttemptEvent::Observe);

    match wallet.wait_for_inclusion(tx_hash).await {
        Ok(receipt) if receipt.success => {
            attempt.apply(AttemptEvent::Include);
            attempt.wallet_phase = Some(WalletPhase::Paid);
            crate::log_attempt_event!("PAYMENT_INCLUDED", attempt, "tx_hash" => format!("{:?}", tx_hash));
            Ok(tx_hash)
        }
        Ok(_) => Err(attempt.fail_with(
            AttemptEvent::Fail,
            PaymentError::OnChainFailure(format!("transaction {:?} reverted", tx_hash)),
        )),
        Err(e) => Err(attempt.fail_with(AttemptEvent::Fail, e)),
    }
}

/// Hand one call to the wallet. A declined signature puts the attempt back to idle
/// and the phase back to `on_reject`; other submission errors fail the attempt.
async fn submit(
    wallet: &dyn WalletChain,
    attempt: &mut PaymentAttempt,
    call: &ContractCall,
    phase: WalletPhase,
    on_reject: WalletPhase,
) -> Result<TxHash, PaymentError> {
    attempt.wallet_phase = Some(phase);
    match wallet.write(call).await {
        Ok(tx_hash) => {
            attempt.apply(AttemptEvent::Submit);
            crate::log_attempt_event!("TX_SUBMITTED", attempt, "tx_hash" => format!("{:?}", tx_hash));
            Ok(tx_hash)
        }
        Err(e) if e.kind() == ErrorKind::UserRejection => {
            attempt.wallet_phase = Some(on_reject);
            Err(attempt.fail_with(AttemptEvent::Reject, e))
        }
        Err(e) => {
            attempt.wallet_phase = Some(on_reject);
            Err(attempt.fail_with(AttemptEvent::Fail, e))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetBalance {
    pub symbol: &'static str,
    pub balance: String,
}

/// Balances of every payable asset for the connected account; empty when disconnected
pub async fn asset_balances(wallet: &dyn WalletChain) -> Result<Vec<AssetBalance>, PaymentError> {
    let account = match wallet.account() {
        Some(account) => account,
        None => return Ok(Vec::new()),
    };

    let mut balances = Vec::with_capacity(PAYMENT_ASSETS.len());
    for asset in PAYMENT_ASSETS.iter() {
        let raw = if asset.is_native() {
            wallet.native_balance(account).await?
        } else {
            wallet.read(&balance_of_call(asset.address()?, account)).await?
        };
        balances.push(AssetBalance {
            symbol: asset.symbol,
            balance: from_base_units(raw, asset.decimals)?,
        });
    }
    Ok(balances)
}
