//! Wallet backed by an ethers middleware
//!
//! With a plain `Provider<Http>` the node's own account signs (dev nodes, unlocked
//! accounts); a `SignerMiddleware` stack signs locally. Either way the flows only see
//! `WalletChain`.

use async_trait::async_trait;
use ethers::providers::{Middleware, MiddlewareError, PendingTransaction};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TxHash, U256, U64};
use std::sync::Arc;

use super::calls::{decode_uint, ContractCall};
use super::traits::{InclusionReceipt, WalletChain};
use crate::models::errors::PaymentError;

pub struct RpcWallet<M> {
    client: Arc<M>,
    account: Option<Address>,
}

impl<M: Middleware + 'static> RpcWallet<M> {
    pub fn new(client: Arc<M>, account: Option<Address>) -> Self {
        Self { client, account }
    }
}

/// EIP-1193 "User Rejected Request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Wallets report a declined signature as a JSON-RPC error with code 4001; signers
/// without a code only say so in the message.
pub fn classify_submit_error(code: Option<i64>, message: String) -> PaymentError {
    let lower = message.to_lowercase();
    if code == Some(USER_REJECTED_CODE) || lower.contains("user rejected") || lower.contains("user denied") {
        PaymentError::UserRejected(message)
    } else {
        PaymentError::Submission(message)
    }
}

#[async_trait]
impl<M: Middleware + 'static> WalletChain for RpcWallet<M> {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn read(&self, call: &ContractCall) -> Result<U256, PaymentError> {
        let tx: TypedTransaction = call.to_request(self.account).into();
        let output = self
            .client
            .call(&tx, None)
            .await
            .map_err(|e| PaymentError::ChainRead(e.to_string()))?;
        decode_uint(&output)
    }

    async fn native_balance(&self, account: Address) -> Result<U256, PaymentError> {
        self.client
            .get_balance(account, None)
            .await
            .map_err(|e| PaymentError::ChainRead(e.to_string()))
    }

    async fn write(&self, call: &ContractCall) -> Result<TxHash, PaymentError> {
        let from = self.account.ok_or(PaymentError::WalletNotConnected)?;
        let pending = self
            .client
            .send_transaction(call.to_request(Some(from)), None)
            .await
            .map_err(|e| classify_submit_error(e.as_error_response().map(|r| r.code), e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionReceipt, PaymentError> {
        let receipt = PendingTransaction::new(tx_hash, self.client.provider())
            .await
            .map_err(|e| PaymentError::OnChainFailure(e.to_string()))?
            .ok_or_else(|| PaymentError::OnChainFailure(format!("transaction {:?} was dropped", tx_hash)))?;

        Ok(InclusionReceipt {
            tx_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            success: receipt.status == Some(U64::from(1u64)),
        })
    }

    fn name(&self) -> &str {
        "rpc"
    }
}
