//! Rail adapter traits
//!
//! The dispatcher never talks to a browser or a node directly; it is handed one
//! implementation of each trait. Production and tests differ only in what is injected.

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::models::errors::PaymentError;
use crate::payment::adapters::calls::ContractCall;

// ===== Native payment capability =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    pub currency: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentItem {
    pub label: String,
    pub amount: CurrencyAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodData {
    pub version: u8,
    pub merchant_identifier: String,
    pub merchant_capabilities: Vec<String>,
    pub supported_networks: Vec<String>,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub supported_methods: String,
    pub data: MethodData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub total: PaymentItem,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display_items: Vec<PaymentItem>,
}

/// Arguments of a browser `PaymentRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativePaymentRequest {
    pub method_data: Vec<PaymentMethod>,
    pub details: PaymentDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativePaymentResponse {
    pub request_id: String,
    pub method_name: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Value passed to `PaymentResponse.complete()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionOutcome {
    Success,
    Fail,
    Unknown,
}

/// Browser payment sheet (Payment Request API)
#[async_trait]
pub trait NativePayCapability: Send + Sync {
    /// `canMakePayment()`: `None` when the browser cannot tell
    async fn can_make_payment(&self, request: &NativePaymentRequest) -> Result<Option<bool>, PaymentError>;

    /// `show()`: suspends until the user accepts, cancels, or the sheet times out.
    ///
    /// Cancellation and timeouts come back as `PaymentError::UserRejected` with the
    /// browser's message.
    async fn show(&self, request: &NativePaymentRequest) -> Result<NativePaymentResponse, PaymentError>;

    /// `complete()`: must be called once for every response returned by `show`
    async fn complete(&self, response: &NativePaymentResponse, outcome: CompletionOutcome) -> Result<(), PaymentError>;

    /// Get capability name for logging
    fn name(&self) -> &str;
}

// ===== Wallet / chain layer =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InclusionReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Connected wallet plus the chain it reads from
#[async_trait]
pub trait WalletChain: Send + Sync {
    /// Connected account, if any
    fn account(&self) -> Option<Address>;

    /// Call a view function returning a single `uint256`
    async fn read(&self, call: &ContractCall) -> Result<U256, PaymentError>;

    async fn native_balance(&self, account: Address) -> Result<U256, PaymentError>;

    /// Have the wallet sign and broadcast the call.
    ///
    /// Returns once the transaction is handed to the network; a declined signature is
    /// `PaymentError::UserRejected`.
    async fn write(&self, call: &ContractCall) -> Result<TxHash, PaymentError>;

    /// Suspend until the transaction is included (or dropped)
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionReceipt, PaymentError>;

    /// Get wallet name for logging
    fn name(&self) -> &str;
}
