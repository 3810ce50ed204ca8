//! Mock adapters for testing and the simulated CLI mode
//!
//! Both record every call so tests can assert on what the flows actually did.

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::calls::{ContractCall, ContractFunction};
use super::traits::{
    CompletionOutcome, InclusionReceipt, NativePayCapability, NativePaymentRequest, NativePaymentResponse,
    WalletChain,
};
use crate::models::errors::PaymentError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ===== Native payment sheet =====

/// What the user does when the payment sheet opens
#[derive(Debug, Clone, PartialEq)]
pub enum SheetOutcome {
    Accept,
    /// User closed the sheet; carries the browser's message
    Reject(String),
}

pub struct MockNativePay {
    name: String,
    available: Mutex<Option<bool>>,
    outcome: Mutex<SheetOutcome>,
    fail_complete: Mutex<Option<String>>,
    shown: Mutex<Vec<NativePaymentRequest>>,
    completions: Mutex<Vec<CompletionOutcome>>,
}

impl MockNativePay {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            available: Mutex::new(Some(true)),
            outcome: Mutex::new(SheetOutcome::Accept),
            fail_complete: Mutex::new(None),
            shown: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(name: &str) -> Self {
        let mock = Self::new(name);
        mock.set_available(Some(false));
        mock
    }

    /// What `can_make_payment` answers; `None` mimics a browser that cannot tell
    pub fn set_available(&self, available: Option<bool>) {
        *lock(&self.available) = available;
    }

    pub fn set_outcome(&self, outcome: SheetOutcome) {
        *lock(&self.outcome) = outcome;
    }

    pub fn fail_complete(&self, reason: &str) {
        *lock(&self.fail_complete) = Some(reason.to_string());
    }

    pub fn shown(&self) -> Vec<NativePaymentRequest> {
        lock(&self.shown).clone()
    }

    pub fn completions(&self) -> Vec<CompletionOutcome> {
        lock(&self.completions).clone()
    }
}

#[async_trait]
impl NativePayCapability for MockNativePay {
    async fn can_make_payment(&self, _request: &NativePaymentRequest) -> Result<Option<bool>, PaymentError> {
        Ok(*lock(&self.available))
    }

    async fn show(&self, request: &NativePaymentRequest) -> Result<NativePaymentResponse, PaymentError> {
        let seq = {
            let mut shown = lock(&self.shown);
            shown.push(request.clone());
            shown.len()
        };
        log::debug!("[{}] show(total={})", self.name, request.details.total.amount.value);

        match lock(&self.outcome).clone() {
            SheetOutcome::Accept => Ok(NativePaymentResponse {
                request_id: format!("{}-req-{}", self.name, seq),
                method_name: request
                    .method_data
                    .first()
                    .map(|m| m.supported_methods.clone())
                    .unwrap_or_default(),
                details: serde_json::json!({ "token": "mock-payment-token" }),
            }),
            SheetOutcome::Reject(reason) => Err(PaymentError::UserRejected(reason)),
        }
    }

    async fn complete(&self, response: &NativePaymentResponse, outcome: CompletionOutcome) -> Result<(), PaymentError> {
        log::debug!("[{}] complete({}, {:?})", self.name, response.request_id, outcome);
        lock(&self.completions).push(outcome);
        match lock(&self.fail_complete).clone() {
            Some(reason) => Err(PaymentError::NativePayFailed(reason)),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ===== Wallet =====

#[derive(Default)]
struct WalletBook {
    account: Option<Address>,
    // (token, owner, spender) -> amount
    allowances: HashMap<(Address, Address, Address), U256>,
    // (token, owner) -> amount
    token_balances: HashMap<(Address, Address), U256>,
    native_balances: HashMap<Address, U256>,
    pending: HashMap<TxHash, ContractCall>,
    reads: Vec<ContractCall>,
    writes: Vec<ContractCall>,
    reject_next_write: Option<String>,
    revert_next_inclusion: Option<String>,
    fail_reads: Option<String>,
    tx_seq: u64,
}

/// In-memory wallet: approvals take effect on inclusion, payments only get recorded
pub struct MockWallet {
    name: String,
    book: Mutex<WalletBook>,
}

impl MockWallet {
    pub fn new(name: &str, account: Option<Address>) -> Self {
        Self {
            name: name.to_string(),
            book: Mutex::new(WalletBook {
                account,
                ..WalletBook::default()
            }),
        }
    }

    pub fn disconnected(name: &str) -> Self {
        Self::new(name, None)
    }

    pub fn connect(&self, account: Address) {
        lock(&self.book).account = Some(account);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        lock(&self.book).allowances.insert((token, owner, spender), amount);
    }

    pub fn set_token_balance(&self, token: Address, owner: Address, amount: U256) {
        lock(&self.book).token_balances.insert((token, owner), amount);
    }

    pub fn set_native_balance(&self, owner: Address, amount: U256) {
        lock(&self.book).native_balances.insert(owner, amount);
    }

    /// The next signature request is declined with this message
    pub fn reject_next_write(&self, reason: &str) {
        lock(&self.book).reject_next_write = Some(reason.to_string());
    }

    /// The next transaction fails inclusion with this message
    pub fn revert_next_inclusion(&self, reason: &str) {
        lock(&self.book).revert_next_inclusion = Some(reason.to_string());
    }

    pub fn fail_reads(&self, reason: &str) {
        lock(&self.book).fail_reads = Some(reason.to_string());
    }

    pub fn reads(&self) -> Vec<ContractCall> {
        lock(&self.book).reads.clone()
    }

    pub fn writes(&self) -> Vec<ContractCall> {
        lock(&self.book).writes.clone()
    }
}

#[async_trait]
impl WalletChain for MockWallet {
    fn account(&self) -> Option<Address> {
        lock(&self.book).account
    }

    async fn read(&self, call: &ContractCall) -> Result<U256, PaymentError> {
        let mut book = lock(&self.book);
        book.reads.push(call.clone());
        if let Some(reason) = book.fail_reads.clone() {
            return Err(PaymentError::ChainRead(reason));
        }

        let missing = || PaymentError::ChainRead(format!("bad arguments for {}", call.function.signature()));
        match call.function {
            ContractFunction::Allowance => {
                let owner = call.address_arg(0).ok_or_else(missing)?;
                let spender = call.address_arg(1).ok_or_else(missing)?;
                Ok(book.allowances.get(&(call.to, owner, spender)).copied().unwrap_or_default())
            }
            ContractFunction::BalanceOf => {
                let owner = call.address_arg(0).ok_or_else(missing)?;
                Ok(book.token_balances.get(&(call.to, owner)).copied().unwrap_or_default())
            }
            other => Err(PaymentError::ChainRead(format!("{} is not a view function", other.signature()))),
        }
    }

    async fn native_balance(&self, account: Address) -> Result<U256, PaymentError> {
        Ok(lock(&self.book).native_balances.get(&account).copied().unwrap_or_default())
    }

    async fn write(&self, call: &ContractCall) -> Result<TxHash, PaymentError> {
        let mut book = lock(&self.book);
        if book.account.is_none() {
            return Err(PaymentError::WalletNotConnected);
        }
        if let Some(reason) = book.reject_next_write.take() {
            return Err(PaymentError::UserRejected(reason));
        }

        book.tx_seq += 1;
        let tx_hash = TxHash::from_low_u64_be(book.tx_seq);
        book.writes.push(call.clone());
        book.pending.insert(tx_hash, call.clone());
        log::debug!("[{}] {} -> {:?}", self.name, call.function.signature(), tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<InclusionReceipt, PaymentError> {
        let mut book = lock(&self.book);
        let call = book
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| PaymentError::OnChainFailure(format!("unknown transaction {:?}", tx_hash)))?;
        if let Some(reason) = book.revert_next_inclusion.take() {
            return Err(PaymentError::OnChainFailure(reason));
        }

        if call.function == ContractFunction::Approve {
            if let (Some(owner), Some(spender), Some(amount)) = (book.account, call.address_arg(0), call.uint_arg(1)) {
                book.allowances.insert((call.to, owner, spender), amount);
            }
        }

        Ok(InclusionReceipt {
            tx_hash,
            block_number: Some(book.tx_seq),
            success: true,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
