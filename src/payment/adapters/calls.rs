//! Contract calls used by the wallet rail
//!
//! Minimal ERC-20 surface plus the client contract's `pay` entry point. A call is a
//! static descriptor until an adapter turns it into a transaction.

use ethers::abi::{decode, encode, ParamType, Token};
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::{format_units, id, parse_units};
use rust_decimal::Decimal;

use crate::models::assets::AssetDescriptor;
use crate::models::errors::PaymentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFunction {
    Allowance,
    Approve,
    BalanceOf,
    Pay,
}

impl ContractFunction {
    pub fn signature(&self) -> &'static str {
        match self {
            ContractFunction::Allowance => "allowance(address,address)",
            ContractFunction::Approve => "approve(address,uint256)",
            ContractFunction::BalanceOf => "balanceOf(address)",
            ContractFunction::Pay => "pay(address,uint256,address)",
        }
    }

    pub fn selector(&self) -> [u8; 4] {
        id(self.signature())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub to: Address,
    pub function: ContractFunction,
    pub args: Vec<Token>,
    /// Native value attached to the call
    pub value: U256,
}

impl ContractCall {
    pub fn new(to: Address, function: ContractFunction, args: Vec<Token>) -> Self {
        Self {
            to,
            function,
            args,
            value: U256::zero(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Selector followed by the ABI-encoded arguments
    pub fn calldata(&self) -> Bytes {
        let mut data = self.function.selector().to_vec();
        data.extend(encode(&self.args));
        Bytes::from(data)
    }

    pub fn to_request(&self, from: Option<Address>) -> TransactionRequest {
        let mut tx = TransactionRequest::new().to(self.to).data(self.calldata());
        if !self.value.is_zero() {
            tx = tx.value(self.value);
        }
        if let Some(from) = from {
            tx = tx.from(from);
        }
        tx
    }

    pub fn address_arg(&self, index: usize) -> Option<Address> {
        self.args.get(index).cloned().and_then(Token::into_address)
    }

    pub fn uint_arg(&self, index: usize) -> Option<U256> {
        self.args.get(index).cloned().and_then(Token::into_uint)
    }
}

pub fn allowance_call(token: Address, owner: Address, spender: Address) -> ContractCall {
    ContractCall::new(
        token,
        ContractFunction::Allowance,
        vec![Token::Address(owner), Token::Address(spender)],
    )
}

pub fn approve_call(token: Address, spender: Address, amount: U256) -> ContractCall {
    ContractCall::new(
        token,
        ContractFunction::Approve,
        vec![Token::Address(spender), Token::Uint(amount)],
    )
}

pub fn balance_of_call(token: Address, account: Address) -> ContractCall {
    ContractCall::new(token, ContractFunction::BalanceOf, vec![Token::Address(account)])
}

/// `pay(paymentToken, amount, payee)` on the client contract.
///
/// Native payments pass the zero address and attach `amount` as value.
pub fn pay_call(
    client: Address,
    asset: &AssetDescriptor,
    amount: U256,
    payee: Address,
) -> Result<ContractCall, PaymentError> {
    let call = ContractCall::new(
        client,
        ContractFunction::Pay,
        vec![Token::Address(asset.address()?), Token::Uint(amount), Token::Address(payee)],
    );
    if asset.is_native() {
        Ok(call.with_value(amount))
    } else {
        Ok(call)
    }
}

pub fn decode_uint(data: &[u8]) -> Result<U256, PaymentError> {
    let tokens = decode(&[ParamType::Uint(256)], data).map_err(|e| PaymentError::ChainRead(e.to_string()))?;
    tokens
        .into_iter()
        .next()
        .and_then(Token::into_uint)
        .ok_or_else(|| PaymentError::ChainRead("empty return data".to_string()))
}

/// Decimal amount to the asset's base units
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<U256, PaymentError> {
    parse_units(amount.to_string(), decimals)
        .map(U256::from)
        .map_err(|e| PaymentError::InvalidAmount(format!("{} with {} decimals: {}", amount, decimals, e)))
}

pub fn from_base_units(amount: U256, decimals: u32) -> Result<String, PaymentError> {
    format_units(amount, decimals).map_err(|e| PaymentError::ChainRead(e.to_string()))
}
