//! Payable assets and fixed contract addresses (Ethereum mainnet)
//!
//! These are compile-time constants, not runtime-negotiated.

use std::str::FromStr;

use ethers::types::Address;
use serde::Serialize;

use crate::models::errors::PaymentError;

/// Client contract: `pay(address,uint256,address)` entry point and allowance spender
pub const CLIENT_CONTRACT: &str = "0xd3335a63df9a3133fc313b1306fdd48612d7fd98";
/// Default payee for wallet payments
pub const PAYMENT_GATEWAY: &str = "0x5c9475e14b7a4857e460702764c4d5186ffd697d";
/// Zero address stands in for the chain's native unit
pub const NATIVE_MARKER: &str = "0x0000000000000000000000000000000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "address", rename_all = "lowercase")]
pub enum AssetContract {
    Native,
    Erc20(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssetDescriptor {
    pub symbol: &'static str,
    pub name: &'static str,
    pub contract: AssetContract,
    pub decimals: u32,
}

impl AssetDescriptor {
    pub fn is_native(&self) -> bool {
        matches!(self.contract, AssetContract::Native)
    }

    /// Token address, or the zero address for the native unit
    pub fn address(&self) -> Result<Address, PaymentError> {
        match self.contract {
            AssetContract::Native => parse_address(NATIVE_MARKER),
            AssetContract::Erc20(addr) => parse_address(addr),
        }
    }
}

pub static PAYMENT_ASSETS: [AssetDescriptor; 5] = [
    AssetDescriptor {
        symbol: "ETH",
        name: "Ethereum",
        contract: AssetContract::Native,
        decimals: 18,
    },
    AssetDescriptor {
        symbol: "DAI",
        name: "Dai Stablecoin",
        contract: AssetContract::Erc20("0x6B175474E89094C44Da98b954EedeAC495271d0F"),
        decimals: 18,
    },
    AssetDescriptor {
        symbol: "USDT",
        name: "Tether USD",
        contract: AssetContract::Erc20("0xdAC17F958D2ee523a2206206994597C13D831ec7"),
        decimals: 6,
    },
    AssetDescriptor {
        symbol: "USDC",
        name: "USD Coin",
        contract: AssetContract::Erc20("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        decimals: 6,
    },
    AssetDescriptor {
        symbol: "PYUSD",
        name: "PayPal USD",
        contract: AssetContract::Erc20("0x6c3ea9036406852006290770BEdFcAbA0e23A0e8"),
        decimals: 6,
    },
];

/// Look up an asset by symbol (any case) or contract address
pub fn find_asset(id: &str) -> Option<&'static AssetDescriptor> {
    let id = id.trim();
    PAYMENT_ASSETS.iter().find(|asset| {
        asset.symbol.eq_ignore_ascii_case(id)
            || match asset.contract {
                AssetContract::Erc20(addr) => addr.eq_ignore_ascii_case(id),
                AssetContract::Native => NATIVE_MARKER.eq_ignore_ascii_case(id),
            }
    })
}

pub fn parse_address(s: &str) -> Result<Address, PaymentError> {
    Address::from_str(s.trim()).map_err(|e| PaymentError::Config(format!("bad address {}: {}", s, e)))
}
