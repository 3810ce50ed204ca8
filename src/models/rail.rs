use serde::{Deserialize, Serialize};

/// Who receives the money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    /// Another PyLink user, addressed by username
    #[default]
    Internal,
    /// A PayPal account, addressed by email
    External,
}

impl RecipientKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientKind::Internal => "internal",
            RecipientKind::External => "external",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internal" | "pylink" => Some(RecipientKind::Internal),
            "external" | "paypal" => Some(RecipientKind::External),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecipientKind::Internal => "PyLink User",
            RecipientKind::External => "PayPal Account",
        }
    }
}

/// Payment execution path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rail {
    /// Browser Payment Request capability (Apple Pay)
    NativePay,
    /// On-chain transaction from a connected wallet
    Wallet,
}

impl Rail {
    pub const ALL: [Rail; 2] = [Rail::NativePay, Rail::Wallet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rail::NativePay => "native-pay",
            Rail::Wallet => "wallet",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "native-pay" | "apple-pay" => Some(Rail::NativePay),
            "wallet" | "crypto" => Some(Rail::Wallet),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rail::NativePay => "Apple Pay",
            Rail::Wallet => "Crypto Wallet",
        }
    }
}
