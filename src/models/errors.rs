// Error types for the send-money flow
use std::fmt;

use crate::models::rail::Rail;
use crate::payment::state::AttemptStatus;

/// Coarse classification used to decide how an error is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Navigation blocked; nothing to report beyond disabling the action
    Validation,
    /// Native rail not offered on this device; hidden, never reported
    CapabilityUnavailable,
    /// User declined in the wallet or payment sheet
    UserRejection,
    /// No wallet account connected
    NotConnected,
    /// Reverted or dropped transaction, failed read
    OnChain,
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentError {
    // Validation errors
    StepIncomplete { step: u8 },
    InvalidHandle(String),
    InvalidAmount(String),
    InvalidRequestCode(String),
    UnknownAsset(String),
    AssetRequired,
    RailNotOffered(Rail),
    RailNotSelected,

    // Capability errors
    CapabilityUnavailable,

    // User errors
    UserRejected(String),

    // Wallet errors
    WalletNotConnected,
    ChainRead(String),
    OnChainFailure(String),
    Submission(String),

    // Attempt errors
    AttemptInProgress,
    NoActiveAttempt,
    CancelNotAllowed(AttemptStatus),
    UnexpectedStatus { expected: &'static str, actual: AttemptStatus },
    NativePayFailed(String),

    // System errors
    Config(String),
    Unknown(String),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepIncomplete { step } => write!(f, "Step {} is incomplete", step),
            Self::InvalidHandle(handle) => write!(f, "Invalid username: {}", handle),
            Self::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            Self::InvalidRequestCode(msg) => write!(f, "Invalid request code: {}", msg),
            Self::UnknownAsset(asset) => write!(f, "Unknown asset: {}", asset),
            Self::AssetRequired => write!(f, "Select an asset to pay with"),
            Self::RailNotOffered(rail) => {
                write!(f, "Payment method {} is not available", rail.label())
            }
            Self::RailNotSelected => write!(f, "No payment method selected"),
            Self::CapabilityUnavailable => write!(f, "Payment Request API not available"),
            Self::UserRejected(reason) => write!(f, "{}", reason),
            Self::WalletNotConnected => write!(f, "Wallet not connected"),
            Self::ChainRead(msg) => write!(f, "Chain read failed: {}", msg),
            Self::OnChainFailure(msg) => write!(f, "{}", msg),
            Self::Submission(msg) => write!(f, "Transaction submission failed: {}", msg),
            Self::AttemptInProgress => write!(f, "A payment is already in progress"),
            Self::NoActiveAttempt => write!(f, "No payment attempt is open"),
            Self::CancelNotAllowed(status) => {
                write!(f, "Cannot cancel a payment that is {}", status.as_str())
            }
            Self::UnexpectedStatus { expected, actual } => {
                write!(f, "Expected attempt {}, found {}", expected, actual.as_str())
            }
            Self::NativePayFailed(msg) => write!(f, "Payment error: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for PaymentError {}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        PaymentError::Unknown(err.to_string())
    }
}

impl PaymentError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StepIncomplete { .. } => "STEP_INCOMPLETE",
            Self::InvalidHandle(_) => "INVALID_HANDLE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidRequestCode(_) => "INVALID_REQUEST_CODE",
            Self::UnknownAsset(_) => "UNKNOWN_ASSET",
            Self::AssetRequired => "ASSET_REQUIRED",
            Self::RailNotOffered(_) => "RAIL_NOT_OFFERED",
            Self::RailNotSelected => "RAIL_NOT_SELECTED",
            Self::CapabilityUnavailable => "CAPABILITY_UNAVAILABLE",
            Self::UserRejected(_) => "USER_REJECTED",
            Self::WalletNotConnected => "WALLET_NOT_CONNECTED",
            Self::ChainRead(_) => "CHAIN_READ_FAILED",
            Self::OnChainFailure(_) => "ON_CHAIN_FAILURE",
            Self::Submission(_) => "SUBMISSION_FAILED",
            Self::AttemptInProgress => "ATTEMPT_IN_PROGRESS",
            Self::NoActiveAttempt => "NO_ACTIVE_ATTEMPT",
            Self::CancelNotAllowed(_) => "CANCEL_NOT_ALLOWED",
            Self::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            Self::NativePayFailed(_) => "NATIVE_PAY_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::StepIncomplete { .. }
            | Self::InvalidHandle(_)
            | Self::InvalidAmount(_)
            | Self::InvalidRequestCode(_)
            | Self::UnknownAsset(_)
            | Self::AssetRequired
            | Self::RailNotOffered(_)
            | Self::RailNotSelected => ErrorKind::Validation,
            Self::CapabilityUnavailable => ErrorKind::CapabilityUnavailable,
            Self::UserRejected(_) => ErrorKind::UserRejection,
            Self::WalletNotConnected => ErrorKind::NotConnected,
            Self::ChainRead(_) | Self::OnChainFailure(_) | Self::Submission(_) => {
                ErrorKind::OnChain
            }
            Self::AttemptInProgress
            | Self::NoActiveAttempt
            | Self::CancelNotAllowed(_)
            | Self::UnexpectedStatus { .. }
            | Self::NativePayFailed(_)
            | Self::Config(_)
            | Self::Unknown(_) => ErrorKind::Internal,
        }
    }

    /// Nothing here is fatal; this only says whether the same attempt can be re-run
    /// as-is once the user reacts.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UserRejected(_)
                | Self::WalletNotConnected
                | Self::ChainRead(_)
                | Self::Submission(_)
                | Self::NativePayFailed(_)
        )
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::UserRejection)
    }

    /// Text shown to the user. Rejections and on-chain failures pass through verbatim.
    pub fn user_message(&self) -> Option<String> {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::CapabilityUnavailable => None,
            _ => Some(self.to_string()),
        }
    }
}
