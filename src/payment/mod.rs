//! Payment module - attempt FSM, rail adapters, and the two confirmation flows
//!
//! Control flows one way: the wizard hands a `PaymentOrder` to the dispatcher, which
//! runs exactly one attempt through either the native sheet or the wallet.

pub mod adapters;
pub mod attempt;
pub mod dispatcher;
pub mod native;
pub mod state;
pub mod wallet;

// Re-export commonly used types
pub use attempt::{PaymentAttempt, WalletPhase};
pub use dispatcher::{DispatchOutcome, DispatchSettings, PaymentDispatcher};
pub use state::{AttemptEvent, AttemptStatus};
