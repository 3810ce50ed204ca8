//! Adapters module - the two external rails behind traits

pub mod calls;
pub mod mock;
pub mod rpc;
pub mod traits;

pub use calls::{ContractCall, ContractFunction};
pub use mock::{MockNativePay, MockWallet, SheetOutcome};
pub use rpc::RpcWallet;
pub use traits::{
    CompletionOutcome, InclusionReceipt, NativePayCapability, NativePaymentRequest, NativePaymentResponse,
    WalletChain,
};
