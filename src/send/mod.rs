//! Send-money wizard: recipient, amount, payment method, review, result

pub mod fee;
pub mod recipient;
pub mod request;
pub mod result;
pub mod wizard;

pub use fee::{calculate_quote, FeeQuote, FeeSchedule};
pub use recipient::{resolve_candidates, RecipientCandidate};
pub use request::MoneyRequest;
pub use result::{leave_result, ResultAction, TransferSummary};
pub use wizard::{PaymentOrder, Recipient, WizardController, WizardState, WizardStep};
