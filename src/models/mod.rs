pub mod assets;
pub mod errors;
pub mod rail;

pub use assets::{find_asset, AssetContract, AssetDescriptor, PAYMENT_ASSETS};
pub use errors::{ErrorKind, PaymentError};
pub use rail::{Rail, RecipientKind};
