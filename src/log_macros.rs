//! Logging macros with fixed short targets
//!
//! Instead of the full module path (e.g. "pylink::payment::dispatcher"), payment lines
//! log under `payment` and wizard lines under `wizard`.

pub const PAYMENT_TARGET: &str = "payment";
pub const WIZARD_TARGET: &str = "wizard";

#[macro_export]
macro_rules! payment_warn {
    ($($arg:tt)*) => {
        log::warn!(target: $crate::log_macros::PAYMENT_TARGET, $($arg)*)
    };
}

#[macro_export]
macro_rules! payment_debug {
    ($($arg:tt)*) => {
        log::debug!(target: $crate::log_macros::PAYMENT_TARGET, $($arg)*)
    };
}

#[macro_export]
macro_rules! wizard_debug {
    ($($arg:tt)*) => {
        log::debug!(target: $crate::log_macros::WIZARD_TARGET, $($arg)*)
    };
}
