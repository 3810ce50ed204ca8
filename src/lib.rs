#[macro_use]
pub mod log_macros;
#[macro_use]
pub mod logging;

pub mod configure;
pub mod logger;
pub mod models;
pub mod payment;
pub mod send;
