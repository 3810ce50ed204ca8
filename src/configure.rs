use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::models::assets::{parse_address, CLIENT_CONTRACT, PAYMENT_GATEWAY};
use crate::models::errors::PaymentError;
use crate::payment::dispatcher::DispatchSettings;
use crate::payment::native::MerchantProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
    pub merchant_name: String,
    pub merchant_identifier: String,
    pub currency_code: String,
    pub country_code: String,
    pub settlement_delay_ms: u64,
    pub client_contract: String,
    pub payee_address: String,
    /// When set, the wallet rail talks to this node instead of the simulated wallet
    pub rpc_url: Option<String>,
    pub wallet_account: Option<String>,
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let s = Config::builder()
        // Set defaults
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/pylink.log")?
        .set_default("merchant_name", "PyLink")?
        .set_default("merchant_identifier", "merchant.com.paypayer")?
        .set_default("currency_code", "USD")?
        .set_default("country_code", "US")?
        .set_default("settlement_delay_ms", 1000_i64)?
        .set_default("client_contract", CLIENT_CONTRACT)?
        .set_default("payee_address", PAYMENT_GATEWAY)?
        // Add configuration from a file
        .add_source(File::with_name("config/config").required(false))
        // Add configuration from environment variables
        .add_source(config::Environment::with_prefix("PYLINK"))
        .build()?;

    s.try_deserialize()
}

impl AppConfig {
    pub fn merchant(&self) -> MerchantProfile {
        MerchantProfile {
            name: self.merchant_name.clone(),
            identifier: self.merchant_identifier.clone(),
            currency_code: self.currency_code.clone(),
            country_code: self.country_code.clone(),
        }
    }

    pub fn dispatch_settings(&self) -> Result<DispatchSettings, PaymentError> {
        Ok(DispatchSettings {
            merchant: self.merchant(),
            settlement_delay: Duration::from_millis(self.settlement_delay_ms),
            client_contract: parse_address(&self.client_contract)?,
            default_payee: parse_address(&self.payee_address)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_file() {
        let config = load_config().unwrap();
        assert_eq!(config.currency_code, "USD");
        assert_eq!(config.settlement_delay_ms, 1000);

        let settings = config.dispatch_settings().unwrap();
        assert_eq!(settings.settlement_delay, Duration::from_secs(1));
        assert_eq!(settings.client_contract, parse_address(CLIENT_CONTRACT).unwrap());
    }

    #[test]
    fn test_bad_payee_is_config_error() {
        let mut config = load_config().unwrap();
        config.payee_address = "not-an-address".to_string();
        assert_eq!(config.dispatch_settings().unwrap_err().error_code(), "CONFIG_ERROR");
    }
}
