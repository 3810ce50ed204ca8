//! Structured payment event logging
//!
//! Provides helpers for:
//! - Structured JSON log lines for attempt lifecycle events
//! - Trace ids for attempts
use serde_json::{json, Value};

/// Get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Structured log event builder
///
/// Usage:
/// ```
/// use pylink::logging::LogEvent;
///
/// let log_value = LogEvent::new("TX_SUBMITTED")
///     .field("attempt_id", "flow_pay_1_1700000000000")
///     .field("rail", "wallet")
///     .field("tx_hash", "0xabc")
///     .service("pylink")
///     .build();
///
/// log::info!("{}", log_value);
/// ```
pub struct LogEvent {
    fields: serde_json::Map<String, Value>,
}

impl LogEvent {
    /// Create a new log event with the given event name
    pub fn new(event: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("event".to_string(), json!(event));
        fields.insert("timestamp_ms".to_string(), json!(now_ms()));

        Self { fields }
    }

    /// Add a field to the log event
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Add service name
    pub fn service(mut self, service: &str) -> Self {
        self.fields.insert("service".to_string(), json!(service));
        self
    }

    /// Build the final JSON value
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Log one attempt lifecycle event under the `payment` target
#[macro_export]
macro_rules! log_attempt_event {
    ($event:expr, $attempt:expr) => {
        log::info!(
            target: $crate::log_macros::PAYMENT_TARGET,
            "{}",
            $crate::logging::LogEvent::new($event)
                .field("attempt_id", $attempt.id.as_str())
                .field("rail", $attempt.rail.as_str())
                .field("status", $attempt.status.as_str())
                .service("pylink")
                .build()
        );
    };
    ($event:expr, $attempt:expr, $key:expr => $value:expr) => {
        log::info!(
            target: $crate::log_macros::PAYMENT_TARGET,
            "{}",
            $crate::logging::LogEvent::new($event)
                .field("attempt_id", $attempt.id.as_str())
                .field("rail", $attempt.rail.as_str())
                .field("status", $attempt.status.as_str())
                .field($key, $value)
                .service("pylink")
                .build()
        );
    };
}

/// Generate trace_id for workflows
pub fn gen_flow_trace_id(flow_type: &str, unique: &str) -> String {
    format!("flow_{}_{}_{}", flow_type, unique, now_ms())
}
