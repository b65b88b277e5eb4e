//! # Metrics Collection
//!
//! Prometheus counters for authentication outcomes. Recording is a no-op until
//! [`init_metrics`] installs the exporter, so services call the `record_*`
//! helpers unconditionally.

use std::net::SocketAddr;

use ::tracing::{info, warn};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

const AUTHENTICATIONS_TOTAL: &str = "confido_auth_authentications_total";
const TOKENS_ISSUED_TOTAL: &str = "confido_auth_tokens_issued_total";
const PASSWORD_RESETS_TOTAL: &str = "confido_auth_password_resets_total";
const MAIL_DELIVERIES_TOTAL: &str = "confido_auth_mail_deliveries_total";

/// Initialize metrics collection and Prometheus exporter
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config_with_source(
            format!("Invalid metrics bind address '{}'", metrics_addr),
            Box::new(e),
        )
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    describe_counter!(AUTHENTICATIONS_TOTAL, "Login and refresh attempts by outcome");
    describe_counter!(TOKENS_ISSUED_TOTAL, "Signed tokens issued by kind");
    describe_counter!(PASSWORD_RESETS_TOTAL, "Password reset requests and completions by outcome");
    describe_counter!(MAIL_DELIVERIES_TOTAL, "Outbound mail attempts by outcome");

    info!(address = %socket_addr, "Prometheus metrics exporter listening");
    Ok(())
}

/// Record a login or refresh outcome (`success`, `invalid_credentials`, ...)
pub fn record_authentication(outcome: &str) {
    counter!(AUTHENTICATIONS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

pub fn record_token_issued(kind: &str) {
    counter!(TOKENS_ISSUED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub fn record_password_reset(outcome: &str) {
    counter!(PASSWORD_RESETS_TOTAL, "outcome" => outcome.to_string()).increment(1);
}

pub fn record_mail_delivery(outcome: &str) {
    counter!(MAIL_DELIVERIES_TOTAL, "outcome" => outcome.to_string()).increment(1);
}
