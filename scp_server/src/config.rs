use std::env;

use log::*;
use scp_common::{helpers::parse_boolean_flag, Money};
use scp_engine::{hub::DEFAULT_QUEUE_SIZE, order_objects::PricingPolicy};

const DEFAULT_SCP_HOST: &str = "127.0.0.1";
const DEFAULT_SCP_PORT: u16 = 8330;
const DEFAULT_TAX_PERCENT: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Flat tax applied to every order subtotal, as a percentage.
    pub tax_percent: f64,
    /// Capacity of each live connection's outbound queue. A client that falls this far behind is disconnected.
    pub ws_queue_size: usize,
    /// When true (the default), pending schema migrations run at startup.
    pub auto_migrate: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SCP_HOST.to_string(),
            port: DEFAULT_SCP_PORT,
            database_url: String::default(),
            tax_percent: DEFAULT_TAX_PERCENT,
            ws_queue_size: DEFAULT_QUEUE_SIZE,
            auto_migrate: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SCP_HOST").ok().unwrap_or_else(|| DEFAULT_SCP_HOST.into());
        let port = env::var("SCP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SCP_PORT. {e} Using the default, {DEFAULT_SCP_PORT}, instead."
                    );
                    DEFAULT_SCP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SCP_PORT);
        let database_url = env::var("SCP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ SCP_DATABASE_URL is not set. Please set it to the URL for the platform database.");
            String::default()
        });
        let tax_percent = env::var("SCP_TAX_PERCENT")
            .ok()
            .and_then(|s| {
                s.parse::<f64>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for SCP_TAX_PERCENT. {e} Using the default instead.");
                        e
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_TAX_PERCENT);
        let ws_queue_size = env::var("SCP_WS_QUEUE_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid value for SCP_WS_QUEUE_SIZE. {e} Using the default instead.");
                        e
                    })
                    .ok()
            })
            .unwrap_or(DEFAULT_QUEUE_SIZE);
        let auto_migrate = parse_boolean_flag(env::var("SCP_AUTO_MIGRATE").ok(), true);
        Self { host, port, database_url, tax_percent, ws_queue_size, auto_migrate }
    }

    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy { tax_percent: self.tax_percent, shipping_fee: Money::default() }
    }
}
