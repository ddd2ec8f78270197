pub mod cli;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod http;
pub mod logger;
pub mod query;
pub mod utils;

mod test_support;

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::decoder::{Decoder, RecordDecoder};
use crate::http::{AuthOptions, HttpGateway, HttpRequest, RequestGateway};
use crate::query::Query;

pub use crate::errors::{QueryError, TransportError};

/// Application context shared by every query: configuration plus the gateway.
///
/// Cloning is cheap; clones share the same gateway.
#[derive(Clone)]
pub struct App {
    config: Arc<ClientConfig>,
    gateway: Arc<dyn RequestGateway>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").field("config", &self.config).finish_non_exhaustive()
    }
}

impl App {
    /// Builds an [`HttpGateway`] for `config`.
    ///
    /// # Errors
    /// Returns `Config` if the configuration is invalid.
    pub fn new(config: ClientConfig) -> Result<Self, QueryError> {
        config.validate()?;
        let config = Arc::new(config);
        let gateway = HttpGateway::new(config.clone())?;
        log::info!("objquery app {} -> {}", config.app_id, config.server_url);
        Ok(Self { config, gateway: Arc::new(gateway) })
    }

    pub fn with_gateway(config: ClientConfig, gateway: Arc<dyn RequestGateway>) -> Self {
        Self { config: Arc::new(config), gateway }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Query returning generic [`Record`](crate::decoder::Record)s.
    pub fn query(&self, class_name: impl Into<String>) -> Query<RecordDecoder> {
        Query::new(self.clone(), class_name, RecordDecoder)
    }

    pub fn query_with<D: Decoder>(&self, class_name: impl Into<String>, decoder: D) -> Query<D> {
        Query::new(self.clone(), class_name, decoder)
    }

    /// # Errors
    /// Whatever the gateway reports, unchanged.
    pub async fn request(&self, req: HttpRequest, options: &AuthOptions) -> Result<Value, QueryError> {
        Ok(self.gateway.request(req, options).await?)
    }
}

/// Initializes logging from `log4rs.yaml` in the working directory.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::init()?;
    Ok(())
}
