use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{Error, Result};

/// HTTP client bound to a service configuration. All pipeline operations
/// hang off this type; the inner `reqwest::Client` is shared and cheap to
/// clone.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) config: ServiceConfig,
    pub(crate) http: reqwest::Client,
}

impl Client {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("ChromaPipeline/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Init(e.to_string()))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Client::new(ServiceConfig::default()).unwrap();
        assert_eq!(client.config().effect_id, "phototo3d");
    }
}
