use crate::http::HttpBackend;
use crate::{ClientSettings, LambdaApi, RemoteError};
use slipway_config::ComposedConfig;
use tracing::debug;

/// Builds an authenticated API client from a composed configuration.
pub trait ClientFactory {
    fn build(&self, config: &ComposedConfig) -> Result<Box<dyn LambdaApi>, RemoteError>;
}

/// Factory producing SigV4-signed HTTP clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn build(&self, config: &ComposedConfig) -> Result<Box<dyn LambdaApi>, RemoteError> {
        let settings = ClientSettings::from_composed(config)?;
        debug!(
            "building Lambda client for {} at {}",
            settings.region, settings.endpoint
        );
        Ok(Box::new(HttpBackend::new(settings)))
    }
}
