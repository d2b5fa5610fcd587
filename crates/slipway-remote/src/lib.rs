//! Remote event-source mapping API for Slipway.
//!
//! This crate provides the `LambdaApi` trait (create, list, update of event-source
//! mappings), the request and response types exchanged with it, a SigV4-signed HTTP
//! backend built on `ureq`, the `ClientFactory` that turns a composed configuration
//! into an authenticated client, and a recording in-memory mock.

pub mod config;
pub mod factory;
pub mod http;
pub mod mock;
pub mod sigv4;
pub mod types;

pub use config::{load_profile, AwsCredentials, ClientSettings, CredentialSource};
pub use factory::{ClientFactory, HttpClientFactory};
pub use types::{
    CreateMappingRequest, CreateOutcome, EventSourceMapping, ListMappingsFilter,
    UpdateMappingRequest,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("{operation} failed with HTTP {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("remote config error: {0}")]
    Config(String),
    #[error("credentials unavailable: {0}")]
    Credentials(String),
    #[error("no event source mapping found for {event_source_arn} -> {function_name}")]
    MappingNotFound {
        event_source_arn: String,
        function_name: String,
    },
}

/// Event-source mapping operations of the remote compute platform.
///
/// A create that collides with an existing association is not an error: it
/// returns `CreateOutcome::AlreadyExists` so the caller can switch to an update.
pub trait LambdaApi: Send + Sync {
    fn create_event_source_mapping(
        &self,
        request: &CreateMappingRequest,
    ) -> Result<CreateOutcome, RemoteError>;

    fn list_event_source_mappings(
        &self,
        filter: &ListMappingsFilter,
    ) -> Result<Vec<EventSourceMapping>, RemoteError>;

    fn update_event_source_mapping(
        &self,
        request: &UpdateMappingRequest,
    ) -> Result<EventSourceMapping, RemoteError>;
}
