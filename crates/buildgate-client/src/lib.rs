//! REST client for TeamCity-style build servers.
//!
//! Provides an authenticated [`Gateway`] plus typed services for builds,
//! projects and server-wide queries. A [`Client`] is constructed explicitly
//! from a [`ClientConfig`] and handed to whoever needs it.
//!
//! # Example
//!
//! ```rust,no_run
//! use buildgate_client::{Client, ClientConfig, Credentials};
//! use buildgate_core::ProjectId;
//!
//! async fn list() -> Result<(), buildgate_client::ClientError> {
//!     let config = ClientConfig::new("http://localhost:8111", Credentials::token("secret"));
//!     let client = Client::new(&config)?;
//!
//!     let unity = ProjectId::new("Unity");
//!     let page = client.projects.search_configurations(None, Some(&unity), 1, 20).await?;
//!     for config in &page.items {
//!         println!("{config}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod builds;
pub mod config;
pub mod error;
pub mod http;
pub mod projects;
pub mod query;

pub use auth::Credentials;
pub use builds::{BuildService, BUILD_FIELDS, DEFAULT_PAGE_SIZE};
pub use config::{ClientConfig, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT};
pub use error::ClientError;
pub use http::Gateway;
pub use projects::ProjectService;
pub use query::QueryService;

/// Combined client with access to all services.
#[derive(Clone)]
pub struct Client {
    gateway: Gateway,
    /// Build service.
    pub builds: BuildService,
    /// Project service.
    pub projects: ProjectService,
    /// Server-wide query service.
    pub query: QueryService,
}

impl Client {
    /// Build a client for the configured server. Fails only on unusable
    /// credentials or TLS setup; no request is sent.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::from_gateway(Gateway::new(config)?))
    }

    pub fn from_gateway(gateway: Gateway) -> Self {
        Self {
            builds: BuildService::new(gateway.clone()),
            projects: ProjectService::new(gateway.clone()),
            query: QueryService::new(gateway.clone()),
            gateway,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Check the server health. Never returns an error; failures are logged.
    pub async fn test_connection(&self) -> bool {
        self.gateway.test_connection().await
    }
}
