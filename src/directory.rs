use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ClientRef;

#[derive(Debug, Error, PartialEq)]
pub enum DirectoryError {
    #[error("unknown client")]
    UnknownClient,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientProfile {
    pub display_name: String,
    pub phone: Option<String>,
}

/// Resolves registered and walk-in clients to display data. Used only for
/// human-readable notification text, never for authorization decisions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn resolve_client(&self, client: ClientRef) -> Result<ClientProfile, DirectoryError>;
}
