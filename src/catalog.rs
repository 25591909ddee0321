use async_trait::async_trait;
use thiserror::Error;

use crate::domain::OfferingRef;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("unknown service or promotion")]
    UnknownOffering,
}

/// Read-only view of the salon's service and promotion catalog. The
/// scheduling core only ever reads durations and prices; catalog management
/// belongs to the surrounding application.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn duration_minutes(&self, offering: OfferingRef) -> Result<u32, CatalogError>;

    /// Price in minor currency units, for display only.
    async fn price(&self, offering: OfferingRef) -> Result<i64, CatalogError>;
}
