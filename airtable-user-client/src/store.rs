//! Record store abstraction.

use airtable_user_core::{LookupResult, RemoteRecord, ResolverConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only access to the remote table that holds one record per user.
///
/// Implementations return `Ok(None)` when no record matches and never
/// write to the remote side.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the first record whose configured email field equals `email`.
    async fn find_by_email(
        &self,
        config: &ResolverConfig,
        email: &str,
    ) -> LookupResult<Option<RemoteRecord>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn find_by_email(
        &self,
        config: &ResolverConfig,
        email: &str,
    ) -> LookupResult<Option<RemoteRecord>> {
        (**self).find_by_email(config, email).await
    }
}
