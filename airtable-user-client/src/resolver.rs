//! Fail-soft field resolution for the current user.

use crate::store::RecordStore;
use airtable_user_core::{
    FallbackReason, LookupError, LookupRequest, LookupResult, Resolution, ResolverConfig,
};
use serde_json::Value;

/// Looks up one field of the record that belongs to an email address.
#[derive(Debug, Clone)]
pub struct UserFieldResolver<S> {
    store: S,
}

impl<S: RecordStore> UserFieldResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the field, surfacing the cause of any failure.
    ///
    /// A field present with a JSON `null` counts as missing.
    pub async fn try_resolve(
        &self,
        identity_email: &str,
        request: &LookupRequest,
        config: &ResolverConfig,
    ) -> LookupResult<Value> {
        let record = self
            .store
            .find_by_email(config, identity_email)
            .await?
            .ok_or(LookupError::NotFound)?;

        match record.fields.get(&request.field_id) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(LookupError::MissingField {
                field_id: request.field_id.clone(),
            }),
        }
    }

    /// Resolve the field, falling back to `request.default_value` on any
    /// failure. Never errors.
    pub async fn resolve(
        &self,
        identity_email: &str,
        request: &LookupRequest,
        config: &ResolverConfig,
    ) -> Resolution {
        match self.try_resolve(identity_email, request, config).await {
            Ok(value) => Resolution::Found(value),
            Err(err) => {
                let reason = FallbackReason::from(&err);
                if let LookupError::Rejected { status, message } = &err {
                    tracing::warn!(
                        status = *status,
                        error = %message,
                        base_id = %config.base_id,
                        table_id = %config.table_id,
                        "Airtable rejected lookup, using default value"
                    );
                } else {
                    tracing::debug!(
                        field_id = %request.field_id,
                        reason = ?reason,
                        error = %err,
                        "Lookup fell back to default value"
                    );
                }
                Resolution::fallback(request.default_value.clone(), reason)
            }
        }
    }
}
