//! Boundary traits for the identity and configuration collaborators.

use crate::{ConfigError, ResolverConfig};

/// Environment variable read by [`EnvIdentity`].
pub const IDENTITY_EMAIL_ENV: &str = "AIRTABLE_USER_INFO_EMAIL";

/// Supplies the current user's email address.
///
/// An unauthenticated context yields an empty string. Callers pass it through
/// to the lookup, where it matches no record.
pub trait IdentityProvider: Send + Sync {
    fn current_email(&self) -> String;
}

/// Read-only source of [`ResolverConfig`], consulted once per invocation.
pub trait ConfigProvider: Send + Sync {
    fn resolver_config(&self) -> Result<ResolverConfig, ConfigError>;
}

/// Identity fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    email: Option<String>,
}

impl StaticIdentity {
    pub fn new(email: Option<String>) -> Self {
        Self { email }
    }

    pub fn authenticated(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { email: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_email(&self) -> String {
        self.email.clone().unwrap_or_default()
    }
}

/// Identity taken from `AIRTABLE_USER_INFO_EMAIL` at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvIdentity;

impl IdentityProvider for EnvIdentity {
    fn current_email(&self) -> String {
        std::env::var(IDENTITY_EMAIL_ENV).unwrap_or_default()
    }
}

/// Configuration held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    config: ResolverConfig,
}

impl StaticConfig {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfig {
    fn resolver_config(&self) -> Result<ResolverConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    fn current_email(&self) -> String {
        (**self).current_email()
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProvider for std::sync::Arc<T> {
    fn resolver_config(&self) -> Result<ResolverConfig, ConfigError> {
        (**self).resolver_config()
    }
}
