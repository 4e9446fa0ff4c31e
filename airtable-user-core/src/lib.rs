//! Airtable User Info - Core
//!
//! Data model, error taxonomy and boundary traits for looking up a field of
//! the Airtable record that belongs to the current user. This crate performs
//! no I/O; the HTTP store and resolver live in `airtable-user-client`.

pub mod error;
pub mod provider;
pub mod shortcode;
pub mod types;

pub use error::{ConfigError, LookupError, LookupResult};
pub use provider::{
    ConfigProvider, EnvIdentity, IdentityProvider, StaticConfig, StaticIdentity,
    IDENTITY_EMAIL_ENV,
};
pub use shortcode::{
    parse_template, Segment, ShortcodeAttrs, ATTR_DEFAULT_VALUE, ATTR_FIELD_ID, SHORTCODE_TAG,
};
pub use types::{
    render_value, FallbackReason, LookupRequest, RemoteRecord, Resolution, ResolverConfig,
};
