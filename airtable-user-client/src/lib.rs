//! Airtable User Info - Client
//!
//! The [`RecordStore`] seam, the reqwest-backed [`AirtableStore`], the
//! fail-soft [`UserFieldResolver`] and the [`ShortcodeHandler`] that ties
//! identity and configuration to a lookup.

pub mod airtable;
pub mod handler;
pub mod resolver;
pub mod store;

pub use airtable::{
    build_query_url, decode_first_record, filter_formula, AirtableStore, ClientConfig,
    DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use handler::ShortcodeHandler;
pub use resolver::UserFieldResolver;
pub use store::RecordStore;
