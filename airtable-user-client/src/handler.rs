//! Shortcode entry point: identity + configuration + resolver.

use crate::resolver::UserFieldResolver;
use crate::store::RecordStore;
use airtable_user_core::{
    parse_template, ConfigProvider, FallbackReason, IdentityProvider, LookupRequest, Resolution,
    Segment, ShortcodeAttrs,
};

/// Resolves `[airtable_user_info]` shortcodes for the current user.
///
/// Configuration is read from the provider on every invocation.
pub struct ShortcodeHandler<S, C, I> {
    resolver: UserFieldResolver<S>,
    config: C,
    identity: I,
}

impl<S, C, I> ShortcodeHandler<S, C, I>
where
    S: RecordStore,
    C: ConfigProvider,
    I: IdentityProvider,
{
    pub fn new(store: S, config: C, identity: I) -> Self {
        Self {
            resolver: UserFieldResolver::new(store),
            config,
            identity,
        }
    }

    pub fn resolver(&self) -> &UserFieldResolver<S> {
        &self.resolver
    }

    /// Run one lookup for the current identity.
    pub async fn invoke(&self, request: &LookupRequest) -> Resolution {
        let config = match self.config.resolver_config() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "Configuration unavailable, using default value");
                return Resolution::fallback(
                    request.default_value.clone(),
                    FallbackReason::ConfigUnavailable,
                );
            }
        };

        let email = self.identity.current_email();
        self.resolver.resolve(&email, request, &config).await
    }

    /// Shortcode callable: attributes in, display text out.
    pub async fn handle(&self, attrs: &ShortcodeAttrs) -> String {
        self.invoke(&attrs.to_request()).await.render()
    }

    /// Expand every live shortcode in `text`, one lookup per tag.
    pub async fn render_template(&self, text: &str) -> String {
        let mut output = String::with_capacity(text.len());
        for segment in parse_template(text) {
            match segment {
                Segment::Text(literal) => output.push_str(literal),
                Segment::Shortcode {
                    attrs,
                    prefix,
                    suffix,
                } => {
                    output.push_str(prefix);
                    output.push_str(&self.handle(&attrs).await);
                    output.push_str(suffix);
                }
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airtable_user_core::{
        ConfigError, LookupResult, RemoteRecord, ResolverConfig, StaticConfig, StaticIdentity,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Returns the fields only for `a@b.com`, recording every email seen.
    #[derive(Default)]
    struct EmailStore {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RecordStore for EmailStore {
        async fn find_by_email(
            &self,
            _config: &ResolverConfig,
            email: &str,
        ) -> LookupResult<Option<RemoteRecord>> {
            self.seen.lock().unwrap().push(email.to_string());
            if email == "a@b.com" {
                Ok(Some(
                    serde_json::from_value(json!({
                        "fields": {"fldTier": "Gold", "fldPoints": 42}
                    }))
                    .unwrap(),
                ))
            } else {
                Ok(None)
            }
        }
    }

    struct BrokenConfig;

    impl ConfigProvider for BrokenConfig {
        fn resolver_config(&self) -> Result<ResolverConfig, ConfigError> {
            Err(ConfigError::Unavailable {
                reason: "settings file unreadable".to_string(),
            })
        }
    }

    fn handler(
        identity: StaticIdentity,
    ) -> ShortcodeHandler<EmailStore, StaticConfig, StaticIdentity> {
        ShortcodeHandler::new(EmailStore::default(), StaticConfig::default(), identity)
    }

    #[tokio::test]
    async fn test_handle_found() {
        let handler = handler(StaticIdentity::authenticated("a@b.com"));
        let attrs = ShortcodeAttrs::parse("field_id='fldTier'");
        assert_eq!(handler.handle(&attrs).await, "Gold");
    }

    #[tokio::test]
    async fn test_anonymous_identity_passes_empty_email() {
        let handler = handler(StaticIdentity::anonymous());
        let resolution = handler
            .invoke(&LookupRequest::new("fldTier", "Guest"))
            .await;
        assert_eq!(resolution.render(), "Guest");
        let seen = handler.resolver().store().seen.lock().unwrap().clone();
        assert_eq!(seen, vec![String::new()]);
    }

    #[tokio::test]
    async fn test_config_failure_falls_back() {
        let handler = ShortcodeHandler::new(
            EmailStore::default(),
            BrokenConfig,
            StaticIdentity::authenticated("a@b.com"),
        );
        let resolution = handler
            .invoke(&LookupRequest::new("fldTier", "Standard"))
            .await;
        assert_eq!(
            resolution,
            Resolution::fallback("Standard", FallbackReason::ConfigUnavailable)
        );
        assert!(handler.resolver().store().seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_render_template_mixes_text_and_values() {
        let handler = handler(StaticIdentity::authenticated("a@b.com"));
        let text = "Tier [airtable_user_info field_id='fldTier'], points \
                    [airtable_user_info field_id=\"fldPoints\"], \
                    badge [airtable_user_info field_id='fldBadge' default_value='none'].";
        assert_eq!(
            handler.render_template(text).await,
            "Tier Gold, points 42, badge none."
        );
    }

    #[tokio::test]
    async fn test_render_template_skips_escaped_tags() {
        let handler = handler(StaticIdentity::authenticated("a@b.com"));
        let rendered = handler
            .render_template("Use [[airtable_user_info field_id='fldTier']] to show [airtable_user_info field_id='fldTier']")
            .await;
        assert_eq!(
            rendered,
            "Use [airtable_user_info field_id='fldTier'] to show Gold"
        );
        assert_eq!(handler.resolver().store().seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_render_template_without_tags_makes_no_calls() {
        let handler = handler(StaticIdentity::authenticated("a@b.com"));
        assert_eq!(handler.render_template("plain text").await, "plain text");
        assert!(handler.resolver().store().seen.lock().unwrap().is_empty());
    }
}
