//! Shortcode attribute parsing and template scanning.
//!
//! Recognises `[airtable_user_info field_id='fld..' default_value='..']` tags
//! inside arbitrary text. A doubled bracket `[[airtable_user_info ...]]`
//! escapes the tag and renders it literally.

use crate::LookupRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Tag name matched in templates.
pub const SHORTCODE_TAG: &str = "airtable_user_info";

pub const ATTR_FIELD_ID: &str = "field_id";
pub const ATTR_DEFAULT_VALUE: &str = "default_value";

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"\[(\[?){}((?:\s[^\]]*?)?)\s*/?\](\]?)",
        regex::escape(SHORTCODE_TAG)
    );
    Regex::new(&pattern).expect("Invalid shortcode tag regex")
});

static ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([\w-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s'"]+))"#)
        .expect("Invalid shortcode attribute regex")
});

/// Attributes of a single shortcode tag, keyed by lowercased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcodeAttrs {
    values: BTreeMap<String, String>,
}

impl ShortcodeAttrs {
    /// Parse the raw attribute text following the tag name.
    ///
    /// Positional values without `=` are dropped.
    pub fn parse(raw: &str) -> Self {
        let mut values = BTreeMap::new();
        for caps in ATTR_PATTERN.captures_iter(raw) {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            values.insert(name, value);
        }
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Typed request with unset attributes defaulted to empty strings.
    pub fn to_request(&self) -> LookupRequest {
        LookupRequest {
            field_id: self.get(ATTR_FIELD_ID).unwrap_or_default().to_string(),
            default_value: self.get(ATTR_DEFAULT_VALUE).unwrap_or_default().to_string(),
        }
    }
}

/// A piece of a scanned template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Copied through unchanged, including escaped tags.
    Text(&'a str),
    /// A live tag. `prefix`/`suffix` hold an unbalanced extra bracket, if any.
    Shortcode {
        attrs: ShortcodeAttrs,
        prefix: &'a str,
        suffix: &'a str,
    },
}

/// Split `text` into literal runs and shortcode tags, in order.
pub fn parse_template(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in TAG_PATTERN.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        if whole.start() > cursor {
            segments.push(Segment::Text(&text[cursor..whole.start()]));
        }

        let open = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let close = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        if open == "[" && close == "]" {
            // [[tag]] renders as [tag]
            segments.push(Segment::Text(&text[whole.start() + 1..whole.end() - 1]));
        } else {
            let raw = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            segments.push(Segment::Shortcode {
                attrs: ShortcodeAttrs::parse(raw),
                prefix: open,
                suffix: close,
            });
        }
        cursor = whole.end();
    }

    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    segments
}
