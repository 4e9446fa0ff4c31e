//! Persisted settings: the four Airtable options plus HTTP client settings.
//!
//! Airtable options are stored as-is and never validated. Only the client
//! section is checked on load.

use airtable_user_client::ClientConfig;
use airtable_user_core::{ConfigProvider, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "AIRTABLE_USER_INFO_CONFIG";
pub const BASE_ID_ENV: &str = "AIRTABLE_USER_INFO_BASE_ID";
pub const TABLE_ID_ENV: &str = "AIRTABLE_USER_INFO_TABLE_ID";
pub const EMAIL_FIELD_ID_ENV: &str = "AIRTABLE_USER_INFO_EMAIL_FIELD_ID";
pub const BEARER_TOKEN_ENV: &str = "AIRTABLE_USER_INFO_BEARER_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub airtable: ResolverConfig,
    pub client: ClientConfig,
}

/// Partial update of the Airtable options; `None` leaves a value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub base_id: Option<String>,
    pub table_id: Option<String>,
    pub email_field_id: Option<String>,
    pub bearer_token: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.base_id.is_none()
            && self.table_id.is_none()
            && self.email_field_id.is_none()
            && self.bearer_token.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or AIRTABLE_USER_INFO_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read or write settings file: {0}")]
    Io(#[from] std::io::Error),
    /// Position only; the parser's message echoes the source line.
    #[error("Failed to parse settings TOML{}", describe_location(.location))]
    Parse { location: Option<(usize, usize)> },
    #[error("Failed to serialize settings TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Settings {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            location: e.span().and_then(|span| line_column(contents, span.start)),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client.api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.client.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn apply(&mut self, update: &SettingsUpdate) {
        let airtable = &mut self.airtable;
        if let Some(value) = &update.base_id {
            airtable.base_id = value.clone();
        }
        if let Some(value) = &update.table_id {
            airtable.table_id = value.clone();
        }
        if let Some(value) = &update.email_field_id {
            airtable.email_field_id = value.clone();
        }
        if let Some(value) = &update.bearer_token {
            airtable.bearer_token = value.clone();
        }
    }

    /// Replace Airtable options with values found by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let update = SettingsUpdate {
            base_id: lookup(BASE_ID_ENV),
            table_id: lookup(TABLE_ID_ENV),
            email_field_id: lookup(EMAIL_FIELD_ID_ENV),
            bearer_token: lookup(BEARER_TOKEN_ENV),
        };
        self.apply(&update);
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Human-readable listing with the token masked.
    pub fn display_masked(&self) -> String {
        let airtable = &self.airtable;
        let mut out = String::new();
        out.push_str(&format!("base_id:            {}\n", airtable.base_id));
        out.push_str(&format!("table_id:           {}\n", airtable.table_id));
        out.push_str(&format!("email_field_id:     {}\n", airtable.email_field_id));
        out.push_str(&format!("bearer_token:       {}\n", airtable.masked_token()));
        out.push_str(&format!("api_base_url:       {}\n", self.client.api_base_url));
        out.push_str(&format!(
            "request_timeout_ms: {}\n",
            self.client.request_timeout_ms
        ));
        out
    }
}

/// Settings persisted in a TOML file.
///
/// A missing file reads as default settings: every Airtable option unset.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_path_option(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        path.map(Self::new).ok_or(ConfigError::MissingConfigPath)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, without environment overrides.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Settings::from_toml(&contents)
    }

    /// Stored settings with environment overrides applied.
    pub fn load_effective(&self) -> Result<Settings, ConfigError> {
        let mut settings = self.load()?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(settings)?;
        let mut file = open_private(&self.path)?;
        file.write_all(contents.as_bytes())?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    /// Load, apply `update`, save. Returns the saved settings.
    pub fn update(&self, update: &SettingsUpdate) -> Result<Settings, ConfigError> {
        let mut settings = self.load()?;
        settings.apply(update);
        self.save(&settings)?;
        tracing::info!(path = %self.path.display(), "Settings saved");
        Ok(settings)
    }
}

impl ConfigProvider for SettingsStore {
    fn resolver_config(&self) -> Result<ResolverConfig, airtable_user_core::ConfigError> {
        self.load_effective()
            .map(|settings| settings.airtable)
            .map_err(|e| airtable_user_core::ConfigError::Unavailable {
                reason: e.to_string(),
            })
    }
}

/// 1-based line and column of byte `offset` in `contents`.
fn line_column(contents: &str, offset: usize) -> Option<(usize, usize)> {
    let before = contents.get(..offset)?;
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().unwrap_or_default().chars().count() + 1;
    Some((line, column))
}

fn describe_location(location: &Option<(usize, usize)>) -> String {
    match location {
        Some((line, column)) => format!(" at line {}, column {}", line, column),
        None => String::new(),
    }
}

/// Open for writing; a new file is created with mode 0600.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// `mode` only applies on creation; tighten files that already existed.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
