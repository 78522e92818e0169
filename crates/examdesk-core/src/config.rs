//! Workspace configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::statistics::{parse_utc_offset, Calendar};

/// Environment variable that overrides `utc_offset`.
pub const UTC_OFFSET_ENV: &str = "EXAMDESK_UTC_OFFSET";

/// Top-level examdesk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamdeskConfig {
    /// Reference timezone for day and week boundaries, e.g. `+07:00`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    /// Where grading reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Fixture used when a command is given none.
    #[serde(default)]
    pub default_fixture: Option<PathBuf>,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examdesk-reports")
}

impl Default for ExamdeskConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            output_dir: default_output_dir(),
            default_fixture: None,
        }
    }
}

impl ExamdeskConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
            .with_context(|| format!("invalid utc_offset: {:?}", self.utc_offset))
    }

    /// Calendar in the configured reference timezone.
    pub fn calendar(&self) -> Result<Calendar> {
        Ok(Calendar::with_offset(self.offset()?))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string. Substituted values are not
/// scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(p: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&p.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examdesk.toml` in the current directory
/// 2. `~/.config/examdesk/config.toml`
///
/// `EXAMDESK_UTC_OFFSET` overrides the configured offset.
pub fn load_config() -> Result<ExamdeskConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamdeskConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examdesk.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ExamdeskConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamdeskConfig::default(),
    };

    if let Ok(offset) = std::env::var(UTC_OFFSET_ENV) {
        config.utc_offset = offset;
    }

    config.utc_offset = resolve_env_vars(&config.utc_offset);
    config.output_dir = resolve_path(&config.output_dir);
    config.default_fixture = config.default_fixture.as_deref().map(resolve_path);

    // Fail at load time rather than on first use.
    config.offset()?;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examdesk"))
}
