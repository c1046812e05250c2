// Translator configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::dialect::{DialectProfile, FileVersion};
use crate::error::{Error, Result};
use crate::materialize::MaterializeOptions;

/// How `contains` / `starts_with` / `ends_with` filters compare text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainsMatching {
    /// Plain `LIKE`; case handling is whatever the driver does.
    #[default]
    DriverDefault,
    /// Both sides folded to upper case before `LIKE`.
    CaseInsensitive,
    /// Binary comparison via `INSTR`.
    CaseSensitive,
}

impl FromStr for ContainsMatching {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driver_default" | "default" => Ok(ContainsMatching::DriverDefault),
            "case_insensitive" => Ok(ContainsMatching::CaseInsensitive),
            "case_sensitive" => Ok(ContainsMatching::CaseSensitive),
            other => Err(Error::Configuration(format!(
                "unknown contains matching '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Overrides the version detected from the workbook extension.
    pub file_version: Option<FileVersion>,
    pub contains_matching: ContainsMatching,
    pub trim_text: bool,
}

impl TranslatorConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Load configuration from string
    pub fn from_str(content: &str) -> Result<Self> {
        // Try JSON first
        if let Ok(config) = serde_json::from_str::<TranslatorConfig>(content) {
            return Ok(config);
        }

        toml::from_str::<TranslatorConfig>(content)
            .map_err(|e| Error::Configuration(format!("parse error: {}", e)))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(version) = std::env::var("SHEETQL_FILE_VERSION") {
            config.file_version = Some(version.parse()?);
        }

        if let Ok(matching) = std::env::var("SHEETQL_CONTAINS_MATCHING") {
            config.contains_matching = matching.parse()?;
        }

        if let Ok(trim) = std::env::var("SHEETQL_TRIM_TEXT") {
            config.trim_text = matches!(trim.trim(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Dialect for a workbook of `detected` version, honouring the override.
    pub fn dialect_for(&self, detected: FileVersion) -> DialectProfile {
        DialectProfile::for_version(self.file_version.unwrap_or(detected))
    }

    /// Validate configuration against the dialect it will be used with
    pub fn validate(&self, dialect: &DialectProfile) -> Result<()> {
        if self.contains_matching == ContainsMatching::CaseSensitive && !dialect.supports_instr {
            return Err(Error::Configuration(format!(
                "case-sensitive matching is not available for the '{}' dialect",
                dialect.name
            )));
        }
        Ok(())
    }

    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            trim_text: self.trim_text,
        }
    }
}
