//! Parser configuration
//!
//! A [`ParserConfig`] is usually read from a JSON file:
//!
//! ```json
//! {
//!   "version": "2.1",
//!   "allow_any_udf": false,
//!   "unsupported": ["ILIKE", "WITH"],
//!   "udfs": ["gavo_match(pattern VARCHAR, string VARCHAR) -> INTEGER"],
//!   "tables": [
//!     { "schema": "ivoa", "name": "obscore",
//!       "columns": [{ "adql_name": "obs_id", "datatype": { "kind": "VARCHAR" } }] }
//!   ]
//! }
//! ```
//!
//! Every field is optional. Without `tables` no schema checking happens.

use adql_ast::{AdqlVersion, DbTable, FeatureSet, FunctionDef, LanguageFeature, SignatureError, UnknownVersion};
use adql_checker::DbChecker;
use adql_diagnostics::{ADQL0300, ADQL0301, ADQL0302, ADQL0303, Diagnostic, ErrorCode};
use adql_parser::AdqlParser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("unknown optional language feature \"{0}\"")]
    UnknownFeature(String),

    #[error(transparent)]
    Version(#[from] UnknownVersion),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Io { .. } | ConfigError::Json(_) => ADQL0300,
            ConfigError::Signature(_) => ADQL0301,
            ConfigError::UnknownFeature(_) => ADQL0302,
            ConfigError::Version(_) => ADQL0303,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), self.to_string())
    }
}

/// Grammar version, optional features and schema to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub version: AdqlVersion,
    /// Accept calls to functions that were not declared
    pub allow_any_udf: bool,
    /// Forms of optional features to disable, e.g. `LOWER`
    pub unsupported: Vec<String>,
    /// Declared function signatures
    pub udfs: Vec<String>,
    /// Published tables for schema checking
    pub tables: Vec<DbTable>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            version: AdqlVersion::default(),
            allow_any_udf: true,
            unsupported: Vec::new(),
            udfs: Vec::new(),
            tables: Vec::new(),
        }
    }
}

impl ParserConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loading parser configuration from {}", path.display());
        Self::from_json(&text)
    }

    /// Set the version from its textual form (`2.0`, `2.1`)
    pub fn set_version(&mut self, version: &str) -> Result<(), ConfigError> {
        self.version = version.parse()?;
        Ok(())
    }

    /// Feature set described by this configuration
    pub fn features(&self) -> Result<FeatureSet, ConfigError> {
        let mut features = FeatureSet::for_version(self.version);
        features.allow_any_udf(self.allow_any_udf);
        for form in &self.unsupported {
            let feature = LanguageFeature::find_form(form)
                .filter(|feature| feature.since <= self.version)
                .ok_or_else(|| ConfigError::UnknownFeature(form.clone()))?;
            features.unsupport(feature);
        }
        for signature in &self.udfs {
            features.support_udf(FunctionDef::parse(signature)?);
        }
        Ok(features)
    }

    pub fn build(&self) -> Result<AdqlParser, ConfigError> {
        Ok(AdqlParser::with_features(self.version, self.features()?))
    }

    /// Schema checker, when tables are configured
    pub fn checker(&self) -> Option<DbChecker> {
        (!self.tables.is_empty()).then(|| DbChecker::new(self.tables.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adql_ast::{ILIKE, LOWER};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::from_json("{}").unwrap();
        assert_eq!(config, ParserConfig::default());
        let parser = config.build().unwrap();
        assert_eq!(parser.version(), AdqlVersion::V2_1);
        assert!(parser.features().allows_any_udf());
    }

    #[test]
    fn test_unsupported_forms() {
        let config = ParserConfig {
            unsupported: vec!["lower".to_string(), "ILIKE".to_string()],
            ..ParserConfig::default()
        };
        let features = config.features().unwrap();
        assert!(!features.is_supporting(&LOWER));
        assert!(!features.is_supporting(&ILIKE));
    }

    #[test]
    fn test_error_codes() {
        let unknown = ParserConfig {
            unsupported: vec!["TELEPORT".to_string()],
            ..ParserConfig::default()
        };
        assert_eq!(unknown.build().unwrap_err().code(), ADQL0302);

        // LOWER does not exist in 2.0
        let too_new = ParserConfig {
            version: AdqlVersion::V2_0,
            unsupported: vec!["LOWER".to_string()],
            ..ParserConfig::default()
        };
        assert_eq!(too_new.build().unwrap_err().code(), ADQL0302);

        let bad_udf = ParserConfig {
            udfs: vec!["broken(".to_string()],
            ..ParserConfig::default()
        };
        assert_eq!(bad_udf.build().unwrap_err().code(), ADQL0301);

        let mut config = ParserConfig::default();
        assert_eq!(config.set_version("3.0").unwrap_err().code(), ADQL0303);
        assert_eq!(ParserConfig::from_json("[]").unwrap_err().code(), ADQL0300);
    }
}
