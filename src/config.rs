//! Pipeline configuration: an optional YAML file overlaid by CLI flags.
//!
//! ```yaml
//! input: data/dirty_cafe_sales.csv
//! database:
//!   path: cafe_sales.db
//! table: sales_data
//! mode: replace
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    database::DatabaseConfig,
    error::{EtlError, Result},
    load::{DEFAULT_TABLE, LoadMode},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub database: DatabaseConfig,
    pub table: String,
    pub mode: LoadMode,
    pub delimiter: Option<char>,
    pub sql_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/dirty_cafe_sales.csv"),
            database: DatabaseConfig::default(),
            table: DEFAULT_TABLE.to_string(),
            mode: LoadMode::default(),
            delimiter: None,
            sql_dir: PathBuf::from("sql_queries"),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| config_error(path, err))?;
        Self::from_yaml_str(&raw).map_err(|err| match err {
            EtlError::Config { message, .. } => EtlError::Config {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|err| config_error(Path::new("<inline>"), err))
    }

    /// Loads `path` when given, otherwise starts from defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        match self.delimiter {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => Err(EtlError::Config {
                path: PathBuf::new(),
                message: format!("delimiter '{c}' must be ASCII"),
            }),
        }
    }
}

fn config_error(path: &Path, err: impl std::fmt::Display) -> EtlError {
    EtlError::Config {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml_str("table: nightly_sales\nmode: append\n").unwrap();
        assert_eq!(config.table, "nightly_sales");
        assert_eq!(config.mode, LoadMode::Append);
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.sql_dir, PathBuf::from("sql_queries"));
    }

    #[test]
    fn nested_database_path_is_read() {
        let config =
            PipelineConfig::from_yaml_str("database:\n  path: /tmp/cafe.db\ndelimiter: ';'\n")
                .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/cafe.db"));
        assert_eq!(config.delimiter_byte().unwrap(), Some(b';'));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineConfig::from_yaml_str("tabel: typo\n").unwrap_err();
        assert!(matches!(err, EtlError::Config { .. }));
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            PipelineConfig::from_yaml_str("").unwrap(),
            PipelineConfig::default()
        );
    }
}
