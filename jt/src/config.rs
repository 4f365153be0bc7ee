//! Configuration shared by the submitter tools and the scheduler daemon

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared-memory name of the job table
    #[serde(default = "default_table")]
    pub table: String,

    /// Number of concurrent CPU slots
    #[serde(default = "default_ncpu")]
    pub ncpu: u32,

    /// Scheduling quantum in milliseconds
    #[serde(default = "default_tslice_ms")]
    pub tslice_ms: u32,
}

fn default_table() -> String {
    "/fairsched".to_string()
}

fn default_ncpu() -> u32 {
    2
}

fn default_tslice_ms() -> u32 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table: default_table(),
            ncpu: default_ncpu(),
            tslice_ms: default_tslice_ms(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            return Ok(config);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("fairsched").join("config.yml")),
            Some(PathBuf::from("fairsched.yml")),
        ];

        for candidate in default_paths.into_iter().flatten() {
            if candidate.exists() {
                let content = std::fs::read_to_string(&candidate)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.table, "/fairsched");
        assert_eq!(config.ncpu, 2);
        assert_eq!(config.tslice_ms, 1000);
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "table: /custom\nncpu: 4").unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.table, "/custom");
        assert_eq!(config.ncpu, 4);
        // missing fields fall back to defaults
        assert_eq!(config.tslice_ms, 1000);
    }

    #[test]
    fn test_load_missing_explicit_file_errors() {
        let path = PathBuf::from("/nonexistent/fairsched.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
