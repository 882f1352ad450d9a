use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Result, SampleError};
use crate::names::resolve_names_path;
use crate::output::OutputFormat;
use crate::runner::StatScope;

pub const DEFAULT_SERVER: &str = "http://hapi.fhir.org/baseR4";

/// Names shipped with the crate, independent of the working directory.
pub const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub server: String,
    pub data_dir: PathBuf,
    pub names_file: String,
    pub passes: usize,
    pub print_patients: bool,
    pub format: OutputFormat,
    pub stat_scope: StatScope,
    pub log_level: String,
    pub timeout_secs: Option<u64>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            names_file: "last_names.txt".to_string(),
            passes: 3,
            print_patients: false,
            format: OutputFormat::default(),
            stat_scope: StatScope::default(),
            log_level: "info".to_string(),
            timeout_secs: None,
        }
    }
}

impl SampleConfig {
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SampleError::config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| SampleError::config(format!("invalid {}: {e}", path.display())))
    }

    /// Defaults, then the config file if one was given, then CLI flags.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(server) = &cli.server {
            self.server = server.clone();
        }
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(file) = &cli.names_file {
            self.names_file = file.clone();
        }
        if let Some(passes) = cli.passes {
            self.passes = passes;
        }
        if cli.print_patients {
            self.print_patients = true;
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        if let Some(scope) = cli.stat_scope {
            self.stat_scope = scope;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            self.timeout_secs = Some(secs);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(SampleError::config("server must not be empty"));
        }
        if self.passes == 0 {
            return Err(SampleError::config("passes must be at least 1"));
        }
        if self.names_file.is_empty() {
            return Err(SampleError::config("names_file must not be empty"));
        }
        Ok(())
    }

    pub fn names_path(&self) -> PathBuf {
        resolve_names_path(&self.data_dir, &self.names_file)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
