use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file when no argument is given.
pub const CONFIG_ENV: &str = "RUSTY_ECON_CONFIG";

/// Which presentations are switched on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartToggles {
    pub line: bool,
    pub bar: bool,
    pub pie: bool,
    pub table: bool,
}

impl ChartToggles {
    pub fn any(&self) -> bool {
        self.line || self.bar || self.pie || self.table
    }
}

/// Viewer settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Catalog JSON opened at start-up.
    pub catalog_path: Option<PathBuf>,
    /// Observation file opened at start-up.
    pub observations_path: Option<PathBuf>,
    pub show_warnings: bool,
    pub charts: ChartToggles,
    pub fetch_cache_capacity: usize,
    pub window_size: [f32; 2],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            observations_path: None,
            show_warnings: true,
            charts: ChartToggles::default(),
            fetch_cache_capacity: 8,
            window_size: [1200.0, 800.0],
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).context("parsing config JSON")
    }

    /// Config from the first argument, else `RUSTY_ECON_CONFIG`, else defaults.
    pub fn from_env(arg: Option<String>) -> Result<Self> {
        match arg.or_else(|| std::env::var(CONFIG_ENV).ok()) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}
