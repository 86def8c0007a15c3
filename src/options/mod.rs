//! Import options with TOML preset support.
//!
//! Everything the import pipeline can be told (visual style, solvent and
//! centring treatment, assembly instancing, destination collection) lives in
//! [`ImportOptions`]. Options are passed explicitly into every call; presets
//! serialize to/from TOML so a directory of `*.toml` files can offer named
//! import profiles.

mod style;

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use style::Style;

use crate::error::ImportError;

/// Options of one import. Uses `#[serde(default)]` so partial TOML files
/// (e.g. only `build_assembly = true`) work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ImportOptions {
    /// Visual preset for the style graph.
    pub style: Style,
    /// Whether to build a style graph at all.
    pub setup_nodes: bool,
    /// Move the structure so its centroid sits at the origin.
    pub centre: bool,
    /// Remove water and other solvent residues.
    pub del_solvent: bool,
    /// Instance the biological assembly.
    pub build_assembly: bool,
    /// Assembly to instance; the first one when unset.
    pub assembly_id: Option<String>,
    /// Destination collection for the created objects.
    pub collection: Option<String>,
    /// Log pipeline steps at `info` instead of `debug`.
    pub verbose: bool,
    /// Cache directory, handed to the structure loader untouched.
    #[schemars(skip)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            style: Style::default(),
            setup_nodes: true,
            centre: false,
            del_solvent: true,
            build_assembly: false,
            assembly_id: None,
            collection: None,
            verbose: false,
            cache_dir: None,
        }
    }
}

impl ImportOptions {
    /// Generate JSON Schema describing the user-facing options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(ImportOptions)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path).map_err(ImportError::Io)?;
        toml::from_str(&content)
            .map_err(|e| ImportError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), ImportError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ImportError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ImportError::Io)?;
        }
        std::fs::write(path, content).map_err(ImportError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }

    /// Log level for pipeline progress lines.
    #[must_use]
    pub fn progress_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}
