//! Structure loading boundary.
//!
//! Decoding PDB, PDBx/mmCIF or MMTF files is the job of an external parsing
//! library. This module only defines what such a library has to deliver:
//! an [`AtomStack`] plus a [`StructureMetadata`] handle answering entity and
//! assembly queries. [`DocumentLoader`] is a bundled implementation reading
//! pre-decoded JSON structure documents.

mod document;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use document::{DocumentLoader, StructureDocument};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::assembly::AssemblyDescriptor;
use crate::error::ImportError;
use crate::structure::entity::EntityChainGroups;
use crate::structure::secondary::SecondaryStructureRange;
use crate::structure::AtomStack;

// ---------------------------------------------------------------------------
// FileFormat
// ---------------------------------------------------------------------------

/// Structure file formats understood by the import pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// Legacy fixed-column PDB.
    Pdb,
    /// PDBx/mmCIF.
    #[default]
    Pdbx,
    /// Macromolecular Transmission Format.
    Mmtf,
}

impl FileFormat {
    /// Guess the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }

    /// Whether files of this format may carry a biological assembly
    /// section. Legacy PDB keeps assemblies in free-text REMARK 350 records
    /// that structured parsers do not expose.
    #[must_use]
    pub fn supports_assemblies(self) -> bool {
        !matches!(self, Self::Pdb)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pdb => "PDB",
            Self::Pdbx => "PDBx/mmCIF",
            Self::Mmtf => "MMTF",
        };
        f.write_str(name)
    }
}

impl FromStr for FileFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdb" | "ent" => Ok(Self::Pdb),
            "pdbx" | "cif" | "mmcif" => Ok(Self::Pdbx),
            "mmtf" => Ok(Self::Mmtf),
            _ => Err(ImportError::OptionsParse(format!(
                "unknown structure format `{s}`"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// StructureSource
// ---------------------------------------------------------------------------

/// Where the structure bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// A local file.
    Path(PathBuf),
    /// Bytes already in memory (e.g. fetched by the caller).
    Bytes(Vec<u8>),
}

/// A structure to load: its format, its bytes and a cache hint for loaders
/// that fetch remote files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSource {
    /// File format.
    pub format: FileFormat,
    /// Byte source.
    pub origin: SourceOrigin,
    /// Directory where fetched files may be cached. Passed through only.
    pub cache_dir: Option<PathBuf>,
}

impl StructureSource {
    /// Source reading a local file; the format is guessed from the
    /// extension, falling back to PDBx.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = FileFormat::from_path(&path).unwrap_or_default();
        Self {
            format,
            origin: SourceOrigin::Path(path),
            cache_dir: None,
        }
    }

    /// Source over in-memory bytes.
    #[must_use]
    pub fn from_bytes(format: FileFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            origin: SourceOrigin::Bytes(bytes),
            cache_dir: None,
        }
    }

    /// Override the format.
    #[must_use]
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the cache directory hint.
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Read the raw bytes. Failures are load errors.
    pub fn read_bytes(&self) -> Result<Vec<u8>, ImportError> {
        match &self.origin {
            SourceOrigin::Bytes(bytes) => Ok(bytes.clone()),
            SourceOrigin::Path(path) => std::fs::read(path).map_err(|e| {
                ImportError::Load(format!("{}: {e}", path.display()))
            }),
        }
    }

    /// Human-readable description for log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.origin {
            SourceOrigin::Path(path) => {
                format!("{} ({})", path.display(), self.format)
            }
            SourceOrigin::Bytes(bytes) => {
                format!("{} in-memory bytes ({})", bytes.len(), self.format)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Raw metadata of a loaded structure.
///
/// All queries distinguish routine absence (`Ok(None)`) from malformed
/// metadata (`Err`). Implementations may also report a format without an
/// assembly section as [`ImportError::UnsupportedAssemblyMetadata`]; the
/// pipeline treats that the same as `Ok(None)`.
pub trait StructureMetadata {
    /// Chains grouped by entity, if the file records entities.
    fn entity_chain_groups(
        &self,
    ) -> Result<Option<EntityChainGroups>, ImportError>;

    /// Biological assemblies, if the file records them.
    fn assemblies(&self) -> Result<Option<AssemblyDescriptor>, ImportError>;

    /// Helix and strand ranges, if the file records them.
    fn secondary_structure(
        &self,
    ) -> Result<Option<Vec<SecondaryStructureRange>>, ImportError> {
        Ok(None)
    }
}

/// Metadata of a file that records neither entities nor assemblies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl StructureMetadata for NoMetadata {
    fn entity_chain_groups(
        &self,
    ) -> Result<Option<EntityChainGroups>, ImportError> {
        Ok(None)
    }

    fn assemblies(&self) -> Result<Option<AssemblyDescriptor>, ImportError> {
        Ok(None)
    }
}

/// Output of a [`StructureLoader`].
pub struct LoadedStructure {
    /// Atoms and per-model coordinates.
    pub stack: AtomStack,
    /// Metadata handle.
    pub metadata: Box<dyn StructureMetadata>,
}

impl fmt::Debug for LoadedStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedStructure")
            .field("atoms", &self.stack.atoms().len())
            .field("models", &self.stack.model_count())
            .finish_non_exhaustive()
    }
}

/// Turns a [`StructureSource`] into atoms and metadata.
pub trait StructureLoader {
    /// Load `source`. Any failure to parse is [`ImportError::Load`].
    fn load(
        &self,
        source: &StructureSource,
    ) -> Result<LoadedStructure, ImportError>;
}
