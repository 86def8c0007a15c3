//! Crate-level error types.

use thiserror::Error;

use crate::loader::FileFormat;

/// Errors produced by the molimport crate.
///
/// Only [`ImportError::Load`] and errors raised by the host scene are fatal
/// to an import. [`ImportError::MissingChainMapping`] and
/// [`ImportError::UnsupportedAssemblyMetadata`] describe routine absence of
/// optional enrichment data and are degraded by the pipeline.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The structure source could not be parsed at all.
    #[error("structure load error: {0}")]
    Load(String),
    /// An atom references a chain that no entity lists.
    #[error("chain `{chain_id}` is not claimed by any entity")]
    MissingChainMapping {
        /// The unmapped chain identifier.
        chain_id: String,
    },
    /// The source format carries no biological assembly section.
    #[error("{format} files carry no biological assembly metadata")]
    UnsupportedAssemblyMetadata {
        /// Format of the offending source.
        format: FileFormat,
    },
    /// A biological assembly id that the descriptor does not define.
    #[error("unknown biological assembly `{0}`")]
    UnknownAssembly(String),
    /// Entity, chain or assembly metadata is present but malformed.
    #[error("invalid structure metadata: {0}")]
    InvalidMetadata(String),
    /// Atom annotation columns disagree with each other.
    #[error("inconsistent atom array: {0}")]
    InvalidStructure(String),
    /// The host scene refused to create or modify an object.
    #[error("host scene error: {0}")]
    Scene(String),
    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML options parsing/serialization failure.
    #[error("options parse error: {0}")]
    OptionsParse(String),
}

impl ImportError {
    /// Whether this error only signals that optional enrichment data is
    /// absent, as opposed to a malformed or unreadable structure.
    #[must_use]
    pub fn is_routine_absence(&self) -> bool {
        matches!(
            self,
            Self::MissingChainMapping { .. }
                | Self::UnsupportedAssemblyMetadata { .. }
        )
    }
}
