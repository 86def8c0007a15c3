use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{
    FileFormat, LoadedStructure, StructureLoader, StructureMetadata,
    StructureSource,
};
use crate::assembly::mmtf::{
    assembly_descriptor_from_mmtf, entity_groups_from_mmtf, MmtfBioAssembly,
    MmtfEntity,
};
use crate::assembly::AssemblyDescriptor;
use crate::error::ImportError;
use crate::structure::entity::EntityChainGroups;
use crate::structure::secondary::SecondaryStructureRange;
use crate::structure::{AtomArray, AtomStack};

/// A pre-decoded structure: atom columns plus MMTF-style metadata lists.
///
/// ```json
/// {
///   "atoms": { "positions": [[0, 0, 0]], "elements": ["C"], ... },
///   "models": [],
///   "entityList": [{ "chainIndexList": [0], "type": "polymer" }],
///   "chainNameList": ["A"],
///   "bioAssemblyList": [{ "name": "1", "transformList": [...] }],
///   "secondaryStructure": [
///     { "id": "HELX_P1", "chainId": "A", "startResId": 3, "endResId": 18 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDocument {
    /// Atom columns; positions are those of the first model.
    pub atoms: AtomArray,
    /// Coordinates of every model for multi-model files.
    #[serde(default)]
    pub models: Vec<Vec<Vec3>>,
    /// Entities, when the source format records them.
    #[serde(default)]
    pub entity_list: Option<Vec<MmtfEntity>>,
    /// Chain names referenced by index from the other lists.
    #[serde(default)]
    pub chain_name_list: Vec<String>,
    /// Biological assemblies, when the source format records them.
    #[serde(default)]
    pub bio_assembly_list: Option<Vec<MmtfBioAssembly>>,
    /// Helix and strand ranges, when the source file assigns them.
    #[serde(default)]
    pub secondary_structure: Option<Vec<SecondaryStructureRange>>,
}

impl StructureDocument {
    /// Split into an atom stack and a metadata handle for `format`.
    pub fn into_loaded(
        self,
        format: FileFormat,
    ) -> Result<LoadedStructure, ImportError> {
        let stack = AtomStack::with_models(self.atoms, self.models)
            .map_err(|e| ImportError::Load(e.to_string()))?;
        let metadata = DocumentMetadata {
            format,
            entity_list: self.entity_list,
            chain_name_list: self.chain_name_list,
            bio_assembly_list: self.bio_assembly_list,
            secondary_structure: self.secondary_structure,
        };
        Ok(LoadedStructure {
            stack,
            metadata: Box::new(metadata),
        })
    }
}

struct DocumentMetadata {
    format: FileFormat,
    entity_list: Option<Vec<MmtfEntity>>,
    chain_name_list: Vec<String>,
    bio_assembly_list: Option<Vec<MmtfBioAssembly>>,
    secondary_structure: Option<Vec<SecondaryStructureRange>>,
}

impl StructureMetadata for DocumentMetadata {
    fn entity_chain_groups(
        &self,
    ) -> Result<Option<EntityChainGroups>, ImportError> {
        self.entity_list
            .as_deref()
            .map(|entities| {
                entity_groups_from_mmtf(entities, &self.chain_name_list)
            })
            .transpose()
    }

    fn assemblies(&self) -> Result<Option<AssemblyDescriptor>, ImportError> {
        match self.bio_assembly_list.as_deref() {
            Some(list) => {
                assembly_descriptor_from_mmtf(list, &self.chain_name_list)
                    .map(Some)
            }
            None if !self.format.supports_assemblies() => {
                Err(ImportError::UnsupportedAssemblyMetadata {
                    format: self.format,
                })
            }
            None => Ok(None),
        }
    }

    fn secondary_structure(
        &self,
    ) -> Result<Option<Vec<SecondaryStructureRange>>, ImportError> {
        Ok(self.secondary_structure.clone())
    }
}

/// Loads [`StructureDocument`]s serialized as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl StructureLoader for DocumentLoader {
    fn load(
        &self,
        source: &StructureSource,
    ) -> Result<LoadedStructure, ImportError> {
        if let Some(dir) = &source.cache_dir {
            log::debug!("cache dir {} unused for local documents", dir.display());
        }
        let bytes = source.read_bytes()?;
        let document: StructureDocument = serde_json::from_slice(&bytes)
            .map_err(|e| {
                ImportError::Load(format!("{}: {e}", source.describe()))
            })?;
        document.into_loaded(source.format)
    }
}
