//! A loaded structure with its resolved enrichment data.
//!
//! [`Molecule`] is what every file format turns into: an atom stack whose
//! `entity_id` and `sec_struct` columns are resolved from the file's own
//! metadata when possible, tagged with its
//! [`FileFormat`] and carrying the metadata handle that answers assembly
//! queries.

use std::fmt;

use crate::assembly::{instance_rows_from_descriptor, AssemblyDescriptor, InstanceRow};
use crate::error::ImportError;
use crate::loader::{
    FileFormat, LoadedStructure, StructureLoader, StructureMetadata,
    StructureSource,
};
use crate::structure::entity::set_atom_entity_ids;
use crate::structure::secondary::set_atom_sec_struct;
use crate::structure::{AtomArray, AtomStack, ChainIds};

/// A loaded structure.
pub struct Molecule {
    format: FileFormat,
    stack: AtomStack,
    metadata: Box<dyn StructureMetadata>,
}

impl fmt::Debug for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Molecule")
            .field("format", &self.format)
            .field("atoms", &self.stack.atoms().len())
            .field("models", &self.stack.model_count())
            .field("entity_ids", &self.stack.atoms().entity_id().is_some())
            .field("sec_struct", &self.stack.atoms().sec_struct().is_some())
            .finish_non_exhaustive()
    }
}

impl Molecule {
    /// Load `source` and resolve its entity ids and secondary structure.
    ///
    /// A load failure aborts. Missing or incomplete metadata leaves the
    /// matching column unset; malformed metadata propagates.
    pub fn load(
        loader: &dyn StructureLoader,
        source: &StructureSource,
    ) -> Result<Self, ImportError> {
        let loaded = loader.load(source)?;
        Self::from_loaded(source.format, loaded)
    }

    /// Wrap an already loaded structure and resolve its entity ids and
    /// secondary structure.
    ///
    /// Both columns are derived from `loaded`'s metadata only. Columns the
    /// loader shipped with the atoms are discarded first.
    pub fn from_loaded(
        format: FileFormat,
        loaded: LoadedStructure,
    ) -> Result<Self, ImportError> {
        let LoadedStructure {
            mut stack,
            metadata,
        } = loaded;
        let atoms = stack.atoms_mut();
        atoms.clear_entity_ids();
        atoms.clear_sec_struct();

        match metadata.entity_chain_groups()? {
            Some(groups) => match set_atom_entity_ids(atoms, &groups) {
                Ok(_) => {}
                Err(e) if e.is_routine_absence() => {
                    log::warn!("entity ids unavailable: {e}");
                }
                Err(e) => return Err(e),
            },
            None => log::debug!("{format} source records no entities"),
        }

        match metadata.secondary_structure()? {
            Some(ranges) => match set_atom_sec_struct(atoms, &ranges) {
                Ok(_) => {}
                Err(e) if e.is_routine_absence() => {
                    log::warn!("secondary structure unavailable: {e}");
                }
                Err(e) => return Err(e),
            },
            None => log::debug!("{format} source assigns no secondary structure"),
        }

        Ok(Self {
            format,
            stack,
            metadata,
        })
    }

    /// Source file format.
    #[must_use]
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Atoms and annotations (first model).
    #[must_use]
    pub fn structure(&self) -> &AtomArray {
        self.stack.atoms()
    }

    /// Atoms together with every model's coordinates.
    #[must_use]
    pub fn stack(&self) -> &AtomStack {
        &self.stack
    }

    pub(crate) fn stack_mut(&mut self) -> &mut AtomStack {
        &mut self.stack
    }

    /// Entity index per atom, `None` when it could not be resolved.
    #[must_use]
    pub fn entity_ids(&self) -> Option<&[u32]> {
        self.stack.atoms().entity_id()
    }

    /// Secondary structure code per atom (see
    /// [`SecondaryStructure`](crate::structure::secondary::SecondaryStructure)),
    /// `None` when the file assigns none.
    #[must_use]
    pub fn sec_struct(&self) -> Option<&[u8]> {
        self.stack.atoms().sec_struct()
    }

    /// Distinct chain ids (sorted) or per-atom chain codes.
    #[must_use]
    pub fn chain_ids(&self, as_int: bool) -> ChainIds {
        self.stack.atoms().chain_ids(as_int)
    }

    /// Biological assemblies of the structure.
    ///
    /// A format without an assembly section yields `Ok(None)`, as does a
    /// file that simply defines none. Malformed assembly metadata is an
    /// error.
    pub fn assemblies(&self) -> Result<Option<AssemblyDescriptor>, ImportError> {
        match self.metadata.assemblies() {
            Err(e) if e.is_routine_absence() => {
                log::warn!("no biological assemblies: {e}");
                Ok(None)
            }
            other => other,
        }
    }

    /// Flat instancing rows for every assembly, chain codes referring to
    /// [`Molecule::chain_ids`] labels.
    pub fn assembly_instances(
        &self,
    ) -> Result<Option<Vec<InstanceRow>>, ImportError> {
        let Some(descriptor) = self.assemblies()? else {
            return Ok(None);
        };
        let labels = self.stack.atoms().unique_chain_ids();
        Ok(Some(instance_rows_from_descriptor(&descriptor, &labels)))
    }
}
