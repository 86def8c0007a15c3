//! Structure-to-scene import pipeline.
//!
//! One call processes one structure end to end:
//!
//! 1. load atoms and metadata ([`Molecule::load`]),
//! 2. resolve entity ids and secondary structure (each degrades to none),
//! 3. drop solvent and centre, as requested,
//! 4. read biological assemblies (degrades to none),
//! 5. create the scene object and its style graph,
//! 6. annotate the object with entity, chain and assembly properties,
//! 7. instance the selected assembly, if requested.
//!
//! Steps 5 to 7 only ever touch the objects created in step 5.

use crate::assembly::{
    extract_transforms, Assembly, AssemblyDescriptor, TransformMode,
};
use crate::error::ImportError;
use crate::loader::{StructureLoader, StructureSource};
use crate::molecule::Molecule;
use crate::options::ImportOptions;
use crate::scene::{HostScene, ObjectHandle, ObjectRequest, PropertyValue};

/// Property holding the entity id of every atom, or null.
pub const ENTITY_IDS_PROPERTY: &str = "entity_ids";
/// Property holding the sorted distinct chain ids.
pub const CHAIN_IDS_PROPERTY: &str = "chain_id_unique";
/// Property holding the assembly descriptor, or null.
pub const ASSEMBLIES_PROPERTY: &str = "biological_assemblies";

/// What an import created and resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneModel {
    /// The molecule object.
    pub object: ObjectHandle,
    /// Frame collection of multi-model structures.
    pub frames: Option<ObjectHandle>,
    /// Assembly instancing data, when an assembly was instanced.
    pub instancing: Option<ObjectHandle>,
    /// Object name.
    pub name: String,
    /// Sorted distinct chain ids.
    pub chain_ids: Vec<String>,
    /// Entity id per atom, `None` when unavailable.
    pub entity_ids: Option<Vec<u32>>,
    /// Biological assemblies, `None` when the source defines none.
    pub biological_assemblies: Option<AssemblyDescriptor>,
}

/// Name of the instancing data object of `name`.
#[must_use]
pub fn instancing_data_name(name: &str) -> String {
    format!("data_assembly_{name}")
}

/// Load `source` and build its scene model in one call.
pub fn import_structure(
    loader: &dyn StructureLoader,
    scene: &mut dyn HostScene,
    source: &StructureSource,
    name: &str,
    options: &ImportOptions,
) -> Result<SceneModel, ImportError> {
    let level = options.progress_level();

    let cached;
    let source = match (&options.cache_dir, &source.cache_dir) {
        (Some(dir), None) => {
            cached = source.clone().with_cache_dir(Some(dir.clone()));
            &cached
        }
        _ => source,
    };

    log::log!(level, "loading {}", source.describe());
    let molecule = Molecule::load(loader, source)?;
    molecule.create_model(scene, name, options)
}

impl Molecule {
    /// Create the scene object of this molecule: prepare the atoms, build
    /// the object and its style, annotate it and instance its assembly.
    pub fn create_model(
        mut self,
        scene: &mut dyn HostScene,
        name: &str,
        options: &ImportOptions,
    ) -> Result<SceneModel, ImportError> {
        let level = options.progress_level();

        // -- Prepare --
        if options.del_solvent {
            let before = self.structure().len();
            let stripped = self.stack().without_solvent()?;
            *self.stack_mut() = stripped;
            log::log!(
                level,
                "{name}: removed {} solvent atoms",
                before - self.structure().len()
            );
        }
        if options.centre {
            let offset = self.stack_mut().centre();
            log::log!(level, "{name}: centred by {offset}");
        }

        // -- Assemble --
        let assemblies = self.assemblies()?;
        let chain_ids = self.structure().unique_chain_ids();
        let entity_ids = self.entity_ids().map(<[u32]>::to_vec);

        // -- Materialize --
        let created = scene.create_object(ObjectRequest {
            name,
            atoms: self.structure(),
            frames: self.stack().frames(),
            collection: options.collection.as_deref(),
        })?;
        log::log!(
            level,
            "{name}: created object {} with {} atoms",
            created.object.0,
            self.structure().len()
        );
        if options.setup_nodes {
            scene.create_style(created.object, created.frames, options.style)?;
            log::log!(level, "{name}: applied style {}", options.style);
        }

        // -- Annotate --
        scene.set_property(
            created.object,
            ENTITY_IDS_PROPERTY,
            entity_ids
                .clone()
                .map_or(PropertyValue::Null, PropertyValue::Ints),
        )?;
        scene.set_property(
            created.object,
            CHAIN_IDS_PROPERTY,
            PropertyValue::Strings(chain_ids.clone()),
        )?;
        scene.set_property(
            created.object,
            ASSEMBLIES_PROPERTY,
            assemblies
                .clone()
                .map_or(PropertyValue::Null, PropertyValue::Assemblies),
        )?;

        // -- Instance --
        let instancing = if options.build_assembly {
            instance_assembly(
                scene,
                created.object,
                name,
                assemblies.as_ref(),
                &chain_ids,
                options,
            )?
        } else {
            None
        };

        Ok(SceneModel {
            object: created.object,
            frames: created.frames,
            instancing,
            name: name.to_owned(),
            chain_ids,
            entity_ids,
            biological_assemblies: assemblies,
        })
    }
}

fn instance_assembly(
    scene: &mut dyn HostScene,
    object: ObjectHandle,
    name: &str,
    assemblies: Option<&AssemblyDescriptor>,
    chain_ids: &[String],
    options: &ImportOptions,
) -> Result<Option<ObjectHandle>, ImportError> {
    if !options.setup_nodes {
        log::warn!("{name}: assembly instancing needs a style graph, skipping");
        return Ok(None);
    }
    let Some(descriptor) = assemblies.filter(|d| !d.is_empty()) else {
        log::warn!("{name}: no biological assembly to build");
        return Ok(None);
    };
    let Some(id) = options
        .assembly_id
        .as_deref()
        .or_else(|| descriptor.first().map(|a| a.id.as_str()))
    else {
        return Ok(None);
    };

    let transforms =
        match extract_transforms(Some(descriptor), id, TransformMode::Quaternion) {
            Ok(transforms) => transforms,
            Err(e @ ImportError::UnknownAssembly(_)) => {
                log::warn!("{name}: {e}, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
    let index = descriptor.position(id).unwrap_or_default() as u32;
    let rows = transforms.instance_rows(index, chain_ids);

    let data = scene.create_instancing_data(&instancing_data_name(name), &rows)?;
    scene.insert_assembly(object, data, chain_ids)?;
    log::log!(
        options.progress_level(),
        "{name}: instanced assembly {id} ({} of {} chain copies)",
        rows.len(),
        descriptor.get(id).map_or(0, Assembly::copy_count)
    );
    Ok(Some(data))
}
