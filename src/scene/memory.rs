use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;

use super::{
    CreatedObject, HostScene, ObjectHandle, ObjectRequest, PropertyValue,
};
use crate::assembly::InstanceRow;
use crate::error::ImportError;
use crate::options::Style;
use crate::structure::AtomArray;

// ---------------------------------------------------------------------------
// SceneObject
// ---------------------------------------------------------------------------

/// Instancing wired into a molecule's style graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssemblyLink {
    /// Instancing data object.
    pub data: ObjectHandle,
    /// Chain labels the row chain codes refer to.
    pub chain_labels: Vec<String>,
}

/// What a [`SceneObject`] holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    /// A molecule: its atoms, style and custom properties.
    Molecule {
        /// Atom columns.
        atoms: AtomArray,
        /// Style graph preset, once built.
        style: Option<Style>,
        /// Custom properties, sorted by key.
        properties: BTreeMap<String, PropertyValue>,
        /// Assembly instancing, once wired.
        assembly: Option<AssemblyLink>,
    },
    /// Per-frame coordinates of a multi-model molecule.
    Frames {
        /// The molecule the frames belong to.
        parent: ObjectHandle,
        /// One coordinate list per model.
        frames: Vec<Vec<Vec3>>,
    },
    /// One vertex per assembly chain copy.
    InstancingData {
        /// `[assembly, chain, qw, qx, qy, qz, tx, ty, tz]` per copy.
        rows: Vec<[f32; 9]>,
    },
}

/// An object of a [`MemoryScene`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    /// Handle assigned on creation.
    pub id: ObjectHandle,
    /// Object name.
    pub name: String,
    /// Collection the object was placed in.
    pub collection: Option<String>,
    /// Object payload.
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl SceneObject {
    /// Custom property `key` of a molecule object.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        match &self.kind {
            ObjectKind::Molecule { properties, .. } => properties.get(key),
            _ => None,
        }
    }

    /// Style of a molecule object.
    #[must_use]
    pub fn style(&self) -> Option<Style> {
        match &self.kind {
            ObjectKind::Molecule { style, .. } => *style,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryScene
// ---------------------------------------------------------------------------

/// Serializable view of a [`MemoryScene`].
#[derive(Debug, Serialize)]
pub struct SceneSnapshot<'a> {
    /// Generation at snapshot time.
    pub generation: u64,
    /// Objects in creation order.
    pub objects: &'a [SceneObject],
}

/// Append-only in-memory host scene. Owns all objects in a flat list.
#[derive(Debug, Default)]
pub struct MemoryScene {
    /// Objects in creation order.
    objects: Vec<SceneObject>,
    next_object_id: u32,
    /// Monotonically increasing generation; bumped on any mutation.
    generation: u64,
}

impl MemoryScene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Mutation helpers --

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn add(
        &mut self,
        name: String,
        collection: Option<String>,
        kind: ObjectKind,
    ) -> ObjectHandle {
        let id = ObjectHandle(self.next_object_id);
        self.next_object_id += 1;
        self.objects.push(SceneObject {
            id,
            name,
            collection,
            kind,
        });
        self.invalidate();
        id
    }

    fn object_mut(
        &mut self,
        id: ObjectHandle,
    ) -> Result<&mut SceneObject, ImportError> {
        self.objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ImportError::Scene(format!("no object {}", id.0)))
    }

    // -- Queries --

    /// Read access to an object.
    #[must_use]
    pub fn object(&self, id: ObjectHandle) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Read access to all objects (creation order).
    #[must_use]
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Number of objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Serializable view for JSON export.
    #[must_use]
    pub fn snapshot(&self) -> SceneSnapshot<'_> {
        SceneSnapshot {
            generation: self.generation,
            objects: &self.objects,
        }
    }
}

fn not_a_molecule(id: ObjectHandle) -> ImportError {
    ImportError::Scene(format!("object {} is not a molecule", id.0))
}

impl HostScene for MemoryScene {
    fn create_object(
        &mut self,
        request: ObjectRequest<'_>,
    ) -> Result<CreatedObject, ImportError> {
        let collection = request.collection.map(str::to_owned);
        let object = self.add(
            request.name.to_owned(),
            collection.clone(),
            ObjectKind::Molecule {
                atoms: request.atoms.clone(),
                style: None,
                properties: BTreeMap::new(),
                assembly: None,
            },
        );
        let frames = (!request.frames.is_empty()).then(|| {
            self.add(
                format!("{}_frames", request.name),
                collection,
                ObjectKind::Frames {
                    parent: object,
                    frames: request.frames.to_vec(),
                },
            )
        });
        Ok(CreatedObject { object, frames })
    }

    fn create_style(
        &mut self,
        object: ObjectHandle,
        frames: Option<ObjectHandle>,
        style: Style,
    ) -> Result<(), ImportError> {
        if let Some(frames) = frames {
            let linked = self.object(frames).is_some_and(|o| {
                matches!(o.kind, ObjectKind::Frames { parent, .. } if parent == object)
            });
            if !linked {
                return Err(ImportError::Scene(format!(
                    "object {} holds no frames of object {}",
                    frames.0, object.0
                )));
            }
        }
        let target = self.object_mut(object)?;
        let ObjectKind::Molecule { style: slot, .. } = &mut target.kind else {
            return Err(not_a_molecule(object));
        };
        *slot = Some(style);
        self.invalidate();
        Ok(())
    }

    fn set_property(
        &mut self,
        object: ObjectHandle,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), ImportError> {
        let target = self.object_mut(object)?;
        let ObjectKind::Molecule { properties, .. } = &mut target.kind else {
            return Err(not_a_molecule(object));
        };
        let _ = properties.insert(key.to_owned(), value);
        self.invalidate();
        Ok(())
    }

    fn create_instancing_data(
        &mut self,
        name: &str,
        rows: &[InstanceRow],
    ) -> Result<ObjectHandle, ImportError> {
        let rows = rows.iter().map(InstanceRow::to_array).collect();
        Ok(self.add(
            name.to_owned(),
            None,
            ObjectKind::InstancingData { rows },
        ))
    }

    fn insert_assembly(
        &mut self,
        object: ObjectHandle,
        data: ObjectHandle,
        chain_labels: &[String],
    ) -> Result<(), ImportError> {
        if !self
            .object(data)
            .is_some_and(|o| matches!(o.kind, ObjectKind::InstancingData { .. }))
        {
            return Err(ImportError::Scene(format!(
                "object {} is not instancing data",
                data.0
            )));
        }
        let target = self.object_mut(object)?;
        let ObjectKind::Molecule {
            style, assembly, ..
        } = &mut target.kind
        else {
            return Err(not_a_molecule(object));
        };
        if style.is_none() {
            return Err(ImportError::Scene(format!(
                "object {} has no style graph to insert an assembly into",
                object.0
            )));
        }
        *assembly = Some(AssemblyLink {
            data,
            chain_labels: chain_labels.to_vec(),
        });
        self.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::structure::Atom;

    fn atoms() -> AtomArray {
        AtomArray::from_atoms([
            Atom::new("A", "ALA", 1, "CA", "C", Vec3::ZERO),
            Atom::new("B", "GLY", 1, "CA", "C", Vec3::X),
        ])
    }

    fn create(scene: &mut MemoryScene, frames: &[Vec<Vec3>]) -> CreatedObject {
        let atoms = atoms();
        scene
            .create_object(ObjectRequest {
                name: "1abc",
                atoms: &atoms,
                frames,
                collection: Some("Molecules"),
            })
            .unwrap()
    }

    #[test]
    fn ids_are_assigned_in_order() {
        let mut scene = MemoryScene::new();
        let first = create(&mut scene, &[]);
        let second = create(&mut scene, &[]);
        assert_eq!(first.object, ObjectHandle(0));
        assert_eq!(second.object, ObjectHandle(1));
        assert!(first.frames.is_none());
        assert_eq!(scene.object_count(), 2);
        assert_eq!(
            scene.object(first.object).unwrap().collection.as_deref(),
            Some("Molecules")
        );
    }

    #[test]
    fn frames_get_their_own_object() {
        let mut scene = MemoryScene::new();
        let models = vec![vec![Vec3::ZERO, Vec3::X], vec![Vec3::Y, Vec3::Z]];
        let created = create(&mut scene, &models);
        let frames = created.frames.unwrap();
        assert_eq!(scene.object(frames).unwrap().name, "1abc_frames");
        scene
            .create_style(created.object, Some(frames), Style::Cartoon)
            .unwrap();
        assert_eq!(
            scene.object(created.object).unwrap().style(),
            Some(Style::Cartoon)
        );
    }

    #[test]
    fn generation_tracks_mutations() {
        let mut scene = MemoryScene::new();
        assert_eq!(scene.generation(), 0);
        let created = create(&mut scene, &[]);
        assert_eq!(scene.generation(), 1);
        scene
            .set_property(created.object, "entity_ids", PropertyValue::Null)
            .unwrap();
        assert_eq!(scene.generation(), 2);
        // failed mutations leave the generation alone
        assert!(scene
            .create_style(created.object, Some(created.object), Style::BallAndStick)
            .is_err());
        assert_eq!(scene.generation(), 2);
        assert!(scene
            .object(created.object)
            .unwrap()
            .property("entity_ids")
            .unwrap()
            .is_null());
    }

    #[test]
    fn unknown_handles_are_scene_errors() {
        let mut scene = MemoryScene::new();
        let err = scene
            .set_property(ObjectHandle(9), "x", PropertyValue::Null)
            .unwrap_err();
        assert!(matches!(err, ImportError::Scene(_)));
    }

    #[test]
    fn assembly_needs_a_style_graph() {
        let mut scene = MemoryScene::new();
        let created = create(&mut scene, &[]);
        let rows = [InstanceRow {
            assembly: 0,
            chain: 1,
            rotation: Quat::IDENTITY,
            translation: Vec3::new(1.0, 2.0, 3.0),
        }];
        let data = scene
            .create_instancing_data("data_assembly_1abc", &rows)
            .unwrap();
        let labels = vec!["A".to_owned(), "B".to_owned()];

        assert!(scene.insert_assembly(created.object, data, &labels).is_err());
        scene
            .create_style(created.object, None, Style::Spheres)
            .unwrap();
        scene.insert_assembly(created.object, data, &labels).unwrap();
        // data objects cannot stand in for molecules and vice versa
        assert!(scene.insert_assembly(data, data, &labels).is_err());
        assert!(scene
            .insert_assembly(created.object, created.object, &labels)
            .is_err());
    }

    #[test]
    fn snapshot_serializes_objects() {
        let mut scene = MemoryScene::new();
        let created = create(&mut scene, &[]);
        scene
            .set_property(
                created.object,
                "chain_id_unique",
                PropertyValue::Strings(vec!["A".into(), "B".into()]),
            )
            .unwrap();
        let value = serde_json::to_value(scene.snapshot()).unwrap();
        let object = &value["objects"][0];
        assert_eq!(object["kind"], "molecule");
        assert_eq!(object["name"], "1abc");
        assert_eq!(
            object["properties"]["chain_id_unique"],
            serde_json::json!(["A", "B"])
        );
        assert_eq!(value["generation"], 2);
    }
}
