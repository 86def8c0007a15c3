//! Host scene boundary.
//!
//! The application that displays molecules owns object lifetime, meshes and
//! style graphs. The import pipeline only talks to it through
//! [`HostScene`]: create an object, attach a style, set properties and wire
//! up assembly instancing. [`MemoryScene`] is an in-memory implementation
//! used by the command-line tool and the tests.

mod memory;

use glam::Vec3;
pub use memory::{
    AssemblyLink, MemoryScene, ObjectKind, SceneObject, SceneSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::assembly::{AssemblyDescriptor, InstanceRow};
use crate::error::ImportError;
use crate::options::Style;
use crate::structure::AtomArray;

/// Opaque handle of a host scene object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ObjectHandle(pub u32);

/// Everything the host needs to build the visual object of a structure.
#[derive(Debug, Clone, Copy)]
pub struct ObjectRequest<'a> {
    /// Object name.
    pub name: &'a str,
    /// Atoms and annotations, one vertex per atom.
    pub atoms: &'a AtomArray,
    /// Per-frame coordinates of multi-model structures; empty otherwise.
    pub frames: &'a [Vec<Vec3>],
    /// Destination collection.
    pub collection: Option<&'a str>,
}

/// Objects created for one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedObject {
    /// The molecule object.
    pub object: ObjectHandle,
    /// Frame collection, present when the request carried frames.
    pub frames: Option<ObjectHandle>,
}

/// Value of a custom property attached to a scene object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Explicitly unavailable.
    Null,
    /// Integer array (entity ids).
    Ints(Vec<u32>),
    /// String array (chain ids).
    Strings(Vec<String>),
    /// Biological assembly descriptor.
    Assemblies(AssemblyDescriptor),
}

impl PropertyValue {
    /// Whether this is [`PropertyValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Operations the import pipeline needs from the host application.
///
/// Every method addresses objects by handle and only ever touches the
/// object it is given (or creates a new one). Errors propagate unchanged
/// through the pipeline.
pub trait HostScene {
    /// Create the molecule object and, for multi-model structures, its
    /// frame collection.
    fn create_object(
        &mut self,
        request: ObjectRequest<'_>,
    ) -> Result<CreatedObject, ImportError>;

    /// Build the style graph of `object`.
    fn create_style(
        &mut self,
        object: ObjectHandle,
        frames: Option<ObjectHandle>,
        style: Style,
    ) -> Result<(), ImportError>;

    /// Set a custom property on `object`.
    fn set_property(
        &mut self,
        object: ObjectHandle,
        key: &str,
        value: PropertyValue,
    ) -> Result<(), ImportError>;

    /// Create an instancing data object holding one vertex per row.
    fn create_instancing_data(
        &mut self,
        name: &str,
        rows: &[InstanceRow],
    ) -> Result<ObjectHandle, ImportError>;

    /// Wire the instancing data `data` into the style graph of `object`.
    fn insert_assembly(
        &mut self,
        object: ObjectHandle,
        data: ObjectHandle,
        chain_labels: &[String],
    ) -> Result<(), ImportError>;
}
