//! Biological assemblies.
//!
//! A structure file stores the asymmetric unit; its biological assemblies
//! describe how to rebuild the functional oligomer by applying rigid
//! transforms to subsets of chains. An [`AssemblyDescriptor`] holds those
//! descriptions, [`transform`] turns one of them into instancing transforms,
//! and [`mmtf`] decodes them from MMTF-style metadata.

pub mod mmtf;
pub mod transform;

use glam::{Mat3, Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};
pub use transform::{
    build_from_dict, extract_transforms, instance_rows_from_descriptor,
    InstanceRow, InstanceTransform, Rotation, TransformArray, TransformMode,
};

use crate::error::ImportError;

/// Absolute tolerance used when checking that a transform is rigid.
/// Deposited matrices are printed with a handful of decimals.
pub const RIGID_TOLERANCE: f32 = 1e-3;

// ---------------------------------------------------------------------------
// ChainTransform
// ---------------------------------------------------------------------------

/// One operation of an assembly: a rigid transform applied to a chain subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainTransform {
    /// Chains the transform is applied to.
    pub chain_ids: Vec<String>,
    /// Homogeneous 4x4 transform (column-major).
    pub matrix: Mat4,
}

impl ChainTransform {
    /// Transform from a full matrix.
    pub fn new<I, S>(chain_ids: I, matrix: Mat4) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chain_ids: chain_ids.into_iter().map(Into::into).collect(),
            matrix,
        }
    }

    /// Identity operation on `chain_ids`.
    pub fn identity<I, S>(chain_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(chain_ids, Mat4::IDENTITY)
    }

    /// Transform from a rotation block and a translation.
    pub fn from_rotation_translation<I, S>(
        chain_ids: I,
        rotation: Mat3,
        translation: Vec3,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let matrix = Mat4::from_cols(
            rotation.x_axis.extend(0.0),
            rotation.y_axis.extend(0.0),
            rotation.z_axis.extend(0.0),
            translation.extend(1.0),
        );
        Self::new(chain_ids, matrix)
    }

    /// Upper-left 3x3 rotation block.
    #[must_use]
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix)
    }

    /// Translation column.
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    /// Whether the matrix is a proper rigid transform: orthonormal rotation
    /// with determinant +1 and an affine bottom row.
    #[must_use]
    pub fn is_rigid(&self, tolerance: f32) -> bool {
        let r = self.rotation();
        let orthonormal =
            (r * r.transpose()).abs_diff_eq(Mat3::IDENTITY, tolerance);
        let proper = (r.determinant() - 1.0).abs() <= tolerance;
        let affine = self.matrix.row(3).abs_diff_eq(Vec4::W, tolerance);
        orthonormal && proper && affine
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// One biological assembly: its id and its ordered operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    /// Assembly identifier, usually "1", "2", ...
    pub id: String,
    /// Operations in file order.
    pub transforms: Vec<ChainTransform>,
}

impl Assembly {
    /// Assembly with the given operations.
    pub fn new(id: impl Into<String>, transforms: Vec<ChainTransform>) -> Self {
        Self {
            id: id.into(),
            transforms,
        }
    }

    /// Number of chain copies the assembly produces.
    #[must_use]
    pub fn copy_count(&self) -> usize {
        self.transforms.iter().map(|t| t.chain_ids.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// AssemblyDescriptor
// ---------------------------------------------------------------------------

/// All biological assemblies of a structure, in file order.
///
/// Every operation is validated as rigid on construction; an empty
/// descriptor is valid and means the file defines no assembly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Assembly>", into = "Vec<Assembly>")]
pub struct AssemblyDescriptor {
    assemblies: Vec<Assembly>,
}

impl TryFrom<Vec<Assembly>> for AssemblyDescriptor {
    type Error = ImportError;

    fn try_from(assemblies: Vec<Assembly>) -> Result<Self, Self::Error> {
        Self::from_assemblies(assemblies)
    }
}

impl From<AssemblyDescriptor> for Vec<Assembly> {
    fn from(descriptor: AssemblyDescriptor) -> Self {
        descriptor.assemblies
    }
}

impl AssemblyDescriptor {
    /// Descriptor with no assemblies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and collect assemblies.
    pub fn from_assemblies(
        assemblies: Vec<Assembly>,
    ) -> Result<Self, ImportError> {
        let mut descriptor = Self::new();
        for assembly in assemblies {
            descriptor.push(assembly)?;
        }
        Ok(descriptor)
    }

    /// Append an assembly. Fails on a duplicate id or a non-rigid operation.
    pub fn push(&mut self, assembly: Assembly) -> Result<(), ImportError> {
        if self.get(&assembly.id).is_some() {
            return Err(ImportError::InvalidMetadata(format!(
                "biological assembly `{}` is defined twice",
                assembly.id
            )));
        }
        if let Some(i) = assembly
            .transforms
            .iter()
            .position(|t| !t.is_rigid(RIGID_TOLERANCE))
        {
            return Err(ImportError::InvalidMetadata(format!(
                "operation {i} of biological assembly `{}` is not a rigid \
                 transform",
                assembly.id
            )));
        }
        self.assemblies.push(assembly);
        Ok(())
    }

    /// Assembly by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Assembly> {
        self.assemblies.iter().find(|a| a.id == id)
    }

    /// Position of assembly `id` in file order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.assemblies.iter().position(|a| a.id == id)
    }

    /// The first assembly; most files define exactly one.
    #[must_use]
    pub fn first(&self) -> Option<&Assembly> {
        self.assemblies.first()
    }

    /// Assembly ids in file order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.assemblies.iter().map(|a| a.id.as_str())
    }

    /// All assemblies in file order.
    #[must_use]
    pub fn assemblies(&self) -> &[Assembly] {
        &self.assemblies
    }

    /// Number of assemblies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    /// Whether no assembly is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn dimer() -> Assembly {
        Assembly::new(
            "1",
            vec![
                ChainTransform::identity(["A", "B"]),
                ChainTransform::from_rotation_translation(
                    ["A", "B"],
                    Mat3::from_rotation_z(FRAC_PI_2),
                    Vec3::new(10.0, 0.0, 0.0),
                ),
            ],
        )
    }

    #[test]
    fn rotation_and_translation_split() {
        let t = &dimer().transforms[1];
        assert_eq!(t.translation(), Vec3::new(10.0, 0.0, 0.0));
        assert!(t
            .rotation()
            .abs_diff_eq(Mat3::from_rotation_z(FRAC_PI_2), 1e-6));
        assert!(t.is_rigid(RIGID_TOLERANCE));
    }

    #[test]
    fn scaling_and_mirroring_are_not_rigid() {
        let scaled = ChainTransform::new(["A"], Mat4::from_scale(Vec3::splat(2.0)));
        assert!(!scaled.is_rigid(RIGID_TOLERANCE));
        let mirrored = ChainTransform::new(
            ["A"],
            Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)),
        );
        assert!(!mirrored.is_rigid(RIGID_TOLERANCE));
    }

    #[test]
    fn descriptor_rejects_non_rigid_operations() {
        let bad = Assembly::new(
            "1",
            vec![ChainTransform::new(["A"], Mat4::from_scale(Vec3::splat(3.0)))],
        );
        assert!(matches!(
            AssemblyDescriptor::from_assemblies(vec![bad]),
            Err(ImportError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn descriptor_rejects_duplicate_ids() {
        let result = AssemblyDescriptor::from_assemblies(vec![dimer(), dimer()]);
        assert!(result.is_err());
    }

    #[test]
    fn lookup_by_id_and_order() {
        let mut second = dimer();
        second.id = "2".into();
        let descriptor =
            AssemblyDescriptor::from_assemblies(vec![dimer(), second]).unwrap();
        assert_eq!(descriptor.ids().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(descriptor.position("2"), Some(1));
        assert_eq!(descriptor.first().map(|a| a.id.as_str()), Some("1"));
        assert!(descriptor.get("3").is_none());
    }

    #[test]
    fn copies_count_every_chain_of_every_operation() {
        let assembly = dimer();
        assert_eq!(assembly.copy_count(), 4);
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let descriptor = AssemblyDescriptor::from_assemblies(vec![dimer()]).unwrap();
        let json = serde_json::to_string(&descriptor).unwrap();
        let parsed: AssemblyDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, descriptor);
    }
}
