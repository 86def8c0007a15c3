//! Instancing transforms derived from an [`AssemblyDescriptor`].
//!
//! Downstream instancing consumes these arrays positionally, so every
//! function here preserves the descriptor's operation order.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::Serialize;

use super::{AssemblyDescriptor, ChainTransform};
use crate::error::ImportError;

/// How the rotation part of each transform is represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// 3x3 rotation matrix.
    #[default]
    Matrix,
    /// Unit quaternion.
    Quaternion,
}

/// Rotation part of an [`InstanceTransform`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Rotation matrix.
    Matrix(Mat3),
    /// Unit quaternion.
    Quaternion(Quat),
}

impl Rotation {
    fn from_matrix(rotation: Mat3, mode: TransformMode) -> Self {
        match mode {
            TransformMode::Matrix => Self::Matrix(rotation),
            TransformMode::Quaternion => {
                Self::Quaternion(Quat::from_mat3(&rotation).normalize())
            }
        }
    }

    /// The rotation as a quaternion.
    #[must_use]
    pub fn to_quat(self) -> Quat {
        match self {
            Self::Matrix(m) => Quat::from_mat3(&m).normalize(),
            Self::Quaternion(q) => q,
        }
    }

    /// The rotation as a matrix.
    #[must_use]
    pub fn to_mat3(self) -> Mat3 {
        match self {
            Self::Matrix(m) => m,
            Self::Quaternion(q) => Mat3::from_quat(q),
        }
    }
}

/// One assembly copy: the chains it replicates and where it goes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InstanceTransform {
    /// Chains the transform is applied to.
    pub chain_ids: Vec<String>,
    /// Rotation part.
    pub rotation: Rotation,
    /// Translation part.
    pub translation: Vec3,
}

impl InstanceTransform {
    fn from_chain_transform(
        transform: &ChainTransform,
        mode: TransformMode,
    ) -> Self {
        Self {
            chain_ids: transform.chain_ids.clone(),
            rotation: Rotation::from_matrix(transform.rotation(), mode),
            translation: transform.translation(),
        }
    }

    /// Homogeneous matrix of this transform.
    #[must_use]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation.to_quat(), self.translation)
    }

    /// Apply the transform to a point.
    #[must_use]
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.rotation.to_mat3() * point + self.translation
    }
}

// ---------------------------------------------------------------------------
// TransformArray
// ---------------------------------------------------------------------------

/// Ordered per-copy transforms of one assembly.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransformArray {
    transforms: Vec<InstanceTransform>,
}

impl TransformArray {
    /// Number of transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether there are no transforms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Transform at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&InstanceTransform> {
        self.transforms.get(index)
    }

    /// Transforms in order.
    pub fn iter(&self) -> impl Iterator<Item = &InstanceTransform> {
        self.transforms.iter()
    }

    /// Transforms as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[InstanceTransform] {
        &self.transforms
    }

    /// Expand into one [`InstanceRow`] per (transform, chain). `chain_labels`
    /// are the structure's sorted distinct chain ids; a row's `chain` is the
    /// position of its chain in that list. Chains the structure does not
    /// contain are skipped.
    #[must_use]
    pub fn instance_rows(
        &self,
        assembly: u32,
        chain_labels: &[String],
    ) -> Vec<InstanceRow> {
        let mut rows = Vec::with_capacity(self.transforms.len());
        for transform in &self.transforms {
            let rotation = transform.rotation.to_quat();
            for chain_id in &transform.chain_ids {
                let Some(chain) = chain_labels.iter().position(|c| c == chain_id)
                else {
                    log::debug!(
                        "assembly {assembly}: chain {chain_id} not in \
                         structure, skipping"
                    );
                    continue;
                };
                rows.push(InstanceRow {
                    assembly,
                    chain: chain as u32,
                    rotation,
                    translation: transform.translation,
                });
            }
        }
        rows
    }
}

impl<'a> IntoIterator for &'a TransformArray {
    type Item = &'a InstanceTransform;
    type IntoIter = std::slice::Iter<'a, InstanceTransform>;

    fn into_iter(self) -> Self::IntoIter {
        self.transforms.iter()
    }
}

/// Flat instancing record for one chain copy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct InstanceRow {
    /// Assembly index (position in the descriptor).
    pub assembly: u32,
    /// Chain code (position in the sorted distinct chain ids).
    pub chain: u32,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Translation.
    pub translation: Vec3,
}

impl InstanceRow {
    /// `[assembly, chain, qw, qx, qy, qz, tx, ty, tz]`, the layout of one
    /// vertex of an instancing data object.
    #[must_use]
    pub fn to_array(&self) -> [f32; 9] {
        let q = self.rotation;
        let t = self.translation;
        [
            self.assembly as f32,
            self.chain as f32,
            q.w,
            q.x,
            q.y,
            q.z,
            t.x,
            t.y,
            t.z,
        ]
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn collect(
    transforms: &[ChainTransform],
    mode: TransformMode,
) -> TransformArray {
    TransformArray {
        transforms: transforms
            .iter()
            .map(|t| InstanceTransform::from_chain_transform(t, mode))
            .collect(),
    }
}

/// Transforms of assembly `assembly_id`, in descriptor order.
///
/// A missing or empty descriptor yields an empty array: assembly metadata is
/// optional. An id the descriptor does not define is
/// [`ImportError::UnknownAssembly`].
pub fn extract_transforms(
    descriptor: Option<&AssemblyDescriptor>,
    assembly_id: &str,
    mode: TransformMode,
) -> Result<TransformArray, ImportError> {
    let Some(descriptor) = descriptor.filter(|d| !d.is_empty()) else {
        return Ok(TransformArray::default());
    };
    let assembly = descriptor
        .get(assembly_id)
        .ok_or_else(|| ImportError::UnknownAssembly(assembly_id.to_owned()))?;
    Ok(collect(&assembly.transforms, mode))
}

/// Transforms of the first assembly, or an empty array when there is none.
#[must_use]
pub fn build_from_dict(
    descriptor: Option<&AssemblyDescriptor>,
    mode: TransformMode,
) -> TransformArray {
    descriptor
        .and_then(AssemblyDescriptor::first)
        .map(|a| collect(&a.transforms, mode))
        .unwrap_or_default()
}

/// Instance rows for every assembly of `descriptor`, assembly by assembly.
#[must_use]
pub fn instance_rows_from_descriptor(
    descriptor: &AssemblyDescriptor,
    chain_labels: &[String],
) -> Vec<InstanceRow> {
    descriptor
        .assemblies()
        .iter()
        .enumerate()
        .flat_map(|(i, a)| {
            collect(&a.transforms, TransformMode::Quaternion)
                .instance_rows(i as u32, chain_labels)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use super::*;
    use crate::assembly::Assembly;

    fn descriptor() -> AssemblyDescriptor {
        AssemblyDescriptor::from_assemblies(vec![
            Assembly::new(
                "1",
                vec![
                    ChainTransform::identity(["A"]),
                    ChainTransform::from_rotation_translation(
                        ["A"],
                        Mat3::from_rotation_z(FRAC_PI_2),
                        Vec3::new(0.0, 5.0, 0.0),
                    ),
                    ChainTransform::from_rotation_translation(
                        ["A"],
                        Mat3::from_rotation_z(PI),
                        Vec3::new(-5.0, 0.0, 0.0),
                    ),
                ],
            ),
            Assembly::new(
                "2",
                vec![ChainTransform::identity(["B", "C"])],
            ),
        ])
        .unwrap()
    }

    fn labels(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn missing_descriptor_yields_nothing() {
        let none = extract_transforms(None, "1", TransformMode::Matrix).unwrap();
        assert!(none.is_empty());
        let empty = AssemblyDescriptor::new();
        let empty =
            extract_transforms(Some(&empty), "1", TransformMode::Quaternion)
                .unwrap();
        assert!(empty.is_empty());
        assert!(build_from_dict(None, TransformMode::Matrix).is_empty());
    }

    #[test]
    fn identity_assembly_yields_identity() {
        let descriptor = AssemblyDescriptor::from_assemblies(vec![Assembly::new(
            "1",
            vec![ChainTransform::identity(["A"])],
        )])
        .unwrap();
        let transforms =
            extract_transforms(Some(&descriptor), "1", TransformMode::Matrix)
                .unwrap();
        assert_eq!(transforms.len(), 1);
        let t = transforms.get(0).unwrap();
        assert_eq!(t.chain_ids, vec!["A".to_owned()]);
        assert_eq!(t.rotation, Rotation::Matrix(Mat3::IDENTITY));
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn one_transform_per_operation_in_order() {
        let descriptor = descriptor();
        let transforms =
            extract_transforms(Some(&descriptor), "1", TransformMode::Matrix)
                .unwrap();
        assert_eq!(transforms.len(), 3);
        let translations: Vec<Vec3> =
            transforms.iter().map(|t| t.translation).collect();
        assert_eq!(
            translations,
            vec![Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), Vec3::new(-5.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn quaternion_mode_rotates_like_the_matrix() {
        let descriptor = descriptor();
        let quats =
            extract_transforms(Some(&descriptor), "1", TransformMode::Quaternion)
                .unwrap();
        let mats =
            extract_transforms(Some(&descriptor), "1", TransformMode::Matrix)
                .unwrap();
        let p = Vec3::new(1.0, 2.0, 3.0);
        for (q, m) in quats.iter().zip(&mats) {
            assert!(matches!(q.rotation, Rotation::Quaternion(_)));
            assert!(q.apply(p).abs_diff_eq(m.apply(p), 1e-5));
        }
        // 90 degrees about z, then shifted along y
        assert!(quats
            .get(1)
            .unwrap()
            .apply(Vec3::X)
            .abs_diff_eq(Vec3::new(0.0, 6.0, 0.0), 1e-5));
    }

    #[test]
    fn unknown_assembly_is_an_error() {
        let descriptor = descriptor();
        assert!(matches!(
            extract_transforms(Some(&descriptor), "7", TransformMode::Matrix),
            Err(ImportError::UnknownAssembly(id)) if id == "7"
        ));
    }

    #[test]
    fn build_from_dict_uses_first_assembly() {
        let descriptor = descriptor();
        let transforms = build_from_dict(Some(&descriptor), TransformMode::Matrix);
        assert_eq!(transforms.len(), 3);
    }

    #[test]
    fn rows_expand_chains_and_skip_missing_ones() {
        let descriptor = descriptor();
        let transforms =
            extract_transforms(Some(&descriptor), "2", TransformMode::Matrix)
                .unwrap();
        let rows = transforms.instance_rows(1, &labels(&["A", "C"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].chain, 1);
        assert_eq!(rows[0].assembly, 1);
        assert_eq!(
            rows[0].to_array(),
            [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn rows_for_every_assembly() {
        let rows = instance_rows_from_descriptor(
            &descriptor(),
            &labels(&["A", "B", "C"]),
        );
        assert_eq!(rows.len(), 5);
        assert_eq!(rows.iter().filter(|r| r.assembly == 0).count(), 3);
        assert_eq!(
            rows.iter()
                .filter(|r| r.assembly == 1)
                .map(|r| r.chain)
                .collect::<Vec<_>>(),
            vec![1, 2]
        );
    }
}
