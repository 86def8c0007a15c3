//! MMTF-style structure metadata.
//!
//! MMTF stores entities and biological assemblies as lists that refer to
//! chains by index into `chainNameList`. These types mirror those records so
//! decoded MMTF (or any document using the same field names) can be turned
//! into [`EntityChainGroups`] and an [`AssemblyDescriptor`].

use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::{Assembly, AssemblyDescriptor, ChainTransform};
use crate::error::ImportError;
use crate::structure::entity::EntityChainGroups;

/// One entry of `entityList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmtfEntity {
    /// Indices into `chainNameList` of the chains belonging to the entity.
    pub chain_index_list: Vec<usize>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Entity type ("polymer", "non-polymer", "water", ...).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// One-letter sequence for polymers.
    #[serde(default)]
    pub sequence: String,
}

/// One entry of a bio-assembly `transformList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmtfTransform {
    /// Indices into `chainNameList` of the chains to transform.
    pub chain_index_list: Vec<usize>,
    /// 4x4 matrix, 16 values in column-major order.
    pub matrix: [f32; 16],
}

/// One entry of `bioAssemblyList`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmtfBioAssembly {
    /// Assembly name; positions are used ("1", "2", ...) when empty.
    #[serde(default)]
    pub name: String,
    /// Operations of the assembly.
    pub transform_list: Vec<MmtfTransform>,
}

fn chain_name<'a>(
    chain_names: &'a [String],
    index: usize,
    context: impl FnOnce() -> String,
) -> Result<&'a str, ImportError> {
    chain_names.get(index).map(String::as_str).ok_or_else(|| {
        ImportError::InvalidMetadata(format!(
            "{} refers to chain index {index}, but only {} chains are named",
            context(),
            chain_names.len()
        ))
    })
}

/// Chain groups of `entityList`.
pub fn entity_groups_from_mmtf(
    entities: &[MmtfEntity],
    chain_names: &[String],
) -> Result<EntityChainGroups, ImportError> {
    EntityChainGroups::from_chain_indices(
        entities.iter().map(|e| e.chain_index_list.as_slice()),
        chain_names,
    )
}

/// Descriptor of `bioAssemblyList`.
///
/// Chain indices become chain names; several chain instances may share a
/// name (e.g. a polymer and its ligands), so names are de-duplicated within
/// each operation, keeping first-use order.
pub fn assembly_descriptor_from_mmtf(
    assemblies: &[MmtfBioAssembly],
    chain_names: &[String],
) -> Result<AssemblyDescriptor, ImportError> {
    let mut descriptor = AssemblyDescriptor::new();
    for (a, assembly) in assemblies.iter().enumerate() {
        let id = if assembly.name.is_empty() {
            (a + 1).to_string()
        } else {
            assembly.name.clone()
        };
        let mut transforms = Vec::with_capacity(assembly.transform_list.len());
        for (t, transform) in assembly.transform_list.iter().enumerate() {
            let mut chain_ids: Vec<String> = Vec::new();
            for &index in &transform.chain_index_list {
                let name = chain_name(chain_names, index, || {
                    format!("operation {t} of assembly `{id}`")
                })?;
                if !chain_ids.iter().any(|c| c == name) {
                    chain_ids.push(name.to_owned());
                }
            }
            transforms.push(ChainTransform {
                chain_ids,
                matrix: Mat4::from_cols_array(&transform.matrix),
            });
        }
        descriptor.push(Assembly::new(id, transforms))?;
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn names(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_owned()).collect()
    }

    const IDENTITY: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn decodes_camel_case_records() {
        let json = r#"[{
            "name": "1",
            "transformList": [
                {"chainIndexList": [0, 1, 2],
                 "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 12.5,-3,4,1]}
            ]
        }]"#;
        let list: Vec<MmtfBioAssembly> = serde_json::from_str(json).unwrap();
        let descriptor =
            assembly_descriptor_from_mmtf(&list, &names(&["A", "A", "B"]))
                .unwrap();
        let op = &descriptor.get("1").unwrap().transforms[0];
        assert_eq!(op.chain_ids, names(&["A", "B"]));
        // column-major: the translation sits in the last four values
        assert_eq!(op.translation(), Vec3::new(12.5, -3.0, 4.0));
    }

    #[test]
    fn unnamed_assemblies_are_numbered() {
        let list = vec![
            MmtfBioAssembly {
                name: String::new(),
                transform_list: vec![MmtfTransform {
                    chain_index_list: vec![0],
                    matrix: IDENTITY,
                }],
            };
            2
        ];
        let descriptor =
            assembly_descriptor_from_mmtf(&list, &names(&["A"])).unwrap();
        assert_eq!(descriptor.ids().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn bad_chain_index_is_invalid_metadata() {
        let list = vec![MmtfBioAssembly {
            name: "1".into(),
            transform_list: vec![MmtfTransform {
                chain_index_list: vec![4],
                matrix: IDENTITY,
            }],
        }];
        let err =
            assembly_descriptor_from_mmtf(&list, &names(&["A"])).unwrap_err();
        assert!(matches!(err, ImportError::InvalidMetadata(_)));
    }

    #[test]
    fn entities_group_chains_by_index() {
        let json = r#"[
            {"chainIndexList": [0, 1], "description": "HEMOGLOBIN ALPHA", "type": "polymer"},
            {"chainIndexList": [2], "type": "water"}
        ]"#;
        let entities: Vec<MmtfEntity> = serde_json::from_str(json).unwrap();
        assert_eq!(entities[1].kind, "water");
        let groups =
            entity_groups_from_mmtf(&entities, &names(&["A", "C", "W"])).unwrap();
        assert_eq!(groups.chains(0), Some(&names(&["A", "C"])[..]));
        assert_eq!(groups.chains(1), Some(&names(&["W"])[..]));
    }
}
