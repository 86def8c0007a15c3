//! Secondary structure annotation.
//!
//! PDBx files list helices and strands as residue ranges
//! (`_struct_conf`, `_struct_sheet_range`) whose ids carry the kind as a
//! prefix (`HELX_P1`, `STRN44`, `TURN_TY1_P68`). These ranges are broadcast
//! onto atoms as one small integer per atom.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::AtomArray;
use crate::error::ImportError;

/// Secondary structure class of a residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SecondaryStructure {
    /// Not part of a polymer (ligands, ions, water).
    None = 0,
    /// Any helix.
    Helix = 1,
    /// Beta strand.
    Strand = 2,
    /// Turns, bends and unassigned polymer residues.
    Loop = 3,
}

impl SecondaryStructure {
    /// Class of a `_struct_conf` / `_struct_sheet_range` id.
    #[must_use]
    pub fn from_conf_id(id: &str) -> Self {
        if id.starts_with("HELX") {
            Self::Helix
        } else if id.starts_with("STRN") {
            Self::Strand
        } else {
            Self::Loop
        }
    }

    /// Numeric code stored in the `sec_struct` column.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Numeric code of a secondary structure id: 1 helix, 2 strand, 3 other.
#[must_use]
pub fn ss_id_to_numeric(id: &str) -> u8 {
    SecondaryStructure::from_conf_id(id).code()
}

/// One annotated residue range, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryStructureRange {
    /// Conformation id, e.g. `HELX_P1`.
    pub id: String,
    /// Chain the range lies on.
    pub chain_id: String,
    /// First residue id.
    pub start_res_id: i32,
    /// Last residue id.
    pub end_res_id: i32,
}

impl SecondaryStructureRange {
    fn contains(&self, res_id: i32) -> bool {
        (self.start_res_id..=self.end_res_id).contains(&res_id)
    }
}

/// One secondary structure code per atom.
///
/// Atoms inside a range take its class; a later range overrides an earlier
/// one. Other polymer atoms are [`SecondaryStructure::Loop`], hetero atoms
/// [`SecondaryStructure::None`]. A range ending before it starts is
/// [`ImportError::InvalidMetadata`].
pub fn resolve_sec_struct(
    atoms: &AtomArray,
    ranges: &[SecondaryStructureRange],
) -> Result<Vec<u8>, ImportError> {
    let mut by_chain: FxHashMap<&str, Vec<&SecondaryStructureRange>> =
        FxHashMap::default();
    for range in ranges {
        if range.end_res_id < range.start_res_id {
            return Err(ImportError::InvalidMetadata(format!(
                "secondary structure `{}` ends at residue {} before it starts \
                 at {}",
                range.id, range.end_res_id, range.start_res_id
            )));
        }
        by_chain.entry(range.chain_id.as_str()).or_default().push(range);
    }

    let codes = atoms
        .chain_id()
        .iter()
        .zip(atoms.res_id())
        .zip(atoms.hetero())
        .map(|((chain, &res_id), &hetero)| {
            let class = by_chain
                .get(chain.as_str())
                .and_then(|ranges| ranges.iter().rev().find(|r| r.contains(res_id)))
                .map(|r| SecondaryStructure::from_conf_id(&r.id));
            match class {
                Some(class) => class.code(),
                None if hetero => SecondaryStructure::None.code(),
                None => SecondaryStructure::Loop.code(),
            }
        })
        .collect();
    Ok(codes)
}

/// Resolve secondary structure for every atom of `atoms` and attach it as
/// its `sec_struct` column. On failure the array is left untouched.
pub fn set_atom_sec_struct<'a>(
    atoms: &'a mut AtomArray,
    ranges: &[SecondaryStructureRange],
) -> Result<&'a [u8], ImportError> {
    let codes = resolve_sec_struct(atoms, ranges)?;
    atoms.set_sec_struct(codes)?;
    Ok(atoms.sec_struct().unwrap_or_default())
}
