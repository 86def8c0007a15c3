//! Columnar atom storage.
//!
//! An [`AtomArray`] keeps one column per atom annotation (coordinates,
//! element, chain, residue, b-factor, charge, ...) plus a bond list. Column
//! lengths are checked whenever an array is built, so every accessor can index
//! any column with the same atom index.
//!
//! [`AtomStack`] pairs an array with the coordinates of every model of a
//! multi-model file (NMR ensembles, trajectories).

mod chains;
pub mod entity;
pub mod secondary;
mod solvent;

pub use chains::ChainIds;
use glam::Vec3;
use serde::{Deserialize, Serialize};
pub use solvent::is_solvent_residue;

use crate::error::ImportError;

// ---------------------------------------------------------------------------
// Atom
// ---------------------------------------------------------------------------

/// A single atom record, used to append rows to an [`AtomArray`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Atom {
    /// Cartesian position in Angstrom.
    pub position: Vec3,
    /// Element symbol (e.g. "C", "FE").
    pub element: String,
    /// Atom name within its residue (e.g. "CA").
    pub atom_name: String,
    /// Residue name (e.g. "ALA", "HOH").
    pub res_name: String,
    /// Residue sequence number.
    pub res_id: i32,
    /// Chain identifier, possibly multi-character for mmCIF.
    pub chain_id: String,
    /// Temperature factor.
    pub b_factor: f32,
    /// Formal charge.
    pub charge: i32,
    /// Whether the atom came from a HETATM record.
    pub hetero: bool,
}

impl Atom {
    /// Atom with the identifying fields set and neutral crystallographic
    /// factors.
    pub fn new(
        chain_id: impl Into<String>,
        res_name: impl Into<String>,
        res_id: i32,
        atom_name: impl Into<String>,
        element: impl Into<String>,
        position: Vec3,
    ) -> Self {
        Self {
            position,
            element: element.into(),
            atom_name: atom_name.into(),
            res_name: res_name.into(),
            res_id,
            chain_id: chain_id.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// AtomColumns (serialized form)
// ---------------------------------------------------------------------------

/// Raw column form of an [`AtomArray`], as found in structure documents.
///
/// `b_factors`, `charges` and `hetero` may be omitted; they are filled with
/// neutral values when the array is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AtomColumns {
    /// Atom positions.
    pub positions: Vec<Vec3>,
    /// Element symbols.
    pub elements: Vec<String>,
    /// Atom names.
    pub atom_names: Vec<String>,
    /// Residue names.
    pub res_names: Vec<String>,
    /// Residue sequence numbers.
    pub res_ids: Vec<i32>,
    /// Chain identifiers.
    pub chain_ids: Vec<String>,
    /// Temperature factors.
    pub b_factors: Vec<f32>,
    /// Formal charges.
    pub charges: Vec<i32>,
    /// HETATM flags.
    pub hetero: Vec<bool>,
    /// Entity index per atom, when already resolved.
    pub entity_ids: Option<Vec<u32>>,
    /// Secondary structure code per atom, when already assigned.
    pub sec_struct: Option<Vec<u8>>,
    /// Bonds as atom index pairs.
    pub bonds: Vec<[u32; 2]>,
}

fn fill_optional<T: Clone>(column: &mut Vec<T>, len: usize, value: T) {
    if column.is_empty() {
        column.resize(len, value);
    }
}

fn check_column(name: &str, actual: usize, expected: usize) -> Result<(), ImportError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ImportError::InvalidStructure(format!(
            "column `{name}` has {actual} entries for {expected} atoms"
        )))
    }
}

impl TryFrom<AtomColumns> for AtomArray {
    type Error = ImportError;

    fn try_from(mut columns: AtomColumns) -> Result<Self, Self::Error> {
        let len = columns.positions.len();
        fill_optional(&mut columns.b_factors, len, 0.0);
        fill_optional(&mut columns.charges, len, 0);
        fill_optional(&mut columns.hetero, len, false);

        check_column("elements", columns.elements.len(), len)?;
        check_column("atom_names", columns.atom_names.len(), len)?;
        check_column("res_names", columns.res_names.len(), len)?;
        check_column("res_ids", columns.res_ids.len(), len)?;
        check_column("chain_ids", columns.chain_ids.len(), len)?;
        check_column("b_factors", columns.b_factors.len(), len)?;
        check_column("charges", columns.charges.len(), len)?;
        check_column("hetero", columns.hetero.len(), len)?;
        if let Some(entity_ids) = &columns.entity_ids {
            check_column("entity_ids", entity_ids.len(), len)?;
        }
        if let Some(sec_struct) = &columns.sec_struct {
            check_column("sec_struct", sec_struct.len(), len)?;
        }
        for &[a, b] in &columns.bonds {
            check_bond(a, b, len)?;
        }

        Ok(Self {
            positions: columns.positions,
            elements: columns.elements,
            atom_names: columns.atom_names,
            res_names: columns.res_names,
            res_ids: columns.res_ids,
            chain_ids: columns.chain_ids,
            b_factors: columns.b_factors,
            charges: columns.charges,
            hetero: columns.hetero,
            entity_ids: columns.entity_ids,
            sec_struct: columns.sec_struct,
            bonds: columns.bonds,
        })
    }
}

impl From<AtomArray> for AtomColumns {
    fn from(array: AtomArray) -> Self {
        Self {
            positions: array.positions,
            elements: array.elements,
            atom_names: array.atom_names,
            res_names: array.res_names,
            res_ids: array.res_ids,
            chain_ids: array.chain_ids,
            b_factors: array.b_factors,
            charges: array.charges,
            hetero: array.hetero,
            entity_ids: array.entity_ids,
            sec_struct: array.sec_struct,
            bonds: array.bonds,
        }
    }
}

fn check_bond(a: u32, b: u32, len: usize) -> Result<(), ImportError> {
    if (a as usize) < len && (b as usize) < len {
        Ok(())
    } else {
        Err(ImportError::InvalidStructure(format!(
            "bond ({a}, {b}) references an atom outside 0..{len}"
        )))
    }
}

// ---------------------------------------------------------------------------
// AtomArray
// ---------------------------------------------------------------------------

/// Columnar atom annotations with a bond list.
///
/// All columns always have the same length. The `entity_id` and
/// `sec_struct` columns are the only ones that may be absent; they are
/// attached by [`entity::set_atom_entity_ids`] and
/// [`secondary::set_atom_sec_struct`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AtomColumns", into = "AtomColumns")]
pub struct AtomArray {
    positions: Vec<Vec3>,
    elements: Vec<String>,
    atom_names: Vec<String>,
    res_names: Vec<String>,
    res_ids: Vec<i32>,
    chain_ids: Vec<String>,
    b_factors: Vec<f32>,
    charges: Vec<i32>,
    hetero: Vec<bool>,
    entity_ids: Option<Vec<u32>>,
    sec_struct: Option<Vec<u8>>,
    bonds: Vec<[u32; 2]>,
}

impl AtomArray {
    /// Empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an array from atom records, without bonds.
    pub fn from_atoms(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut array = Self::new();
        for atom in atoms {
            let _ = array.push(atom);
        }
        array
    }

    /// Append an atom and return its index.
    ///
    /// Appending drops previously attached entity and secondary structure
    /// columns, since they no longer cover every atom.
    pub fn push(&mut self, atom: Atom) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(atom.position);
        self.elements.push(atom.element);
        self.atom_names.push(atom.atom_name);
        self.res_names.push(atom.res_name);
        self.res_ids.push(atom.res_id);
        self.chain_ids.push(atom.chain_id);
        self.b_factors.push(atom.b_factor);
        self.charges.push(atom.charge);
        self.hetero.push(atom.hetero);
        self.entity_ids = None;
        self.sec_struct = None;
        index
    }

    /// Add a bond between two existing atoms.
    pub fn add_bond(&mut self, a: u32, b: u32) -> Result<(), ImportError> {
        check_bond(a, b, self.len())?;
        self.bonds.push([a, b]);
        Ok(())
    }

    /// Number of atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the array holds no atoms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Reassemble the record of atom `index`.
    #[must_use]
    pub fn atom(&self, index: usize) -> Option<Atom> {
        Some(Atom {
            position: *self.positions.get(index)?,
            element: self.elements[index].clone(),
            atom_name: self.atom_names[index].clone(),
            res_name: self.res_names[index].clone(),
            res_id: self.res_ids[index],
            chain_id: self.chain_ids[index].clone(),
            b_factor: self.b_factors[index],
            charge: self.charges[index],
            hetero: self.hetero[index],
        })
    }

    // -- Column access --

    /// Atom positions.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Element symbols.
    #[must_use]
    pub fn element(&self) -> &[String] {
        &self.elements
    }

    /// Atom names.
    #[must_use]
    pub fn atom_name(&self) -> &[String] {
        &self.atom_names
    }

    /// Residue names.
    #[must_use]
    pub fn res_name(&self) -> &[String] {
        &self.res_names
    }

    /// Residue sequence numbers.
    #[must_use]
    pub fn res_id(&self) -> &[i32] {
        &self.res_ids
    }

    /// Chain identifier of every atom.
    #[must_use]
    pub fn chain_id(&self) -> &[String] {
        &self.chain_ids
    }

    /// Temperature factors.
    #[must_use]
    pub fn b_factor(&self) -> &[f32] {
        &self.b_factors
    }

    /// Formal charges.
    #[must_use]
    pub fn charge(&self) -> &[i32] {
        &self.charges
    }

    /// HETATM flags.
    #[must_use]
    pub fn hetero(&self) -> &[bool] {
        &self.hetero
    }

    /// Entity index of every atom, if resolved.
    #[must_use]
    pub fn entity_id(&self) -> Option<&[u32]> {
        self.entity_ids.as_deref()
    }

    /// Secondary structure code of every atom, if assigned.
    #[must_use]
    pub fn sec_struct(&self) -> Option<&[u8]> {
        self.sec_struct.as_deref()
    }

    /// Bonds as atom index pairs.
    #[must_use]
    pub fn bonds(&self) -> &[[u32; 2]] {
        &self.bonds
    }

    // -- Mutation --

    /// Attach the entity column. Fails if it does not cover every atom.
    pub fn set_entity_ids(
        &mut self,
        entity_ids: Vec<u32>,
    ) -> Result<(), ImportError> {
        check_column("entity_ids", entity_ids.len(), self.len())?;
        self.entity_ids = Some(entity_ids);
        Ok(())
    }

    /// Drop the entity column.
    pub fn clear_entity_ids(&mut self) {
        self.entity_ids = None;
    }

    /// Attach the secondary structure column. Fails if it does not cover
    /// every atom.
    pub fn set_sec_struct(&mut self, codes: Vec<u8>) -> Result<(), ImportError> {
        check_column("sec_struct", codes.len(), self.len())?;
        self.sec_struct = Some(codes);
        Ok(())
    }

    /// Drop the secondary structure column.
    pub fn clear_sec_struct(&mut self) {
        self.sec_struct = None;
    }

    /// Replace all positions (one per atom).
    pub fn set_positions(
        &mut self,
        positions: Vec<Vec3>,
    ) -> Result<(), ImportError> {
        check_column("positions", positions.len(), self.len())?;
        self.positions = positions;
        Ok(())
    }

    /// Translate every atom by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for p in &mut self.positions {
            *p += offset;
        }
    }

    /// Mean atom position, `None` for an empty array.
    #[must_use]
    pub fn centroid(&self) -> Option<Vec3> {
        centroid(&self.positions)
    }

    /// Keep the atoms whose `mask` entry is true. Bonds between kept atoms
    /// are re-indexed, bonds touching removed atoms are dropped.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, ImportError> {
        check_column("mask", mask.len(), self.len())?;
        let remap = mask_remap(mask);

        fn pick<T: Clone>(column: &[T], mask: &[bool]) -> Vec<T> {
            column
                .iter()
                .zip(mask)
                .filter(|&(_, &keep)| keep)
                .map(|(v, _)| v.clone())
                .collect()
        }

        let bonds = self
            .bonds
            .iter()
            .filter_map(|&[a, b]| {
                Some([remap[a as usize]?, remap[b as usize]?])
            })
            .collect();

        Ok(Self {
            positions: pick(&self.positions, mask),
            elements: pick(&self.elements, mask),
            atom_names: pick(&self.atom_names, mask),
            res_names: pick(&self.res_names, mask),
            res_ids: pick(&self.res_ids, mask),
            chain_ids: pick(&self.chain_ids, mask),
            b_factors: pick(&self.b_factors, mask),
            charges: pick(&self.charges, mask),
            hetero: pick(&self.hetero, mask),
            entity_ids: self.entity_ids.as_deref().map(|ids| pick(ids, mask)),
            sec_struct: self.sec_struct.as_deref().map(|ss| pick(ss, mask)),
            bonds,
        })
    }

    /// Mask selecting every atom that is not part of a solvent residue.
    #[must_use]
    pub fn non_solvent_mask(&self) -> Vec<bool> {
        self.res_names
            .iter()
            .map(|name| !is_solvent_residue(name))
            .collect()
    }
}

/// Old index -> new index for the atoms a mask keeps.
fn mask_remap(mask: &[bool]) -> Vec<Option<u32>> {
    let mut next = 0u32;
    mask.iter()
        .map(|&keep| {
            keep.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

fn centroid(positions: &[Vec3]) -> Option<Vec3> {
    if positions.is_empty() {
        return None;
    }
    let sum: Vec3 = positions.iter().copied().sum();
    Some(sum / positions.len() as f32)
}

// ---------------------------------------------------------------------------
// AtomStack
// ---------------------------------------------------------------------------

/// An [`AtomArray`] together with the coordinates of every model in the
/// source file. `models[0]` always equals the array's own positions.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomStack {
    atoms: AtomArray,
    models: Vec<Vec<Vec3>>,
}

impl AtomStack {
    /// Single-model stack.
    #[must_use]
    pub fn new(atoms: AtomArray) -> Self {
        let models = vec![atoms.positions().to_vec()];
        Self { atoms, models }
    }

    /// Stack over several models. The array takes the first model's
    /// coordinates; every model must cover every atom.
    pub fn with_models(
        mut atoms: AtomArray,
        models: Vec<Vec<Vec3>>,
    ) -> Result<Self, ImportError> {
        let Some(first) = models.first() else {
            return Ok(Self::new(atoms));
        };
        for (i, model) in models.iter().enumerate() {
            check_column(&format!("model {i}"), model.len(), atoms.len())?;
        }
        atoms.set_positions(first.clone())?;
        Ok(Self { atoms, models })
    }

    /// Annotations and first-model coordinates.
    #[must_use]
    pub fn atoms(&self) -> &AtomArray {
        &self.atoms
    }

    pub(crate) fn atoms_mut(&mut self) -> &mut AtomArray {
        &mut self.atoms
    }

    /// Number of models.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Coordinates of model `index`.
    #[must_use]
    pub fn model(&self, index: usize) -> Option<&[Vec3]> {
        self.models.get(index).map(Vec::as_slice)
    }

    /// Per-frame coordinate collection: every model for multi-model
    /// structures, empty for single-model ones.
    #[must_use]
    pub fn frames(&self) -> &[Vec<Vec3>] {
        if self.models.len() > 1 {
            &self.models
        } else {
            &[]
        }
    }

    /// Keep the atoms selected by `mask` in the array and in every model.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, ImportError> {
        let atoms = self.atoms.filter(mask)?;
        let models = self
            .models
            .iter()
            .map(|model| {
                model
                    .iter()
                    .zip(mask)
                    .filter(|&(_, &keep)| keep)
                    .map(|(p, _)| *p)
                    .collect()
            })
            .collect();
        Ok(Self { atoms, models })
    }

    /// Drop water and other solvent residues.
    pub fn without_solvent(&self) -> Result<Self, ImportError> {
        self.filter(&self.atoms.non_solvent_mask())
    }

    /// Translate every model so the first model's centroid sits at the
    /// origin. Returns the applied offset.
    pub fn centre(&mut self) -> Vec3 {
        let Some(c) = self.atoms.centroid() else {
            return Vec3::ZERO;
        };
        let offset = -c;
        self.atoms.translate(offset);
        for model in &mut self.models {
            for p in model.iter_mut() {
                *p += offset;
            }
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water(res_id: i32, x: f32) -> Atom {
        let mut atom = Atom::new("A", "HOH", res_id, "O", "O", Vec3::new(x, 0.0, 0.0));
        atom.hetero = true;
        atom
    }

    fn sample() -> AtomArray {
        let mut array = AtomArray::from_atoms([
            Atom::new("A", "ALA", 1, "N", "N", Vec3::new(0.0, 0.0, 0.0)),
            water(100, 5.0),
            Atom::new("A", "ALA", 1, "CA", "C", Vec3::new(1.0, 0.0, 0.0)),
            Atom::new("A", "ALA", 1, "C", "C", Vec3::new(2.0, 0.0, 0.0)),
        ]);
        array.add_bond(0, 2).unwrap();
        array.add_bond(2, 3).unwrap();
        array
    }

    #[test]
    fn push_keeps_columns_aligned() {
        let array = sample();
        assert_eq!(array.len(), 4);
        assert_eq!(array.chain_id().len(), 4);
        assert_eq!(array.b_factor(), &[0.0; 4]);
        assert_eq!(array.atom(1).unwrap().res_name, "HOH");
        assert!(array.atom(4).is_none());
    }

    #[test]
    fn bond_to_missing_atom_is_rejected() {
        let mut array = sample();
        assert!(matches!(
            array.add_bond(0, 9),
            Err(ImportError::InvalidStructure(_))
        ));
    }

    #[test]
    fn entity_column_must_cover_every_atom() {
        let mut array = sample();
        assert!(array.set_entity_ids(vec![0, 0]).is_err());
        array.set_entity_ids(vec![0, 1, 0, 0]).unwrap();
        assert_eq!(array.entity_id(), Some(&[0, 1, 0, 0][..]));
        array.clear_entity_ids();
        assert!(array.entity_id().is_none());
    }

    #[test]
    fn filter_reindexes_bonds() {
        let mut array = sample();
        array.add_bond(1, 3).unwrap();
        let kept = array.filter(&array.non_solvent_mask()).unwrap();
        assert_eq!(kept.len(), 3);
        assert!(kept.res_name().iter().all(|r| r == "ALA"));
        // (0,2) -> (0,1), (2,3) -> (1,2), the water bond is gone
        assert_eq!(kept.bonds(), &[[0, 1], [1, 2]]);
    }

    #[test]
    fn deserialize_fills_optional_columns() {
        let json = r#"{
            "positions": [[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]],
            "elements": ["N", "C"],
            "atom_names": ["N", "CA"],
            "res_names": ["GLY", "GLY"],
            "res_ids": [1, 1],
            "chain_ids": ["A", "A"],
            "bonds": [[0, 1]]
        }"#;
        let array: AtomArray = serde_json::from_str(json).unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array.charge(), &[0, 0]);
        assert_eq!(array.hetero(), &[false, false]);
        assert!(array.entity_id().is_none());
    }

    #[test]
    fn deserialize_rejects_short_columns() {
        let json = r#"{
            "positions": [[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]],
            "elements": ["N"],
            "atom_names": ["N", "CA"],
            "res_names": ["GLY", "GLY"],
            "res_ids": [1, 1],
            "chain_ids": ["A", "A"]
        }"#;
        let err = serde_json::from_str::<AtomArray>(json).unwrap_err();
        assert!(err.to_string().contains("elements"));
    }

    #[test]
    fn stack_centre_moves_every_model() {
        let atoms = AtomArray::from_atoms([
            Atom::new("A", "GLY", 1, "CA", "C", Vec3::new(1.0, 1.0, 1.0)),
            Atom::new("A", "GLY", 2, "CA", "C", Vec3::new(3.0, 1.0, 1.0)),
        ]);
        let models = vec![
            vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 1.0, 1.0)],
            vec![Vec3::new(2.0, 1.0, 1.0), Vec3::new(4.0, 1.0, 1.0)],
        ];
        let mut stack = AtomStack::with_models(atoms, models).unwrap();
        let offset = stack.centre();
        assert_eq!(offset, Vec3::new(-2.0, -1.0, -1.0));
        assert_eq!(stack.atoms().centroid(), Some(Vec3::ZERO));
        assert_eq!(stack.model(1).unwrap()[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(stack.frames().len(), 2);
    }

    #[test]
    fn single_model_has_no_frames() {
        let stack = AtomStack::new(sample());
        assert_eq!(stack.model_count(), 1);
        assert!(stack.frames().is_empty());
        let dry = stack.without_solvent().unwrap();
        assert_eq!(dry.atoms().len(), 3);
        assert_eq!(dry.model(0).unwrap().len(), 3);
    }

    #[test]
    fn models_must_match_atom_count() {
        let result = AtomStack::with_models(sample(), vec![vec![Vec3::ZERO]]);
        assert!(matches!(result, Err(ImportError::InvalidStructure(_))));
    }
}
