//! Entity resolution: broadcast per-entity chain lists onto atoms.
//!
//! An entity is one molecular species of a structure file (one kind of
//! protein chain, one ligand type, ...). Files list, per entity, the chains
//! that are copies of it. [`resolve_entity_ids`] turns that grouping into one
//! entity index per atom.

use rustc_hash::FxHashMap;

use super::AtomArray;
use crate::error::ImportError;

// ---------------------------------------------------------------------------
// EntityChainGroups
// ---------------------------------------------------------------------------

/// Chain ids grouped by entity. The position of a group is its entity index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityChainGroups {
    groups: Vec<Vec<String>>,
}

impl EntityChainGroups {
    /// Grouping with no entities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity listing `chain_ids`; returns its entity index.
    pub fn push_entity<I, S>(&mut self, chain_ids: I) -> u32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push(chain_ids.into_iter().map(Into::into).collect());
        (self.groups.len() - 1) as u32
    }

    /// Build from MMTF-style chain index lists: each entity lists indices
    /// into `chain_names`.
    pub fn from_chain_indices<'a>(
        entity_chain_indices: impl IntoIterator<Item = &'a [usize]>,
        chain_names: &[String],
    ) -> Result<Self, ImportError> {
        let mut groups = Self::new();
        for (entity, indices) in entity_chain_indices.into_iter().enumerate() {
            let chains = indices
                .iter()
                .map(|&i| {
                    chain_names.get(i).cloned().ok_or_else(|| {
                        ImportError::InvalidMetadata(format!(
                            "entity {entity} lists chain index {i}, but only {} \
                             chains are named",
                            chain_names.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let _ = groups.push_entity(chains);
        }
        Ok(groups)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no entity is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Chains listed by entity `index`.
    #[must_use]
    pub fn chains(&self, index: usize) -> Option<&[String]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    /// `(entity index, chains)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, chains)| (i as u32, chains.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// ChainEntityMap
// ---------------------------------------------------------------------------

/// A chain claimed by a second entity after a first one already owned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainClaimConflict {
    /// The contested chain id.
    pub chain_id: String,
    /// Entity that keeps the chain.
    pub owner: u32,
    /// Entity whose claim was ignored.
    pub ignored: u32,
}

/// Chain id -> entity index lookup.
///
/// The first entity listing a chain owns it. Well-formed files never list a
/// chain twice; later claims are ignored and kept in
/// [`ChainEntityMap::conflicts`].
#[derive(Debug, Clone, Default)]
pub struct ChainEntityMap {
    map: FxHashMap<String, u32>,
    conflicts: Vec<ChainClaimConflict>,
}

impl ChainEntityMap {
    /// Build the lookup from an entity grouping.
    #[must_use]
    pub fn from_groups(groups: &EntityChainGroups) -> Self {
        let mut map = FxHashMap::default();
        let mut conflicts = Vec::new();
        for (entity, chains) in groups.iter() {
            for chain_id in chains {
                if let Some(&owner) = map.get(chain_id) {
                    if owner != entity {
                        log::debug!(
                            "chain {chain_id} listed by entities {owner} and \
                             {entity}; keeping {owner}"
                        );
                        conflicts.push(ChainClaimConflict {
                            chain_id: chain_id.clone(),
                            owner,
                            ignored: entity,
                        });
                    }
                    continue;
                }
                let _ = map.insert(chain_id.clone(), entity);
            }
        }
        Self { map, conflicts }
    }

    /// Entity owning `chain_id`.
    #[must_use]
    pub fn get(&self, chain_id: &str) -> Option<u32> {
        self.map.get(chain_id).copied()
    }

    /// Number of mapped chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no chain is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Ignored duplicate claims, in the order they were met.
    #[must_use]
    pub fn conflicts(&self) -> &[ChainClaimConflict] {
        &self.conflicts
    }

    /// Map every chain id to its entity. Fails on the first chain id that no
    /// entity lists.
    pub fn entity_ids<S: AsRef<str>>(
        &self,
        chain_ids: &[S],
    ) -> Result<Vec<u32>, ImportError> {
        chain_ids
            .iter()
            .map(|c| {
                let c = c.as_ref();
                self.get(c).ok_or_else(|| ImportError::MissingChainMapping {
                    chain_id: c.to_owned(),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// One entity index per chain id in `chain_ids`.
///
/// Fails with [`ImportError::MissingChainMapping`] when a chain id belongs
/// to no entity.
pub fn resolve_entity_ids<S: AsRef<str>>(
    chain_ids: &[S],
    groups: &EntityChainGroups,
) -> Result<Vec<u32>, ImportError> {
    ChainEntityMap::from_groups(groups).entity_ids(chain_ids)
}

/// Resolve entity ids for every atom of `atoms` and attach them as its
/// `entity_id` column. On failure the array is left untouched.
pub fn set_atom_entity_ids<'a>(
    atoms: &'a mut AtomArray,
    groups: &EntityChainGroups,
) -> Result<&'a [u32], ImportError> {
    let ids = resolve_entity_ids(atoms.chain_id(), groups)?;
    atoms.set_entity_ids(ids)?;
    Ok(atoms.entity_id().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::structure::Atom;

    fn atoms_on(chains: &[&str]) -> AtomArray {
        AtomArray::from_atoms(chains.iter().enumerate().map(|(i, c)| {
            Atom::new(*c, "ALA", i as i32 + 1, "CA", "C", Vec3::ZERO)
        }))
    }

    fn groups(entities: &[&[&str]]) -> EntityChainGroups {
        let mut groups = EntityChainGroups::new();
        for chains in entities {
            let _ = groups.push_entity(chains.iter().copied());
        }
        groups
    }

    #[test]
    fn single_entity_covers_both_chains() {
        let mut atoms = atoms_on(&["A", "A", "B", "B"]);
        let ids = set_atom_entity_ids(&mut atoms, &groups(&[&["A", "B"]]))
            .unwrap()
            .to_vec();
        assert_eq!(ids, vec![0, 0, 0, 0]);
        assert_eq!(atoms.entity_id(), Some(&ids[..]));
    }

    #[test]
    fn one_entity_per_chain() {
        let atoms = atoms_on(&["A", "B", "A", "B"]);
        let ids =
            resolve_entity_ids(atoms.chain_id(), &groups(&[&["A"], &["B"]]))
                .unwrap();
        assert_eq!(ids, vec![0, 1, 0, 1]);
    }

    #[test]
    fn same_chain_always_same_entity() {
        let chains = ["C", "A", "B", "C", "A", "D"];
        let ids = resolve_entity_ids(
            &chains,
            &groups(&[&["A", "D"], &["B"], &["C"]]),
        )
        .unwrap();
        assert_eq!(ids.len(), chains.len());
        for i in 0..chains.len() {
            for j in 0..chains.len() {
                if chains[i] == chains[j] {
                    assert_eq!(ids[i], ids[j]);
                }
            }
        }
    }

    #[test]
    fn first_claim_wins() {
        let map = ChainEntityMap::from_groups(&groups(&[&["A", "B"], &["B"]]));
        assert_eq!(map.get("B"), Some(0));
        assert_eq!(
            map.conflicts(),
            &[ChainClaimConflict {
                chain_id: "B".into(),
                owner: 0,
                ignored: 1,
            }]
        );
    }

    #[test]
    fn unknown_chain_is_reported() {
        let mut atoms = atoms_on(&["A", "Z"]);
        let err = set_atom_entity_ids(&mut atoms, &groups(&[&["A"]]))
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingChainMapping { ref chain_id } if chain_id == "Z"
        ));
        assert!(atoms.entity_id().is_none());
    }

    #[test]
    fn chain_indices_resolve_through_names() {
        let names = vec!["A".to_owned(), "B".to_owned(), "C".to_owned()];
        let indices: [&[usize]; 2] = [&[0, 2], &[1]];
        let groups =
            EntityChainGroups::from_chain_indices(indices, &names).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.chains(0), Some(&["A".to_owned(), "C".to_owned()][..]));
        assert_eq!(groups.chains(1), Some(&["B".to_owned()][..]));
    }

    #[test]
    fn chain_index_out_of_range_is_invalid() {
        let names = vec!["A".to_owned()];
        let indices: [&[usize]; 1] = [&[0, 3]];
        assert!(matches!(
            EntityChainGroups::from_chain_indices(indices, &names),
            Err(ImportError::InvalidMetadata(_))
        ));
    }
}
