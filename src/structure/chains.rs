use std::collections::BTreeSet;

use serde::Serialize;

use super::AtomArray;

/// Chain identifiers of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChainIds {
    /// Distinct chain ids in sorted order.
    Labels(Vec<String>),
    /// One dense code per atom: the position of the atom's chain id in the
    /// sorted distinct list.
    Codes(Vec<u32>),
}

impl ChainIds {
    /// Number of entries (distinct chains for labels, atoms for codes).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Labels(labels) => labels.len(),
            Self::Codes(codes) => codes.len(),
        }
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The labels, if this is the label form.
    #[must_use]
    pub fn as_labels(&self) -> Option<&[String]> {
        match self {
            Self::Labels(labels) => Some(labels),
            Self::Codes(_) => None,
        }
    }

    /// The per-atom codes, if this is the code form.
    #[must_use]
    pub fn as_codes(&self) -> Option<&[u32]> {
        match self {
            Self::Codes(codes) => Some(codes),
            Self::Labels(_) => None,
        }
    }
}

impl AtomArray {
    /// Distinct chain ids, sorted.
    #[must_use]
    pub fn unique_chain_ids(&self) -> Vec<String> {
        self.chain_ids
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Dense per-atom chain codes. Codes follow the sorted order of
    /// [`AtomArray::unique_chain_ids`], so equal chain ids always share a
    /// code and distinct ids never do.
    #[must_use]
    pub fn chain_codes(&self) -> Vec<u32> {
        let labels = self.unique_chain_ids();
        self.chain_ids
            .iter()
            .map(|c| labels.binary_search(c).unwrap_or_else(|i| i) as u32)
            .collect()
    }

    /// Chain ids as sorted distinct labels, or as per-atom codes when
    /// `as_int` is set.
    #[must_use]
    pub fn chain_ids(&self, as_int: bool) -> ChainIds {
        if as_int {
            ChainIds::Codes(self.chain_codes())
        } else {
            ChainIds::Labels(self.unique_chain_ids())
        }
    }
}
