//! The two result views the Orchestrator assembles a walker's output into:
//! a `category -> id -> Struct` map (`Hierarchic`) and its sorted flattening
//! (`Flat`), the shape every serializer consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Struct;

/// `category -> (id -> Struct)`. `category` is typically a source file path
/// or logical group; `BTreeMap` keeps both levels lexicographically ordered
/// so egress is deterministic regardless of walker schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchic(BTreeMap<String, BTreeMap<String, Struct>>);

impl Hierarchic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `st` under `category`/`id`. A later insert for the same key
    /// overwrites the earlier one -- the walker only calls this once per id
    /// by construction (dedup happens upstream), so overwrite is a no-op in
    /// practice, not a conflict-resolution policy.
    pub fn insert(&mut self, category: impl Into<String>, id: impl Into<String>, st: Struct) {
        self.0.entry(category.into()).or_default().insert(id.into(), st);
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|byid| byid.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.values().map(|byid| byid.len()).sum()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn get(&self, category: &str, id: &str) -> Option<&Struct> {
        self.0.get(category)?.get(id)
    }

    /// All `(id, Struct)` pairs under `category`, in id order. Used by
    /// `SyncApply` to rewrite every struct belonging to one source file
    /// without re-deriving the full flattening.
    pub fn entries_in(&self, category: &str) -> impl Iterator<Item = (&str, &Struct)> {
        self.0.get(category).into_iter().flat_map(|byid| byid.iter().map(|(id, st)| (id.as_str(), st)))
    }

    /// Flattens to a single sequence, sorted by `(category, id)` -- the
    /// egress order every on-disk serializer writes.
    pub fn flatten(&self) -> Flat {
        let mut entries = Vec::with_capacity(self.len());
        for (category, byid) in &self.0 {
            for (id, st) in byid {
                entries.push((category.clone(), id.clone(), st.clone()));
            }
        }
        Flat(entries)
    }
}

/// A sorted `(category, id, Struct)` sequence -- what `Bytes` serializers
/// (JSON/XML/CSV/Markdown) actually iterate over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flat(Vec<(String, String, Struct)>);

impl Flat {
    pub fn sorted(&self) -> &[(String, String, Struct)] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String, Struct)> {
        self.0.iter()
    }

    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.0.iter().map(|(_, _, st)| st)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(name: &str) -> Struct {
        Struct { name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn flatten_is_sorted_by_category_then_id() {
        let mut h = Hierarchic::new();
        h.insert("b.rs", "id2", st("Z"));
        h.insert("a.rs", "id1", st("Y"));
        h.insert("a.rs", "id0", st("X"));
        let flat = h.flatten();
        let names: Vec<&str> = flat.structs().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn len_and_is_empty() {
        let mut h = Hierarchic::new();
        assert!(h.is_empty());
        h.insert("a.rs", "id0", st("X"));
        assert_eq!(h.len(), 1);
        assert!(!h.is_empty());
    }
}
