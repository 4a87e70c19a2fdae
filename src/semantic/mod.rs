//! The semantic index: a queryable map of addressable UI elements.
//!
//! Snapshots are built alongside compilation and swapped into the registry
//! together with the script, so queries always observe a consistent view of
//! one graph generation. The global id index lives in the registry and maps
//! every element id across all graphs to its `(graph, uid)` home.

use std::collections::{BTreeMap, HashMap};

use crate::math::{Aabb, Point};
use crate::primitive::{ElementId, PrimitiveKind, Uid};

/// Compile-time record of one addressable element.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticEntry {
    pub id: ElementId,
    pub uid: Uid,
    /// Logical element type, e.g. "button". Defaults to the primitive tag
    /// unless overridden by explicit metadata.
    pub kind: String,
    /// The primitive tag this entry was built from.
    pub module: PrimitiveKind,
    /// Id of the nearest addressable ancestor, or of the hosting component
    /// when this element is the top of a component sub-graph.
    pub parent_id: Option<ElementId>,
    /// Bounds in the primitive's local space.
    pub local_bounds: Aabb,
    /// Local bounds mapped through the cumulative transform to root space.
    pub screen_bounds: Aabb,
    pub clickable: bool,
    pub focusable: bool,
    pub label: Option<String>,
    pub role: Option<String>,
    pub value: Option<String>,
    pub hidden: bool,
    /// Depth from the graph root at compile time.
    pub z_index: u32,
}

/// Per-graph semantic lookup tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SemanticSnapshot {
    elements: HashMap<ElementId, SemanticEntry>,
    /// Element ids in paint order; ties in `elements_at_point` resolve to
    /// the later entry.
    order: Vec<ElementId>,
    by_type: BTreeMap<String, Vec<ElementId>>,
    by_role: BTreeMap<String, Vec<ElementId>>,
    by_primitive: BTreeMap<PrimitiveKind, Vec<ElementId>>,
    timestamp_ms: u64,
}

impl SemanticSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry in paint order. A duplicate id within one graph
    /// replaces the earlier entry but keeps its original paint position.
    pub fn insert(&mut self, entry: SemanticEntry) {
        let id = entry.id.clone();
        if !self.elements.contains_key(&id) {
            self.order.push(id.clone());
            self.by_type
                .entry(entry.kind.clone())
                .or_default()
                .push(id.clone());
            if let Some(role) = &entry.role {
                self.by_role.entry(role.clone()).or_default().push(id.clone());
            }
            self.by_primitive
                .entry(entry.module)
                .or_default()
                .push(id.clone());
        }
        self.elements.insert(id, entry);
    }

    pub fn get(&self, id: &ElementId) -> Option<&SemanticEntry> {
        self.elements.get(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Entries in paint order.
    pub fn entries(&self) -> impl Iterator<Item = &SemanticEntry> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn ids_of_type(&self, kind: &str) -> &[ElementId] {
        self.by_type.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ids_of_role(&self, role: &str) -> &[ElementId] {
        self.by_role.get(role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ids_of_primitive(&self, module: PrimitiveKind) -> &[ElementId] {
        self.by_primitive
            .get(&module)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries whose screen bounds contain the point, topmost first:
    /// z_index descending, later paint order breaking ties.
    pub fn entries_at_point(&self, p: Point) -> Vec<&SemanticEntry> {
        let mut hits: Vec<(usize, &SemanticEntry)> = self
            .entries()
            .enumerate()
            .filter(|(_, e)| !e.hidden && e.screen_bounds.contains(p))
            .collect();
        hits.sort_by(|(ia, a), (ib, b)| b.z_index.cmp(&a.z_index).then(ib.cmp(ia)));
        hits.into_iter().map(|(_, e)| e).collect()
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Stamped at registration time by the coordinator, never during
    /// compilation.
    pub fn set_timestamp_ms(&mut self, ts: u64) {
        self.timestamp_ms = ts;
    }
}

/// A reconstructed element hierarchy rooted at one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticTree {
    pub entry: SemanticEntry,
    pub children: Vec<SemanticTree>,
}

impl SemanticTree {
    /// Rebuild the subtree under `root_id` from parent links. Children
    /// appear in insertion (paint) order.
    pub fn build(snapshot: &SemanticSnapshot, root_id: &ElementId) -> Option<SemanticTree> {
        let root = snapshot.get(root_id)?.clone();
        let children = snapshot
            .entries()
            .filter(|e| e.parent_id.as_ref() == Some(root_id))
            .filter_map(|e| SemanticTree::build(snapshot, &e.id))
            .collect();
        Some(SemanticTree {
            entry: root,
            children,
        })
    }

    /// Total number of entries in the tree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(SemanticTree::size).sum::<usize>()
    }
}
