//! Concurrent registries shared between the coordinator and its readers.
//!
//! The coordinator is the only writer. Every value is wrapped in an `Arc`
//! and replaced wholesale, never mutated in place, so a reader holding a
//! clone keeps a consistent generation and a reader racing a writer sees
//! the old entry or the new one, never a torn mix. Lock hold times are a
//! map operation long on both sides.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::input::router::InputList;
use crate::primitive::{ElementId, Uid};
use crate::scene::SceneId;
use crate::script::{GraphId, Script};
use crate::semantic::SemanticSnapshot;

/// One registered script generation.
#[derive(Debug, Clone)]
pub struct ScriptEntry {
    pub graph_id: GraphId,
    pub script: Arc<Script>,
    pub input_list: Arc<InputList>,
    pub semantics: Option<Arc<SemanticSnapshot>>,
    pub owner: SceneId,
}

#[derive(Debug, Default)]
pub struct Registries {
    semantics_enabled: bool,
    scripts: RwLock<HashMap<GraphId, Arc<ScriptEntry>>>,
    semantics: RwLock<HashMap<GraphId, Arc<SemanticSnapshot>>>,
    id_index: RwLock<HashMap<ElementId, (GraphId, Uid)>>,
}

impl Registries {
    pub fn new(semantics_enabled: bool) -> Self {
        Self {
            semantics_enabled,
            ..Default::default()
        }
    }

    pub fn semantics_enabled(&self) -> bool {
        self.semantics_enabled
    }

    pub fn get_entry(&self, id: &GraphId) -> Option<Arc<ScriptEntry>> {
        self.scripts.read().unwrap().get(id).cloned()
    }

    pub fn get_script(&self, id: &GraphId) -> Option<Arc<Script>> {
        self.get_entry(id).map(|e| e.script.clone())
    }

    pub fn input_list(&self, id: &GraphId) -> Option<Arc<InputList>> {
        self.get_entry(id).map(|e| e.input_list.clone())
    }

    /// All registered graph ids, sorted for stable output.
    pub fn list_ids(&self) -> Vec<GraphId> {
        let mut ids: Vec<GraphId> = self.scripts.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn snapshot(&self, id: &GraphId) -> Option<Arc<SemanticSnapshot>> {
        self.semantics.read().unwrap().get(id).cloned()
    }

    /// All semantic snapshots, sorted by graph id for stable query output.
    pub fn snapshots(&self) -> Vec<(GraphId, Arc<SemanticSnapshot>)> {
        let mut out: Vec<(GraphId, Arc<SemanticSnapshot>)> = self
            .semantics
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        out.sort_by(|(a, _), (b, _)| a.cmp(b));
        out
    }

    /// Where an element id lives. Cross-graph collisions resolve to the
    /// most recently written graph.
    pub fn lookup_id(&self, id: &ElementId) -> Option<(GraphId, Uid)> {
        self.id_index.read().unwrap().get(id).cloned()
    }

    /// Graph ids owned by a scene, for termination cleanup.
    pub(crate) fn owned_by(&self, owner: SceneId) -> Vec<GraphId> {
        self.scripts
            .read()
            .unwrap()
            .values()
            .filter(|e| e.owner == owner)
            .map(|e| e.graph_id.clone())
            .collect()
    }

    /// Replace (or create) one graph's entry, keeping the semantic table
    /// and the id index in step.
    pub(crate) fn insert(&self, entry: ScriptEntry) {
        let graph_id = entry.graph_id.clone();
        let new_snapshot = entry.semantics.clone();

        let old = self
            .scripts
            .write()
            .unwrap()
            .insert(graph_id.clone(), Arc::new(entry));

        {
            let mut index = self.id_index.write().unwrap();
            if let Some(old) = &old {
                if let Some(old_snap) = &old.semantics {
                    for e in old_snap.entries() {
                        if index.get(&e.id).map(|(g, _)| g) == Some(&graph_id) {
                            index.remove(&e.id);
                        }
                    }
                }
            }
            if let Some(snap) = &new_snapshot {
                for e in snap.entries() {
                    index.insert(e.id.clone(), (graph_id.clone(), e.uid));
                }
            }
        }

        let mut semantics = self.semantics.write().unwrap();
        match new_snapshot {
            Some(snap) => {
                semantics.insert(graph_id, snap);
            }
            None => {
                semantics.remove(&graph_id);
            }
        }
    }

    /// Remove one graph's entry and its semantic slices.
    pub(crate) fn remove(&self, id: &GraphId) -> Option<Arc<ScriptEntry>> {
        let removed = self.scripts.write().unwrap().remove(id)?;

        if let Some(snap) = self.semantics.write().unwrap().remove(id) {
            let mut index = self.id_index.write().unwrap();
            for e in snap.entries() {
                if index.get(&e.id).map(|(g, _)| g) == Some(id) {
                    index.remove(&e.id);
                }
            }
        }
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;
    use crate::primitive::PrimitiveKind;
    use crate::semantic::SemanticEntry;

    fn entry_with_semantics(graph: &str, owner: SceneId, ids: &[&str]) -> ScriptEntry {
        let mut snap = SemanticSnapshot::new();
        for (i, id) in ids.iter().enumerate() {
            snap.insert(SemanticEntry {
                id: (*id).into(),
                uid: i as Uid + 1,
                kind: "rect".into(),
                module: PrimitiveKind::Rect,
                parent_id: None,
                local_bounds: Aabb::ZERO,
                screen_bounds: Aabb::ZERO,
                clickable: false,
                focusable: false,
                label: None,
                role: None,
                value: None,
                hidden: false,
                z_index: 1,
            });
        }
        ScriptEntry {
            graph_id: graph.into(),
            script: Arc::new(Script::empty()),
            input_list: Arc::new(InputList::default()),
            semantics: Some(Arc::new(snap)),
            owner,
        }
    }

    #[test]
    fn insert_and_lookup() {
        let reg = Registries::new(true);
        let owner = SceneId::new();
        reg.insert(entry_with_semantics("g1", owner, &["a", "b"]));

        assert!(reg.get_script(&"g1".into()).is_some());
        assert_eq!(reg.list_ids(), vec![GraphId::from("g1")]);
        assert_eq!(reg.lookup_id(&"a".into()), Some(("g1".into(), 1)));
    }

    #[test]
    fn reinsert_drops_stale_ids() {
        let reg = Registries::new(true);
        let owner = SceneId::new();
        reg.insert(entry_with_semantics("g1", owner, &["a", "b"]));
        reg.insert(entry_with_semantics("g1", owner, &["b", "c"]));

        assert_eq!(reg.lookup_id(&"a".into()), None);
        assert!(reg.lookup_id(&"b".into()).is_some());
        assert!(reg.lookup_id(&"c".into()).is_some());
    }

    #[test]
    fn id_collision_latest_writer_wins() {
        let reg = Registries::new(true);
        let owner = SceneId::new();
        reg.insert(entry_with_semantics("g1", owner, &["shared"]));
        reg.insert(entry_with_semantics("g2", owner, &["shared"]));

        assert_eq!(reg.lookup_id(&"shared".into()).unwrap().0, GraphId::from("g2"));

        // removing g1 must not disturb g2's claim
        reg.remove(&"g1".into());
        assert_eq!(reg.lookup_id(&"shared".into()).unwrap().0, GraphId::from("g2"));
    }

    #[test]
    fn remove_clears_all_tables() {
        let reg = Registries::new(true);
        let owner = SceneId::new();
        reg.insert(entry_with_semantics("g1", owner, &["a"]));

        assert!(reg.remove(&"g1".into()).is_some());
        assert!(reg.get_entry(&"g1".into()).is_none());
        assert!(reg.snapshot(&"g1".into()).is_none());
        assert_eq!(reg.lookup_id(&"a".into()), None);
        assert!(reg.remove(&"g1".into()).is_none());
    }

    #[test]
    fn owned_by_filters_by_scene() {
        let reg = Registries::new(true);
        let s1 = SceneId::new();
        let s2 = SceneId::new();
        reg.insert(entry_with_semantics("a", s1, &[]));
        reg.insert(entry_with_semantics("b", s2, &[]));
        reg.insert(entry_with_semantics("c", s1, &[]));

        let mut owned = reg.owned_by(s1);
        owned.sort();
        assert_eq!(owned, vec![GraphId::from("a"), GraphId::from("c")]);
    }
}
