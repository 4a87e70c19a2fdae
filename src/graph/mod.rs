//! The declarative scene graph.
//!
//! A graph owns a uid-keyed map of primitives with a group at uid 0 as the
//! root. Graphs have value semantics: scenes build or clone-and-edit a
//! graph, then push the whole value to the viewport, which compiles and
//! registers it. The registered script supersedes the previous one; the
//! graph value itself is never shared mutably.

pub mod compiler;

use std::collections::{BTreeMap, HashMap};

use crate::errors::ViewPortError;
use crate::primitive::{ElementId, Primitive, Uid, ROOT_UID};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    primitives: BTreeMap<Uid, Primitive>,
    parents: HashMap<Uid, Uid>,
    ids: HashMap<ElementId, Uid>,
    next_uid: Uid,
}

impl Graph {
    /// A graph containing only the root group.
    pub fn new() -> Self {
        let mut primitives = BTreeMap::new();
        primitives.insert(ROOT_UID, Primitive::group());
        Self {
            primitives,
            parents: HashMap::new(),
            ids: HashMap::new(),
            next_uid: ROOT_UID + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        // the root group alone counts as empty
        self.primitives.len() <= 1
    }

    pub fn get(&self, uid: Uid) -> Option<&Primitive> {
        self.primitives.get(&uid)
    }

    pub fn uid_for_id(&self, id: &ElementId) -> Option<Uid> {
        self.ids.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Uid, &Primitive)> {
        self.primitives.iter().map(|(uid, p)| (*uid, p))
    }

    /// Add a primitive under `parent`, returning its uid. The parent must
    /// exist and be a group or component.
    pub fn add(&mut self, parent: Uid, primitive: Primitive) -> Result<Uid, ViewPortError> {
        if !self.primitives.contains_key(&parent) {
            return Err(ViewPortError::InvalidGraph(format!(
                "parent uid {parent} does not exist"
            )));
        }
        let uid = self.next_uid;

        {
            let parent_prim = self.primitives.get_mut(&parent).expect("checked above");
            let Some(children) = parent_prim.data.children_mut() else {
                return Err(ViewPortError::InvalidGraph(format!(
                    "parent uid {parent} cannot hold children"
                )));
            };
            children.push(uid);
        }

        if let Some(id) = &primitive.id {
            self.ids.insert(id.clone(), uid);
        }
        self.primitives.insert(uid, primitive);
        self.parents.insert(uid, parent);
        self.next_uid += 1;
        Ok(uid)
    }

    /// Add a primitive directly under the root group.
    pub fn add_to_root(&mut self, primitive: Primitive) -> Result<Uid, ViewPortError> {
        self.add(ROOT_UID, primitive)
    }

    /// Replace a primitive in place via a closure. The uid stays stable;
    /// the id side-index follows any id change.
    pub fn modify<F>(&mut self, uid: Uid, f: F) -> Result<(), ViewPortError>
    where
        F: FnOnce(&mut Primitive),
    {
        let Some(prim) = self.primitives.get_mut(&uid) else {
            return Err(ViewPortError::NotFound);
        };
        let old_id = prim.id.clone();
        f(prim);
        let new_id = prim.id.clone();
        if old_id != new_id {
            if let Some(old) = old_id {
                if self.ids.get(&old) == Some(&uid) {
                    self.ids.remove(&old);
                }
            }
            if let Some(new) = new_id {
                self.ids.insert(new, uid);
            }
        }
        Ok(())
    }

    /// Replace the primitive addressed by id.
    pub fn modify_by_id<F>(&mut self, id: &ElementId, f: F) -> Result<(), ViewPortError>
    where
        F: FnOnce(&mut Primitive),
    {
        let uid = self.uid_for_id(id).ok_or(ViewPortError::NotFound)?;
        self.modify(uid, f)
    }

    /// Delete a primitive and its subtree. The root group cannot be
    /// deleted.
    pub fn delete(&mut self, uid: Uid) -> Result<(), ViewPortError> {
        if uid == ROOT_UID {
            return Err(ViewPortError::InvalidState(
                "the root group cannot be deleted".to_string(),
            ));
        }
        if !self.primitives.contains_key(&uid) {
            return Err(ViewPortError::NotFound);
        }

        if let Some(parent) = self.parents.get(&uid).copied() {
            if let Some(parent_prim) = self.primitives.get_mut(&parent) {
                if let Some(children) = parent_prim.data.children_mut() {
                    children.retain(|c| *c != uid);
                }
            }
        }

        let mut stack = vec![uid];
        while let Some(cur) = stack.pop() {
            if let Some(prim) = self.primitives.remove(&cur) {
                if let Some(id) = &prim.id {
                    if self.ids.get(id) == Some(&cur) {
                        self.ids.remove(id);
                    }
                }
                if let Some(children) = prim.data.children() {
                    stack.extend_from_slice(children);
                }
            }
            self.parents.remove(&cur);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::PrimitiveData;

    #[test]
    fn new_graph_has_group_root() {
        let g = Graph::new();
        assert!(g.is_empty());
        assert!(matches!(
            g.get(ROOT_UID).unwrap().data,
            PrimitiveData::Group { .. }
        ));
    }

    #[test]
    fn add_assigns_monotonic_uids_and_links_parent() {
        let mut g = Graph::new();
        let a = g.add_to_root(Primitive::rect(10.0, 10.0)).unwrap();
        let b = g.add_to_root(Primitive::circle(5.0)).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(
            g.get(ROOT_UID).unwrap().data.children(),
            Some(&[1u32, 2u32][..])
        );
    }

    #[test]
    fn add_under_non_container_fails() {
        let mut g = Graph::new();
        let rect = g.add_to_root(Primitive::rect(10.0, 10.0)).unwrap();
        let err = g.add(rect, Primitive::circle(1.0)).unwrap_err();
        assert!(matches!(err, ViewPortError::InvalidGraph(_)));
    }

    #[test]
    fn modify_keeps_uid_and_updates_id_index() {
        let mut g = Graph::new();
        let uid = g
            .add_to_root(Primitive::rect(10.0, 10.0).with_id("old"))
            .unwrap();
        assert_eq!(g.uid_for_id(&"old".into()), Some(uid));

        g.modify(uid, |p| {
            p.id = Some("new".into());
        })
        .unwrap();

        assert_eq!(g.uid_for_id(&"old".into()), None);
        assert_eq!(g.uid_for_id(&"new".into()), Some(uid));
    }

    #[test]
    fn delete_removes_subtree() {
        let mut g = Graph::new();
        let group = g.add_to_root(Primitive::group()).unwrap();
        let inner = g
            .add(group, Primitive::rect(1.0, 1.0).with_id("inner"))
            .unwrap();

        g.delete(group).unwrap();
        assert!(g.get(group).is_none());
        assert!(g.get(inner).is_none());
        assert_eq!(g.uid_for_id(&"inner".into()), None);
        assert_eq!(g.get(ROOT_UID).unwrap().data.children(), Some(&[][..]));
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut g = Graph::new();
        assert!(matches!(
            g.delete(ROOT_UID),
            Err(ViewPortError::InvalidState(_))
        ));
    }
}
