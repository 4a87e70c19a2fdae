//! The graph compiler: depth-first flatten into a drawing script, an input
//! list, and a semantic snapshot.
//!
//! Compilation is a pure function of the graph and options. Equal graph
//! values compile to byte-identical scripts, which is what lets the
//! registry detect no-op updates without diffing structures.

use std::collections::HashSet;

use crate::errors::ViewPortError;
use crate::graph::Graph;
use crate::input::router::{InputEntry, InputList, InputNode};
use crate::input::InputClasses;
use crate::math::Matrix;
use crate::primitive::{ElementId, Primitive, PrimitiveData, PrimitiveKind, Uid, ROOT_UID};
use crate::scene::SceneId;
use crate::script::{Script, ScriptCommand};
use crate::semantic::{SemanticEntry, SemanticSnapshot};
use crate::style::{StyleSet, StyleValue};

/// Options for one compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Scene that owns the resulting registry entry; stamped into every
    /// input entry so hits route back to it.
    pub owner: SceneId,
    /// Semantic parent for the graph's top-level entries. Set to the
    /// hosting component's id when compiling a component sub-scene.
    pub parent_id: Option<ElementId>,
    /// Whether to build the semantic snapshot at all.
    pub semantics: bool,
}

impl CompileOptions {
    pub fn new(owner: SceneId) -> Self {
        Self {
            owner,
            parent_id: None,
            semantics: true,
        }
    }

    pub fn with_parent_id(mut self, id: impl Into<ElementId>) -> Self {
        self.parent_id = Some(id.into());
        self
    }

    pub fn with_semantics(mut self, on: bool) -> Self {
        self.semantics = on;
        self
    }
}

/// Everything one graph compiles to.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub script: Script,
    pub input_list: InputList,
    pub semantics: Option<SemanticSnapshot>,
}

/// Compile a graph. Nothing is committed on failure.
pub fn compile(graph: &Graph, opts: &CompileOptions) -> Result<Compiled, ViewPortError> {
    match graph.get(ROOT_UID) {
        Some(p) if matches!(p.data, PrimitiveData::Group { .. }) => {}
        Some(_) => {
            return Err(ViewPortError::InvalidGraph(
                "root primitive must be a group".to_string(),
            ))
        }
        None => {
            return Err(ViewPortError::InvalidGraph(
                "graph has no root primitive".to_string(),
            ))
        }
    }

    let mut cx = Cx {
        graph,
        opts,
        commands: Vec::new(),
        nodes: Vec::new(),
        semantics: if opts.semantics {
            Some(SemanticSnapshot::new())
        } else {
            None
        },
        visited: HashSet::new(),
    };

    cx.walk(
        ROOT_UID,
        Matrix::IDENTITY,
        &StyleSet::new(),
        opts.parent_id.clone(),
        0,
        false,
    )?;

    Ok(Compiled {
        script: Script::from_commands(cx.commands),
        input_list: InputList { nodes: cx.nodes },
        semantics: cx.semantics,
    })
}

struct Cx<'a> {
    graph: &'a Graph,
    opts: &'a CompileOptions,
    commands: Vec<ScriptCommand>,
    nodes: Vec<InputNode>,
    semantics: Option<SemanticSnapshot>,
    visited: HashSet<Uid>,
}

impl Cx<'_> {
    fn walk(
        &mut self,
        uid: Uid,
        inherited_tf: Matrix,
        inherited_styles: &StyleSet,
        parent_sem: Option<ElementId>,
        depth: u32,
        inherited_hidden: bool,
    ) -> Result<(), ViewPortError> {
        if !self.visited.insert(uid) {
            return Err(ViewPortError::InvalidGraph(format!(
                "uid {uid} is referenced more than once (cycle or duplicate child)"
            )));
        }
        let prim = self.graph.get(uid).ok_or_else(|| {
            ViewPortError::InvalidGraph(format!("child uid {uid} is missing from the graph"))
        })?;
        prim.data
            .validate()
            .map_err(ViewPortError::InvalidGraph)?;

        // once hidden, the whole subtree stays undrawn and untestable
        let hidden = inherited_hidden || prim.styles.hidden();

        let local_tf = prim.transform.to_matrix();
        let cumulative = inherited_tf.mul(&local_tf);
        let merged = prim.styles.merged_over(inherited_styles);

        let style_commands = style_commands(&prim.styles);
        let needs_state =
            !hidden && (!prim.transform.is_identity() || !style_commands.is_empty());

        if needs_state {
            self.commands.push(ScriptCommand::PushState);
            if !prim.transform.is_identity() {
                if local_tf.is_translation() {
                    self.commands
                        .push(ScriptCommand::Translate(local_tf.tx(), local_tf.ty()));
                } else {
                    self.commands.push(ScriptCommand::Transform(local_tf));
                }
            }
            self.commands.extend(style_commands);
        }

        if !hidden {
            prim.data.commands(&mut self.commands);
            self.collect_input(uid, prim, &merged, cumulative);
        }

        let parent_for_children = if self.semantics.is_some() {
            self.register_semantic(uid, prim, &merged, cumulative, depth, parent_sem, hidden)
        } else {
            parent_sem
        };

        if let Some(children) = prim.data.children() {
            let children = children.to_vec();
            for child in children {
                self.walk(
                    child,
                    cumulative,
                    &merged,
                    parent_for_children.clone(),
                    depth + 1,
                    hidden,
                )?;
            }
        }

        if needs_state {
            self.commands.push(ScriptCommand::PopState);
        }
        Ok(())
    }

    fn collect_input(&mut self, uid: Uid, prim: &Primitive, merged: &StyleSet, cumulative: Matrix) {
        match &prim.data {
            // references always descend so nested graphs stay reachable
            PrimitiveData::ScriptRef { id } | PrimitiveData::ComponentRef { id, .. } => {
                self.nodes.push(InputNode::Graph {
                    graph_id: id.clone(),
                    transform: cumulative,
                });
            }
            PrimitiveData::Group { .. } => {}
            data => {
                let classes = merged.input_classes();
                if !classes.is_empty() {
                    self.nodes.push(InputNode::Prim(InputEntry {
                        uid,
                        transform: cumulative,
                        shape: data.clone(),
                        owner: self.opts.owner,
                        classes,
                        id: prim.id.clone(),
                    }));
                }
            }
        }
    }

    /// Record a semantic entry when the primitive is addressable, returning
    /// the parent id the children should inherit.
    fn register_semantic(
        &mut self,
        uid: Uid,
        prim: &Primitive,
        merged: &StyleSet,
        cumulative: Matrix,
        depth: u32,
        parent_sem: Option<ElementId>,
        hidden: bool,
    ) -> Option<ElementId> {
        let has_usable_id = prim
            .id
            .as_ref()
            .is_some_and(|id| id.as_str() != "_root_");
        if !has_usable_id && prim.semantic.is_none() {
            return parent_sem;
        }

        let module = prim.data.kind();
        let element_id = prim
            .id
            .clone()
            .unwrap_or_else(|| ElementId::from(format!("{module}#{uid}")));

        let meta = prim.semantic.clone().unwrap_or_default();
        let classes = merged.input_classes();

        let kind = meta.kind.unwrap_or_else(|| match module {
            PrimitiveKind::ComponentRef => "component".to_string(),
            other => other.to_string(),
        });
        let clickable = meta.clickable.unwrap_or_else(|| {
            module == PrimitiveKind::ComponentRef || classes.contains(InputClasses::CURSOR_BUTTON)
        });
        let label = meta.label.or_else(|| match &prim.data {
            PrimitiveData::Text { text } => Some(text.clone()),
            _ => None,
        });

        let local_bounds = prim.data.bounds(merged);
        let screen_bounds = cumulative.transform_aabb(local_bounds);

        let entry = SemanticEntry {
            id: element_id.clone(),
            uid,
            kind,
            module,
            parent_id: parent_sem,
            local_bounds,
            screen_bounds,
            clickable,
            focusable: meta.focusable.unwrap_or(false),
            label,
            role: meta.role,
            value: meta.value,
            hidden,
            z_index: depth,
        };

        if let Some(snap) = &mut self.semantics {
            snap.insert(entry);
        }
        Some(element_id)
    }
}

/// Wire commands for the styles a primitive sets explicitly. `input` and
/// `hidden` shape compilation itself and have no draw-state command here.
fn style_commands(styles: &StyleSet) -> Vec<ScriptCommand> {
    let mut out = Vec::new();
    for style in styles.iter() {
        match style {
            StyleValue::Fill(color) => out.push(ScriptCommand::FillColor(*color)),
            StyleValue::Stroke { width, color } => {
                out.push(ScriptCommand::StrokeColor(*color));
                out.push(ScriptCommand::StrokeWidth(*width));
            }
            StyleValue::Font(name) => out.push(ScriptCommand::Font(name.clone())),
            StyleValue::FontSize(size) => out.push(ScriptCommand::FontSize(*size)),
            StyleValue::TextAlign(align) => out.push(ScriptCommand::TextAlign(*align)),
            StyleValue::TextBase(base) => out.push(ScriptCommand::TextBase(*base)),
            StyleValue::LineCap(cap) => out.push(ScriptCommand::LineCap(*cap)),
            StyleValue::LineJoin(join) => out.push(ScriptCommand::LineJoin(*join)),
            StyleValue::MiterLimit(limit) => out.push(ScriptCommand::MiterLimit(*limit)),
            StyleValue::Scissor(rect) => out.push(ScriptCommand::Scissor(*rect)),
            StyleValue::Hidden(_) | StyleValue::Input(_) => {}
        }
    }
    out
}
