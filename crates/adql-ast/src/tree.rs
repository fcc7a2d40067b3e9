//! Arena storage and the child-cursor mutation protocol

use crate::{Arity, NodeId, NodeKind, SlotKind};
use adql_diagnostics::{ADQL0200, ADQL0201, ADQL0202, ADQL0203, ADQL0204, ADQL0205, ErrorCode};
use adql_diagnostics::TextPosition;
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;

/// A node of the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: SmallVec<[NodeId; 4]>,
    /// Source position; `None` for built or modified nodes
    pub position: Option<TextPosition>,
}

/// Tree mutation and copy failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("illegal cursor state: {0}")]
    IllegalState(&'static str),

    #[error("impossible to put a {found} where a {expected} is expected")]
    TypeMismatch {
        expected: SlotKind,
        found: &'static str,
    },

    #[error("impossible to remove a child of {node}: its children are fixed")]
    FixedArity { node: &'static str },

    #[error("impossible to remove a child of {node}: at least {min} required")]
    MinimumArity { node: &'static str, min: usize },

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("copy of {node} failed: {source}")]
    CopyFailed {
        node: NodeId,
        #[source]
        source: Box<TreeError>,
    },
}

impl TreeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TreeError::IllegalState(_) => ADQL0200,
            TreeError::TypeMismatch { .. } => ADQL0201,
            TreeError::FixedArity { .. } => ADQL0202,
            TreeError::MinimumArity { .. } => ADQL0203,
            TreeError::UnknownNode(_) => ADQL0204,
            TreeError::CopyFailed { .. } => ADQL0205,
        }
    }
}

/// Arena holding every node of one query tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id
    pub fn add(&mut self, kind: NodeKind, children: impl IntoIterator<Item = NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            children: children.into_iter().collect(),
            position: None,
        });
        id
    }

    /// Append a leaf node
    pub fn leaf(&mut self, kind: NodeKind) -> NodeId {
        self.add(kind, [])
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Node by id.
    ///
    /// Ids are only handed out by this arena, so this panics only when an id
    /// from another tree is used.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn position(&self, id: NodeId) -> Option<TextPosition> {
        self.node(id).position
    }

    pub fn set_position(&mut self, id: NodeId, position: Option<TextPosition>) {
        self.nodes[id.index()].position = position;
    }

    /// Start iterating over the children of `parent`
    pub fn cursor(&self, parent: NodeId) -> ChildCursor {
        ChildCursor::new(parent)
    }

    /// Every node reachable from `id`, in pre-order, `id` included
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Parent of `id` within the tree hanging from the root
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        let root = self.root?;
        self.descendants(root)
            .into_iter()
            .find(|&candidate| self.children(candidate).contains(&id))
    }

    /// Deep copy of the subtree rooted at `id`, stored in this same arena.
    ///
    /// The copy shares no node with the original, keeps positions and
    /// carries the same scalar data.
    pub fn copy_subtree(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        self.get(id).ok_or(TreeError::UnknownNode(id))?;
        let order = self.descendants(id);
        let mut copies = HashMap::with_capacity(order.len());
        // Reversed pre-order visits every child before its parent
        for &original in order.iter().rev() {
            let node = self.get(original).ok_or(TreeError::UnknownNode(original))?;
            let kind = node.kind.clone();
            let position = node.position;
            let children = node
                .children
                .iter()
                .map(|child| copies.get(child).copied().ok_or(TreeError::UnknownNode(*child)))
                .collect::<Result<SmallVec<[NodeId; 4]>, _>>()
                .map_err(|source| TreeError::CopyFailed {
                    node: original,
                    source: Box::new(source),
                })?;
            let copy = self.add(kind, children);
            self.set_position(copy, position);
            copies.insert(original, copy);
        }
        copies.get(&id).copied().ok_or(TreeError::UnknownNode(id))
    }

    /// Deep copy of a subtree of `other` into this arena
    pub fn import(&mut self, other: &Ast, id: NodeId) -> Result<NodeId, TreeError> {
        let node = other.get(id).ok_or(TreeError::UnknownNode(id))?;
        let mut children = SmallVec::<[NodeId; 4]>::new();
        for &child in &node.children {
            let copied = self.import(other, child).map_err(|source| TreeError::CopyFailed {
                node: id,
                source: Box::new(source),
            })?;
            children.push(copied);
        }
        let copy = self.add(node.kind.clone(), children);
        self.set_position(copy, node.position);
        Ok(copy)
    }

    /// Standalone tree made of a deep copy of the subtree at `id`
    pub fn extract(&self, id: NodeId) -> Result<Ast, TreeError> {
        let mut tree = Ast::new();
        let root = tree.import(self, id)?;
        tree.set_root(root);
        Ok(tree)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// `next` not called yet
    Fresh,
    /// Positioned on the child at `current`
    OnChild,
    /// The current child was replaced or removed
    Modified,
    Exhausted,
}

/// Iterator over the children of a node that can replace or remove the
/// child it was last positioned on.
///
/// The cursor holds no borrow of the tree; every call takes the arena, so a
/// replacement node can be built between `next` and `replace`. One
/// modification is allowed per `next`.
#[derive(Debug, Clone)]
pub struct ChildCursor {
    parent: NodeId,
    current: usize,
    upcoming: usize,
    state: CursorState,
}

impl ChildCursor {
    pub fn new(parent: NodeId) -> Self {
        Self {
            parent,
            current: 0,
            upcoming: 0,
            state: CursorState::Fresh,
        }
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Index of the child the cursor is positioned on
    pub fn index(&self) -> Option<usize> {
        (self.state == CursorState::OnChild).then_some(self.current)
    }

    /// Advance to the next child
    pub fn next(&mut self, ast: &Ast) -> Option<NodeId> {
        let child = ast.child(self.parent, self.upcoming);
        match child {
            Some(_) => {
                self.current = self.upcoming;
                self.upcoming += 1;
                self.state = CursorState::OnChild;
            }
            None => self.state = CursorState::Exhausted,
        }
        child
    }

    /// Replace the current child with `replacement`.
    ///
    /// The replacement must belong to the category the slot accepts. The
    /// parent loses its source position.
    pub fn replace(&mut self, ast: &mut Ast, replacement: NodeId) -> Result<(), TreeError> {
        self.check_positioned()?;
        let replacement_kind = ast
            .get(replacement)
            .ok_or(TreeError::UnknownNode(replacement))?
            .kind
            .clone();
        let slot = ast.kind(self.parent).slot(self.current);
        if !slot.accepts(&replacement_kind) {
            return Err(TreeError::TypeMismatch {
                expected: slot,
                found: replacement_kind.name(),
            });
        }
        let parent = &mut ast.nodes[self.parent.index()];
        parent.children[self.current] = replacement;
        parent.position = None;
        self.state = CursorState::Modified;
        log::trace!("replaced child {} of {}", self.current, self.parent);
        Ok(())
    }

    /// Remove the current child.
    ///
    /// Only list nodes above their minimum length accept removals. The next
    /// call to [`ChildCursor::next`] returns the child that followed the
    /// removed one.
    pub fn remove(&mut self, ast: &mut Ast) -> Result<(), TreeError> {
        self.check_positioned()?;
        let parent = &mut ast.nodes[self.parent.index()];
        match parent.kind.arity() {
            Arity::Fixed => {
                return Err(TreeError::FixedArity {
                    node: parent.kind.name(),
                });
            }
            Arity::List { min } if parent.children.len() <= min => {
                return Err(TreeError::MinimumArity {
                    node: parent.kind.name(),
                    min,
                });
            }
            Arity::List { .. } => {}
        }
        parent.children.remove(self.current);
        if let NodeKind::Constraints(constraints) = &mut parent.kind {
            if self.current < constraints.connectors.len() {
                constraints.connectors.remove(self.current);
            }
        }
        parent.position = None;
        self.upcoming = self.current;
        self.state = CursorState::Modified;
        log::trace!("removed child {} of {}", self.current, self.parent);
        Ok(())
    }

    /// Replace the current child, or remove it when `replacement` is `None`
    pub fn set(&mut self, ast: &mut Ast, replacement: Option<NodeId>) -> Result<(), TreeError> {
        match replacement {
            Some(node) => self.replace(ast, node),
            None => self.remove(ast),
        }
    }

    fn check_positioned(&self) -> Result<(), TreeError> {
        match self.state {
            CursorState::OnChild => Ok(()),
            CursorState::Fresh => Err(TreeError::IllegalState("next() has not been called")),
            CursorState::Modified => Err(TreeError::IllegalState(
                "the current child has already been replaced or removed",
            )),
            CursorState::Exhausted => Err(TreeError::IllegalState("no more children")),
        }
    }
}
