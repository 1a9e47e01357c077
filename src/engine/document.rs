//! Document - Headless DOM-like host for the binding engine.
//!
//! The document owns every node in an arena ([`Registry`]) and exposes the
//! minimal capability set the engine needs:
//! - Node creation by [`NodeKind`] and tree edits (append, remove, release)
//! - A closed set of named properties (see [`StringProp`], [`BoolProp`])
//! - Focus tracking, scroll position, and a layout offset input
//! - Event listeners and dispatch
//! - An "attached" signal that resolves once a node gets a parent
//!
//! # Borrowing
//!
//! The document never holds its internal borrow while running user code.
//! Listeners are cloned out before dispatch, so a listener may freely edit the
//! tree, fire the notifier, or release the node it is attached to.
//!
//! # Stale handles
//!
//! Writes to a released node return `false` and leave no trace. Tree edits
//! involving a released node return [`Error::StaleNode`].

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use tracing::trace;

use super::registry::Registry;
use crate::error::{Error, Result};
use crate::types::{
    BoolProp, Caps, ESCAPE_KEY, ENTER_KEY, Event, EventKind, FocusEvent, KeyboardEvent,
    MouseEvent, NodeId, NodeKind, StringProp,
};

/// Event listener attached to a node.
pub type Listener = Rc<dyn Fn(&Document, &Event)>;

// =============================================================================
// Node Storage
// =============================================================================

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    strings: [String; StringProp::COUNT],
    flags: [bool; BoolProp::COUNT],
    scroll_top: f64,
    offset_top: f64,
    /// Property writes performed on this node (bindings, focus, scroll).
    writes: usize,
    listeners: Vec<(EventKind, Listener)>,
    attach_waiters: Vec<oneshot::Sender<()>>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            strings: Default::default(),
            flags: [false; BoolProp::COUNT],
            scroll_top: 0.0,
            offset_top: 0.0,
            writes: 0,
            listeners: Vec::new(),
            attach_waiters: Vec::new(),
        }
    }
}

struct DocumentState {
    nodes: Registry<NodeData>,
    body: NodeId,
    active: Option<NodeId>,
}

// =============================================================================
// Document Handle
// =============================================================================

/// Shared handle to a headless document. Cloning is cheap.
#[derive(Clone)]
pub struct Document {
    state: Rc<RefCell<DocumentState>>,
}

/// Non-owning handle to a [`Document`].
#[derive(Clone)]
pub struct WeakDocument {
    state: Weak<RefCell<DocumentState>>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.state.upgrade().map(|state| Document { state })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Document")
                .field("nodes", &state.nodes.len())
                .field("body", &state.body)
                .field("active", &state.active)
                .finish(),
            Err(_) => f.write_str("Document { <borrowed> }"),
        }
    }
}

impl Document {
    /// Create an empty document containing only its `body` node.
    pub fn new() -> Self {
        let mut nodes = Registry::new();
        let body = nodes.allocate(NodeData::new(NodeKind::Body));
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                nodes,
                body,
                active: None,
            })),
        }
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn ptr_eq(&self, other: &Document) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// The root node every mount attaches under.
    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Create a new detached node of the given kind.
    pub fn create_element(&self, kind: NodeKind) -> NodeId {
        let node = self.state.borrow_mut().nodes.allocate(NodeData::new(kind));
        trace!(?node, tag = kind.tag_name(), "create element");
        node
    }

    pub fn is_alive(&self, node: NodeId) -> bool {
        self.state.borrow().nodes.is_allocated(node)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.state.borrow().nodes.get(node).map(|data| data.kind)
    }

    /// Capabilities of `node`; empty for a released node.
    pub fn caps(&self, node: NodeId) -> Caps {
        self.kind(node).map_or(Caps::empty(), NodeKind::caps)
    }

    /// Number of live nodes, `body` included.
    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().nodes.get(node).and_then(|data| data.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .and_then(|data| data.children.first().copied())
    }

    /// `node` and all of its descendants, in pre-order.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let state = self.state.borrow();
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = state.nodes.get(id) {
                out.push(id);
                stack.extend(data.children.iter().rev());
            }
        }
        out
    }

    // =========================================================================
    // Tree Edits
    // =========================================================================

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent. Resolves the child's pending attach waiters.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let waiters = {
            let mut state = self.state.borrow_mut();
            if !state.nodes.is_allocated(parent) {
                return Err(Error::StaleNode(parent));
            }
            let Some(old_parent) = state.nodes.get(child).map(|data| data.parent) else {
                return Err(Error::StaleNode(child));
            };

            let mut cursor = Some(parent);
            while let Some(id) = cursor {
                if id == child {
                    return Err(Error::HierarchyRequest { parent, child });
                }
                cursor = state.nodes.get(id).and_then(|data| data.parent);
            }

            if let Some(old) = old_parent.and_then(|old| state.nodes.get_mut(old)) {
                old.children.retain(|c| *c != child);
            }
            if let Some(data) = state.nodes.get_mut(parent) {
                data.children.push(child);
            }
            match state.nodes.get_mut(child) {
                Some(data) => {
                    data.parent = Some(parent);
                    std::mem::take(&mut data.attach_waiters)
                }
                None => Vec::new(),
            }
        };

        for waiter in waiters {
            let _ = waiter.send(());
        }
        Ok(())
    }

    /// Detach `child` from `parent`. The child stays alive and may be
    /// appended again.
    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.nodes.is_allocated(parent) {
            return Err(Error::StaleNode(parent));
        }
        let Some(current) = state.nodes.get(child).map(|data| data.parent) else {
            return Err(Error::StaleNode(child));
        };
        if current != Some(parent) {
            return Err(Error::NotAChild { parent, child });
        }

        if let Some(data) = state.nodes.get_mut(parent) {
            data.children.retain(|c| *c != child);
        }
        if let Some(data) = state.nodes.get_mut(child) {
            data.parent = None;
        }
        Ok(())
    }

    /// Detach `node` and free it together with its whole subtree. Listeners
    /// and attach waiters are dropped; every handle into the subtree goes
    /// stale. Returns `false` if `node` was already released.
    pub fn release(&self, node: NodeId) -> bool {
        let subtree = self.subtree(node);
        if subtree.is_empty() {
            return false;
        }

        let dropped = {
            let mut state = self.state.borrow_mut();
            if let Some(parent) = state.nodes.get(node).and_then(|data| data.parent) {
                if let Some(data) = state.nodes.get_mut(parent) {
                    data.children.retain(|c| *c != node);
                }
            }

            let mut dropped = Vec::with_capacity(subtree.len());
            for id in &subtree {
                if let Some(data) = state.nodes.release(*id) {
                    dropped.push(data);
                }
            }
            if state.active.is_some_and(|active| subtree.contains(&active)) {
                state.active = None;
            }
            dropped
        };

        trace!(?node, released = dropped.len(), "release subtree");
        // Listener closures are dropped here, outside the borrow
        drop(dropped);
        true
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Write a string property. Returns `false` when the node is released or
    /// its kind does not support the property.
    pub fn set_string(&self, node: NodeId, prop: StringProp, value: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(node) else {
            trace!(?node, ?prop, "write to released node ignored");
            return false;
        };
        if !data.kind.caps().contains(prop.required_caps()) {
            trace!(?node, ?prop, "property not supported by node kind");
            return false;
        }
        data.strings[prop.slot()] = value.to_owned();
        data.writes += 1;
        true
    }

    pub fn string(&self, node: NodeId, prop: StringProp) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map(|data| data.strings[prop.slot()].clone())
    }

    /// Text content of `node`; empty for a released node.
    pub fn text_content(&self, node: NodeId) -> String {
        self.string(node, StringProp::TextContent).unwrap_or_default()
    }

    /// Write a boolean property. Same failure rules as [`set_string`](Self::set_string).
    pub fn set_flag(&self, node: NodeId, prop: BoolProp, value: bool) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(node) else {
            trace!(?node, ?prop, "write to released node ignored");
            return false;
        };
        if !data.kind.caps().contains(prop.required_caps()) {
            trace!(?node, ?prop, "property not supported by node kind");
            return false;
        }
        data.flags[prop.slot()] = value;
        data.writes += 1;
        true
    }

    pub fn flag(&self, node: NodeId, prop: BoolProp) -> bool {
        self.state
            .borrow()
            .nodes
            .get(node)
            .is_some_and(|data| data.flags[prop.slot()])
    }

    pub fn scroll_top(&self, node: NodeId) -> f64 {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map_or(0.0, |data| data.scroll_top)
    }

    pub fn set_scroll_top(&self, node: NodeId, value: f64) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(node) else {
            return false;
        };
        data.scroll_top = value;
        data.writes += 1;
        true
    }

    /// Vertical offset of `node` inside its parent, as laid out by the host.
    pub fn offset_top(&self, node: NodeId) -> f64 {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map_or(0.0, |data| data.offset_top)
    }

    /// Layout input from the host. Not counted as a property write.
    pub fn set_offset_top(&self, node: NodeId, value: f64) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(node) else {
            return false;
        };
        data.offset_top = value;
        true
    }

    /// Number of property writes performed on `node` since creation.
    pub fn property_writes(&self, node: NodeId) -> usize {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map_or(0, |data| data.writes)
    }

    // =========================================================================
    // Focus
    // =========================================================================

    pub fn active_element(&self) -> Option<NodeId> {
        self.state.borrow().active
    }

    /// Move focus to `node`. The previously focused node, if different,
    /// receives a blur event.
    pub fn focus(&self, node: NodeId) -> bool {
        let previous = {
            let mut state = self.state.borrow_mut();
            let Some(data) = state.nodes.get_mut(node) else {
                return false;
            };
            data.writes += 1;
            state.active.replace(node)
        };

        if let Some(previous) = previous.filter(|previous| *previous != node) {
            self.dispatch(
                previous,
                &Event::Blur(FocusEvent {
                    target: previous,
                    related_target: Some(node),
                }),
            );
        }
        true
    }

    /// Drop focus from `node` if it is the active element.
    pub fn blur(&self, node: NodeId) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if state.active != Some(node) {
                return false;
            }
            state.active = None;
        }
        self.dispatch(
            node,
            &Event::Blur(FocusEvent {
                target: node,
                related_target: None,
            }),
        );
        true
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register `listener` for `kind` events on `node`.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        listener: impl Fn(&Document, &Event) + 'static,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(data) = state.nodes.get_mut(node) else {
            return false;
        };
        data.listeners.push((kind, Rc::new(listener)));
        true
    }

    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.state.borrow().nodes.get(node).map_or(0, |data| {
            data.listeners.iter().filter(|(k, _)| *k == kind).count()
        })
    }

    /// Deliver `event` to the listeners of `node` registered for its kind, in
    /// registration order. Returns how many listeners ran.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let kind = event.kind();
        let listeners: Vec<Listener> = {
            let state = self.state.borrow();
            let Some(data) = state.nodes.get(node) else {
                return 0;
            };
            data.listeners
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, listener)| listener.clone())
                .collect()
        };

        trace!(?node, event = kind.name(), listeners = listeners.len(), "dispatch");
        for listener in &listeners {
            listener(self, event);
        }
        listeners.len()
    }

    /// Resolves to `true` once `node` has a parent (immediately if it already
    /// has one), or to `false` if the node is released first.
    pub fn when_attached(&self, node: NodeId) -> impl Future<Output = bool> + use<> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.borrow_mut();
            match state.nodes.get_mut(node) {
                Some(data) if data.parent.is_some() => {
                    let _ = tx.send(());
                }
                Some(data) => data.attach_waiters.push(tx),
                None => drop(tx),
            }
        }
        async move { rx.await.is_ok() }
    }

    // =========================================================================
    // User Interaction
    // =========================================================================

    pub fn click(&self, node: NodeId) -> usize {
        self.dispatch(node, &Event::Click(MouseEvent { target: node, button: 0 }))
    }

    pub fn double_click(&self, node: NodeId) -> usize {
        self.dispatch(node, &Event::DoubleClick(MouseEvent { target: node, button: 0 }))
    }

    pub fn key_up(&self, node: NodeId, key_code: u32) -> usize {
        self.dispatch(node, &Event::KeyUp(keyboard_event(node, key_code)))
    }

    pub fn key_down(&self, node: NodeId, key_code: u32) -> usize {
        self.dispatch(node, &Event::KeyDown(keyboard_event(node, key_code)))
    }

    /// Simulate the user typing: replace the value of a text input and
    /// deliver a key-up for the last character typed.
    pub fn input_text(&self, node: NodeId, text: &str) -> usize {
        {
            let mut state = self.state.borrow_mut();
            let Some(data) = state.nodes.get_mut(node) else {
                return 0;
            };
            if !data.kind.caps().contains(Caps::TEXT_INPUT) {
                return 0;
            }
            data.strings[StringProp::Value.slot()] = text.to_owned();
        }
        let key_code = text.chars().last().map_or(0, |c| c as u32);
        self.key_up(node, key_code)
    }

    /// Simulate the user clicking a checkbox: flip `checked`, then deliver
    /// the click.
    pub fn toggle_checked(&self, node: NodeId) -> usize {
        {
            let mut state = self.state.borrow_mut();
            let Some(data) = state.nodes.get_mut(node) else {
                return 0;
            };
            if !data.kind.caps().contains(Caps::CHECK) {
                return 0;
            }
            let slot = BoolProp::Checked.slot();
            data.flags[slot] = !data.flags[slot];
        }
        self.click(node)
    }
}

fn keyboard_event(target: NodeId, key_code: u32) -> KeyboardEvent {
    let key = match key_code {
        ENTER_KEY => "Enter".to_owned(),
        ESCAPE_KEY => "Escape".to_owned(),
        code => char::from_u32(code).map(String::from).unwrap_or_default(),
    };
    KeyboardEvent {
        target,
        key_code,
        key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InputType;
    use futures::executor::block_on;
    use std::cell::Cell;

    #[test]
    fn test_tree_edits() {
        let doc = Document::new();
        let body = doc.body();
        let list = doc.create_element(NodeKind::Ul);
        let a = doc.create_element(NodeKind::Li);
        let b = doc.create_element(NodeKind::Li);

        doc.append_child(body, list).unwrap();
        doc.append_child(list, a).unwrap();
        doc.append_child(list, b).unwrap();

        assert_eq!(doc.children(list), vec![a, b]);
        assert_eq!(doc.parent(a), Some(list));
        assert_eq!(doc.first_child(list), Some(a));
        assert_eq!(doc.subtree(list), vec![list, a, b]);

        doc.remove_child(list, a).unwrap();
        assert_eq!(doc.children(list), vec![b]);
        assert_eq!(doc.parent(a), None);
        assert_eq!(
            doc.remove_child(list, a),
            Err(Error::NotAChild { parent: list, child: a })
        );
    }

    #[test]
    fn test_append_moves_node() {
        let doc = Document::new();
        let first = doc.create_element(NodeKind::Div);
        let second = doc.create_element(NodeKind::Div);
        let child = doc.create_element(NodeKind::Span);

        doc.append_child(first, child).unwrap();
        doc.append_child(second, child).unwrap();

        assert!(doc.children(first).is_empty());
        assert_eq!(doc.children(second), vec![child]);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let doc = Document::new();
        let outer = doc.create_element(NodeKind::Div);
        let inner = doc.create_element(NodeKind::Div);
        doc.append_child(outer, inner).unwrap();

        assert_eq!(
            doc.append_child(inner, outer),
            Err(Error::HierarchyRequest { parent: inner, child: outer })
        );
        assert!(doc.append_child(outer, outer).is_err());
    }

    #[test]
    fn test_release_makes_subtree_stale() {
        let doc = Document::new();
        let body = doc.body();
        let outer = doc.create_element(NodeKind::Div);
        let inner = doc.create_element(NodeKind::Span);
        doc.append_child(body, outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        assert!(doc.release(outer));
        assert!(!doc.is_alive(outer));
        assert!(!doc.is_alive(inner));
        assert!(doc.children(body).is_empty());
        assert_eq!(doc.node_count(), 1);

        // Writes to stale nodes are tolerated
        assert!(!doc.set_string(inner, StringProp::TextContent, "late"));
        assert!(!doc.release(outer));
        assert_eq!(doc.append_child(body, inner), Err(Error::StaleNode(inner)));
    }

    #[test]
    fn test_property_caps() {
        let doc = Document::new();
        let div = doc.create_element(NodeKind::Div);
        let input = doc.create_element(NodeKind::Input(InputType::Text));

        assert!(doc.set_string(div, StringProp::ClassName, "box"));
        assert!(!doc.set_string(div, StringProp::Value, "x"));
        assert!(!doc.set_flag(div, BoolProp::Disabled, true));
        assert!(doc.set_flag(input, BoolProp::Disabled, true));
        assert!(doc.flag(input, BoolProp::Disabled));

        assert_eq!(doc.property_writes(div), 1);
        assert_eq!(doc.property_writes(input), 1);
    }

    #[test]
    fn test_focus_moves_and_blurs() {
        let doc = Document::new();
        let a = doc.create_element(NodeKind::Input(InputType::Text));
        let b = doc.create_element(NodeKind::Input(InputType::Text));
        let blurred = Rc::new(Cell::new(0));

        let counter = blurred.clone();
        doc.add_event_listener(a, EventKind::Blur, move |_, event| {
            if let Event::Blur(focus) = event {
                assert_eq!(focus.related_target, Some(b));
            }
            counter.set(counter.get() + 1);
        });

        assert!(doc.focus(a));
        assert_eq!(doc.active_element(), Some(a));
        assert!(doc.focus(b));
        assert_eq!(doc.active_element(), Some(b));
        assert_eq!(blurred.get(), 1);
        assert!(!doc.blur(a));
        assert!(doc.blur(b));
        assert_eq!(doc.active_element(), None);
    }

    #[test]
    fn test_listener_can_release_its_node() {
        let doc = Document::new();
        let button = doc.create_element(NodeKind::Button);
        doc.add_event_listener(button, EventKind::Click, |doc, event| {
            doc.release(event.target());
        });

        assert_eq!(doc.click(button), 1);
        assert!(!doc.is_alive(button));
        assert_eq!(doc.click(button), 0);
    }

    #[test]
    fn test_input_text_and_toggle() {
        let doc = Document::new();
        let text = doc.create_element(NodeKind::Input(InputType::Text));
        let check = doc.create_element(NodeKind::Input(InputType::Checkbox));
        let keys = Rc::new(Cell::new(0));

        let seen = keys.clone();
        doc.add_event_listener(text, EventKind::KeyUp, move |_, event| {
            if let Event::KeyUp(key) = event {
                seen.set(key.key_code);
            }
        });

        doc.input_text(text, "hi");
        assert_eq!(doc.string(text, StringProp::Value).as_deref(), Some("hi"));
        assert_eq!(keys.get(), 'i' as u32);
        // User edits are not binding writes
        assert_eq!(doc.property_writes(text), 0);

        doc.toggle_checked(check);
        assert!(doc.flag(check, BoolProp::Checked));
    }

    #[test]
    fn test_when_attached() {
        let doc = Document::new();
        let parent = doc.create_element(NodeKind::Div);
        let child = doc.create_element(NodeKind::Span);
        let orphan = doc.create_element(NodeKind::Span);

        let attached = doc.when_attached(child);
        let never = doc.when_attached(orphan);
        doc.append_child(parent, child).unwrap();
        doc.release(orphan);

        assert!(block_on(attached));
        assert!(!block_on(never));
        // Already attached resolves immediately
        assert!(block_on(doc.when_attached(child)));
    }

    #[test]
    fn test_attach_signal_outlives_handle() {
        let doc = Document::new();
        let child = doc.create_element(NodeKind::Span);

        let attached = {
            let handle = doc.clone();
            handle.when_attached(child)
        };
        doc.append_child(doc.body(), child).unwrap();
        assert!(block_on(attached));
    }
}
