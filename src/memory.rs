//! An arena-backed in-memory render surface.
//!
//! This is the reference implementation of the [`Surface`] capability: the test backend, the
//! headless rendering target, and the source of the "empty container usable as a mount target"
//! primitive. Handles are copyable arena ids; a removed node stays in the arena (detached), which
//! is exactly the identity-preserving detach/re-insert behaviour keyed moves rely on.

use crate::surface::{BoundListener, Surface};
use crate::value::Value;
use core::fmt::Write as _;
use hashbrown::HashMap;
use std::rc::Rc;

/// Identifies one node in a [`MemorySurface`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

enum NodeKind {
	Text(String),
	Element {
		tag: String,
		attrs: HashMap<String, String>,
		style: HashMap<String, String>,
		classes: Vec<String>,
		listeners: HashMap<String, Vec<BoundListener>>,
	},
	Container,
}

struct NodeData {
	kind: NodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Default)]
pub struct MemorySurface {
	nodes: Vec<NodeData>,
}

impl MemorySurface {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn push(&mut self, kind: NodeKind) -> NodeId {
		self.nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.nodes.len() - 1)
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes[node.0].parent.take() {
			self.nodes[parent.0].children.retain(|child| *child != node);
		}
	}

	// --- inspection API for tests and headless rendering ---

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Element { tag, .. } => Some(tag),
			_ => None,
		}
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Text(value) => Some(value),
			_ => None,
		}
	}

	#[must_use]
	pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
			_ => None,
		}
	}

	#[must_use]
	pub fn style_value(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.nodes[node.0].kind {
			NodeKind::Element { style, .. } => style.get(name).map(String::as_str),
			_ => None,
		}
	}

	#[must_use]
	pub fn classes(&self, node: NodeId) -> &[String] {
		match &self.nodes[node.0].kind {
			NodeKind::Element { classes, .. } => classes,
			_ => &[],
		}
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.nodes[node.0].children
	}

	/// The listeners currently attached under `event`, cloned out so the caller can fire them
	/// without holding any borrow of the surface.
	#[must_use]
	pub fn listeners(&self, node: NodeId, event: &str) -> Vec<BoundListener> {
		match &self.nodes[node.0].kind {
			NodeKind::Element { listeners, .. } => listeners.get(event).map(|l| l.iter().map(Rc::clone).collect()).unwrap_or_default(),
			_ => Vec::new(),
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId) -> usize {
		match &self.nodes[node.0].kind {
			NodeKind::Element { listeners, .. } => listeners.values().map(Vec::len).sum(),
			_ => 0,
		}
	}

	/// An HTML-ish serialization of the subtree under `node`, with attributes, styles and classes
	/// in sorted order. Containers render their children only.
	#[must_use]
	pub fn render_to_string(&self, node: NodeId) -> String {
		let mut out = String::new();
		self.render_node(node, &mut out);
		out
	}

	fn render_node(&self, node: NodeId, out: &mut String) {
		match &self.nodes[node.0].kind {
			NodeKind::Text(value) => out.push_str(value),
			NodeKind::Element { tag, attrs, style, classes, .. } => {
				let _ = write!(out, "<{}", tag);
				if !classes.is_empty() {
					let mut classes = classes.clone();
					classes.sort();
					let _ = write!(out, " class=\"{}\"", classes.join(" "));
				}
				let mut attr_names: Vec<_> = attrs.keys().collect();
				attr_names.sort();
				for name in attr_names {
					let _ = write!(out, " {}=\"{}\"", name, attrs[name]);
				}
				if !style.is_empty() {
					let mut style_names: Vec<_> = style.keys().collect();
					style_names.sort();
					out.push_str(" style=\"");
					for (i, name) in style_names.iter().enumerate() {
						if i > 0 {
							out.push(';');
						}
						let _ = write!(out, "{}:{}", name, style[*name]);
					}
					out.push('"');
				}
				out.push('>');
				for child in &self.nodes[node.0].children {
					self.render_node(*child, out);
				}
				let _ = write!(out, "</{}>", tag);
			}
			NodeKind::Container => {
				for child in &self.nodes[node.0].children {
					self.render_node(*child, out);
				}
			}
		}
	}
}

impl Surface for MemorySurface {
	type Handle = NodeId;

	fn create_text(&mut self, value: &str) -> NodeId {
		self.push(NodeKind::Text(value.to_owned()))
	}

	fn create_element(&mut self, tag: &str) -> NodeId {
		self.push(NodeKind::Element {
			tag: tag.to_owned(),
			attrs: HashMap::new(),
			style: HashMap::new(),
			classes: Vec::new(),
			listeners: HashMap::new(),
		})
	}

	fn create_container(&mut self) -> NodeId {
		self.push(NodeKind::Container)
	}

	fn set_text(&mut self, node: &NodeId, value: &str) {
		if let NodeKind::Text(current) = &mut self.nodes[node.0].kind {
			*current = value.to_owned();
		}
	}

	fn insert(&mut self, parent: &NodeId, node: &NodeId, index: Option<usize>) {
		self.detach(*node);
		let count = self.nodes[parent.0].children.len();
		let at = index.map_or(count, |i| i.min(count));
		self.nodes[parent.0].children.insert(at, *node);
		self.nodes[node.0].parent = Some(*parent);
	}

	fn remove(&mut self, node: &NodeId) {
		self.detach(*node);
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
			attrs.insert(name.to_owned(), value.to_owned());
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
			attrs.remove(name);
		}
	}

	fn set_style(&mut self, node: &NodeId, name: &str, value: &str) {
		if let NodeKind::Element { style, .. } = &mut self.nodes[node.0].kind {
			style.insert(name.to_owned(), value.to_owned());
		}
	}

	fn remove_style(&mut self, node: &NodeId, name: &str) {
		if let NodeKind::Element { style, .. } = &mut self.nodes[node.0].kind {
			style.remove(name);
		}
	}

	fn add_class(&mut self, node: &NodeId, class: &str) {
		if let NodeKind::Element { classes, .. } = &mut self.nodes[node.0].kind {
			if !classes.iter().any(|c| c == class) {
				classes.push(class.to_owned());
			}
		}
	}

	fn remove_class(&mut self, node: &NodeId, class: &str) {
		if let NodeKind::Element { classes, .. } = &mut self.nodes[node.0].kind {
			classes.retain(|c| c != class);
		}
	}

	fn add_listener(&mut self, node: &NodeId, event: &str, listener: &BoundListener) {
		if let NodeKind::Element { listeners, .. } = &mut self.nodes[node.0].kind {
			listeners.entry(event.to_owned()).or_default().push(Rc::clone(listener));
		}
	}

	fn remove_listener(&mut self, node: &NodeId, event: &str, listener: &BoundListener) {
		if let NodeKind::Element { listeners, .. } = &mut self.nodes[node.0].kind {
			if let Some(attached) = listeners.get_mut(event) {
				attached.retain(|l| !Rc::ptr_eq(l, listener));
				if attached.is_empty() {
					listeners.remove(event);
				}
			}
		}
	}

	fn position(&self, node: &NodeId) -> Option<usize> {
		let parent = self.nodes[node.0].parent?;
		self.nodes[parent.0].children.iter().position(|child| child == node)
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.nodes[node.0].parent
	}

	fn child_count(&self, parent: &NodeId) -> usize {
		self.nodes[parent.0].children.len()
	}

	fn can_host(&self, node: &NodeId) -> bool {
		matches!(self.nodes[node.0].kind, NodeKind::Element { .. } | NodeKind::Container)
	}
}

/// Convenience for tests: fires `event` on `node` with `payload`, snapshotting the listeners
/// first so the surface borrow is released before any handler runs.
pub fn fire_event(surface: &crate::surface::SharedSurface<MemorySurface>, node: NodeId, event: &str, payload: &Value) {
	let listeners = surface.borrow().listeners(node, event);
	for listener in listeners {
		listener(payload);
	}
}
