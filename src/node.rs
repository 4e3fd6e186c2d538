//! The virtual node model.
//!
//! A [`VNode`] is an immutable-until-mounted description of a render-surface node or group
//! thereof. The mount engine populates its surface bookkeeping (the owned handle and, for
//! elements, the table of listeners actually attached); the destroy engine clears it again.

use crate::component::{Component, ComponentDef, Handler};
use crate::surface::{BoundListener, Surface};
use crate::value::Value;
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use std::mem;
use std::rc::Rc;

/// The property bag of an element or component node.
///
/// `on`, `key`, `style` and `class` are the reserved sub-bags the engines treat specially; plain
/// attributes live in `attrs`.
pub struct Props<S: Surface> {
	pub attrs: HashMap<String, Value>,
	pub on: HashMap<String, Handler<S>>,
	pub key: Option<String>,
	pub style: HashMap<String, String>,
	pub class: Vec<String>,
}

impl<S: Surface> Props<S> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attrs.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn on(mut self, event: impl Into<String>, handler: Handler<S>) -> Self {
		self.on.insert(event.into(), handler);
		self
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.style.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn class(mut self, class: impl Into<String>) -> Self {
		self.class.push(class.into());
		self
	}

	/// Fills in entries from `defaults` without overriding anything already present.
	///
	/// `key` is deliberately not propagated: a contextual bag applies to a whole list, and keys
	/// must stay per-item.
	pub(crate) fn merge_defaults(&mut self, defaults: &Self) {
		for (name, value) in &defaults.attrs {
			self.attrs.entry(name.clone()).or_insert_with(|| value.clone());
		}
		for (event, handler) in &defaults.on {
			self.on.entry(event.clone()).or_insert_with(|| Rc::clone(handler));
		}
		for (name, value) in &defaults.style {
			self.style.entry(name.clone()).or_insert_with(|| value.clone());
		}
		for class in &defaults.class {
			if !self.class.contains(class) {
				self.class.push(class.clone());
			}
		}
	}
}

impl<S: Surface> Default for Props<S> {
	fn default() -> Self {
		Self {
			attrs: HashMap::new(),
			on: HashMap::new(),
			key: None,
			style: HashMap::new(),
			class: Vec::new(),
		}
	}
}

impl<S: Surface> Clone for Props<S> {
	fn clone(&self) -> Self {
		Self {
			attrs: self.attrs.clone(),
			on: self.on.iter().map(|(k, v)| (k.clone(), Rc::clone(v))).collect(),
			key: self.key.clone(),
			style: self.style.clone(),
			class: self.class.clone(),
		}
	}
}

/// A child argument to the [`VNode`] constructors.
///
/// `None` children are silently dropped, which permits conditional rendering through
/// `condition.then(…).into()`; bare strings coerce into text nodes.
pub struct Child<S: Surface>(Option<VNode<S>>);

impl<S: Surface> From<VNode<S>> for Child<S> {
	fn from(node: VNode<S>) -> Self {
		Child(Some(node))
	}
}

impl<S: Surface> From<Option<VNode<S>>> for Child<S> {
	fn from(node: Option<VNode<S>>) -> Self {
		Child(node)
	}
}

impl<S: Surface> From<&str> for Child<S> {
	fn from(text: &str) -> Self {
		Child(Some(VNode::text(text)))
	}
}

impl<S: Surface> From<String> for Child<S> {
	fn from(text: String) -> Self {
		Child(Some(VNode::text(text)))
	}
}

/// The five node variants.
pub enum Kind<S: Surface> {
	Text(String),
	Element {
		tag: String,
		props: Props<S>,
		children: Vec<VNode<S>>,
	},
	/// An ordered group with no surface representation of its own; operations target the nearest
	/// real parent.
	Fragment { children: Vec<VNode<S>> },
	/// A placeholder replaced in place by content projection before mounting.
	Slot { fallback: Vec<VNode<S>> },
	Component {
		def: Rc<ComponentDef<S>>,
		props: Props<S>,
		children: Vec<VNode<S>>,
		instance: Option<Rc<Component<S>>>,
	},
}

/// A virtual node: created fresh on every render, mounted exactly once, read by patch cycles
/// while mounted, destroyed exactly once.
pub struct VNode<S: Surface> {
	pub kind: Kind<S>,
	/// The owned surface handle (for fragments: the nearest real parent). Populated by the mount
	/// engine, transferred on each successful patch, cleared by the destroy engine.
	pub(crate) surface: Option<S::Handle>,
	/// For fragments: the child index within the real parent where this group's content begins,
	/// recorded at mount and refreshed on each patch. Lets a group that currently contributes no
	/// surface nodes regrow in place rather than at the end.
	pub(crate) anchor: Option<usize>,
	/// For elements: the listeners actually attached, so destroy/patch detach exactly these.
	pub(crate) listeners: Vec<(String, BoundListener)>,
}

impl<S: Surface> VNode<S> {
	fn with_kind(kind: Kind<S>) -> Self {
		Self {
			kind,
			surface: None,
			anchor: None,
			listeners: Vec::new(),
		}
	}

	fn gather(children: Vec<Child<S>>) -> Vec<VNode<S>> {
		children.into_iter().filter_map(|child| child.0).collect()
	}

	#[must_use]
	pub fn text(value: impl Into<String>) -> Self {
		Self::with_kind(Kind::Text(value.into()))
	}

	#[must_use]
	pub fn element(tag: impl Into<String>, props: Props<S>, children: Vec<Child<S>>) -> Self {
		Self::with_kind(Kind::Element {
			tag: tag.into(),
			props,
			children: Self::gather(children),
		})
	}

	#[must_use]
	pub fn fragment(children: Vec<Child<S>>) -> Self {
		Self::with_kind(Kind::Fragment { children: Self::gather(children) })
	}

	/// A fragment whose contextual `props` are propagated onto each non-text child (the child's
	/// own entries win). Used for merging shared props across a list without introducing a
	/// surface wrapper.
	#[must_use]
	pub fn fragment_with(props: Props<S>, children: Vec<Child<S>>) -> Self {
		let mut children = Self::gather(children);
		for child in &mut children {
			match &mut child.kind {
				Kind::Element { props: own, .. } | Kind::Component { props: own, .. } => own.merge_defaults(&props),
				_ => {}
			}
		}
		Self::with_kind(Kind::Fragment { children })
	}

	#[must_use]
	pub fn slot(fallback: Vec<Child<S>>) -> Self {
		Self::with_kind(Kind::Slot { fallback: Self::gather(fallback) })
	}

	#[must_use]
	pub fn component(def: &Rc<ComponentDef<S>>, props: Props<S>, children: Vec<Child<S>>) -> Self {
		Self::with_kind(Kind::Component {
			def: Rc::clone(def),
			props,
			children: Self::gather(children),
			instance: None,
		})
	}

	#[must_use]
	pub fn kind_name(&self) -> &'static str {
		match &self.kind {
			Kind::Text(_) => "text",
			Kind::Element { .. } => "element",
			Kind::Fragment { .. } => "fragment",
			Kind::Slot { .. } => "slot",
			Kind::Component { .. } => "component",
		}
	}

	/// The identity key, when the node carries one.
	#[must_use]
	pub fn identity_key(&self) -> Option<&str> {
		match &self.kind {
			Kind::Element { props, .. } | Kind::Component { props, .. } => props.key.as_deref(),
			_ => None,
		}
	}

	/// The surface handle this node currently owns (for fragments: its real parent).
	#[must_use]
	pub fn surface_handle(&self) -> Option<&S::Handle> {
		self.surface.as_ref()
	}

	/// The live component instance, once mounted.
	#[must_use]
	pub fn instance(&self) -> Option<&Rc<Component<S>>> {
		match &self.kind {
			Kind::Component { instance, .. } => instance.as_ref(),
			_ => None,
		}
	}

	/// Whether any node in this subtree still holds surface bookkeeping. After a destroy this is
	/// `false` for the whole tree.
	#[must_use]
	pub fn holds_surface(&self) -> bool {
		if self.surface.is_some() || !self.listeners.is_empty() {
			return true;
		}
		match &self.kind {
			Kind::Element { children, .. } | Kind::Fragment { children } => children.iter().any(VNode::holds_surface),
			Kind::Component { instance, .. } => instance.is_some(),
			_ => false,
		}
	}
}

/// Cloning yields a fresh, unmounted description: surface bookkeeping and component instances do
/// not travel with the copy.
impl<S: Surface> Clone for VNode<S> {
	fn clone(&self) -> Self {
		let kind = match &self.kind {
			Kind::Text(value) => Kind::Text(value.clone()),
			Kind::Element { tag, props, children } => Kind::Element {
				tag: tag.clone(),
				props: props.clone(),
				children: children.clone(),
			},
			Kind::Fragment { children } => Kind::Fragment { children: children.clone() },
			Kind::Slot { fallback } => Kind::Slot { fallback: fallback.clone() },
			Kind::Component { def, props, children, .. } => Kind::Component {
				def: Rc::clone(def),
				props: props.clone(),
				children: children.clone(),
				instance: None,
			},
		};
		Self::with_kind(kind)
	}
}

impl<S: Surface> Debug for VNode<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match &self.kind {
			Kind::Text(value) => write!(f, "Text({:?})", value),
			Kind::Element { tag, children, .. } => write!(f, "Element(<{}>, {} children)", tag, children.len()),
			Kind::Fragment { children } => write!(f, "Fragment({} children)", children.len()),
			Kind::Slot { fallback } => write!(f, "Slot({} fallback children)", fallback.len()),
			Kind::Component { def, .. } => write!(f, "Component({})", def.name),
		}
	}
}

/// The equality oracle: decides whether two virtual nodes at the same tree position represent the
/// same identity, i.e. whether the surface node can be reused or must be replaced.
///
/// Different variants are never equal. Text and fragment nodes are always mutually equal (their
/// content is patched in place). Elements match on tag and `key` (a missing key only equals a
/// missing key); components match on the identical definition allocation and `key`. "Not equal"
/// always triggers destroy-and-remount, never a partial patch.
#[must_use]
pub fn same_node<S: Surface>(a: &VNode<S>, b: &VNode<S>) -> bool {
	match (&a.kind, &b.kind) {
		(Kind::Text(_), Kind::Text(_)) | (Kind::Fragment { .. }, Kind::Fragment { .. }) => true,
		(
			Kind::Element { tag: tag_a, props: props_a, .. },
			Kind::Element { tag: tag_b, props: props_b, .. },
		) => tag_a == tag_b && props_a.key == props_b.key,
		(
			Kind::Component { def: def_a, props: props_a, .. },
			Kind::Component { def: def_b, props: props_b, .. },
		) => Rc::ptr_eq(def_a, def_b) && props_a.key == props_b.key,
		_ => false,
	}
}

/// The effective rendering children of a child list: descends through (and only through) nested
/// fragments. This is the sequence the patch engine reconciles.
#[must_use]
pub fn flat_refs<'a, S: Surface>(children: &'a [VNode<S>]) -> Vec<&'a VNode<S>> {
	fn walk<'a, S: Surface>(children: &'a [VNode<S>], out: &mut Vec<&'a VNode<S>>) {
		for child in children {
			if let Kind::Fragment { children } = &child.kind {
				walk(children, out);
			} else {
				out.push(child);
			}
		}
	}
	let mut out = Vec::with_capacity(children.len());
	walk(children, &mut out);
	out
}

/// Mutable flavour of [`flat_refs`], for the patch engine.
pub(crate) fn flat_muts<'a, S: Surface>(children: &'a mut [VNode<S>]) -> Vec<&'a mut VNode<S>> {
	fn walk<'a, S: Surface>(children: &'a mut [VNode<S>], out: &mut Vec<&'a mut VNode<S>>) {
		for child in children.iter_mut() {
			// The fragment test is split from the descent: the `kind` borrow must not escape
			// into the branch that moves the whole `child` reference out.
			if matches!(child.kind, Kind::Fragment { .. }) {
				if let Kind::Fragment { children } = &mut child.kind {
					walk(children, out);
				}
			} else {
				out.push(child);
			}
		}
	}
	let mut out = Vec::with_capacity(children.len());
	walk(children, &mut out);
	out
}

/// How many surface nodes a mounted virtual node currently contributes to its parent.
#[must_use]
pub fn surface_len<S: Surface>(node: &VNode<S>) -> usize {
	match &node.kind {
		Kind::Text(_) | Kind::Element { .. } => usize::from(node.surface.is_some()),
		Kind::Fragment { children } => children.iter().map(surface_len).sum(),
		Kind::Slot { .. } => 0,
		Kind::Component { instance, .. } => instance.as_ref().map_or(0, |component| component.handles().len()),
	}
}

/// The flattened surface handles a mounted virtual node owns, in tree order, descending into
/// fragments and component instances.
#[must_use]
pub fn collect_handles<S: Surface>(node: &VNode<S>) -> Vec<S::Handle> {
	fn walk<S: Surface>(node: &VNode<S>, out: &mut Vec<S::Handle>) {
		match &node.kind {
			Kind::Text(_) | Kind::Element { .. } => {
				if let Some(handle) = &node.surface {
					out.push(handle.clone());
				}
			}
			Kind::Fragment { children } => {
				for child in children {
					walk(child, out);
				}
			}
			Kind::Slot { .. } => {}
			Kind::Component { instance, .. } => {
				if let Some(component) = instance {
					out.extend(component.handles());
				}
			}
		}
	}
	let mut out = Vec::new();
	walk(node, &mut out);
	out
}

/// Content projection: replaces each slot, in place within its parent's children, with a fragment
/// wrapping either `provided` (when non-empty) or the slot's own fallback. Even an empty
/// projection becomes an empty fragment, never a hole.
///
/// The walk never descends into component subtrees: a nested component's slots are its own
/// concern, resolved when *it* renders.
pub fn project_slots<S: Surface>(node: &mut VNode<S>, provided: &[VNode<S>]) {
	if let Kind::Slot { fallback } = &mut node.kind {
		let children = if provided.is_empty() {
			mem::take(fallback)
		} else {
			provided.to_vec()
		};
		node.kind = Kind::Fragment { children };
		return;
	}
	match &mut node.kind {
		Kind::Element { children, .. } | Kind::Fragment { children } => {
			for child in children {
				project_slots(child, provided);
			}
		}
		_ => {}
	}
}
