use crate::value::Value;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

/// An event listener after the engine has bound it to its owning component.
///
/// The surface stores these verbatim and compares them by [`Rc`] pointer identity, so the
/// destroy/patch engines can detach exactly what was attached.
pub type BoundListener = Rc<dyn Fn(&Value)>;

/// The render-surface capability the engine consumes from its environment.
///
/// A surface is the external, stateful tree (a browser DOM, a terminal scene graph, the
/// [in-memory reference surface](crate::memory::MemorySurface)) that the engine mutates to match
/// the virtual tree. Handles are cheap identifiers for surface nodes; the engine clones and
/// compares them freely but only ever creates and releases them through this trait.
pub trait Surface: 'static {
	/// Identifies one surface node. Stays valid across [`remove`](Surface::remove), so a detached
	/// node can be re-inserted elsewhere without losing identity (this is what makes keyed moves
	/// possible).
	type Handle: Clone + PartialEq + Debug;

	/// Creates a detached text node holding `value`.
	fn create_text(&mut self, value: &str) -> Self::Handle;
	/// Creates a detached element node for `tag`.
	fn create_element(&mut self, tag: &str) -> Self::Handle;
	/// Creates an empty container usable as a mount target.
	fn create_container(&mut self) -> Self::Handle;

	/// Replaces the data of a text node.
	fn set_text(&mut self, node: &Self::Handle, value: &str);

	/// Inserts `node` into `parent` at the zero-based child `index`, appending when `index` is
	/// `None`. An index past the current child count clamps to an append; it is not an error.
	fn insert(&mut self, parent: &Self::Handle, node: &Self::Handle, index: Option<usize>);
	/// Detaches `node` from its parent. The handle stays valid.
	fn remove(&mut self, node: &Self::Handle);

	fn set_attribute(&mut self, node: &Self::Handle, name: &str, value: &str);
	fn remove_attribute(&mut self, node: &Self::Handle, name: &str);
	fn set_style(&mut self, node: &Self::Handle, name: &str, value: &str);
	fn remove_style(&mut self, node: &Self::Handle, name: &str);
	fn add_class(&mut self, node: &Self::Handle, class: &str);
	fn remove_class(&mut self, node: &Self::Handle, class: &str);

	fn add_listener(&mut self, node: &Self::Handle, event: &str, listener: &BoundListener);
	/// Detaches the listener previously attached under `event`, compared by pointer identity.
	fn remove_listener(&mut self, node: &Self::Handle, event: &str, listener: &BoundListener);

	/// The node's current ordinal position among its parent's children, or `None` if detached.
	fn position(&self, node: &Self::Handle) -> Option<usize>;
	/// The node's current parent, or `None` if detached.
	fn parent(&self, node: &Self::Handle) -> Option<Self::Handle>;
	/// The number of children currently attached to `parent`.
	fn child_count(&self, parent: &Self::Handle) -> usize;
	/// Whether `node` may host children (elements and containers; not text).
	fn can_host(&self, node: &Self::Handle) -> bool;
}

/// Shared handle to a surface.
///
/// Every engine entry point takes the shared handle and keeps its borrows short, so an event
/// listener that triggers a re-render mid-dispatch never observes an outstanding borrow.
pub type SharedSurface<S> = Rc<RefCell<S>>;
