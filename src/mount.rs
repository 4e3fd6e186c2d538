//! The mount engine: materializes a virtual node (and its subtree) onto the render surface.

use crate::app::AppContext;
use crate::component::Component;
use crate::error::Error;
use crate::node::{surface_len, Kind, VNode};
use crate::surface::{SharedSurface, Surface};
use std::rc::Rc;
use tracing::{trace, trace_span};

/// Mounts `vnode` into `parent` at `index` (append when `None`; past-the-end clamps to append).
///
/// `owner` is the component whose render produced this node; event handler bodies are bound to
/// it. `context` is only consulted when a component is instantiated without an owner (the
/// application root); everything below resolves its context through the parent chain.
///
/// Fails on a parent that cannot host children and on a slot that content projection never
/// resolved; both indicate caller misuse.
pub fn mount<S: Surface>(
	surface: &SharedSurface<S>,
	vnode: &mut VNode<S>,
	parent: &S::Handle,
	index: Option<usize>,
	owner: Option<&Rc<Component<S>>>,
	context: Option<&AppContext>,
) -> Result<(), Error> {
	if !surface.borrow().can_host(parent) {
		return Err(Error::InvalidMountTarget);
	}
	let span = trace_span!("mount", kind = vnode.kind_name());
	let _enter = span.enter();

	match &mut vnode.kind {
		Kind::Text(value) => {
			let handle = surface.borrow_mut().create_text(value);
			surface.borrow_mut().insert(parent, &handle, index);
			vnode.surface = Some(handle);
		}

		Kind::Element { tag, props, children } => {
			let handle = surface.borrow_mut().create_element(tag);
			{
				let mut surface = surface.borrow_mut();
				for (name, value) in &props.attrs {
					if !value.is_null() {
						surface.set_attribute(&handle, name, &value.to_string());
					}
				}
				for (name, value) in &props.style {
					surface.set_style(&handle, name, value);
				}
				for class in &props.class {
					surface.add_class(&handle, class);
				}
			}
			for (event, handler) in &props.on {
				let bound = Component::bind(owner, handler);
				surface.borrow_mut().add_listener(&handle, event, &bound);
				vnode.listeners.push((event.clone(), bound));
			}
			for child in children.iter_mut() {
				mount(surface, child, &handle, None, owner, context)?;
			}
			surface.borrow_mut().insert(parent, &handle, index);
			vnode.surface = Some(handle);
		}

		Kind::Fragment { children } => {
			// The fragment owns no node; its reference is the real parent, and its children land
			// contiguously at a running index.
			let base = {
				let count = surface.borrow().child_count(parent);
				index.map_or(count, |i| i.min(count))
			};
			let mut placed = 0;
			for child in children.iter_mut() {
				mount(surface, child, parent, Some(base + placed), owner, context)?;
				placed += surface_len(child);
			}
			vnode.surface = Some(parent.clone());
			vnode.anchor = Some(base);
			trace!("mounted fragment of {} surface node(s)", placed);
		}

		Kind::Slot { .. } => return Err(Error::UnresolvedSlot),

		Kind::Component { def, props, children, instance } => {
			let component = Component::create(def, props.clone(), children.clone(), owner, Rc::clone(surface), context.cloned());
			component.mount(parent, index)?;
			vnode.surface = component.first_handle();
			*instance = Some(component);
		}
	}
	Ok(())
}
