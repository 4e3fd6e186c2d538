//! The patch engine: reconciles a previously-mounted tree with a freshly-rendered description,
//! reusing surface nodes wherever identity is preserved and replacing wholesale where it is not.

use crate::app::AppContext;
use crate::component::Component;
use crate::destroy::destroy;
use crate::diff::{diff_maps, diff_slices, ListOp};
use crate::error::Error;
use crate::mount::mount;
use crate::node::{collect_handles, flat_muts, flat_refs, same_node, surface_len, Kind, Props, VNode};
use crate::surface::{BoundListener, SharedSurface, Surface};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{trace, trace_span};

/// Patches the mounted `old` tree into the shape described by `new`.
///
/// Surface bookkeeping migrates from `old` to `new`: afterwards `new` is the mounted tree and
/// `old` holds nothing. When the two roots do not share identity (per [`same_node`]), the old
/// subtree is destroyed and `new` is mounted in its place.
pub fn patch<S: Surface>(
	surface: &SharedSurface<S>,
	old: &mut VNode<S>,
	new: &mut VNode<S>,
	owner: Option<&Rc<Component<S>>>,
	context: Option<&AppContext>,
) -> Result<(), Error> {
	if !same_node(old, new) {
		return replace(surface, old, new, owner, context);
	}
	let span = trace_span!("patch", kind = new.kind_name());
	let _enter = span.enter();

	match (&mut old.kind, &mut new.kind) {
		(Kind::Text(previous), Kind::Text(current)) => {
			let handle = old.surface.take().expect("patched an unmounted text node");
			if previous != current {
				surface.borrow_mut().set_text(&handle, current);
			}
			new.surface = Some(handle);
		}

		(
			Kind::Element { props: old_props, children: old_children, .. },
			Kind::Element { props: new_props, children: new_children, .. },
		) => {
			let handle = old.surface.take().expect("patched an unmounted element node");
			patch_plain_props(surface, &handle, old_props, new_props);
			rebind_listeners(surface, &handle, &mut old.listeners, &mut new.listeners, old_props, new_props, owner);
			// An element's reconciled list is its entire child set.
			patch_children(surface, old_children, new_children, &handle, 0, owner, context)?;
			new.surface = Some(handle);
		}

		(Kind::Fragment { children: old_children }, Kind::Fragment { children: new_children }) => {
			let parent = old.surface.take().expect("patched an unmounted fragment node");
			let first = old_children.iter().find_map(|child| collect_handles(child).into_iter().next());
			let base = resolve_base(surface, &parent, first, old.anchor)?;
			patch_children(surface, old_children, new_children, &parent, base, owner, context)?;
			new.anchor = Some(base);
			new.surface = Some(parent);
		}

		(
			Kind::Component { instance: old_instance, .. },
			Kind::Component { props: new_props, children: new_children, instance: new_instance, .. },
		) => {
			let component = old_instance.take().expect("patched an unmounted component node");
			component.transfer(new_props.clone(), new_children.clone())?;
			old.surface = None;
			new.surface = component.first_handle();
			*new_instance = Some(component);
		}

		// same_node never matches across variants, and slots never match anything.
		_ => unreachable!("patched nodes that share no identity"),
	}
	Ok(())
}

/// Destroy-and-remount at the old subtree's surface position.
fn replace<S: Surface>(
	surface: &SharedSurface<S>,
	old: &mut VNode<S>,
	new: &mut VNode<S>,
	owner: Option<&Rc<Component<S>>>,
	context: Option<&AppContext>,
) -> Result<(), Error> {
	let span = trace_span!("replace", from = old.kind_name(), to = new.kind_name());
	let _enter = span.enter();

	let (parent, at) = match collect_handles(old).into_iter().next() {
		Some(first) => {
			let surface = surface.borrow();
			let parent = surface.parent(&first).ok_or(Error::SurfaceDesync)?;
			let at = surface.position(&first).ok_or(Error::SurfaceDesync)?;
			(parent, at)
		}
		// A mounted subtree currently contributing no surface nodes (an empty fragment, or a
		// component rendering one): its recorded reference is the parent itself, and the
		// replacement goes in at the recorded insertion base.
		None => {
			let (parent, recorded) = match &old.kind {
				Kind::Component { instance: Some(component), .. } => (component.host_handle(), component.anchor()),
				_ => (old.surface.clone(), old.anchor),
			};
			let parent = parent.ok_or(Error::SurfaceDesync)?;
			let count = surface.borrow().child_count(&parent);
			(parent, recorded.unwrap_or(count).min(count))
		}
	};
	destroy(surface, old);
	mount(surface, new, &parent, Some(at), owner, context)
}

fn patch_plain_props<S: Surface>(surface: &SharedSurface<S>, handle: &S::Handle, old: &Props<S>, new: &Props<S>) {
	let mut surface = surface.borrow_mut();

	let attrs = diff_maps(&old.attrs, &new.attrs);
	for (name, value) in attrs.added.iter().chain(&attrs.changed) {
		if value.is_null() {
			surface.remove_attribute(handle, name);
		} else {
			surface.set_attribute(handle, name, &value.to_string());
		}
	}
	for name in &attrs.removed {
		surface.remove_attribute(handle, name);
	}

	let style = diff_maps(&old.style, &new.style);
	for (name, value) in style.added.iter().chain(&style.changed) {
		surface.set_style(handle, name, value);
	}
	for name in &style.removed {
		surface.remove_style(handle, name);
	}

	for class in &old.class {
		if !new.class.contains(class) {
			surface.remove_class(handle, class);
		}
	}
	for class in &new.class {
		if !old.class.contains(class) {
			surface.add_class(handle, class);
		}
	}
}

/// Re-attaches event listeners, keeping the already-attached binding wherever the user handler is
/// the identical allocation (so surface-side listener identity is stable across renders).
#[allow(clippy::too_many_arguments)]
fn rebind_listeners<S: Surface>(
	surface: &SharedSurface<S>,
	handle: &S::Handle,
	old_attached: &mut Vec<(String, BoundListener)>,
	new_attached: &mut Vec<(String, BoundListener)>,
	old_props: &Props<S>,
	new_props: &Props<S>,
	owner: Option<&Rc<Component<S>>>,
) {
	let mut kept: HashMap<String, BoundListener> = old_attached.drain(..).collect();
	for (event, handler) in &new_props.on {
		let unchanged = old_props.on.get(event).is_some_and(|previous| Rc::ptr_eq(previous, handler));
		if unchanged {
			if let Some(bound) = kept.remove(event) {
				new_attached.push((event.clone(), bound));
				continue;
			}
		}
		if let Some(stale) = kept.remove(event) {
			surface.borrow_mut().remove_listener(handle, event, &stale);
		}
		let bound = Component::bind(owner, handler);
		surface.borrow_mut().add_listener(handle, event, &bound);
		new_attached.push((event.clone(), bound));
	}
	for (event, stale) in kept {
		surface.borrow_mut().remove_listener(handle, &event, &stale);
	}
}

/// Reconciles two child lists under `parent` via the keyed sequence diff.
///
/// Both lists are flattened through fragments first; the resulting operations act on surface
/// positions tracked by a running cursor. Moves relocate the already-mounted surface nodes
/// without destroying them, so component instances and element state survive reordering.
pub(crate) fn patch_children<S: Surface>(
	surface: &SharedSurface<S>,
	old_children: &mut [VNode<S>],
	new_children: &mut [VNode<S>],
	parent: &S::Handle,
	base: usize,
	owner: Option<&Rc<Component<S>>>,
	context: Option<&AppContext>,
) -> Result<(), Error> {
	let ops = {
		let old_flat = flat_refs(old_children);
		let new_flat = flat_refs(new_children);
		diff_slices(&old_flat, &new_flat, |a, b| same_node(a, b))
	};
	let mut old_flat = flat_muts(old_children);
	let mut new_flat = flat_muts(new_children);
	trace!("reconciling {} -> {} children at base {}", old_flat.len(), new_flat.len(), base);

	let mut cursor = base;
	for op in ops {
		match op {
			ListOp::Noop { original, target } => {
				note_position(&*old_flat[original], cursor);
				patch(surface, &mut *old_flat[original], &mut *new_flat[target], owner, context)?;
				cursor += surface_len(&*new_flat[target]);
			}
			ListOp::Add { target } => {
				mount(surface, &mut *new_flat[target], parent, Some(cursor), owner, context)?;
				cursor += surface_len(&*new_flat[target]);
			}
			ListOp::Move { original, target, .. } => {
				let handles = collect_handles(&*old_flat[original]);
				{
					let mut surface = surface.borrow_mut();
					for (offset, handle) in handles.iter().enumerate() {
						surface.remove(handle);
						surface.insert(parent, handle, Some(cursor + offset));
					}
				}
				note_position(&*old_flat[original], cursor);
				patch(surface, &mut *old_flat[original], &mut *new_flat[target], owner, context)?;
				cursor += surface_len(&*new_flat[target]);
			}
			ListOp::Remove { original, .. } => {
				destroy(surface, &mut *old_flat[original]);
			}
		}
	}

	adopt_fragments(new_children, parent);
	Ok(())
}

/// Where a child list begins within `parent`: the position of the first surviving surface node,
/// falling back to the insertion base recorded when the group was mounted. A group that currently
/// contributes no surface nodes regrows in place instead of at the end.
fn resolve_base<S: Surface>(
	surface: &SharedSurface<S>,
	parent: &S::Handle,
	first: Option<S::Handle>,
	recorded: Option<usize>,
) -> Result<usize, Error> {
	let surface = surface.borrow();
	match first {
		Some(handle) => surface.position(&handle).ok_or(Error::SurfaceDesync),
		None => {
			let count = surface.child_count(parent);
			Ok(recorded.unwrap_or(count).min(count))
		}
	}
}

/// Keeps a component instance's recorded insertion base current while the list it sits in is
/// reconciled, so a later re-render from an empty subtree lands at the right position even after
/// its siblings shifted.
fn note_position<S: Surface>(node: &VNode<S>, at: usize) {
	if let Kind::Component { instance: Some(component), .. } = &node.kind {
		component.set_anchor(at);
	}
}

/// Reconciliation works on the flattened child sequence, so fragment wrappers in the new tree are
/// never mounted as such; give them their surface reference (the real parent) here.
fn adopt_fragments<S: Surface>(children: &mut [VNode<S>], parent: &S::Handle) {
	for child in children.iter_mut() {
		if let Kind::Fragment { children: nested } = &mut child.kind {
			child.surface = Some(parent.clone());
			adopt_fragments(nested, parent);
		}
	}
}
