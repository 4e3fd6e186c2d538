//! The destroy engine: tears down a materialized subtree, detaching listeners and releasing
//! surface references.

use crate::node::{Kind, VNode};
use crate::surface::{SharedSurface, Surface};
use tracing::trace_span;

/// Destroys a mounted subtree.
///
/// # Panics
///
/// Destroying a node that holds no surface reference is a programming error, not a recoverable
/// condition.
pub fn destroy<S: Surface>(surface: &SharedSurface<S>, vnode: &mut VNode<S>) {
	teardown(surface, vnode, true);
}

/// `remove` is false for descendants of an element that is itself being removed: surface removal
/// is subtree-wide, so they only release bookkeeping (listeners, component instances, handles).
pub(crate) fn teardown<S: Surface>(surface: &SharedSurface<S>, vnode: &mut VNode<S>, remove: bool) {
	let span = trace_span!("destroy", kind = vnode.kind_name());
	let _enter = span.enter();

	match &mut vnode.kind {
		Kind::Text(_) => {
			let handle = vnode.surface.take().expect("destroyed an unmounted text node");
			if remove {
				surface.borrow_mut().remove(&handle);
			}
		}

		Kind::Element { children, .. } => {
			let handle = vnode.surface.take().expect("destroyed an unmounted element node");
			for (event, listener) in vnode.listeners.drain(..) {
				surface.borrow_mut().remove_listener(&handle, &event, &listener);
			}
			for child in children.iter_mut() {
				teardown(surface, child, false);
			}
			if remove {
				surface.borrow_mut().remove(&handle);
			}
		}

		Kind::Fragment { children } => {
			// No node of its own to remove; the reference is the parent.
			let _parent = vnode.surface.take().expect("destroyed an unmounted fragment node");
			for child in children.iter_mut() {
				teardown(surface, child, remove);
			}
		}

		Kind::Slot { .. } => panic!("destroyed an unresolved slot"),

		Kind::Component { instance, .. } => {
			let component = instance.take().expect("destroyed an unmounted component node");
			component.teardown(remove);
			vnode.surface = None;
		}
	}
	vnode.anchor = None;
}
