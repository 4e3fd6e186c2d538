use chassis::memory::{MemorySurface, NodeId};
use chassis::{destroy, handler, mount, Error, Props, SharedSurface, Surface as _, VNode};
use std::cell::RefCell;
use std::rc::Rc;

type Node = VNode<MemorySurface>;

fn fixture() -> (SharedSurface<MemorySurface>, NodeId) {
	let surface: SharedSurface<MemorySurface> = Rc::new(RefCell::new(MemorySurface::new()));
	let root = surface.borrow_mut().create_container();
	(surface, root)
}

fn mount_at_root(surface: &SharedSurface<MemorySurface>, root: NodeId, node: &mut Node) {
	mount(surface, node, &root, None, None, None).unwrap();
}

#[test]
fn text_mounts_and_renders() {
	let (surface, root) = fixture();
	let mut node = Node::text("hello");
	mount_at_root(&surface, root, &mut node);

	assert_eq!(surface.borrow().render_to_string(root), "hello");
	assert!(node.surface_handle().is_some());
}

#[test]
fn element_applies_attributes_styles_and_classes() {
	let (surface, root) = fixture();
	let mut node = Node::element(
		"input",
		Props::new()
			.attr("type", "checkbox")
			.attr("tabindex", 3_i64)
			.attr("disabled", chassis::Value::Null)
			.style("color", "red")
			.class("wide")
			.class("dense"),
		vec![],
	);
	mount_at_root(&surface, root, &mut node);

	let handle = *node.surface_handle().unwrap();
	let surface = surface.borrow();
	assert_eq!(surface.attr(handle, "type"), Some("checkbox"));
	assert_eq!(surface.attr(handle, "tabindex"), Some("3"));
	// Null-valued attributes are not written at all.
	assert_eq!(surface.attr(handle, "disabled"), None);
	assert_eq!(surface.style_value(handle, "color"), Some("red"));
	assert_eq!(surface.classes(handle), ["wide".to_owned(), "dense".to_owned()]);
}

#[test]
fn children_coerce_and_none_children_vanish() {
	let (surface, root) = fixture();
	let shown: Option<Node> = false.then(|| Node::text("hidden"));
	let mut node = Node::element("p", Props::new(), vec!["plain".into(), shown.into(), Node::text("!").into()]);
	mount_at_root(&surface, root, &mut node);

	assert_eq!(surface.borrow().render_to_string(root), "<p>plain!</p>");
}

#[test]
fn fragment_children_land_contiguously_at_the_requested_index() {
	let (surface, root) = fixture();
	let mut tail = Node::text("tail");
	mount_at_root(&surface, root, &mut tail);

	let mut fragment = Node::fragment(vec![Node::text("a").into(), Node::text("b").into()]);
	mount(&surface, &mut fragment, &root, Some(0), None, None).unwrap();

	assert_eq!(surface.borrow().render_to_string(root), "abtail");
	// The fragment's own reference is the real parent.
	assert_eq!(fragment.surface_handle(), Some(&root));
}

#[test]
fn nested_fragments_flatten_into_the_parent() {
	let (surface, root) = fixture();
	let inner = Node::fragment(vec![Node::text("b").into(), Node::text("c").into()]);
	let mut outer = Node::fragment(vec![Node::text("a").into(), inner.into(), Node::text("d").into()]);
	mount_at_root(&surface, root, &mut outer);

	assert_eq!(surface.borrow().render_to_string(root), "abcd");
	assert_eq!(surface.borrow().children(root).len(), 4);
}

#[test]
fn contextual_fragment_props_fill_in_without_overriding() {
	let (surface, root) = fixture();
	let mut node = Node::fragment_with(
		Props::new().attr("draggable", "true").class("row").key("list"),
		vec![
			Node::element("li", Props::new().attr("draggable", "false"), vec!["a".into()]).into(),
			Node::element("li", Props::new(), vec!["b".into()]).into(),
		],
	);
	mount_at_root(&surface, root, &mut node);

	let surface = surface.borrow();
	let children = surface.children(root).to_vec();
	// The child's own entry wins over the contextual one.
	assert_eq!(surface.attr(children[0], "draggable"), Some("false"));
	assert_eq!(surface.attr(children[1], "draggable"), Some("true"));
	assert_eq!(surface.classes(children[0]), ["row".to_owned()]);
	// Keys stay per-item and are never propagated from the contextual bag.
	if let chassis::Kind::Fragment { children } = &node.kind {
		assert!(children.iter().all(|child| child.identity_key().is_none()));
	} else {
		unreachable!();
	}
}

#[test]
fn an_index_past_the_end_clamps_to_append() {
	let (surface, root) = fixture();
	let mut first = Node::text("first");
	mount_at_root(&surface, root, &mut first);

	let mut clamped = Node::text("clamped");
	mount(&surface, &mut clamped, &root, Some(99), None, None).unwrap();
	assert_eq!(surface.borrow().render_to_string(root), "firstclamped");
}

#[test]
fn a_text_node_cannot_host_a_mount() {
	let (surface, _root) = fixture();
	let target = surface.borrow_mut().create_text("not a parent");
	let mut node = Node::text("child");

	let result = mount(&surface, &mut node, &target, None, None, None);
	assert!(matches!(result, Err(Error::InvalidMountTarget)));
}

#[test]
fn an_unresolved_slot_cannot_mount() {
	let (surface, root) = fixture();
	let mut node = Node::slot(vec![Node::text("fallback").into()]);

	let result = mount(&surface, &mut node, &root, None, None, None);
	assert!(matches!(result, Err(Error::UnresolvedSlot)));
}

#[test]
fn destroy_removes_the_subtree_and_detaches_listeners() {
	let (surface, root) = fixture();
	let fired = Rc::new(RefCell::new(0));
	let on_click = {
		let fired = Rc::clone(&fired);
		handler::<MemorySurface, _>(move |_owner, _payload| *fired.borrow_mut() += 1)
	};
	let mut node = Node::element(
		"div",
		Props::new().on("click", on_click),
		vec![Node::element("span", Props::new(), vec!["inner".into()]).into()],
	);
	mount_at_root(&surface, root, &mut node);
	let handle = *node.surface_handle().unwrap();
	assert_eq!(surface.borrow().listener_count(handle), 1);

	destroy(&surface, &mut node);

	assert_eq!(surface.borrow().render_to_string(root), "");
	assert_eq!(surface.borrow().listener_count(handle), 0);
	assert!(!node.holds_surface());
	assert_eq!(*fired.borrow(), 0);
}

#[test]
fn destroying_a_fragment_removes_every_contributed_node() {
	let (surface, root) = fixture();
	let mut keep = Node::text("keep");
	mount_at_root(&surface, root, &mut keep);
	let mut fragment = Node::fragment(vec![Node::text("a").into(), Node::text("b").into()]);
	mount(&surface, &mut fragment, &root, Some(0), None, None).unwrap();
	assert_eq!(surface.borrow().render_to_string(root), "abkeep");

	destroy(&surface, &mut fragment);
	assert_eq!(surface.borrow().render_to_string(root), "keep");
	assert!(!fragment.holds_surface());
}

#[test]
#[should_panic(expected = "destroyed an unmounted text node")]
fn destroying_twice_panics() {
	let (surface, root) = fixture();
	let mut node = Node::text("once");
	mount_at_root(&surface, root, &mut node);
	destroy(&surface, &mut node);
	destroy(&surface, &mut node);
}
