use chassis::memory::{fire_event, MemorySurface, NodeId};
use chassis::{handler, mount, patch, Props, SharedSurface, Surface as _, VNode, Value};
use std::cell::RefCell;
use std::rc::Rc;

type Node = VNode<MemorySurface>;

fn fixture() -> (SharedSurface<MemorySurface>, NodeId) {
	let surface: SharedSurface<MemorySurface> = Rc::new(RefCell::new(MemorySurface::new()));
	let root = surface.borrow_mut().create_container();
	(surface, root)
}

fn mounted(surface: &SharedSurface<MemorySurface>, root: NodeId, mut node: Node) -> Node {
	mount(surface, &mut node, &root, None, None, None).unwrap();
	node
}

fn repatch(surface: &SharedSurface<MemorySurface>, mut old: Node, mut new: Node) -> Node {
	patch(surface, &mut old, &mut new, None, None).unwrap();
	new
}

fn keyed_list(keys: &[&str]) -> Node {
	Node::element(
		"ul",
		Props::new(),
		keys.iter()
			.map(|key| Node::element("li", Props::new().key(*key), vec![(*key).into()]).into())
			.collect(),
	)
}

#[test]
fn text_updates_in_place() {
	let (surface, root) = fixture();
	let old = mounted(&surface, root, Node::text("before"));
	let before = *old.surface_handle().unwrap();

	let new = repatch(&surface, old, Node::text("after"));
	assert_eq!(new.surface_handle(), Some(&before));
	assert_eq!(surface.borrow().render_to_string(root), "after");
}

#[test]
fn attributes_styles_and_classes_patch_in_place() {
	let (surface, root) = fixture();
	let old = mounted(
		&surface,
		root,
		Node::element(
			"div",
			Props::new()
				.attr("title", "old")
				.attr("gone", "yes")
				.style("color", "red")
				.style("margin", "0")
				.class("a")
				.class("b"),
			vec![],
		),
	);
	let handle = *old.surface_handle().unwrap();

	let new = repatch(
		&surface,
		old,
		Node::element(
			"div",
			Props::new()
				.attr("title", "new")
				.attr("fresh", "1")
				.attr("nulled", Value::Null)
				.style("color", "blue")
				.class("b")
				.class("c"),
			vec![],
		),
	);
	assert_eq!(new.surface_handle(), Some(&handle));

	let surface = surface.borrow();
	assert_eq!(surface.attr(handle, "title"), Some("new"));
	assert_eq!(surface.attr(handle, "fresh"), Some("1"));
	assert_eq!(surface.attr(handle, "gone"), None);
	// A Null value removes the attribute just like a missing key does.
	assert_eq!(surface.attr(handle, "nulled"), None);
	assert_eq!(surface.style_value(handle, "color"), Some("blue"));
	assert_eq!(surface.style_value(handle, "margin"), None);
	assert_eq!(surface.classes(handle), ["b".to_owned(), "c".to_owned()]);
}

#[test]
fn keyed_reorder_preserves_surface_identity() {
	let (surface, root) = fixture();
	let old = mounted(&surface, root, keyed_list(&["a", "b", "c"]));
	let list = *old.surface_handle().unwrap();
	let before = surface.borrow().children(list).to_vec();

	let new = repatch(&surface, old, keyed_list(&["c", "a", "b"]));
	assert_eq!(new.surface_handle(), Some(&list));

	let after = surface.borrow().children(list).to_vec();
	assert_eq!(after, vec![before[2], before[0], before[1]]);
	assert_eq!(surface.borrow().render_to_string(list), "<ul><li>c</li><li>a</li><li>b</li></ul>");
}

#[test]
fn keyed_removal_and_insertion_reuse_the_survivors() {
	let (surface, root) = fixture();
	let old = mounted(&surface, root, keyed_list(&["a", "b", "c", "d"]));
	let list = *old.surface_handle().unwrap();
	let before = surface.borrow().children(list).to_vec();

	let new = repatch(&surface, old, keyed_list(&["d", "x", "b"]));
	drop(new);
	let after = surface.borrow().children(list).to_vec();
	assert_eq!(after.len(), 3);
	assert_eq!(after[0], before[3]);
	assert_eq!(after[2], before[1]);
	assert!(!before.contains(&after[1]));
	assert_eq!(surface.borrow().render_to_string(list), "<ul><li>d</li><li>x</li><li>b</li></ul>");
}

#[test]
fn a_changed_tag_replaces_at_the_same_position() {
	let (surface, root) = fixture();
	let old = mounted(
		&surface,
		root,
		Node::element(
			"p",
			Props::new(),
			vec![
				Node::text("x").into(),
				Node::element("b", Props::new(), vec!["mid".into()]).into(),
				Node::text("y").into(),
			],
		),
	);

	let new = repatch(
		&surface,
		old,
		Node::element(
			"p",
			Props::new(),
			vec![
				Node::text("x").into(),
				Node::element("i", Props::new(), vec!["mid".into()]).into(),
				Node::text("y").into(),
			],
		),
	);
	drop(new);
	assert_eq!(surface.borrow().render_to_string(root), "<p>x<i>mid</i>y</p>");
}

#[test]
fn a_changed_key_replaces_even_with_the_same_tag() {
	let (surface, root) = fixture();
	let old = mounted(&surface, root, keyed_list(&["a"]));
	let list = *old.surface_handle().unwrap();
	let before = surface.borrow().children(list).to_vec();

	let new = repatch(&surface, old, keyed_list(&["z"]));
	drop(new);
	let after = surface.borrow().children(list).to_vec();
	assert_ne!(after[0], before[0]);
}

#[test]
fn an_unchanged_handler_keeps_its_attached_listener() {
	let (surface, root) = fixture();
	let on_click = handler::<MemorySurface, _>(|_owner, _payload| {});
	let old = mounted(
		&surface,
		root,
		Node::element("button", Props::new().on("click", Rc::clone(&on_click)), vec![]),
	);
	let handle = *old.surface_handle().unwrap();
	let attached_before = surface.borrow().listeners(handle, "click");

	let new = repatch(
		&surface,
		old,
		Node::element("button", Props::new().on("click", Rc::clone(&on_click)), vec![]),
	);
	drop(new);
	let attached_after = surface.borrow().listeners(handle, "click");
	assert_eq!(attached_after.len(), 1);
	assert!(Rc::ptr_eq(&attached_before[0], &attached_after[0]));
}

#[test]
fn a_new_handler_allocation_rebinds_the_listener() {
	let (surface, root) = fixture();
	let fired = Rc::new(RefCell::new(Vec::new()));

	let first = {
		let fired = Rc::clone(&fired);
		handler::<MemorySurface, _>(move |_owner, _payload| fired.borrow_mut().push("first"))
	};
	let old = mounted(&surface, root, Node::element("button", Props::new().on("click", first), vec![]));
	let handle = *old.surface_handle().unwrap();
	let attached_before = surface.borrow().listeners(handle, "click");

	let second = {
		let fired = Rc::clone(&fired);
		handler::<MemorySurface, _>(move |_owner, _payload| fired.borrow_mut().push("second"))
	};
	let new = repatch(&surface, old, Node::element("button", Props::new().on("click", second), vec![]));
	drop(new);

	let attached_after = surface.borrow().listeners(handle, "click");
	assert_eq!(attached_after.len(), 1);
	assert!(!Rc::ptr_eq(&attached_before[0], &attached_after[0]));

	fire_event(&surface, handle, "click", &Value::Null);
	assert_eq!(*fired.borrow(), vec!["second"]);
}

#[test]
fn fragments_flatten_and_survive_growth() {
	let (surface, root) = fixture();
	let old = mounted(
		&surface,
		root,
		Node::element(
			"div",
			Props::new(),
			vec![
				Node::fragment(vec![Node::text("a").into()]).into(),
				Node::text("z").into(),
			],
		),
	);
	let handle = *old.surface_handle().unwrap();

	let mut new = repatch(
		&surface,
		old,
		Node::element(
			"div",
			Props::new(),
			vec![
				Node::fragment(vec![Node::text("a").into(), Node::text("b").into()]).into(),
				Node::text("z").into(),
			],
		),
	);
	assert_eq!(surface.borrow().render_to_string(handle), "<div>abz</div>");

	// The grown fragment is a mounted node in its own right: destroying the patched tree must
	// release everything.
	chassis::destroy(&surface, &mut new);
	assert_eq!(surface.borrow().render_to_string(root), "");
	assert!(!new.holds_surface());
}

#[test]
fn an_empty_fragment_regrows_at_its_mounted_position() {
	let (surface, root) = fixture();
	let mut tail = Node::text("z");
	mount(&surface, &mut tail, &root, None, None, None).unwrap();

	let mut empty = Node::fragment(vec![]);
	mount(&surface, &mut empty, &root, Some(0), None, None).unwrap();
	assert_eq!(surface.borrow().render_to_string(root), "z");

	// Growing back from nothing lands before the sibling, where the fragment was mounted.
	let grown = repatch(&surface, empty, Node::fragment(vec![Node::text("x").into()]));
	assert_eq!(surface.borrow().render_to_string(root), "xz");

	// The position survives emptying out and growing again.
	let emptied = repatch(&surface, grown, Node::fragment(vec![]));
	assert_eq!(surface.borrow().render_to_string(root), "z");
	let regrown = repatch(&surface, emptied, Node::fragment(vec![Node::text("y").into()]));
	drop(regrown);
	assert_eq!(surface.borrow().render_to_string(root), "yz");
}
