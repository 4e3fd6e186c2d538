//! Stateful components.
//!
//! A [`ComponentDef`] is a reusable blueprint: a render function plus optional state
//! initialization, lifecycle hooks and named methods. Definition identity is the `Rc` allocation,
//! so two definitions built from identical closures are still distinct node types.
//!
//! A [`Component`] is one live instance: it owns its props and state, renders and reconciles its
//! own subtree, and carries a dispatcher through which the subtree reports events upward.

use crate::app::AppContext;
use crate::destroy;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::mount;
use crate::node::{collect_handles, project_slots, Props, VNode};
use crate::patch;
use crate::scheduler;
use crate::surface::{BoundListener, SharedSurface, Surface};
use crate::value::Value;
use hashbrown::HashMap;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{trace, trace_span};

/// Component-local state: a flat bag of named values.
pub type State = HashMap<String, Value>;

/// An event handler as written by the user: receives the component that *rendered* the node the
/// event fired on (`None` for nodes rendered outside any component) and the event payload.
pub type Handler<S> = Rc<dyn Fn(Option<Rc<Component<S>>>, &Value)>;

/// A lifecycle hook; runs through the job queue, never inline.
pub type Hook<S> = Rc<dyn Fn(&Rc<Component<S>>)>;

/// A named method callable on a live instance.
pub type Method<S> = Rc<dyn Fn(&Rc<Component<S>>, &Value) -> Value>;

type RenderFn<S> = Rc<dyn Fn(&Component<S>) -> VNode<S>>;
type StateInit<S> = Rc<dyn Fn(&Props<S>) -> State>;

/// Wraps a closure as a [`Handler`].
pub fn handler<S: Surface, F: Fn(Option<Rc<Component<S>>>, &Value) + 'static>(body: F) -> Handler<S> {
	Rc::new(body)
}

/// The blueprint of a component. Build one with [`ComponentDef::new`] and the chained
/// configuration methods, then share it via [`ComponentDef::build`].
pub struct ComponentDef<S: Surface> {
	pub(crate) name: &'static str,
	render: RenderFn<S>,
	initial_state: Option<StateInit<S>>,
	after_mount: Option<Hook<S>>,
	after_unmount: Option<Hook<S>>,
	methods: HashMap<&'static str, Method<S>>,
}

impl<S: Surface> ComponentDef<S> {
	#[must_use]
	pub fn new(name: &'static str, render: impl Fn(&Component<S>) -> VNode<S> + 'static) -> Self {
		Self {
			name,
			render: Rc::new(render),
			initial_state: None,
			after_mount: None,
			after_unmount: None,
			methods: HashMap::new(),
		}
	}

	/// Derives the initial state from the mount-time props.
	#[must_use]
	pub fn with_state(mut self, init: impl Fn(&Props<S>) -> State + 'static) -> Self {
		self.initial_state = Some(Rc::new(init));
		self
	}

	#[must_use]
	pub fn after_mount(mut self, hook: impl Fn(&Rc<Component<S>>) + 'static) -> Self {
		self.after_mount = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn after_unmount(mut self, hook: impl Fn(&Rc<Component<S>>) + 'static) -> Self {
		self.after_unmount = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn method(mut self, name: &'static str, body: impl Fn(&Rc<Component<S>>, &Value) -> Value + 'static) -> Self {
		self.methods.insert(name, Rc::new(body));
		self
	}

	#[must_use]
	pub fn build(self) -> Rc<Self> {
		Rc::new(self)
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}
}

/// One live component instance.
///
/// Instances are handed around as `Rc<Component<_>>`; the rendered subtree holds no strong
/// reference back, so dropping the mounted tree drops the instance.
pub struct Component<S: Surface> {
	def: Rc<ComponentDef<S>>,
	surface: SharedSurface<S>,
	props: RefCell<Props<S>>,
	state: RefCell<State>,
	/// The children the *parent* passed in, projected into this instance's slots on each render.
	projected: RefCell<Vec<VNode<S>>>,
	dispatcher: Dispatcher,
	/// Self-reference so `&self` methods can hand out owning handles (to hooks, handlers and the
	/// mount engine). Always upgradable while the instance exists.
	weak_self: Weak<Component<S>>,
	parent: Option<Weak<Component<S>>>,
	context: RefCell<Option<AppContext>>,
	rendered: RefCell<Option<VNode<S>>>,
	host: RefCell<Option<S::Handle>>,
	mounted: Cell<bool>,
}

impl<S: Surface> Component<S> {
	pub(crate) fn create(
		def: &Rc<ComponentDef<S>>,
		props: Props<S>,
		projected: Vec<VNode<S>>,
		owner: Option<&Rc<Component<S>>>,
		surface: SharedSurface<S>,
		context: Option<AppContext>,
	) -> Rc<Self> {
		let state = def.initial_state.as_ref().map(|init| init(&props)).unwrap_or_default();
		let component = Rc::new_cyclic(|weak_self| Self {
			def: Rc::clone(def),
			surface,
			props: RefCell::new(props),
			state: RefCell::new(state),
			projected: RefCell::new(projected),
			dispatcher: Dispatcher::new(),
			weak_self: Weak::clone(weak_self),
			parent: owner.map(Rc::downgrade),
			context: RefCell::new(context),
			rendered: RefCell::new(None),
			host: RefCell::new(None),
			mounted: Cell::new(false),
		});
		// The `on` entries of a component's props are the parent's subscriptions to what this
		// instance emits, bound to the parent. They stay subscribed for the instance's lifetime.
		{
			let props = component.props.borrow();
			for (topic, handler) in &props.on {
				let _ = component.dispatcher.subscribe(topic.clone(), Self::bind(owner, handler));
			}
		}
		component
	}

	/// Closes a user [`Handler`] over its owning component, yielding the payload-only shape the
	/// surface and dispatcher work with.
	pub(crate) fn bind(owner: Option<&Rc<Component<S>>>, handler: &Handler<S>) -> BoundListener {
		let owner = owner.map(Rc::clone);
		let handler = Rc::clone(handler);
		Rc::new(move |payload: &Value| handler(owner.clone(), payload))
	}

	fn strong(&self) -> Rc<Self> {
		self.weak_self.upgrade().expect("component instance outlived its allocation")
	}

	/// Renders and mounts this instance into `parent` at `index`, then enqueues the after-mount
	/// hook. Mounting an already-mounted instance is refused; a fully unmounted one may be mounted
	/// again.
	pub fn mount(&self, parent: &S::Handle, index: Option<usize>) -> Result<(), Error> {
		if self.mounted.get() {
			return Err(Error::AlreadyMounted(self.def.name));
		}
		let span = trace_span!("component_mount", name = self.def.name);
		let _enter = span.enter();

		let mut tree = self.render_tree();
		mount::mount(&self.surface, &mut tree, parent, index, Some(&self.strong()), None)?;
		*self.rendered.borrow_mut() = Some(tree);
		*self.host.borrow_mut() = Some(parent.clone());
		self.mounted.set(true);

		if let Some(hook) = &self.def.after_mount {
			let hook = Rc::clone(hook);
			let instance = self.strong();
			scheduler::enqueue(self.def.name, move || hook(&instance));
		}
		Ok(())
	}

	/// Destroys the rendered subtree and enqueues the after-unmount hook.
	pub fn unmount(&self) -> Result<(), Error> {
		if !self.mounted.get() {
			return Err(Error::NotMounted(self.def.name));
		}
		self.teardown(true);
		Ok(())
	}

	/// Teardown shared by explicit unmount and by destruction of an enclosing subtree (where
	/// `remove` is false because an ancestor's surface removal already covers this instance).
	pub(crate) fn teardown(&self, remove: bool) {
		let span = trace_span!("component_unmount", name = self.def.name);
		let _enter = span.enter();

		let mut tree = self
			.rendered
			.borrow_mut()
			.take()
			.expect("tore down a component instance that is not mounted");
		destroy::teardown(&self.surface, &mut tree, remove);
		*self.host.borrow_mut() = None;
		self.mounted.set(false);

		if let Some(hook) = &self.def.after_unmount {
			let hook = Rc::clone(hook);
			let instance = self.strong();
			scheduler::enqueue(self.def.name, move || hook(&instance));
		}
	}

	/// Merges `entries` into the state (shallow, incoming wins) and re-renders. State writes
	/// always re-render; there is no change detection here.
	pub fn update_state(&self, entries: State) -> Result<(), Error> {
		if !self.mounted.get() {
			return Err(Error::NotMounted(self.def.name));
		}
		self.state.borrow_mut().extend(entries);
		self.refresh()
	}

	/// Merges `incoming` into the props (shallow, incoming wins) and re-renders only when
	/// something actually differed.
	pub fn update_props(&self, incoming: Props<S>) -> Result<(), Error> {
		if !self.mounted.get() {
			return Err(Error::NotMounted(self.def.name));
		}
		let changed = Self::merge_shallow(&mut self.props.borrow_mut(), incoming);
		if changed {
			self.refresh()
		} else {
			trace!("skipped re-render of {}: props unchanged", self.def.name);
			Ok(())
		}
	}

	/// Called by the patch engine when the parent re-rendered this component in place: adopts the
	/// freshly-described props and projected children, re-rendering when either differed.
	pub(crate) fn transfer(&self, props: Props<S>, projected: Vec<VNode<S>>) -> Result<(), Error> {
		let projected_changed = {
			let mut current = self.projected.borrow_mut();
			let changed = !current.is_empty() || !projected.is_empty();
			*current = projected;
			changed
		};
		let props_changed = Self::merge_shallow(&mut self.props.borrow_mut(), props);
		if props_changed || projected_changed {
			self.refresh()
		} else {
			Ok(())
		}
	}

	/// Shallow prop merge: keys present in `incoming` replace, absent keys survive. An empty
	/// class list or `on` bag counts as absent. Returns whether anything observable changed.
	fn merge_shallow(current: &mut Props<S>, incoming: Props<S>) -> bool {
		let mut changed = false;
		for (name, value) in incoming.attrs {
			if current.attrs.get(&name) != Some(&value) {
				changed = true;
			}
			current.attrs.insert(name, value);
		}
		for (name, value) in incoming.style {
			if current.style.get(&name) != Some(&value) {
				changed = true;
			}
			current.style.insert(name, value);
		}
		if !incoming.class.is_empty() && incoming.class != current.class {
			current.class = incoming.class;
			changed = true;
		}
		for (topic, handler) in incoming.on {
			current.on.insert(topic, handler);
		}
		if incoming.key.is_some() {
			current.key = incoming.key;
		}
		changed
	}

	/// Renders against the current props and state and patches the mounted subtree in place.
	fn refresh(&self) -> Result<(), Error> {
		let span = trace_span!("component_render", name = self.def.name);
		let _enter = span.enter();

		let mut next = self.render_tree();
		let mut previous = self
			.rendered
			.borrow_mut()
			.take()
			.expect("re-rendered a component instance that is not mounted");
		let result = patch::patch(&self.surface, &mut previous, &mut next, Some(&self.strong()), None);
		*self.rendered.borrow_mut() = Some(next);
		result
	}

	fn render_tree(&self) -> VNode<S> {
		let mut tree = (self.def.render)(self);
		project_slots(&mut tree, &self.projected.borrow());
		tree
	}

	/// Publishes `payload` under `topic` on this instance's dispatcher, the upward event channel
	/// to the handlers the parent registered in `on`.
	pub fn emit(&self, topic: &str, payload: &Value) {
		self.dispatcher.dispatch(topic, payload);
	}

	/// The dispatcher carrying this instance's emitted events; exposed so callers can subscribe
	/// outside the props mechanism.
	#[must_use]
	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Invokes the method registered under `name`; `None` when the definition has no such method.
	#[must_use]
	pub fn call(&self, name: &str, argument: &Value) -> Option<Value> {
		let method = self.def.methods.get(name).map(Rc::clone)?;
		Some(method(&self.strong(), argument))
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.def.name
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.mounted.get()
	}

	#[must_use]
	pub fn prop(&self, name: &str) -> Option<Value> {
		self.props.borrow().attrs.get(name).cloned()
	}

	#[must_use]
	pub fn state_value(&self, name: &str) -> Option<Value> {
		self.state.borrow().get(name).cloned()
	}

	#[must_use]
	pub fn parent(&self) -> Option<Rc<Component<S>>> {
		self.parent.as_ref()?.upgrade()
	}

	/// The nearest context: this instance's own, or the closest ancestor's.
	#[must_use]
	pub fn context(&self) -> Option<AppContext> {
		if let Some(context) = self.context.borrow().as_ref() {
			return Some(Rc::clone(context));
		}
		self.parent()?.context()
	}

	pub fn set_context(&self, context: AppContext) {
		*self.context.borrow_mut() = Some(context);
	}

	/// The surface handles the rendered subtree currently contributes, in tree order.
	#[must_use]
	pub fn handles(&self) -> Vec<S::Handle> {
		self.rendered.borrow().as_ref().map(collect_handles).unwrap_or_default()
	}

	#[must_use]
	pub fn first_handle(&self) -> Option<S::Handle> {
		self.handles().into_iter().next()
	}

	/// This instance's position among its host's surface children (0 while it contributes no
	/// surface nodes).
	#[must_use]
	pub fn offset(&self) -> usize {
		self.first_handle()
			.and_then(|handle| self.surface.borrow().position(&handle))
			.unwrap_or(0)
	}

	pub(crate) fn host_handle(&self) -> Option<S::Handle> {
		self.host.borrow().clone()
	}

	/// The insertion base recorded on the rendered root, when it carries one.
	pub(crate) fn anchor(&self) -> Option<usize> {
		self.rendered.borrow().as_ref().and_then(|root| root.anchor)
	}

	/// Records where this instance's content begins in its host, so a subtree that currently
	/// contributes no surface nodes re-renders back into place.
	pub(crate) fn set_anchor(&self, at: usize) {
		if let Some(root) = self.rendered.borrow_mut().as_mut() {
			root.anchor = Some(at);
		}
	}
}
