//! The application shell: owns the shared surface, the root tree and the ambient context.

use crate::destroy;
use crate::error::Error;
use crate::mount;
use crate::node::VNode;
use crate::scheduler;
use crate::surface::{SharedSurface, Surface};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace_span;

/// The ambient application context, visible to every component without prop-threading: the root
/// component receives it at mount, descendants resolve it through their parent chain. Consumers
/// downcast it to their concrete type.
pub type AppContext = Rc<dyn Any>;

/// One application: a render surface, at most one mounted root tree, and an optional context.
pub struct App<S: Surface> {
	surface: SharedSurface<S>,
	context: Option<AppContext>,
	root: Option<VNode<S>>,
	host: Option<S::Handle>,
}

impl<S: Surface> App<S> {
	#[must_use]
	pub fn new(surface: S) -> Self {
		Self {
			surface: Rc::new(RefCell::new(surface)),
			context: None,
			root: None,
			host: None,
		}
	}

	#[must_use]
	pub fn with_context(mut self, context: AppContext) -> Self {
		self.context = Some(context);
		self
	}

	/// The shared surface handle, for constructing mount targets and inspecting results.
	#[must_use]
	pub fn surface(&self) -> SharedSurface<S> {
		Rc::clone(&self.surface)
	}

	/// Mounts `root` into `parent`. One root at a time; unmount first to replace it.
	pub fn mount(&mut self, mut root: VNode<S>, parent: &S::Handle) -> Result<(), Error> {
		if self.root.is_some() {
			return Err(Error::AlreadyMounted("application"));
		}
		let span = trace_span!("app_mount");
		let _enter = span.enter();
		mount::mount(&self.surface, &mut root, parent, None, None, self.context.as_ref())?;
		self.root = Some(root);
		self.host = Some(parent.clone());
		Ok(())
	}

	/// Destroys the mounted root tree.
	pub fn unmount(&mut self) -> Result<(), Error> {
		let mut root = self.root.take().ok_or(Error::NotMounted("application"))?;
		let span = trace_span!("app_unmount");
		let _enter = span.enter();
		destroy::destroy(&self.surface, &mut root);
		self.host = None;
		Ok(())
	}

	/// The mounted root tree, when there is one.
	#[must_use]
	pub fn root(&self) -> Option<&VNode<S>> {
		self.root.as_ref()
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.root.is_some()
	}

	/// The handle the root tree is mounted into, while mounted.
	#[must_use]
	pub fn host(&self) -> Option<&S::Handle> {
		self.host.as_ref()
	}

	/// Runs all pending lifecycle jobs. Call after a burst of mounts, unmounts or updates; hooks
	/// never run inline.
	pub fn settle(&self) {
		scheduler::settle();
	}
}
