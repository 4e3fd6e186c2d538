//! A minimal named-topic publish/subscribe facility.
//!
//! Each component instance owns one dispatcher; `emit` publishes through it to the handlers the
//! owning parent registered at mount time. Dispatching a topic nobody specifically subscribed to
//! is reported, not fatal; the subscribe-to-all handlers still run.

use crate::value::Value;
use hashbrown::HashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{trace, warn};

pub type Subscriber = Rc<dyn Fn(&Value)>;
/// Returned by the subscribe calls; invoke to remove the subscription.
pub type Unsubscribe = Box<dyn FnOnce()>;

#[derive(Default)]
struct Registry {
	topics: HashMap<String, Vec<(u64, Subscriber)>>,
	any: Vec<(u64, Subscriber)>,
	next_id: u64,
}

#[derive(Default)]
pub struct Dispatcher {
	registry: Rc<RefCell<Registry>>,
}

impl Dispatcher {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribes `handler` to `topic`. Handlers run in subscription order.
	pub fn subscribe(&self, topic: impl Into<String>, handler: Subscriber) -> Unsubscribe {
		let topic = topic.into();
		let id = {
			let mut registry = self.registry.borrow_mut();
			let id = registry.next_id;
			registry.next_id += 1;
			registry.topics.entry(topic.clone()).or_default().push((id, handler));
			id
		};
		let registry = Rc::clone(&self.registry);
		Box::new(move || {
			if let Some(handlers) = registry.borrow_mut().topics.get_mut(&topic) {
				handlers.retain(|(handler_id, _)| *handler_id != id);
			}
		})
	}

	/// Subscribes `handler` to every topic. These run after the topic-specific handlers.
	pub fn subscribe_any(&self, handler: Subscriber) -> Unsubscribe {
		let id = {
			let mut registry = self.registry.borrow_mut();
			let id = registry.next_id;
			registry.next_id += 1;
			registry.any.push((id, handler));
			id
		};
		let registry = Rc::clone(&self.registry);
		Box::new(move || {
			registry.borrow_mut().any.retain(|(handler_id, _)| *handler_id != id);
		})
	}

	/// Invokes `topic`'s handlers in subscription order, then the subscribe-to-all handlers.
	///
	/// Handler lists are snapshotted before invocation, so a handler that re-renders (and thereby
	/// re-subscribes) never observes an outstanding borrow.
	pub fn dispatch(&self, topic: &str, payload: &Value) {
		let (specific, any): (Vec<Subscriber>, Vec<Subscriber>) = {
			let registry = self.registry.borrow();
			(
				registry
					.topics
					.get(topic)
					.map(|handlers| handlers.iter().map(|(_, h)| Rc::clone(h)).collect())
					.unwrap_or_default(),
				registry.any.iter().map(|(_, h)| Rc::clone(h)).collect(),
			)
		};
		if specific.is_empty() {
			warn!("dispatched {:?} with no specific subscriber", topic);
		} else {
			trace!("dispatching {:?} to {} subscriber(s)", topic, specific.len());
		}
		for handler in specific {
			handler(payload);
		}
		for handler in any {
			handler(payload);
		}
	}
}
