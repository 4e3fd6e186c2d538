//! The lifecycle job queue.
//!
//! After-mount and after-unmount hooks are never invoked inline during `mount`/`unmount`: they
//! are pushed onto this FIFO queue and run when the current synchronous burst of work settles.
//! That way a burst of mounts (say, an entire initial tree) enqueues all hooks first and runs
//! them in registration order afterwards, so every hook observes a fully-settled tree.
//!
//! Jobs are launched strictly in order; a failing job (a panicking hook) is caught at the queue
//! boundary, reported, and never aborts its siblings. There is no cancellation and no timeout.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace};

type Job = Box<dyn FnOnce()>;

struct Queue {
	jobs: VecDeque<(&'static str, Job)>,
	drain_scheduled: bool,
}

thread_local! {
	static QUEUE: RefCell<Queue> = RefCell::new(Queue {
		jobs: VecDeque::new(),
		drain_scheduled: false,
	});
}

/// Appends a job to the queue and marks a drain as scheduled. `label` names the job in failure
/// reports.
pub fn enqueue(label: &'static str, job: impl FnOnce() + 'static) {
	QUEUE.with(|queue| {
		let mut queue = queue.borrow_mut();
		queue.jobs.push_back((label, Box::new(job)));
		queue.drain_scheduled = true;
		trace!("enqueued lifecycle job for {} ({} pending)", label, queue.jobs.len());
	});
}

/// Drains the queue in registration order, including jobs enqueued by jobs already running in
/// this drain. Once this returns, every hook enqueued so far has at least started.
pub fn settle() {
	loop {
		let next = QUEUE.with(|queue| queue.borrow_mut().jobs.pop_front());
		let Some((label, job)) = next else { break };
		if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
			let message = payload
				.downcast_ref::<&str>()
				.map(|s| (*s).to_owned())
				.or_else(|| payload.downcast_ref::<String>().cloned())
				.unwrap_or_else(|| "non-string panic payload".to_owned());
			error!("lifecycle hook for {} failed: {}", label, message);
		}
	}
	QUEUE.with(|queue| queue.borrow_mut().drain_scheduled = false);
}

/// The number of jobs waiting for the next [`settle`].
#[must_use]
pub fn pending() -> usize {
	QUEUE.with(|queue| queue.borrow().jobs.len())
}

/// Whether a drain has been scheduled and not yet run to completion.
#[must_use]
pub fn drain_scheduled() -> bool {
	QUEUE.with(|queue| queue.borrow().drain_scheduled)
}
