use chassis::dispatcher::Dispatcher;
use chassis::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Rc<dyn Fn(&Value)> {
	let log = Rc::clone(log);
	Rc::new(move |payload: &Value| log.borrow_mut().push(format!("{}:{}", tag, payload)))
}

#[test]
fn specific_subscribers_run_before_subscribe_all() {
	let dispatcher = Dispatcher::new();
	let log = Rc::new(RefCell::new(Vec::new()));

	let _keep_any = dispatcher.subscribe_any(recorder(&log, "any"));
	let _keep_a = dispatcher.subscribe("ping", recorder(&log, "a"));
	let _keep_b = dispatcher.subscribe("ping", recorder(&log, "b"));

	dispatcher.dispatch("ping", &Value::from("x"));
	assert_eq!(*log.borrow(), vec!["a:x".to_owned(), "b:x".to_owned(), "any:x".to_owned()]);
}

#[test]
fn unrelated_topics_do_not_cross() {
	let dispatcher = Dispatcher::new();
	let log = Rc::new(RefCell::new(Vec::new()));

	let _keep = dispatcher.subscribe("left", recorder(&log, "left"));
	dispatcher.dispatch("right", &Value::Null);
	assert!(log.borrow().is_empty());

	dispatcher.dispatch("left", &Value::from(1_i64));
	assert_eq!(*log.borrow(), vec!["left:1".to_owned()]);
}

#[test]
fn unsubscribing_stops_delivery() {
	let dispatcher = Dispatcher::new();
	let log = Rc::new(RefCell::new(Vec::new()));

	let unsubscribe = dispatcher.subscribe("tick", recorder(&log, "gone"));
	let _keep = dispatcher.subscribe("tick", recorder(&log, "kept"));

	dispatcher.dispatch("tick", &Value::from("1"));
	unsubscribe();
	dispatcher.dispatch("tick", &Value::from("2"));

	assert_eq!(
		*log.borrow(),
		vec!["gone:1".to_owned(), "kept:1".to_owned(), "kept:2".to_owned()]
	);
}

#[test]
fn a_handler_may_subscribe_during_dispatch() {
	let dispatcher = Rc::new(Dispatcher::new());
	let log = Rc::new(RefCell::new(Vec::new()));

	let _keep = dispatcher.subscribe("grow", {
		let dispatcher = Rc::clone(&dispatcher);
		let log = Rc::clone(&log);
		Rc::new(move |_payload: &Value| {
			log.borrow_mut().push("grew".to_owned());
			// Registering mid-dispatch must not deadlock; the new subscriber only sees later
			// dispatches.
			std::mem::forget(dispatcher.subscribe("grow", recorder(&log, "late")));
		})
	});

	dispatcher.dispatch("grow", &Value::Null);
	assert_eq!(*log.borrow(), vec!["grew".to_owned()]);

	dispatcher.dispatch("grow", &Value::Null);
	assert_eq!(log.borrow().len(), 3);
	assert_eq!(log.borrow()[2], "late:".to_owned());
}
