use super::*;
use std::sync::Mutex;

fn recorder<E: Clone + Send + 'static>() -> (Arc<Mutex<Vec<E>>>, impl Fn(&E) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |event: &E| sink.lock().expect("sink").push(event.clone()))
}

#[test]
fn observable_notifies_with_new_value() {
    let cell = Observable::new(String::from("a"));
    let (seen, listener) = recorder::<String>();
    cell.subscribe(listener);

    cell.set("b".to_string());
    cell.update(|value| value.push('c'));

    assert_eq!(cell.get(), "bc");
    assert_eq!(*seen.lock().expect("seen"), vec!["b".to_string(), "bc".to_string()]);
}

#[test]
fn listeners_run_in_registration_order() {
    let cell = Observable::new(0u32);
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = order.clone();
        cell.subscribe(move |_| order.lock().expect("order").push(tag));
    }

    cell.set(1);

    assert_eq!(*order.lock().expect("order"), vec!["first", "second", "third"]);
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let cell = Observable::new(false);
    let (seen, listener) = recorder::<bool>();
    let id = cell.subscribe(listener);

    cell.set(true);
    assert!(cell.unsubscribe(id));
    assert!(!cell.unsubscribe(id));
    cell.set(false);

    assert_eq!(*seen.lock().expect("seen"), vec![true]);
    assert_eq!(cell.listener_count(), 0);
}

#[test]
fn listener_can_read_the_cell_that_notified_it() {
    let cell = Arc::new(Observable::new(1i64));
    let reader = cell.clone();
    let (seen, sink) = recorder::<i64>();
    cell.subscribe(move |_| sink(&reader.get()));

    cell.set(42);

    assert_eq!(*seen.lock().expect("seen"), vec![42]);
}

#[test]
fn list_push_reports_insertion_index() {
    let list = ObservableList::new();
    let (seen, listener) = recorder::<ListChange<&'static str>>();
    list.subscribe(listener);

    assert_eq!(list.push("x"), 0);
    assert_eq!(list.push("y"), 1);

    assert_eq!(list.snapshot(), vec!["x", "y"]);
    assert_eq!(
        *seen.lock().expect("seen"),
        vec![
            ListChange::Inserted { index: 0, item: "x" },
            ListChange::Inserted { index: 1, item: "y" },
        ]
    );
}

#[test]
fn remove_at_out_of_range_is_silent_noop() {
    let list = ObservableList::new();
    list.push(1);
    let (seen, listener) = recorder::<ListChange<i32>>();
    list.subscribe(listener);

    assert_eq!(list.remove_at(5), None);

    assert_eq!(list.len(), 1);
    assert!(seen.lock().expect("seen").is_empty());
}

#[test]
fn remove_first_matches_by_predicate() {
    let list = ObservableList::new();
    for value in [10, 20, 30, 20] {
        list.push(value);
    }

    assert_eq!(list.remove_first(|v| *v == 20), Some((1, 20)));
    assert_eq!(list.snapshot(), vec![10, 30, 20]);
    assert_eq!(list.position(|v| *v == 20), Some(2));
    assert_eq!(list.remove_first(|v| *v == 99), None);
}

#[test]
fn clear_notifies_only_when_something_was_removed() {
    let list: ObservableList<u8> = ObservableList::default();
    let (seen, listener) = recorder::<ListChange<u8>>();
    list.subscribe(listener);

    list.clear();
    list.push(7);
    list.clear();

    assert!(list.is_empty());
    assert_eq!(
        *seen.lock().expect("seen"),
        vec![ListChange::Inserted { index: 0, item: 7 }, ListChange::Cleared]
    );
}

#[test]
fn push_with_sees_length_before_insertion() {
    let list = ObservableList::new();
    list.push(100usize);

    let (index, item) = list.push_with(|len| len * 10);

    assert_eq!((index, item), (1, 10));
    assert_eq!(list.snapshot(), vec![100, 10]);
}

#[test]
fn concurrent_pushes_notify_in_mutation_order_without_overlap() {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        thread,
        time::Duration,
    };

    let list = Arc::new(ObservableList::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let busy = Arc::new(AtomicBool::new(false));
    let overlapped = Arc::new(AtomicBool::new(false));
    {
        let (seen, busy, overlapped) = (seen.clone(), busy.clone(), overlapped.clone());
        list.subscribe(move |change: &ListChange<u32>| {
            if busy.swap(true, Ordering::SeqCst) {
                overlapped.store(true, Ordering::SeqCst);
            }
            if let ListChange::Inserted { index, .. } = change {
                if *index == 0 {
                    thread::sleep(Duration::from_millis(100));
                }
                seen.lock().expect("seen").push(*index);
            }
            busy.store(false, Ordering::SeqCst);
        });
    }

    let first = {
        let list = list.clone();
        thread::spawn(move || list.push(10))
    };
    thread::sleep(Duration::from_millis(20));
    let second = {
        let list = list.clone();
        thread::spawn(move || list.push(20))
    };
    first.join().expect("first pusher");
    second.join().expect("second pusher");

    assert_eq!(*seen.lock().expect("seen"), vec![0, 1]);
    assert!(!overlapped.load(Ordering::SeqCst));
    assert_eq!(list.snapshot(), vec![10, 20]);
}
