use assert_call::{call, CallRecorder};

use crate::{action, core::Runtime, reaction, ObservableSet};

#[test]
fn insert_remove() {
    let _rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = ObservableSet::new();
    let _r = reaction({
        let s = s.clone();
        move || call!("{}", s.len())
    })
    .unwrap();
    cr.verify("0");

    assert!(action(|| s.insert(1)).unwrap());
    cr.verify("1");
    assert!(!action(|| s.insert(1)).unwrap());
    cr.verify("1");
    assert!(action(|| s.remove(&1)).unwrap());
    cr.verify("0");
    assert!(!s.contains(&1));
}

#[test]
fn clear_empty_still_notifies() {
    let _rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = ObservableSet::<i32>::new();
    let _r = reaction({
        let s = s.clone();
        move || call!("{}", s.is_empty())
    })
    .unwrap();
    cr.verify("true");

    action(|| s.clear()).unwrap();
    cr.verify("true");
    assert_eq!(s.version(), 1);
}

#[test]
fn serde() {
    let s: ObservableSet<i32> = serde_json::from_str("[2,1,2]").unwrap();
    assert_eq!(format!("{s:?}"), "{1, 2}");
    assert_eq!(serde_json::to_string(&s).unwrap(), "[1,2]");
}
