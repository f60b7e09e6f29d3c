use assert_call::{call, CallRecorder};

use crate::{
    action, action_fn, core::Runtime, in_action, reaction, ActionScope, Error, Observable,
    ObservableVec, RuntimeConfig,
};

#[derive(Debug, PartialEq)]
enum TestError {
    Store(Error),
    Rejected,
}
impl From<Error> for TestError {
    fn from(e: Error) -> Self {
        Self::Store(e)
    }
}

#[test]
fn returns_value() {
    let _rt = Runtime::new();
    let a = Observable::new(1);
    let old = action(|| a.replace(2)).unwrap();
    assert_eq!(old, 1);
    assert!(!in_action());
}

#[test]
fn nested_flushes_at_outermost() {
    let _rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let a = Observable::new(0);
    let _r = reaction({
        let a = a.clone();
        move || call!("{}", a.get())
    })
    .unwrap();
    cr.verify("0");

    action(|| {
        action(|| a.set(1))?;
        cr.verify(());
        action(|| a.set(2))
    })
    .unwrap();
    cr.verify("2");
}

#[test]
fn error_keeps_applied_writes() {
    let _rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let a = Observable::new(0);
    let _r = reaction({
        let a = a.clone();
        move || call!("{}", a.get())
    })
    .unwrap();
    cr.verify("0");

    let ret: Result<(), TestError> = action(|| {
        a.set(1)?;
        Err(TestError::Rejected)
    });
    assert_eq!(ret, Err(TestError::Rejected));
    cr.verify("1");
    assert!(!in_action());
}

#[test]
fn flush_error_converts() {
    let _rt = Runtime::with_config(RuntimeConfig::default().with_max_flush_rounds(1));
    let a = Observable::new(0);
    let b = Observable::new(0);
    let _ra = reaction({
        let a = a.clone();
        let b = b.clone();
        move || {
            let v = a.get();
            if v > 0 {
                action(|| b.set(v)).unwrap();
            }
        }
    })
    .unwrap();
    let _rb = reaction({
        let a = a.clone();
        let b = b.clone();
        move || {
            let v = b.get();
            if v > 0 {
                action(|| a.set(v + 1)).unwrap();
            }
        }
    })
    .unwrap();

    let ret: Result<(), TestError> = action(|| Ok(a.set(1)?));
    assert_eq!(ret, Err(TestError::Store(Error::FlushLimitExceeded(1))));
}

#[test]
fn action_fn_wraps_calls() {
    let _rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let items = ObservableVec::new();
    let _r = reaction({
        let items = items.clone();
        move || call!("{}", items.len())
    })
    .unwrap();
    cr.verify("0");

    let add = action_fn({
        let items = items.clone();
        move |n: i32| {
            items.push(n)?;
            items.push(n * 10)
        }
    });
    add(1).unwrap();
    cr.verify("2");
    add(2).unwrap();
    cr.verify("4");
    assert_eq!(items.snapshot(), vec![1, 10, 2, 20]);
}

#[test]
fn dropped_scope_flushes() {
    let _rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let a = Observable::new(0);
    let _r = reaction({
        let a = a.clone();
        move || call!("{}", a.get())
    })
    .unwrap();
    cr.verify("0");

    {
        let _scope = ActionScope::enter();
        a.set(1).unwrap();
        cr.verify(());
    }
    cr.verify("1");
}
