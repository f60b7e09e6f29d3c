use super::*;
use crate::{action, reaction, Observable};

#[test]
fn runtime_config_is_applied() {
    let config = RuntimeConfig::default()
        .with_write_policy(WritePolicy::Lenient)
        .with_max_flush_rounds(3);
    let rt = Runtime::with_config(config.clone());
    assert_eq!(rt.config(), config);
}

#[test]
fn runtime_drop_resets_config() {
    {
        let mut rt = Runtime::new();
        rt.set_write_policy(WritePolicy::Lenient);
        assert_eq!(rt.config().write_policy, WritePolicy::Lenient);
    }
    let rt = Runtime::new();
    assert_eq!(rt.config().write_policy, WritePolicy::Strict);
}

#[test]
#[should_panic(expected = "Only one `Runtime` can exist in the same thread at the same time.")]
fn second_runtime_panics() {
    let _rt = Runtime::new();
    let _rt2 = Runtime::new();
}

#[test]
#[should_panic(expected = "`Runtime` is not created.")]
fn write_without_runtime_panics() {
    let s = Observable::new(1);
    let _ = s.set(2);
}

#[test]
fn read_without_runtime() {
    let s = Observable::new(1);
    assert_eq!(s.get(), 1);
}

#[test]
fn ids_are_distinct() {
    let a = NodeId::next();
    let b = NodeId::next();
    assert_ne!(a, b);
    assert!(a.to_string().starts_with("node#"));
    assert!(ReactionId::next().to_string().starts_with("reaction#"));
}

#[test]
fn action_scope_nesting() {
    let _rt = Runtime::new();
    assert!(!in_action());
    let outer = ActionScope::enter();
    let inner = ActionScope::enter();
    assert!(in_action());
    inner.exit().unwrap();
    assert!(in_action());
    outer.exit().unwrap();
    assert!(!in_action());
}

#[test]
fn action_scope_drop_leaves() {
    let _rt = Runtime::new();
    {
        let _scope = ActionScope::enter();
        assert!(in_action());
    }
    assert!(!in_action());
}

#[test]
fn pending_reactions_until_outermost_exit() {
    let rt = Runtime::new();
    let s = Observable::new(0);
    let _r = reaction({
        let s = s.clone();
        move || {
            s.get();
        }
    })
    .unwrap();

    let scope = ActionScope::enter();
    s.set(1).unwrap();
    s.set(2).unwrap();
    assert_eq!(rt.pending_reactions(), 1);
    scope.exit().unwrap();
    assert_eq!(rt.pending_reactions(), 0);
}

#[test]
fn untracked_hides_reads() {
    let _rt = Runtime::new();
    let a = Observable::new(1);
    let b = Observable::new(2);
    let r = reaction({
        let a = a.clone();
        let b = b.clone();
        move || {
            assert!(is_tracking());
            a.get();
            untracked(|| {
                assert!(!is_tracking());
                b.get();
            });
            assert!(is_tracking());
        }
    })
    .unwrap();
    assert!(r.depends_on(a.id()));
    assert!(!r.depends_on(b.id()));
    assert_eq!(b.observer_count(), 0);
}

#[test]
fn not_tracking_outside_reactions() {
    let _rt = Runtime::new();
    assert!(!is_tracking());
    action(|| {
        assert!(!is_tracking());
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn dropped_runtime_cancels_pending() {
    let s = Observable::new(0);
    let r = {
        let _rt = Runtime::new();
        let r = reaction({
            let s = s.clone();
            move || {
                s.get();
            }
        })
        .unwrap();
        let scope = ActionScope::enter();
        s.set(1).unwrap();
        std::mem::forget(scope);
        r
    };
    let rt = Runtime::new();
    assert_eq!(rt.pending_reactions(), 0);
    assert!(!in_action());
    action(|| s.set(2)).unwrap();
    assert_eq!(r.run_count(), 2);
}

#[test]
fn zero_flush_rounds_runs_one_round() {
    let config: RuntimeConfig = serde_json::from_str(r#"{ "max_flush_rounds": 0 }"#).unwrap();
    let _rt = Runtime::with_config(config);
    let a = Observable::new(0);
    let r = reaction({
        let a = a.clone();
        move || {
            a.get();
        }
    })
    .unwrap();

    action(|| a.set(1)).unwrap();
    assert_eq!(r.run_count(), 2);
}

#[test]
fn repeated_reads_bind_once() {
    let _rt = Runtime::new();
    let reversed = Observable::new(false);
    let xs: Vec<_> = (0..5).map(Observable::new).collect();
    let r = reaction({
        let reversed = reversed.clone();
        let xs = xs.clone();
        move || {
            let order: Vec<_> = if reversed.get() {
                xs.iter().rev().collect()
            } else {
                xs.iter().collect()
            };
            for x in order {
                x.get();
                x.get();
            }
        }
    })
    .unwrap();
    assert_eq!(r.dependency_count(), 6);
    assert!(xs.iter().all(|x| x.observer_count() == 1));

    action(|| reversed.set(true)).unwrap();
    assert_eq!(r.dependency_count(), 6);
    assert!(xs.iter().all(|x| x.observer_count() == 1));
    assert_eq!(reversed.observer_count(), 1);
    assert_eq!(r.dependencies()[1], xs[4].id());
}
