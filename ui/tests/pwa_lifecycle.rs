//! End-to-end behaviour of the process-wide manager over a scripted host.
//!
//! Every test runs on its own thread, so each one gets a fresh manager.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ui::pwa::{
    Channel, LifecycleEvent, Listener, ListenerError, PwaConfig, PwaError, PwaHost, PwaManager,
};
use ui::testing::ScriptedHost;

use LifecycleEvent::*;

type EventLog = Rc<RefCell<Vec<(usize, LifecycleEvent)>>>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn install(host: &Rc<ScriptedHost>) -> Rc<PwaManager> {
    init_tracing();
    let host: Rc<dyn PwaHost> = host.clone();
    PwaManager::install(host, &PwaConfig::default())
}

fn recording_listener(log: &EventLog, id: usize) -> Listener {
    let log = log.clone();
    Listener::infallible(move |event| log.borrow_mut().push((id, event)))
}

#[tokio::test(start_paused = true)]
async fn offline_then_online_reaches_every_listener_in_order() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    for id in 0..4 {
        manager.add_event_listener(&recording_listener(&log, id));
    }

    host.set_online(false);
    tokio::time::sleep(Duration::from_secs(3)).await;
    host.set_online(true);

    let log = log.borrow();
    assert_eq!(log.len(), 8);
    for id in 0..4 {
        let received: Vec<_> = log
            .iter()
            .filter(|(listener, _)| *listener == id)
            .map(|(_, event)| *event)
            .collect();
        assert_eq!(received, vec![Offline, Online], "listener {id}");
    }
    // All listeners see `Offline` before anyone sees `Online`.
    assert!(log[..4].iter().all(|(_, event)| *event == Offline));
}

#[test]
fn repeated_connectivity_signals_are_suppressed() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));

    host.set_online(true);
    host.set_online(false);
    host.set_online(false);
    host.set_online(false);
    host.set_online(true);
    host.set_online(true);

    let events: Vec<_> = log.borrow().iter().map(|(_, event)| *event).collect();
    assert_eq!(events, vec![Offline, Online]);
}

#[test]
fn initial_state_comes_from_host() {
    let host = Rc::new(ScriptedHost::starting_offline());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));

    host.set_online(false);
    host.set_online(true);

    let events: Vec<_> = log.borrow().iter().map(|(_, event)| *event).collect();
    assert_eq!(events, vec![Online]);
}

#[test]
fn construction_is_idempotent() {
    let host = Rc::new(ScriptedHost::new());
    let first = install(&host);
    let other_host = Rc::new(ScriptedHost::new());
    let second = install(&other_host);

    assert!(Rc::ptr_eq(&first, &second));
    assert!(Rc::ptr_eq(&first, &PwaManager::global()));

    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    first.add_event_listener(&recording_listener(&log, 0));
    host.set_online(false);
    // The second host was never attached.
    other_host.set_online(false);

    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn same_listener_registered_twice_fires_once() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let listener = recording_listener(&log, 0);
    manager.add_event_listener(&listener);
    manager.add_event_listener(&listener);

    host.set_online(false);

    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn removed_listener_receives_nothing_more() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let listener = recording_listener(&log, 0);
    manager.add_event_listener(&listener);

    host.set_online(false);
    manager.remove_event_listener(&listener);
    host.set_online(true);
    host.publish_waiting("/sw.js");

    assert_eq!(*log.borrow(), vec![(0, Offline)]);
}

#[test]
fn failing_listener_does_not_starve_the_rest() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));
    manager.add_event_listener(&Listener::new(|_| Err(ListenerError::new("render failed"))));
    manager.add_event_listener(&recording_listener(&log, 2));

    host.set_online(false);

    assert_eq!(*log.borrow(), vec![(0, Offline), (2, Offline)]);
}

#[test]
fn update_is_announced_once_per_version() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));

    host.publish_waiting("/sw.js");
    host.redeliver_waiting();
    host.redeliver_waiting();

    assert_eq!(*log.borrow(), vec![(0, UpdateAvailable)]);
}

#[tokio::test]
async fn activation_without_update_is_immediate() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);

    manager.activate_update().await.expect("nothing to activate");

    assert!(host.skip_requests().is_empty());
    assert_eq!(host.reload_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn confirmed_activation_reloads_exactly_once() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let version = host.publish_waiting("/sw.js");

    let confirm = async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        host.confirm_control();
    };
    let (activated, ()) = tokio::join!(manager.activate_update(), confirm);

    activated.expect("worker confirmed control");
    assert_eq!(host.skip_requests(), vec![version]);
    assert_eq!(host.reload_count(), 1);

    // A stray second confirmation must not reload again.
    host.confirm_control();
    assert_eq!(host.reload_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn activation_timeout_leaves_manager_usable() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));
    host.publish_waiting("/sw.js");

    let err = manager.activate_update().await.unwrap_err();
    assert_eq!(
        err,
        PwaError::ActivationTimeout {
            waited: PwaConfig::default().activation_timeout()
        }
    );
    assert_eq!(host.reload_count(), 0);

    host.set_online(false);
    host.confirm_on_skip(true);
    manager.activate_update().await.expect("retry succeeds");

    assert_eq!(host.reload_count(), 1);
    assert_eq!(*log.borrow(), vec![(0, UpdateAvailable), (0, Offline)]);
}

#[tokio::test(start_paused = true)]
async fn update_activated_elsewhere_reloads_without_waiting() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    host.publish_waiting("/sw.js");

    // Another tab hands control to the waiting worker.
    host.confirm_control();
    assert_eq!(host.reload_count(), 0);

    manager.activate_update().await.expect("worker already in control");

    assert_eq!(host.reload_count(), 1);
    assert!(host.skip_requests().is_empty());
    manager.activate_update().await.expect("nothing left to activate");
    assert_eq!(host.reload_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn newer_activation_supersedes_older_one() {
    let host = Rc::new(ScriptedHost::new());
    let manager = install(&host);
    host.publish_waiting("/sw.js");

    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        manager.activate_update().await
    };
    let confirm = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        host.confirm_control();
    };
    let (first, second, ()) = tokio::join!(manager.activate_update(), second, confirm);

    assert_eq!(first, Err(PwaError::ActivationSuperseded));
    assert_eq!(second, Ok(()));
    assert_eq!(host.reload_count(), 1);
}

#[test]
fn worker_channel_failure_keeps_connectivity_alive() {
    let host = Rc::new(ScriptedHost::new());
    host.fail_channel(Channel::Worker);
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));

    host.publish_waiting("/sw.js");
    host.set_online(false);

    assert_eq!(*log.borrow(), vec![(0, Offline)]);
}

#[test]
fn connectivity_channel_failure_keeps_updates_alive() {
    let host = Rc::new(ScriptedHost::new());
    host.fail_channel(Channel::Connectivity);
    let manager = install(&host);
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    manager.add_event_listener(&recording_listener(&log, 0));

    host.set_online(false);
    host.publish_waiting("/sw.js");

    assert_eq!(*log.borrow(), vec![(0, UpdateAvailable)]);
}
