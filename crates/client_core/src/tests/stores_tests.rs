use super::*;

#[test]
fn session_store_starts_anonymous() {
    let store = SessionStore::new();
    assert!(store.current().is_none());
    assert!(store.credential().is_none());
    assert!(!store.is_authenticated());
}

#[test]
fn setting_a_session_replaces_the_previous_one() {
    let store = SessionStore::new();
    store.set_session(Session::new("first", UserId(1)));
    store.set_session(Session::new("second", UserId(2)));

    let current = store.current().expect("session");
    assert_eq!(current.user_id(), UserId(2));
    assert_eq!(current.access_token.expose(), "second");
}

#[tokio::test]
async fn subscribers_observe_session_changes() {
    let store = SessionStore::new();
    let mut rx = store.subscribe();

    store.set_session(Session::new("token", UserId(9)));
    rx.changed().await.expect("changed");
    assert_eq!(rx.borrow().as_ref().map(Session::user_id), Some(UserId(9)));

    store.clear_session();
    rx.changed().await.expect("changed");
    assert!(rx.borrow().is_none());
}

#[test]
fn login_gate_toggles_visibility() {
    let gate = LoginGateStore::new();
    assert!(!gate.is_visible());
    gate.show(true);
    assert!(gate.is_visible());
    gate.show(false);
    assert!(!gate.is_visible());
}

#[test]
fn require_session_raises_gate_only_when_anonymous() {
    let session = SessionStore::new();
    let gate = LoginGateStore::new();

    assert!(require_session(&session, &gate).is_none());
    assert!(gate.is_visible());

    gate.show(false);
    session.set_session(Session::new("token", UserId(4)));
    assert!(require_session(&session, &gate).is_some());
    assert!(!gate.is_visible());
}
