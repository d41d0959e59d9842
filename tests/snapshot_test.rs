//! Snapshot export/import round-trip.

use turnhall::{Command, Outcome, Role, SessionCoordinator, SessionState, SessionStatus};

fn played_session() -> SessionCoordinator {
    let session = SessionCoordinator::new();
    session.assign_participant(Role::X, "px", "Alice").unwrap();
    session.assign_participant(Role::O, "po", "Bot").unwrap();

    let state = session.query();
    let first = state.participant(state.turn).unwrap().id.clone();
    let second = state.participant(state.turn.opponent()).unwrap().id.clone();
    session.submit(&first, Command::Claim { row: 0, col: 0 }).unwrap();
    session.submit(&second, Command::Claim { row: 1, col: 1 }).unwrap();
    session.submit(&first, Command::Pass).unwrap();
    session
}

#[test]
fn test_json_round_trip_reproduces_query() {
    let session = played_session();
    let exported = session.export_snapshot();

    let json = exported.to_json().expect("serialize snapshot");
    let restored = SessionState::from_json(&json).expect("deserialize snapshot");
    assert_eq!(restored, exported);

    let revived = SessionCoordinator::from_snapshot(restored).expect("valid snapshot");
    assert_eq!(revived.query(), session.query());
    // History order survives the trip.
    let original: Vec<_> = session.query().move_history;
    let round_tripped: Vec<_> = revived.query().move_history;
    assert_eq!(original, round_tripped);
}

#[test]
fn test_restored_session_keeps_playing() {
    let session = played_session();
    let json = session.export_snapshot().to_json().unwrap();

    let revived =
        SessionCoordinator::from_snapshot(SessionState::from_json(&json).unwrap()).unwrap();
    let state = revived.query();
    assert_eq!(state.status, SessionStatus::Active);

    let acting = state.participant(state.turn).unwrap().id.clone();
    let result = revived
        .submit(&acting, Command::Claim { row: 2, col: 2 })
        .unwrap();
    assert!(result.accepted);
}

#[test]
fn test_restore_rejects_corrupt_snapshot() {
    let mut snapshot = SessionCoordinator::new().export_snapshot();
    // Outcome without terminal status violates the state invariants.
    snapshot.outcome = Some(Outcome::Draw);
    assert!(SessionCoordinator::from_snapshot(snapshot).is_err());
}

#[test]
fn test_liveness_is_not_part_of_the_snapshot() {
    let session = played_session();
    session.set_liveness("px", turnhall::Liveness::Acting);

    let json = session.export_snapshot().to_json().unwrap();
    let revived =
        SessionCoordinator::from_snapshot(SessionState::from_json(&json).unwrap()).unwrap();
    assert!(revived.liveness_of("px").is_none());
}
