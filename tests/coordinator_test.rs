//! Integration tests for the session coordinator's public contract.

use turnhall::{
    Command, Liveness, Outcome, Reject, Role, SessionCoordinator, SessionError, SessionEvent,
    SessionStatus,
};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Builds an active two-participant session and returns the coordinator
/// plus the participant IDs in acting order (first turn holder first).
fn active_session() -> (SessionCoordinator, String, String) {
    init_tracing();
    let session = SessionCoordinator::new();
    session
        .assign_participant(Role::X, "px", "Alice")
        .expect("assign X");
    session
        .assign_participant(Role::O, "po", "Bot")
        .expect("assign O");

    let state = session.query();
    assert_eq!(state.status, SessionStatus::Active);
    let first = state.participant(state.turn).unwrap().id.clone();
    let second = state.participant(state.turn.opponent()).unwrap().id.clone();
    (session, first, second)
}

fn claim(row: u8, col: u8) -> Command {
    Command::Claim { row, col }
}

#[test]
fn test_assignment_activates_session() {
    let session = SessionCoordinator::new();
    assert_eq!(session.query().status, SessionStatus::Pending);

    session.assign_participant(Role::O, "po", "Bot").unwrap();
    assert_eq!(session.query().status, SessionStatus::Pending);

    session.assign_participant(Role::X, "px", "Alice").unwrap();
    assert_eq!(session.query().status, SessionStatus::Active);
}

#[test]
fn test_assignment_rejects_taken_role_and_duplicate_id() {
    let session = SessionCoordinator::new();
    session.assign_participant(Role::X, "px", "Alice").unwrap();

    let err = session
        .assign_participant(Role::X, "other", "Eve")
        .unwrap_err();
    assert_eq!(err, SessionError::RoleOccupied(Role::X));

    let err = session
        .assign_participant(Role::O, "px", "Alice again")
        .unwrap_err();
    assert_eq!(err, SessionError::DuplicateParticipant("px".to_string()));
}

#[test]
fn test_unknown_participant_rejected() {
    let (session, _, _) = active_session();
    let result = session.submit("ghost", claim(0, 0)).unwrap();
    assert!(!result.accepted);
    assert_eq!(result.reason, Some(Reject::UnknownParticipant));
}

#[test]
fn test_pending_session_rejects_commands_without_mutation() {
    let session = SessionCoordinator::new();
    session.assign_participant(Role::X, "px", "Alice").unwrap();

    let result = session.submit("px", claim(0, 0)).unwrap();
    assert!(!result.accepted);
    assert!(matches!(result.reason, Some(Reject::IllegalCommand(_))));
    assert!(session.query().move_history.is_empty());
}

#[test]
fn test_top_row_win_scenario() {
    // First mover claims the whole top row while the second interleaves
    // unrelated legal moves; the third top-row claim ends the session.
    let (session, first, second) = active_session();
    let winner_role = session.query().turn;

    assert!(session.submit(&first, claim(0, 0)).unwrap().accepted);
    assert!(session.submit(&second, claim(1, 0)).unwrap().accepted);
    assert!(session.submit(&first, claim(0, 1)).unwrap().accepted);
    assert!(session.submit(&second, claim(1, 1)).unwrap().accepted);

    let result = session.submit(&first, claim(0, 2)).unwrap();
    assert!(result.accepted);
    assert_eq!(result.outcome, Some(Outcome::Winner(winner_role)));

    let state = session.query();
    assert_eq!(state.status, SessionStatus::Terminal);
    assert_eq!(state.outcome, Some(Outcome::Winner(winner_role)));
    assert_eq!(state.participant(winner_role).unwrap().wins, 1);

    // Terminal immutability: both roles are now locked out until reset.
    for id in [&first, &second] {
        let result = session.submit(id, claim(2, 2)).unwrap();
        assert!(!result.accepted);
        assert_eq!(result.reason, Some(Reject::SessionTerminal));
    }
    assert_eq!(session.query().move_history.len(), 5);
}

#[test]
fn test_occupied_cell_rejected_state_unchanged() {
    let (session, first, second) = active_session();
    assert!(session.submit(&first, claim(0, 0)).unwrap().accepted);

    let before = session.query();
    let result = session.submit(&second, claim(0, 0)).unwrap();
    assert!(!result.accepted);
    assert!(matches!(result.reason, Some(Reject::PositionOccupied(_))));
    assert_eq!(session.query(), before);
}

#[test]
fn test_out_of_bounds_rejected() {
    let (session, first, _) = active_session();
    let result = session.submit(&first, claim(3, 7)).unwrap();
    assert!(!result.accepted);
    assert_eq!(result.reason, Some(Reject::OutOfBounds { row: 3, col: 7 }));
}

#[test]
fn test_out_of_turn_rejected_without_broadcast() {
    let (session, first, second) = active_session();
    let acting_role = session.query().turn;

    let mut events = session.subscribe();
    let result = session.submit(&second, claim(2, 2)).unwrap();
    assert!(!result.accepted);
    assert_eq!(result.reason, Some(Reject::NotYourTurn(acting_role)));

    // A rejection publishes nothing; the next accepted command does.
    assert!(events.try_recv().is_err());
    assert!(session.submit(&first, claim(2, 2)).unwrap().accepted);
    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::StateChanged(_))
    ));
}

#[test]
fn test_turn_strictly_alternates() {
    let (session, first, second) = active_session();
    let order = [&first, &second, &first, &second, &first];
    let cells = [(0, 0), (1, 0), (0, 1), (1, 1), (2, 2)];

    for (id, (row, col)) in order.iter().zip(cells) {
        let before = session.query().turn;
        assert!(session.submit(id, claim(row, col)).unwrap().accepted);
        assert_eq!(session.query().turn, before.opponent());
    }

    let history = session.query().move_history;
    for window in history.windows(2) {
        assert_ne!(window[0].role, window[1].role);
    }
}

#[test]
fn test_forced_pass_advances_turn_without_board_change() {
    let (session, first, _) = active_session();
    let acting = session.query().turn;

    // A supervisor expiring the turn submits a pass on the stalled
    // participant's behalf; it rides the same atomic path.
    let result = session.submit(&first, Command::Pass).unwrap();
    assert!(result.accepted);

    let state = session.query();
    assert_eq!(state.turn, acting.opponent());
    assert_eq!(state.board.claimed_count(), 0);
    assert_eq!(state.move_history.len(), 1);
}

#[test]
fn test_reset_preserves_win_counters() {
    let (session, first, second) = active_session();
    let winner_role = session.query().turn;

    session.submit(&first, claim(0, 0)).unwrap();
    session.submit(&second, claim(1, 0)).unwrap();
    session.submit(&first, claim(0, 1)).unwrap();
    session.submit(&second, claim(1, 1)).unwrap();
    session.submit(&first, claim(0, 2)).unwrap();
    assert_eq!(session.query().status, SessionStatus::Terminal);

    let mut events = session.subscribe();
    let state = session.reset();

    assert_eq!(state.status, SessionStatus::Active);
    assert_eq!(state.board.claimed_count(), 0);
    assert!(state.move_history.is_empty());
    assert_eq!(state.outcome, None);
    assert_eq!(state.participant(winner_role).unwrap().wins, 1);
    assert_eq!(state.participant(winner_role.opponent()).unwrap().wins, 0);
    assert_eq!(session.query(), state);

    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::SessionReset(_))
    ));

    // The revived session accepts commands again.
    let acting = state.participant(state.turn).unwrap().id.clone();
    assert!(session.submit(&acting, claim(2, 2)).unwrap().accepted);
}

#[test]
fn test_session_ended_event_published_on_terminal() {
    let (session, first, second) = active_session();
    let winner_role = session.query().turn;

    session.submit(&first, claim(0, 0)).unwrap();
    session.submit(&second, claim(1, 0)).unwrap();
    session.submit(&first, claim(0, 1)).unwrap();
    session.submit(&second, claim(1, 1)).unwrap();

    let mut events = session.subscribe();
    session.submit(&first, claim(0, 2)).unwrap();

    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::StateChanged(_))
    ));
    match events.try_recv() {
        Ok(SessionEvent::SessionEnded(outcome)) => {
            assert_eq!(outcome, Outcome::Winner(winner_role));
        }
        other => panic!("expected SessionEnded, got {:?}", other),
    }
}

#[test]
fn test_liveness_publishes_without_touching_state() {
    let (session, first, _) = active_session();
    let before = session.query();

    let mut events = session.subscribe();
    session.set_liveness(&first, Liveness::Deliberating);

    assert_eq!(session.query(), before);
    let record = session.liveness_of(&first).expect("liveness recorded");
    assert_eq!(record.status, Liveness::Deliberating);

    match events.try_recv() {
        Ok(SessionEvent::LivenessChanged {
            participant_id,
            liveness,
        }) => {
            assert_eq!(participant_id, first);
            assert_eq!(liveness, Liveness::Deliberating);
        }
        other => panic!("expected LivenessChanged, got {:?}", other),
    }
}

#[test]
fn test_accepted_submit_clears_liveness_to_idle() {
    let (session, first, _) = active_session();
    session.set_liveness(&first, Liveness::Acting);

    session.submit(&first, claim(1, 1)).unwrap();
    let record = session.liveness_of(&first).expect("liveness recorded");
    assert_eq!(record.status, Liveness::Idle);
}
