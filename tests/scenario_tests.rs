//! End-to-end room scenarios over the in-memory stores.
//!
//! Two clients share one room row, take turns through the change feed and
//! each record their own result once the room completes.

use std::time::Duration;

use game_rooms_tests::Platform;
use room_notifier::RoomNotifier;
use rstest::rstest;
use shared::feed::{RoomChangeFeed, RoomFilter};
use shared::models::game_room::RoomStatus;
use shared::models::game_state::rock_paper_scissors::Choice;
use shared::models::game_state::{GameType, IllegalMove, PlayerMove};
use shared::models::room_change::RoomChangeKind;
use shared::models::subscription::SubscriptionTopic;
use shared::repositories::game_room_repository::GameRoomRepository;
use shared::repositories::player_stats_repository::PlayerStatsRepository;
use shared::services::errors::room_service_errors::RoomServiceError;
use shared::services::game_service::MoveOutcome;
use test_case::test_case;

const FEED_TIMEOUT: Duration = Duration::from_secs(5);

#[rstest]
#[case::creator_takes_top_row(&[0, 4, 1, 3, 2], Some("alice"))]
#[case::joiner_takes_middle_row(&[0, 3, 1, 4, 8, 5], Some("bob"))]
#[case::full_board_draw(&[0, 1, 2, 4, 3, 5, 7, 6, 8], None)]
#[tokio::test]
async fn test_tic_tac_toe_played_through_the_feed(
    #[case] cells: &[usize],
    #[case] winner: Option<&str>,
) {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::TicTacToe, "alice")
        .await
        .unwrap();
    let mut alice = platform.session(&room, "alice");
    let joined = platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();
    let mut bob = platform.session(&joined, "bob");

    for (turn, &cell) in cells.iter().enumerate() {
        let session = if turn % 2 == 0 { &mut alice } else { &mut bob };
        let my_turn = tokio::time::timeout(FEED_TIMEOUT, session.wait_for_turn())
            .await
            .unwrap()
            .unwrap();
        assert!(my_turn, "turn {} never came", turn);

        let outcome = session.play(PlayerMove::Place { cell }).await.unwrap();
        assert!(outcome.is_applied(), "move {} was not applied", turn);
    }

    let alice_stats = alice.run_until_finished().await.unwrap().unwrap();
    let bob_stats = bob.run_until_finished().await.unwrap().unwrap();

    let finished = platform.room_service.get_room(&room.room_id).await.unwrap();
    assert_eq!(finished.status, RoomStatus::Completed);
    assert_eq!(finished.winner_id.as_deref(), winner);
    assert!(finished.completed_at.is_some());
    assert!(finished.is_consistent());

    assert_eq!(alice_stats.games_played, 1);
    assert_eq!(bob_stats.games_played, 1);
    assert_eq!(alice_stats.games_won, u64::from(winner == Some("alice")));
    assert_eq!(bob_stats.games_won, u64::from(winner == Some("bob")));
}

#[test_case(Choice::Rock, Choice::Rock, None ; "rock against rock is a draw")]
#[test_case(Choice::Paper, Choice::Rock, Some("alice") ; "paper covers rock")]
#[test_case(Choice::Rock, Choice::Paper, Some("bob") ; "rock loses to paper")]
#[test_case(Choice::Scissors, Choice::Paper, Some("alice") ; "scissors cut paper")]
#[tokio::test]
async fn test_rock_paper_scissors_simultaneous_choices(
    alice_choice: Choice,
    bob_choice: Choice,
    winner: Option<&str>,
) {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::RockPaperScissors, "alice")
        .await
        .unwrap();
    let joined = platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();
    let mut alice = platform.session(&joined, "alice");
    let mut bob = platform.session(&joined, "bob");

    let (alice_outcome, bob_outcome) = tokio::join!(
        alice.play(PlayerMove::Choose {
            choice: alice_choice
        }),
        bob.play(PlayerMove::Choose { choice: bob_choice }),
    );
    assert!(alice_outcome.unwrap().is_applied());
    assert!(bob_outcome.unwrap().is_applied());

    alice.run_until_finished().await.unwrap();
    bob.run_until_finished().await.unwrap();

    let finished = platform.room_service.get_room(&room.room_id).await.unwrap();
    assert_eq!(finished.status, RoomStatus::Completed);
    assert_eq!(finished.winner_id.as_deref(), winner);

    for player in ["alice", "bob"] {
        let stats = platform.stats_service.get_stats(player).await.unwrap();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.games_won, u64::from(winner == Some(player)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_have_exactly_one_winner() {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::TicTacToe, "alice")
        .await
        .unwrap();

    let joiners = ["bob", "carol", "dave", "erin", "frank", "grace"];
    let handles: Vec<_> = joiners
        .iter()
        .map(|&joiner| {
            let service = platform.room_service.clone();
            let room_id = room.room_id.clone();
            tokio::spawn(async move { service.join_room(&room_id, joiner).await })
        })
        .collect();

    let mut seated = Vec::new();
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(joined) => seated.push(joined),
            Err(RoomServiceError::JoinConflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected join error: {}", e),
        }
    }

    assert_eq!(seated.len(), 1);
    assert_eq!(conflicts, joiners.len() - 1);

    let stored = platform.room_service.get_room(&room.room_id).await.unwrap();
    assert_eq!(stored.player2_id, seated[0].player2_id);
    assert_eq!(stored.status, RoomStatus::InProgress);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_creator_cannot_join_own_room() {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::RockPaperScissors, "alice")
        .await
        .unwrap();

    let result = platform.room_service.join_room(&room.room_id, "alice").await;

    assert!(matches!(result, Err(RoomServiceError::CannotJoinOwnRoom)));
    let stored = platform.room_service.get_room(&room.room_id).await.unwrap();
    assert!(stored.is_open());
}

#[tokio::test]
async fn test_open_rooms_feed_sees_rooms_come_and_go() {
    let platform = Platform::new();
    let mut lobby = platform.hub().subscribe(RoomFilter::OpenRooms);

    let first = platform
        .room_service
        .create_room(GameType::TicTacToe, "alice")
        .await
        .unwrap();
    platform
        .room_service
        .join_room(&first.room_id, "bob")
        .await
        .unwrap();
    platform
        .game_service
        .play_tic_tac_toe(&first.room_id, "alice", 4)
        .await
        .unwrap();
    let second = platform
        .room_service
        .create_room(GameType::RockPaperScissors, "carol")
        .await
        .unwrap();

    let created = lobby.recv().await.unwrap();
    assert_eq!(created.kind, RoomChangeKind::Inserted);
    assert_eq!(created.room_id(), first.room_id);

    let taken = lobby.recv().await.unwrap();
    assert_eq!(taken.room_id(), first.room_id);
    assert!(!taken.room.is_open());

    // The move does not touch the open list, so the next event is the second room.
    let next = lobby.recv().await.unwrap();
    assert_eq!(next.room_id(), second.room_id);

    let open = platform.room_service.list_open_rooms().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].room_id, second.room_id);
}

#[tokio::test]
async fn test_open_rooms_are_paged_newest_first() {
    let platform = Platform::new();
    let mut created = Vec::new();
    for offset in 0..12 {
        let mut room = shared::models::game_room::GameRoom::new(GameType::TicTacToe, "alice");
        room.created_at = chrono::Utc::now() + chrono::Duration::seconds(offset);
        platform.rooms.create_room(&room).await.unwrap();
        created.push(room.room_id);
    }

    let open = platform.room_service.list_open_rooms().await.unwrap();

    assert_eq!(open.len(), 10);
    assert_eq!(open[0].room_id, created[11]);
    assert!(open
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[tokio::test]
async fn test_illegal_moves_leave_the_row_untouched() {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::TicTacToe, "alice")
        .await
        .unwrap();

    let too_early = platform
        .game_service
        .play_tic_tac_toe(&room.room_id, "alice", 0)
        .await
        .unwrap();
    assert!(matches!(
        too_early,
        MoveOutcome::Ignored {
            reason: IllegalMove::RoomNotInProgress,
            ..
        }
    ));

    platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();
    platform
        .game_service
        .play_tic_tac_toe(&room.room_id, "alice", 0)
        .await
        .unwrap();
    let before = platform.room_service.get_room(&room.room_id).await.unwrap();

    let occupied = platform
        .game_service
        .play_tic_tac_toe(&room.room_id, "bob", 0)
        .await
        .unwrap();
    let off_board = platform
        .game_service
        .play_tic_tac_toe(&room.room_id, "bob", 9)
        .await
        .unwrap();
    let outsider = platform
        .game_service
        .play_tic_tac_toe(&room.room_id, "mallory", 5)
        .await
        .unwrap();

    assert!(matches!(
        occupied,
        MoveOutcome::Ignored {
            reason: IllegalMove::CellOccupied(0),
            ..
        }
    ));
    assert!(matches!(
        off_board,
        MoveOutcome::Ignored {
            reason: IllegalMove::CellOutOfRange(9),
            ..
        }
    ));
    assert!(matches!(
        outsider,
        MoveOutcome::Ignored {
            reason: IllegalMove::NotParticipant,
            ..
        }
    ));
    let after = platform.room_service.get_room(&room.room_id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_second_choice_is_ignored() {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::RockPaperScissors, "alice")
        .await
        .unwrap();
    platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();

    platform
        .game_service
        .make_choice(&room.room_id, "alice", Choice::Rock)
        .await
        .unwrap();
    let changed_mind = platform
        .game_service
        .make_choice(&room.room_id, "alice", Choice::Paper)
        .await
        .unwrap();

    assert!(matches!(
        changed_mind,
        MoveOutcome::Ignored {
            reason: IllegalMove::AlreadyChosen,
            ..
        }
    ));
    let stored = platform.room_service.get_room(&room.room_id).await.unwrap();
    assert_eq!(stored.status, RoomStatus::InProgress);
}

#[tokio::test]
async fn test_replayed_completion_is_counted_twice() {
    let platform = Platform::new();
    let mut feed = platform.hub().subscribe(RoomFilter::All);
    let room = platform
        .room_service
        .create_room(GameType::RockPaperScissors, "alice")
        .await
        .unwrap();
    platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();
    platform
        .game_service
        .make_choice(&room.room_id, "alice", Choice::Scissors)
        .await
        .unwrap();
    platform
        .game_service
        .make_choice(&room.room_id, "bob", Choice::Paper)
        .await
        .unwrap();

    let completion = loop {
        let change = feed.recv().await.unwrap();
        if change.completed_transition() {
            break change;
        }
    };

    // At-least-once delivery: the same terminal change arrives twice.
    for _ in 0..2 {
        platform
            .stats_service
            .on_room_change(&completion, "alice")
            .await
            .unwrap();
    }

    let alice = platform.stats.get_stats("alice").await.unwrap().unwrap();
    assert_eq!(alice.games_played, 2);
    assert_eq!(alice.games_won, 2);
}

#[tokio::test]
async fn test_cancelled_waiting_room_cannot_be_joined() {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::TicTacToe, "alice")
        .await
        .unwrap();

    let cancelled = platform
        .room_service
        .cancel_room(&room.room_id, "alice")
        .await
        .unwrap();
    assert_eq!(cancelled.status, RoomStatus::Cancelled);
    assert!(cancelled.player2_id.is_none());
    assert!(cancelled.winner_id.is_none());

    let late = platform.room_service.join_room(&room.room_id, "bob").await;
    assert!(matches!(late, Err(RoomServiceError::JoinConflict(_))));
    assert!(platform
        .room_service
        .list_open_rooms()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_abandoned_game_ends_when_a_participant_cancels() {
    let platform = Platform::new();
    let room = platform
        .room_service
        .create_room(GameType::TicTacToe, "alice")
        .await
        .unwrap();
    let joined = platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();
    let mut alice = platform.session(&joined, "alice");

    platform
        .room_service
        .cancel_room(&room.room_id, "bob")
        .await
        .unwrap();

    let recorded = tokio::time::timeout(FEED_TIMEOUT, alice.run_until_finished())
        .await
        .unwrap()
        .unwrap();
    assert!(recorded.is_none());
    assert_eq!(alice.room().status, RoomStatus::Cancelled);
    assert!(!alice.is_my_turn());
}

#[tokio::test]
async fn test_feed_driven_notifier_matches_table_stream() {
    let platform = Platform::new();
    let notifier = RoomNotifier::new(
        platform.subscription_service.clone(),
        platform.stats_service.clone(),
    );
    let mut feed = platform.hub().subscribe(RoomFilter::All);

    platform
        .subscription_service
        .subscribe("lobby-tab", &SubscriptionTopic::OpenRooms)
        .await
        .unwrap();
    let room = platform
        .room_service
        .create_room(GameType::RockPaperScissors, "alice")
        .await
        .unwrap();
    platform
        .subscription_service
        .subscribe("alice-tab", &SubscriptionTopic::Room(room.room_id.clone()))
        .await
        .unwrap();
    platform
        .room_service
        .join_room(&room.room_id, "bob")
        .await
        .unwrap();
    platform
        .game_service
        .make_choice(&room.room_id, "alice", Choice::Rock)
        .await
        .unwrap();
    platform
        .game_service
        .make_choice(&room.room_id, "bob", Choice::Scissors)
        .await
        .unwrap();

    // insert, join, two choices; both tabs are subscribed before the first is handled
    for _ in 0..4 {
        let change = feed.recv().await.unwrap();
        notifier.handle_change(&change).await.unwrap();
    }

    let sent = platform.subscriptions.sent().await;
    let lobby_messages = sent.iter().filter(|(conn, _)| conn == "lobby-tab").count();
    let room_messages = sent.iter().filter(|(conn, _)| conn == "alice-tab").count();
    assert_eq!(lobby_messages, 2);
    assert_eq!(room_messages, 4);

    let alice = platform.stats_service.get_stats("alice").await.unwrap();
    let bob = platform.stats_service.get_stats("bob").await.unwrap();
    assert_eq!((alice.games_played, alice.games_won), (1, 1));
    assert_eq!((bob.games_played, bob.games_won), (1, 0));
}
