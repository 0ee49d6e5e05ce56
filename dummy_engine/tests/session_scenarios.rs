//! Session scenarios played against rigged deals.
//!
//! Each test fixes the deal with a recorded deck order so the hands are
//! known, then drives the engine through public commands and checks the
//! score events and settlement it produced.

mod common;

use chrono::Utc;
use common::{discard, draw, ids, play, points, rigged_start, run_out};
use dummy_engine::game::{
    Action, Applied, Card, Command, CommandError, GameRules, GameSession, HeadPlay, ScoreEventKind,
    SessionStart, SessionStatus, TurnPhase, WinningType,
    Suit::{Club, Diamond, Heart, Spade},
    cards::{ACE, JACK, KING, QUEEN},
    scoring::aggregate,
};
use rand::{SeedableRng, rngs::StdRng};

// ============================================================================
// Dealing and drawing
// ============================================================================

#[test]
fn test_deal_then_draw() {
    let mut rng = StdRng::seed_from_u64(7);
    let start = SessionStart::shuffled("room-1", vec![1, 2], GameRules::default(), &mut rng, Utc::now());
    let mut session = GameSession::start(&start).unwrap();

    assert_eq!(session.hand(1).unwrap().len(), 7);
    assert_eq!(session.hand(2).unwrap().len(), 7);
    assert_eq!(session.discard_pile().len(), 1);
    assert_eq!(session.deck().len(), 37);
    assert_eq!(session.current_turn_gamer_id(), 1);

    let applied = draw(&mut session, 1);
    assert_eq!(applied.version, 1);
    assert!(applied.events.is_empty());
    assert_eq!(session.deck().len(), 36);
    assert_eq!(session.hand(1).unwrap().len(), 8);
    assert!(matches!(
        session.turns().phase(),
        TurnPhase::AwaitingMeldOrDiscard(_)
    ));
    session.check_invariants().unwrap();
}

#[test]
fn test_out_of_turn_and_out_of_phase_commands_rejected() {
    let mut rng = StdRng::seed_from_u64(8);
    let start = SessionStart::shuffled("room-1", vec![1, 2], GameRules::default(), &mut rng, Utc::now());
    let mut session = GameSession::start(&start).unwrap();

    assert_eq!(
        play(&mut session, 2, Action::DrawFromDeck).unwrap_err(),
        CommandError::NotYourTurn
    );

    let card = session.hand(1).unwrap().to_vec()[0];
    let err = play(&mut session, 1, Action::Discard { card_id: card.id() }).unwrap_err();
    assert!(matches!(err, CommandError::IllegalActionForState { .. }));
    assert_eq!(session.version(), 0);
}

#[test]
fn test_stale_version_rejected_without_changes() {
    let mut rng = StdRng::seed_from_u64(9);
    let start = SessionStart::shuffled("room-1", vec![1, 2], GameRules::default(), &mut rng, Utc::now());
    let mut session = GameSession::start(&start).unwrap();
    draw(&mut session, 1);

    let before = session.hand(1).unwrap().to_vec();
    let card = before[0];
    let stale = Command {
        gamer_id: 1,
        expected_version: 0,
        action: Action::Discard { card_id: card.id() },
    };
    assert_eq!(
        session.execute(stale, Utc::now()).unwrap_err(),
        CommandError::StaleMoveVersion {
            expected: 0,
            current: 1
        }
    );
    assert_eq!(session.version(), 1);
    assert_eq!(session.hand(1).unwrap().to_vec(), before);
    assert_eq!(session.discard_pile().len(), 1);
}

// ============================================================================
// Melds and head pickups
// ============================================================================

#[test]
fn test_speto_set_scores_110() {
    let twos = vec![Card(2, Diamond), Card(2, Spade), Card(2, Club)];
    let mut a_hand = twos.clone();
    a_hand.extend([Card(9, Heart), Card(10, Heart), Card(JACK, Spade), Card(KING, Diamond)]);
    let b_hand = vec![
        Card(3, Spade),
        Card(4, Club),
        Card(5, Diamond),
        Card(6, Club),
        Card(7, Spade),
        Card(8, Diamond),
        Card(9, Club),
    ];
    let start = rigged_start(&[a_hand, b_hand], Card(ACE, Heart), &[Card(KING, Club)]);
    let mut session = GameSession::start(&start).unwrap();

    draw(&mut session, 1);
    let applied = play(&mut session, 1, Action::Meld { card_ids: ids(&twos) }).unwrap();

    assert_eq!(points(&applied.events, 1, ScoreEventKind::MeldPoints), vec![60]);
    assert_eq!(points(&applied.events, 1, ScoreEventKind::SpetoMeldBonus), vec![50]);
    assert_eq!(applied.events.iter().map(|e| e.points).sum::<i32>(), 110);
    assert_eq!(session.totals()[&1].total(), 110);
    assert_eq!(session.melds().len(), 1);
}

#[test]
fn test_invalid_meld_leaves_hand_alone() {
    let a_hand = vec![
        Card(3, Heart),
        Card(4, Heart),
        Card(6, Heart),
        Card(9, Spade),
        Card(JACK, Diamond),
        Card(ACE, Club),
        Card(KING, Diamond),
    ];
    let b_hand = vec![
        Card(3, Spade),
        Card(4, Club),
        Card(5, Diamond),
        Card(6, Club),
        Card(7, Spade),
        Card(8, Diamond),
        Card(9, Club),
    ];
    let start = rigged_start(&[a_hand, b_hand], Card(ACE, Heart), &[Card(KING, Club)]);
    let mut session = GameSession::start(&start).unwrap();
    draw(&mut session, 1);

    let gap = ids(&[Card(3, Heart), Card(4, Heart), Card(6, Heart)]);
    assert_eq!(
        play(&mut session, 1, Action::Meld { card_ids: gap }).unwrap_err(),
        CommandError::InvalidMeld
    );
    assert_eq!(session.hand(1).unwrap().len(), 8);
    assert!(session.melds().is_empty());
    assert_eq!(session.version(), 1);
}

/// Player 1 discards 7♥ on the first turn; player 2 holds 5♥ 6♥.
fn head_pickup_session() -> GameSession {
    let a_hand = vec![
        Card(7, Heart),
        Card(2, Heart),
        Card(3, Heart),
        Card(4, Diamond),
        Card(9, Spade),
        Card(JACK, Diamond),
        Card(ACE, Club),
    ];
    let b_hand = vec![
        Card(5, Heart),
        Card(6, Heart),
        Card(8, Club),
        Card(8, Diamond),
        Card(8, Spade),
        Card(8, Heart),
        Card(KING, Club),
    ];
    let start = rigged_start(&[a_hand, b_hand], Card(QUEEN, Diamond), &[Card(10, Spade)]);
    let mut session = GameSession::start(&start).unwrap();
    draw(&mut session, 1);
    discard(&mut session, 1, Card(7, Heart));
    session
}

#[test]
fn test_head_meld_bonus_and_head_discard_penalty() {
    let mut session = head_pickup_session();
    let play_head = HeadPlay::Meld {
        card_ids: ids(&[Card(5, Heart), Card(6, Heart)]),
    };
    let applied = play(&mut session, 2, Action::DrawFromDiscard { play: play_head }).unwrap();

    assert_eq!(points(&applied.events, 2, ScoreEventKind::MeldPoints), vec![15]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::HeadBonus), vec![50]);
    assert_eq!(points(&applied.events, 1, ScoreEventKind::HeadDiscard), vec![-50]);

    let meld = session.melds().iter().next().unwrap();
    assert!(meld.created_from_head);
    assert_eq!(meld.owner, 2);
    assert!(session.discard_pile().cards().all(|c| *c != Card(7, Heart)));
}

#[test]
fn test_knock_after_head_pickup_charges_dummy_discard() {
    let mut session = head_pickup_session();
    let play_head = HeadPlay::Meld {
        card_ids: ids(&[Card(5, Heart), Card(6, Heart)]),
    };
    play(&mut session, 2, Action::DrawFromDiscard { play: play_head }).unwrap();
    let eights = ids(&[Card(8, Club), Card(8, Diamond), Card(8, Spade), Card(8, Heart)]);
    play(&mut session, 2, Action::Meld { card_ids: eights }).unwrap();
    let applied = play(
        &mut session,
        2,
        Action::Knock {
            discard: Some(Card(KING, Club).id()),
        },
    )
    .unwrap();

    assert_eq!(points(&applied.events, 1, ScoreEventKind::DummyDiscard), vec![-50]);
    // Mixed-suit set, so dark but not color.
    assert_eq!(points(&applied.events, 2, ScoreEventKind::DarkKnockBonus), vec![100]);
    // 2♥ 3♥ 4♦ 9♠ J♦ A♣ 10♠ = 55, doubled for never melding.
    assert_eq!(points(&applied.events, 1, ScoreEventKind::DarkLosePenalty), vec![-110]);
    assert!(points(&applied.events, 2, ScoreEventKind::HandPenalty).is_empty());

    let result = applied.result.unwrap();
    assert_eq!(result.winner_id, Some(2));
    assert_eq!(result.winning_type, WinningType::DarkKnock);
    assert_eq!(result.summary_for(1).unwrap().total_points, -210);
    assert_eq!(result.summary_for(2).unwrap().total_points, 185);
    assert_eq!(session.status(), &SessionStatus::Finished);
}

#[test]
fn test_speto_head_pickup() {
    let a_hand = vec![
        Card(QUEEN, Spade),
        Card(3, Diamond),
        Card(4, Diamond),
        Card(9, Club),
        Card(10, Club),
        Card(ACE, Diamond),
        Card(5, Club),
    ];
    let b_hand = vec![
        Card(JACK, Spade),
        Card(KING, Spade),
        Card(3, Heart),
        Card(7, Diamond),
        Card(8, Club),
        Card(9, Heart),
        Card(2, Heart),
    ];
    let start = rigged_start(&[a_hand, b_hand], Card(6, Heart), &[Card(4, Spade)]);
    let mut session = GameSession::start(&start).unwrap();
    draw(&mut session, 1);
    discard(&mut session, 1, Card(QUEEN, Spade));

    let play_head = HeadPlay::Meld {
        card_ids: ids(&[Card(JACK, Spade), Card(KING, Spade)]),
    };
    let applied = play(&mut session, 2, Action::DrawFromDiscard { play: play_head }).unwrap();

    assert_eq!(points(&applied.events, 2, ScoreEventKind::MeldPoints), vec![70]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::HeadBonus), vec![100]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::SpetoMeldBonus), vec![50]);
    assert_eq!(points(&applied.events, 1, ScoreEventKind::SpeToTarget), vec![-50]);
    assert!(points(&applied.events, 1, ScoreEventKind::HeadDiscard).is_empty());
}

/// Player 1 melds 3♥ 4♥ 5♥ on the first turn and discards `thrown`.
fn run_on_table_session(thrown: Card, b_hand: Vec<Card>) -> GameSession {
    let a_hand = vec![
        Card(3, Heart),
        Card(4, Heart),
        Card(5, Heart),
        Card(9, Spade),
        Card(JACK, Diamond),
        Card(ACE, Club),
        Card(KING, Diamond),
    ];
    let start = rigged_start(&[a_hand, b_hand], Card(8, Diamond), &[thrown]);
    let mut session = GameSession::start(&start).unwrap();
    draw(&mut session, 1);
    let run = ids(&[Card(3, Heart), Card(4, Heart), Card(5, Heart)]);
    play(&mut session, 1, Action::Meld { card_ids: run }).unwrap();
    discard(&mut session, 1, thrown);
    session
}

fn plain_b_hand(extra: Card) -> Vec<Card> {
    vec![
        extra,
        Card(2, Spade),
        Card(3, Club),
        Card(10, Diamond),
        Card(JACK, Club),
        Card(QUEEN, Club),
        Card(9, Diamond),
    ]
}

#[test]
fn test_layable_discard_is_foolish() {
    let mut session = run_on_table_session(Card(6, Heart), plain_b_hand(Card(4, Spade)));
    let play_head = HeadPlay::Layoff {
        meld_id: 1,
        card_ids: vec![],
    };
    let applied = play(&mut session, 2, Action::DrawFromDiscard { play: play_head }).unwrap();

    assert_eq!(points(&applied.events, 1, ScoreEventKind::FoolishDiscard), vec![-50]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::MeldPoints), vec![5]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::DepositBonus), vec![5]);
    assert_eq!(session.melds().get(1).unwrap().cards.len(), 4);
    assert!(session.melds().get(1).unwrap().contributors.contains(&2));
}

#[test]
fn test_unlayable_discard_laid_off_with_help_is_full_discard() {
    let mut session = run_on_table_session(Card(7, Heart), plain_b_hand(Card(6, Heart)));
    let play_head = HeadPlay::Layoff {
        meld_id: 1,
        card_ids: ids(&[Card(6, Heart)]),
    };
    let applied = play(&mut session, 2, Action::DrawFromDiscard { play: play_head }).unwrap();

    assert_eq!(points(&applied.events, 1, ScoreEventKind::FullDiscard), vec![-50]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::MeldPoints), vec![10]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::DepositBonus), vec![10]);
}

#[test]
fn test_ordinary_turns_score_nothing() {
    let mut session = run_on_table_session(Card(7, Heart), plain_b_hand(Card(6, Heart)));
    draw(&mut session, 2);
    discard(&mut session, 2, Card(2, Spade));
    draw(&mut session, 1);
    let events_before = session.score_events().len();
    discard(&mut session, 1, Card(KING, Diamond));
    assert_eq!(session.score_events().len(), events_before);
}

// ============================================================================
// Knocking
// ============================================================================

#[test]
fn test_dark_color_knock_three_players() {
    let a_hand = vec![
        Card(3, Club),
        Card(4, Club),
        Card(5, Club),
        Card(6, Club),
        Card(7, Club),
        Card(8, Club),
        Card(KING, Heart),
    ];
    let b_hand = vec![
        Card(9, Diamond),
        Card(9, Heart),
        Card(9, Spade),
        Card(2, Heart),
        Card(3, Heart),
        Card(4, Heart),
        Card(5, Heart),
    ];
    let c_hand = vec![
        Card(ACE, Diamond),
        Card(KING, Diamond),
        Card(QUEEN, Diamond),
        Card(JACK, Diamond),
        Card(10, Diamond),
        Card(2, Diamond),
        Card(3, Diamond),
    ];
    let draws = [Card(4, Diamond), Card(5, Diamond), Card(6, Diamond), Card(9, Club)];
    let start = rigged_start(&[a_hand, b_hand, c_hand], Card(7, Diamond), &draws);
    let mut session = GameSession::start(&start).unwrap();

    draw(&mut session, 1);
    discard(&mut session, 1, Card(4, Diamond));

    draw(&mut session, 2);
    let nines = ids(&[Card(9, Diamond), Card(9, Heart), Card(9, Spade)]);
    play(&mut session, 2, Action::Meld { card_ids: nines }).unwrap();
    discard(&mut session, 2, Card(5, Diamond));

    draw(&mut session, 3);
    discard(&mut session, 3, Card(6, Diamond));

    draw(&mut session, 1);
    let run: Vec<Card> = (3..=9).map(|rank| Card(rank, Club)).collect();
    play(&mut session, 1, Action::Meld { card_ids: ids(&run) }).unwrap();
    let applied = play(
        &mut session,
        1,
        Action::Knock {
            discard: Some(Card(KING, Heart).id()),
        },
    )
    .unwrap();

    assert_eq!(points(&applied.events, 1, ScoreEventKind::DarkColorKnockBonus), vec![200]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::HandPenalty), vec![-20]);
    assert_eq!(points(&applied.events, 3, ScoreEventKind::DarkLosePenalty), vec![-130]);

    let result = applied.result.unwrap();
    assert_eq!(result.winner_id, Some(1));
    assert_eq!(result.winning_type, WinningType::DarkColorKnock);
    assert_eq!(result.summary_for(1).unwrap().total_points, 235);
    assert_eq!(result.summary_for(2).unwrap().total_points, -5);
    assert_eq!(result.summary_for(3).unwrap().total_points, -130);
    assert_eq!(session.winning_type(), Some(WinningType::DarkColorKnock));
    assert!(!session.is_active());

    let totals = aggregate(session.score_events());
    for summary in &result.players {
        assert_eq!(summary.total_points, totals[&summary.gamer_id].total());
    }
}

/// A melds on their first turn, B draws and throws, then A draws the last
/// card of a second meld and knocks with the 7 of spades.
fn knock_on_second_turn(
    a_hand: Vec<Card>,
    first_meld: [Card; 3],
    throw: Card,
    second_meld: [Card; 3],
) -> (GameSession, Applied) {
    let b_hand = vec![
        Card(KING, Club),
        Card(QUEEN, Heart),
        Card(JACK, Diamond),
        Card(8, Spade),
        Card(7, Diamond),
        Card(6, Club),
    ];
    let draws = [Card(7, Spade), Card(2, Diamond), second_meld[2]];
    let start = rigged_start(&[a_hand, b_hand], Card(10, Spade), &draws);
    let mut session = GameSession::start(&start).unwrap();

    draw(&mut session, 1);
    play(&mut session, 1, Action::Meld { card_ids: ids(&first_meld) }).unwrap();
    discard(&mut session, 1, throw);

    draw(&mut session, 2);
    discard(&mut session, 2, Card(2, Diamond));

    draw(&mut session, 1);
    play(&mut session, 1, Action::Meld { card_ids: ids(&second_meld) }).unwrap();
    let applied = play(
        &mut session,
        1,
        Action::Knock {
            discard: Some(Card(7, Spade).id()),
        },
    )
    .unwrap();
    assert!(session.hand(1).unwrap().is_empty());
    (session, applied)
}

#[test]
fn test_knock_after_earlier_meld_is_plain() {
    let a_hand = vec![
        Card(3, Heart),
        Card(4, Heart),
        Card(5, Heart),
        Card(9, Club),
        Card(9, Diamond),
        Card(KING, Spade),
    ];
    let run = [Card(3, Heart), Card(4, Heart), Card(5, Heart)];
    let nines = [Card(9, Club), Card(9, Diamond), Card(9, Spade)];
    let (session, applied) = knock_on_second_turn(a_hand, run, Card(KING, Spade), nines);

    assert_eq!(points(&applied.events, 1, ScoreEventKind::KnockBonus), vec![50]);
    assert!(points(&applied.events, 1, ScoreEventKind::DarkKnockBonus).is_empty());
    assert!(points(&applied.events, 1, ScoreEventKind::ColorKnockBonus).is_empty());
    assert_eq!(points(&applied.events, 2, ScoreEventKind::DarkLosePenalty), vec![-90]);

    let result = applied.result.unwrap();
    assert_eq!(result.winner_id, Some(1));
    assert_eq!(result.winning_type, WinningType::Knock);
    assert_eq!(result.summary_for(1).unwrap().total_points, 80);
    assert_eq!(result.summary_for(2).unwrap().total_points, -90);
    assert_eq!(session.winning_type(), Some(WinningType::Knock));
}

#[test]
fn test_one_suit_knock_after_earlier_meld_is_color_knock() {
    let a_hand = vec![
        Card(3, Club),
        Card(4, Club),
        Card(5, Club),
        Card(9, Club),
        Card(10, Club),
        Card(KING, Heart),
    ];
    let low = [Card(3, Club), Card(4, Club), Card(5, Club)];
    let high = [Card(9, Club), Card(10, Club), Card(JACK, Club)];
    let (session, applied) = knock_on_second_turn(a_hand, low, Card(KING, Heart), high);

    assert_eq!(points(&applied.events, 1, ScoreEventKind::ColorKnockBonus), vec![100]);
    assert!(points(&applied.events, 1, ScoreEventKind::DarkColorKnockBonus).is_empty());
    assert_eq!(points(&applied.events, 2, ScoreEventKind::DarkLosePenalty), vec![-90]);

    let result = applied.result.unwrap();
    assert_eq!(result.winning_type, WinningType::ColorKnock);
    assert_eq!(result.summary_for(1).unwrap().total_points, 140);
    assert_eq!(session.winning_type(), Some(WinningType::ColorKnock));
}

#[test]
fn test_timeout_after_melding_out_knocks() {
    let a_hand = vec![Card(3, Heart), Card(4, Heart), Card(5, Heart)];
    let b_hand = vec![Card(KING, Club), Card(QUEEN, Diamond), Card(JACK, Diamond)];
    let start = rigged_start(&[a_hand, b_hand], Card(9, Spade), &[Card(6, Heart)]);
    let mut session = GameSession::start(&start).unwrap();

    draw(&mut session, 1);
    let run: Vec<Card> = (3..=6).map(|rank| Card(rank, Heart)).collect();
    play(&mut session, 1, Action::Meld { card_ids: ids(&run) }).unwrap();
    assert!(session.hand(1).unwrap().is_empty());

    let applied = session.expire_turn(Utc::now());
    assert_eq!(applied.len(), 1);
    assert!(applied[0].record.forced);
    assert_eq!(applied[0].record.action, Action::Knock { discard: None });
    assert_eq!(points(&applied[0].events, 2, ScoreEventKind::DarkLosePenalty), vec![-60]);
    assert_eq!(session.winning_type(), Some(WinningType::DarkColorKnock));
}

fn low_hand_start(threshold: i32) -> SessionStart {
    let a_hand = vec![
        Card(3, Spade),
        Card(4, Spade),
        Card(6, Diamond),
        Card(7, Club),
        Card(8, Heart),
        Card(9, Diamond),
        Card(5, Club),
    ];
    let b_hand = vec![
        Card(ACE, Spade),
        Card(KING, Spade),
        Card(JACK, Spade),
        Card(10, Spade),
        Card(10, Diamond),
        Card(9, Spade),
        Card(8, Spade),
    ];
    let mut start = rigged_start(&[a_hand, b_hand], Card(2, Heart), &[Card(4, Heart)]);
    start.rules.knock_threshold = threshold;
    start
}

#[test]
fn test_knock_over_threshold_rejected_atomically() {
    let mut session = GameSession::start(&low_hand_start(0)).unwrap();
    draw(&mut session, 1);

    let err = play(
        &mut session,
        1,
        Action::Knock {
            discard: Some(Card(4, Heart).id()),
        },
    )
    .unwrap_err();
    assert_eq!(
        err,
        CommandError::KnockDeadwoodExceedsThreshold {
            deadwood: 35,
            threshold: 0
        }
    );
    assert_eq!(session.hand(1).unwrap().len(), 8);
    assert_eq!(session.discard_pile().len(), 1);
    assert!(session.is_active());
}

#[test]
fn test_knock_within_threshold_pays_own_deadwood() {
    let mut session = GameSession::start(&low_hand_start(40)).unwrap();
    draw(&mut session, 1);
    let applied = play(
        &mut session,
        1,
        Action::Knock {
            discard: Some(Card(4, Heart).id()),
        },
    )
    .unwrap();

    assert_eq!(points(&applied.events, 1, ScoreEventKind::DarkKnockBonus), vec![100]);
    assert_eq!(points(&applied.events, 1, ScoreEventKind::HandPenalty), vec![-35]);
    assert_eq!(points(&applied.events, 2, ScoreEventKind::DarkLosePenalty), vec![-130]);
    assert_eq!(session.winner_id(), Some(1));
}

// ============================================================================
// Deck exhaustion
// ============================================================================

#[test]
fn test_deck_exhaustion_is_dummy_finish() {
    let twos = vec![Card(2, Diamond), Card(2, Spade), Card(2, Club)];
    let mut a_hand = twos.clone();
    a_hand.extend([Card(9, Heart), Card(10, Heart), Card(JACK, Spade), Card(KING, Diamond)]);
    let b_hand = vec![
        Card(3, Spade),
        Card(4, Club),
        Card(5, Diamond),
        Card(6, Club),
        Card(7, Spade),
        Card(8, Diamond),
        Card(9, Club),
    ];
    let start = rigged_start(&[a_hand, b_hand], Card(ACE, Heart), &[Card(KING, Club)]);
    let mut session = GameSession::start(&start).unwrap();

    draw(&mut session, 1);
    play(&mut session, 1, Action::Meld { card_ids: ids(&twos) }).unwrap();
    discard(&mut session, 1, Card(KING, Club));
    run_out(&mut session);

    assert!(session.deck().is_empty());
    assert_eq!(session.winning_type(), Some(WinningType::DummyFinish));
    assert_eq!(session.winner_id(), Some(1));
    // 3 opening moves, 36 forced draw/discard pairs, then the failed draw.
    assert_eq!(session.version(), 76);

    let knock_kinds = [
        ScoreEventKind::KnockBonus,
        ScoreEventKind::DarkKnockBonus,
        ScoreEventKind::ColorKnockBonus,
        ScoreEventKind::DarkColorKnockBonus,
    ];
    assert!(session
        .score_events()
        .iter()
        .all(|e| !knock_kinds.contains(&e.event_type)));
    let last: Vec<_> = session
        .score_events()
        .iter()
        .filter(|e| e.move_number == 76)
        .collect();
    assert!(!last.is_empty());
    assert!(last.iter().all(|e| e.event_type == ScoreEventKind::HandPenalty));

    let result = session.result().unwrap();
    assert_eq!(result.move_count, 76);
    assert!(result.summary_for(1).unwrap().is_winner);
    assert_eq!(
        play(&mut session, 2, Action::DrawFromDeck).unwrap_err(),
        CommandError::SessionNotActive
    );
}
