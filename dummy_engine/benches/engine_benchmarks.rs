use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dummy_engine::{
    game::{
        Action, Card, Command, GameRules, GameSession, SessionStart, Suit,
        rules::classify_meld,
        scoring::aggregate,
    },
    replay,
    store::{CommitBatch, GameRecord},
};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

/// Helper to deal a seeded session with N players
fn setup_session(n_players: usize) -> (SessionStart, GameSession) {
    let mut rng = StdRng::seed_from_u64(n_players as u64);
    let players = (1..=n_players as i64).collect();
    let start = SessionStart::shuffled("bench", players, GameRules::default(), &mut rng, Utc::now());
    let session = GameSession::start(&start).unwrap();
    (start, session)
}

/// Plays a session out on forced turns, collecting its record
fn played_record(n_players: usize) -> GameRecord {
    let (start, mut session) = setup_session(n_players);
    let mut record = GameRecord::new(start);
    while session.is_active() {
        let applied = session.expire_turn(Utc::now());
        record.moves.extend(applied.iter().map(CommitBatch::from));
    }
    record.status = session.status().clone();
    record
}

fn bench_meld_validation(c: &mut Criterion) {
    let set = vec![Card(9, Suit::Club), Card(9, Suit::Heart), Card(9, Suit::Spade)];
    let run: Vec<Card> = (3..=9).rev().map(|rank| Card(rank, Suit::Diamond)).collect();
    let junk = vec![Card(2, Suit::Club), Card(7, Suit::Heart), Card(12, Suit::Spade)];

    c.bench_function("classify_set", |b| b.iter(|| classify_meld(black_box(&set))));
    c.bench_function("classify_run_7", |b| b.iter(|| classify_meld(black_box(&run))));
    c.bench_function("classify_invalid", |b| b.iter(|| classify_meld(black_box(&junk))));
}

fn bench_command_commit(c: &mut Criterion) {
    let (_, session) = setup_session(4);
    c.bench_function("draw_from_deck", |b| {
        b.iter(|| {
            let mut session = session.clone();
            let command = Command {
                gamer_id: 1,
                expected_version: 0,
                action: Action::DrawFromDeck,
            };
            black_box(session.execute(command, Utc::now()).unwrap());
        });
    });

    c.bench_function("rejected_command", |b| {
        b.iter(|| {
            let mut session = session.clone();
            let command = Command {
                gamer_id: 2,
                expected_version: 0,
                action: Action::DrawFromDeck,
            };
            black_box(session.execute(command, Utc::now()).unwrap_err());
        });
    });
}

fn bench_full_game(c: &mut Criterion) {
    let mut group = c.benchmark_group("forced_game");
    for players in [2, 3, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(players), &players, |b, &n| {
            b.iter(|| black_box(played_record(n)));
        });
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    for players in [2, 4] {
        let record = played_record(players);
        group.bench_with_input(BenchmarkId::from_parameter(players), &record, |b, record| {
            b.iter(|| black_box(replay::rebuild(record).unwrap()));
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let record = played_record(4);
    let session = replay::rebuild(&record).unwrap();
    c.bench_function("aggregate_scores", |b| {
        b.iter(|| aggregate(black_box(session.score_events())));
    });
    c.bench_function("view_for", |b| b.iter(|| black_box(session.view_for(1))));
}

criterion_group!(rules, bench_meld_validation);

criterion_group!(
    sessions,
    bench_command_commit,
    bench_full_game,
    bench_replay,
    bench_aggregate,
);

criterion_main!(rules, sessions);
