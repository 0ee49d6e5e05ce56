//! Replays a Thai Dummy game record and checks it against what was logged.
//!
//! Records come from a JSON file or straight from the PostgreSQL event log.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use dummy_engine::{
    game::{GameRules, GameSession, SessionStart},
    replay,
    session::SessionConfig,
    store::{CommitBatch, DatabaseConfig, EventLog, GameRecord, PgEventLog},
};
use pico_args::Arguments;
use rand::{SeedableRng, rngs::StdRng};
use std::{fs, path::PathBuf};
use uuid::Uuid;

const HELP: &str = "\
Replay and verify a Thai Dummy game record

USAGE:
  dm_replay [OPTIONS] [RECORD]

ARGS:
  RECORD                JSON game record (start record + moves)

OPTIONS:
  --session UUID        Load the record from PostgreSQL (DATABASE_URL)
  --simulate SEED       Play a game on turn timeouts alone and print its record
  --players N           Players for --simulate  [default: 2]
  --json                Print the result or running totals as JSON

FLAGS:
  -h, --help            Print help information
";

struct Args {
    record: Option<PathBuf>,
    session: Option<Uuid>,
    simulate: Option<u64>,
    players: usize,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        session: pargs.opt_value_from_str("--session")?,
        simulate: pargs.opt_value_from_str("--simulate")?,
        players: pargs.opt_value_from_str("--players")?.unwrap_or(2),
        json: pargs.contains("--json"),
        record: pargs.opt_free_from_str()?,
    };

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    if let Some(seed) = args.simulate {
        let record = simulate(seed, args.players)?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let record = match (args.session, &args.record) {
        (Some(session_id), _) => load_from_database(session_id).await?,
        (None, Some(path)) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw).context("Not a valid game record")?
        }
        (None, None) => bail!("No record given\n\n{HELP}"),
    };

    let session = replay::rebuild(&record).context("Replay failed")?;
    log::info!(
        "Replayed {} moves of session {}",
        record.moves.len(),
        session.id()
    );

    if args.json {
        let out = match session.result() {
            Some(result) => serde_json::to_string_pretty(result)?,
            None => serde_json::to_string_pretty(&session.totals())?,
        };
        println!("{out}");
    } else {
        print_report(&record, &session);
    }
    Ok(())
}

async fn load_from_database(session_id: Uuid) -> Result<GameRecord> {
    let config = DatabaseConfig::from_env().map_err(anyhow::Error::msg)?;
    let pool = config
        .connect()
        .await
        .context("Failed to connect to database")?;
    let log = PgEventLog::new(pool);
    Ok(log.load(session_id).await?)
}

/// A game where every turn times out: draw, dump the heaviest card, repeat
/// until the deck runs dry.
fn simulate(seed: u64, players: usize) -> Result<GameRecord> {
    let players: Vec<i64> = (1..=players as i64).collect();
    SessionConfig::default()
        .validate_players(&players)
        .map_err(anyhow::Error::msg)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let start = SessionStart::shuffled("simulated", players, GameRules::default(), &mut rng, Utc::now());
    let mut session = GameSession::start(&start)?;
    let mut record = GameRecord::new(start);
    while session.is_active() {
        let applied = session.expire_turn(Utc::now());
        if applied.is_empty() {
            bail!("Simulation stalled at version {}", session.version());
        }
        record.moves.extend(applied.iter().map(CommitBatch::from));
    }
    record.status = session.status().clone();
    Ok(record)
}

fn print_report(record: &GameRecord, session: &GameSession) {
    println!("Session   {}", session.id());
    println!("Room      {}", session.room_id());
    println!("Moves     {}", session.version());
    println!("Status    {:?}", session.status());
    if let Some(winning_type) = session.winning_type() {
        match session.winner_id() {
            Some(winner) => println!("Winner    {winner} ({winning_type})"),
            None => println!("Winner    none ({winning_type})"),
        }
    }
    let forced = record.moves.iter().filter(|m| m.record.forced).count();
    if forced > 0 {
        println!("Timeouts  {forced} forced moves");
    }

    println!();
    println!(
        "{:>10} {:>7} {:>7} {:>8} {:>7} {:>7}",
        "gamer", "meld", "bonus", "penalty", "hand", "total"
    );
    let totals = session.totals();
    for &gamer in session.players() {
        let t = totals.get(&gamer).copied().unwrap_or_default();
        println!(
            "{:>10} {:>7} {:>7} {:>8} {:>7} {:>7}",
            gamer,
            t.meld_points,
            t.bonus_points,
            t.penalty_points,
            t.hand_points,
            t.total()
        );
    }
}
