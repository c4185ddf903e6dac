// Draft coordinator entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database
// 4. Import the player pool
// 5. Ensure the draft instance and its roster exist
// 6. Create mpsc channels
// 7. Spawn WebSocket server task
// 8. Run the application event loop
// 9. Cleanup on exit

use std::sync::Arc;
use std::time::Duration;

use draft_coordinator::app;
use draft_coordinator::config;
use draft_coordinator::db::Database;
use draft_coordinator::draft::engine::DraftEngine;
use draft_coordinator::draft::state::DraftStatus;
use draft_coordinator::draft::team::TeamKind;
use draft_coordinator::pool;
use draft_coordinator::ws_server;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Draft coordinator starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} rounds",
        config.league.name, config.league.num_teams, config.league.total_rounds
    );

    // 3. Open database
    let db = Arc::new(Database::open(&config.db_path).context("failed to open database")?);
    info!("Database opened at {}", config.db_path);

    // 4. Import the player pool
    let players = pool::load_players(std::path::Path::new(&config.players_path))
        .context("failed to load player pool")?;
    let total = db
        .import_players(&players)
        .context("failed to import players")?;
    info!("Player pool ready: {total} players");

    // 5. Ensure the draft instance and its roster exist. The draft id is
    // derived from the league name, so restarting the process resumes the
    // same draft from the database.
    let engine = Arc::new(DraftEngine::new(Arc::clone(&db)));
    let draft_id = draft_id_for(&config.league.name);
    ensure_draft(&engine, &db, &config, &draft_id).context("failed to prepare draft instance")?;

    // 6. Create mpsc channels
    let (ws_tx, ws_rx) = mpsc::channel(256);
    let (out_tx, out_rx) = mpsc::channel(256);

    // 7. Spawn WebSocket server task
    let ws_port = config.ws_port;
    let ws_handle = tokio::spawn(async move {
        if let Err(e) = ws_server::run(ws_port, ws_tx, out_rx).await {
            error!("WebSocket server error: {e}");
        }
    });

    // 8. Run the application event loop (blocks until shutdown)
    info!("Draft {draft_id} ready. WebSocket server listening on 127.0.0.1:{ws_port}");
    let state = app::AppState::new(
        engine,
        Duration::from_millis(config.bots.think_delay_ms),
        config.league.commissioner.clone(),
        out_tx,
    );
    if let Err(e) = app::run(ws_rx, state).await {
        error!("Application loop error: {e}");
    }

    // 9. Cleanup: the ws server loops forever, abort it.
    ws_handle.abort();

    info!("Draft coordinator shut down cleanly");
    Ok(())
}

/// Stable draft instance id for a league name (lowercased, spaces to
/// underscores).
fn draft_id_for(league_name: &str) -> String {
    let slug: String = league_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("draft_{slug}")
}

/// Create the draft instance if it doesn't exist yet and fill its roster:
/// configured human entrants first, then bot teams up to capacity. Safe to
/// call on every startup -- existing instances and teams are left alone, and
/// a draft that already started is never touched.
fn ensure_draft(
    engine: &DraftEngine,
    db: &Database,
    config: &config::Config,
    draft_id: &str,
) -> anyhow::Result<()> {
    let league = &config.league;

    let state = match db.load_draft(draft_id)? {
        Some(state) => state,
        None => {
            engine
                .create_draft(draft_id, league.total_rounds, league.num_teams)
                .map_err(|e| anyhow::anyhow!("failed to create draft: {e}"))?;
            db.load_draft(draft_id)?
                .context("draft missing after creation")?
        }
    };

    if state.status != DraftStatus::NotStarted {
        info!(
            "Resuming draft {draft_id}: status={}, pick={}",
            state.status, state.current_pick
        );
        return Ok(());
    }

    for entry in &league.teams {
        if db.team_by_name(draft_id, &entry.name)?.is_none() {
            engine
                .register_team(
                    draft_id,
                    &entry.name,
                    TeamKind::Human {
                        owner: entry.owner.clone(),
                    },
                )
                .map_err(|e| anyhow::anyhow!("failed to register team `{}`: {e}", entry.name))?;
        }
    }

    // Fill remaining seats with bots, skipping names that already exist.
    let mut bot_index = 1;
    while db.team_count(draft_id)? < league.num_teams {
        let name = format!("{} {bot_index}", league.bot_name_prefix);
        bot_index += 1;
        if db.team_by_name(draft_id, &name)?.is_none() {
            engine
                .register_team(draft_id, &name, TeamKind::Bot)
                .map_err(|e| anyhow::anyhow!("failed to register bot `{name}`: {e}"))?;
        }
    }

    info!(
        "Draft {draft_id} roster ready: {} teams ({} human)",
        db.team_count(draft_id)?,
        league.teams.len()
    );
    Ok(())
}

/// Initialize tracing to log to a file (the terminal stays clean for
/// operator output).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("draftd.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draft_coordinator=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
