// SQLite persistence layer for drafts, teams, players, and the pick ledger.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::draft::pick::Pick;
use crate::draft::state::{DraftState, DraftStatus};
use crate::draft::team::{Team, TeamKind};

/// A player in the global pool. Availability is per draft instance and is
/// derived from the pick ledger, not stored on the player row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub display_name: String,
}

/// SQLite-backed persistence for draft instances, their rosters, the player
/// pool, and the append-only pick ledger.
///
/// Every draft-scoped row carries a `draft_id`, so independent draft
/// instances never share turn state or player availability.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS drafts (
                draft_id      TEXT PRIMARY KEY,
                status        TEXT NOT NULL DEFAULT 'not_started',
                draft_order   TEXT NOT NULL DEFAULT '[]',
                current_round INTEGER NOT NULL DEFAULT 1,
                current_pick  INTEGER NOT NULL DEFAULT 0,
                total_rounds  INTEGER NOT NULL,
                capacity      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS teams (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                draft_id TEXT NOT NULL REFERENCES drafts(draft_id),
                name     TEXT NOT NULL,
                kind     TEXT NOT NULL,
                owner    TEXT,
                UNIQUE(draft_id, name)
            );

            CREATE TABLE IF NOT EXISTS players (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS picks (
                pick_number INTEGER NOT NULL,
                draft_id    TEXT NOT NULL REFERENCES drafts(draft_id),
                team_id     INTEGER NOT NULL REFERENCES teams(id),
                team_name   TEXT NOT NULL,
                player_id   INTEGER NOT NULL REFERENCES players(id),
                player_name TEXT NOT NULL,
                round       INTEGER NOT NULL,
                timestamp   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (pick_number, draft_id),
                UNIQUE(draft_id, player_id)
            );

            CREATE INDEX IF NOT EXISTS idx_teams_draft_id ON teams(draft_id);
            CREATE INDEX IF NOT EXISTS idx_picks_draft_id ON picks(draft_id);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Draft instances
    // ------------------------------------------------------------------

    /// Create a fresh draft instance row. Fails if the draft_id is taken.
    pub fn create_draft(&self, draft_id: &str, total_rounds: u32, capacity: usize) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO drafts (draft_id, total_rounds, capacity) VALUES (?1, ?2, ?3)",
            params![draft_id, total_rounds, capacity as i64],
        )
        .with_context(|| format!("failed to create draft {draft_id}"))?;
        Ok(())
    }

    /// Load the state record for a draft instance. Returns `None` if the
    /// instance does not exist.
    pub fn load_draft(&self, draft_id: &str) -> Result<Option<DraftState>> {
        let conn = self.conn();
        Self::load_draft_on(&conn, draft_id)
    }

    fn load_draft_on(conn: &Connection, draft_id: &str) -> Result<Option<DraftState>> {
        let row = conn
            .query_row(
                "SELECT status, draft_order, current_round, current_pick, total_rounds, capacity
                 FROM drafts WHERE draft_id = ?1",
                params![draft_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()
            .context("failed to query draft state")?;

        let Some((status, order_json, current_round, current_pick, total_rounds, capacity)) = row
        else {
            return Ok(None);
        };

        let status = DraftStatus::from_str_status(&status)
            .with_context(|| format!("unknown draft status `{status}` in database"))?;
        let draft_order: Vec<String> = serde_json::from_str(&order_json)
            .context("failed to deserialize draft_order column")?;

        Ok(Some(DraftState {
            draft_id: draft_id.to_string(),
            status,
            draft_order,
            current_round,
            current_pick,
            total_rounds,
            capacity: capacity as usize,
        }))
    }

    /// Transition a draft to `in_progress` and store its (freshly shuffled)
    /// order. The order is written exactly once here and only cleared again
    /// by [`Database::reset_draft`].
    pub fn mark_started(&self, draft_id: &str, order: &[String]) -> Result<()> {
        let conn = self.conn();
        let order_json =
            serde_json::to_string(order).context("failed to serialize draft order")?;
        let changed = conn
            .execute(
                "UPDATE drafts SET status = 'in_progress', draft_order = ?2 WHERE draft_id = ?1",
                params![draft_id, order_json],
            )
            .context("failed to mark draft started")?;
        anyhow::ensure!(changed == 1, "draft {draft_id} not found");
        Ok(())
    }

    /// Transition a draft to `cancelled`.
    pub fn mark_cancelled(&self, draft_id: &str) -> Result<()> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE drafts SET status = 'cancelled' WHERE draft_id = ?1",
                params![draft_id],
            )
            .context("failed to mark draft cancelled")?;
        anyhow::ensure!(changed == 1, "draft {draft_id} not found");
        Ok(())
    }

    /// Administrative reset: delete the instance's entire pick ledger, clear
    /// the order, zero the counters, and return the status to `not_started`.
    /// One transaction with automatic rollback on error.
    pub fn reset_draft(&self, draft_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin reset transaction")?;
        tx.execute("DELETE FROM picks WHERE draft_id = ?1", params![draft_id])
            .context("failed to delete picks")?;
        tx.execute(
            "UPDATE drafts
             SET status = 'not_started', draft_order = '[]',
                 current_round = 1, current_pick = 0
             WHERE draft_id = ?1",
            params![draft_id],
        )
        .context("failed to reset draft state")?;
        tx.commit().context("failed to commit reset")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Register a team in a draft instance. Returns the new team's row id.
    /// The `(draft_id, name)` unique constraint rejects duplicate names.
    pub fn register_team(&self, draft_id: &str, name: &str, kind: &TeamKind) -> Result<i64> {
        let conn = self.conn();
        let id: i64 = conn
            .query_row(
                "INSERT INTO teams (draft_id, name, kind, owner)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id",
                params![draft_id, name, kind.as_str(), kind.owner()],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to register team `{name}` in draft {draft_id}"))?;
        Ok(id)
    }

    /// All teams registered in a draft instance, ordered by registration.
    pub fn list_teams(&self, draft_id: &str) -> Result<Vec<Team>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, kind, owner FROM teams WHERE draft_id = ?1 ORDER BY id")
            .context("failed to prepare list_teams query")?;

        let teams = stmt
            .query_map(params![draft_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .context("failed to query teams")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map team rows")?
            .into_iter()
            .map(|(id, name, kind, owner)| {
                let kind = TeamKind::from_db(&kind, owner)
                    .with_context(|| format!("unknown team kind `{kind}` in database"))?;
                Ok(Team { id, name, kind })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(teams)
    }

    /// Number of teams registered in a draft instance.
    pub fn team_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM teams WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count teams")?;
        Ok(count as usize)
    }

    /// Look up a team by display name within one draft instance.
    pub fn team_by_name(&self, draft_id: &str, name: &str) -> Result<Option<Team>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, kind, owner FROM teams WHERE draft_id = ?1 AND name = ?2",
                params![draft_id, name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()
            .context("failed to query team by name")?;

        match row {
            Some((id, kind, owner)) => {
                let kind = TeamKind::from_db(&kind, owner)
                    .with_context(|| format!("unknown team kind `{kind}` in database"))?;
                Ok(Some(Team {
                    id,
                    name: name.to_string(),
                    kind,
                }))
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Insert a player into the global pool, or return the existing row id
    /// if the name is already present. Single atomic statement.
    pub fn upsert_player(&self, name: &str) -> Result<i64> {
        let conn = self.conn();
        let id: i64 = conn
            .query_row(
                "INSERT INTO players (name) VALUES (?1)
                 ON CONFLICT(name) DO UPDATE SET name = excluded.name
                 RETURNING id",
                params![name],
                |row| row.get(0),
            )
            .with_context(|| format!("failed to upsert player `{name}`"))?;
        Ok(id)
    }

    /// Import a batch of players in one transaction. Returns how many rows
    /// the pool holds afterwards.
    pub fn import_players(&self, names: &[String]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for name in names {
            tx.execute(
                "INSERT INTO players (name) VALUES (?1)
                 ON CONFLICT(name) DO NOTHING",
                params![name],
            )
            .with_context(|| format!("failed to import player `{name}`"))?;
        }
        let total: i64 = tx
            .query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))
            .context("failed to count players")?;
        tx.commit().context("failed to commit player import")?;
        Ok(total as usize)
    }

    /// Whether a player row exists.
    pub fn player_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM players WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
            .context("failed to check player existence")?;
        Ok(exists)
    }

    /// Look up a player by id.
    pub fn player(&self, id: i64) -> Result<Option<Player>> {
        let conn = self.conn();
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM players WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query player")?;
        Ok(name.map(|display_name| Player { id, display_name }))
    }

    /// Players not yet picked in the given draft instance. Availability is
    /// the absence of a pick row for `(draft_id, player_id)` -- there is no
    /// global availability flag, so concurrent instances never interfere.
    pub fn list_available_players(&self, draft_id: &str) -> Result<Vec<Player>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT p.id, p.name FROM players p
                 WHERE NOT EXISTS (
                     SELECT 1 FROM picks k
                     WHERE k.draft_id = ?1 AND k.player_id = p.id
                 )
                 ORDER BY p.id",
            )
            .context("failed to prepare available players query")?;

        let players = stmt
            .query_map(params![draft_id], |row| {
                Ok(Player {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                })
            })
            .context("failed to query available players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;

        Ok(players)
    }

    /// Whether a player has already been picked in this draft instance.
    pub fn player_picked(&self, draft_id: &str, player_id: i64) -> Result<bool> {
        let conn = self.conn();
        let picked: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM picks WHERE draft_id = ?1 AND player_id = ?2)",
                params![draft_id, player_id],
                |row| row.get(0),
            )
            .context("failed to check pick existence")?;
        Ok(picked)
    }

    // ------------------------------------------------------------------
    // Pick ledger
    // ------------------------------------------------------------------

    /// Commit one pick: insert the ledger row and advance the draft's
    /// counters (and status, when the pick completes the draft) in a single
    /// transaction. Either everything lands or nothing does.
    ///
    /// Returns the stored pick with its database-generated timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_pick(
        &self,
        draft_id: &str,
        pick_number: u32,
        team_id: i64,
        team_name: &str,
        player_id: i64,
        player_name: &str,
        round: u32,
        new_round: u32,
        new_status: DraftStatus,
    ) -> Result<Pick> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin pick transaction")?;

        tx.execute(
            "INSERT INTO picks
                (pick_number, draft_id, team_id, team_name, player_id, player_name, round)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![pick_number, draft_id, team_id, team_name, player_id, player_name, round],
        )
        .context("failed to insert pick")?;

        tx.execute(
            "UPDATE drafts
             SET current_pick = ?2, current_round = ?3, status = ?4
             WHERE draft_id = ?1",
            params![draft_id, pick_number, new_round, new_status.as_str()],
        )
        .context("failed to advance draft counters")?;

        let timestamp: String = tx
            .query_row(
                "SELECT timestamp FROM picks WHERE draft_id = ?1 AND pick_number = ?2",
                params![draft_id, pick_number],
                |row| row.get(0),
            )
            .context("failed to read back pick timestamp")?;

        tx.commit().context("failed to commit pick")?;

        let timestamp = parse_timestamp(&timestamp)?;
        Ok(Pick {
            pick_number,
            draft_id: draft_id.to_string(),
            team_id,
            team_name: team_name.to_string(),
            player_id,
            player_name: player_name.to_string(),
            round,
            timestamp,
        })
    }

    /// Load the full pick ledger for a draft instance, ordered by pick
    /// number.
    pub fn load_picks(&self, draft_id: &str) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pick_number, team_id, team_name, player_id, player_name, round, timestamp
                 FROM picks WHERE draft_id = ?1 ORDER BY pick_number",
            )
            .context("failed to prepare load_picks query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, u32>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .context("failed to query picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map pick rows")?;

        rows.into_iter()
            .map(|(pick_number, team_id, team_name, player_id, player_name, round, ts)| {
                Ok(Pick {
                    pick_number,
                    draft_id: draft_id.to_string(),
                    team_id,
                    team_name,
                    player_id,
                    player_name,
                    round,
                    timestamp: parse_timestamp(&ts)?,
                })
            })
            .collect()
    }

    /// Number of picks committed for a draft instance.
    pub fn pick_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM picks WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count picks")?;
        Ok(count as usize)
    }

    /// Generate a new unique draft ID based on the current UTC timestamp.
    ///
    /// Format: `draft_YYYYMMDD_HHMMSS_SSS`. The millisecond suffix keeps
    /// IDs unique even when two drafts start in the same second.
    pub fn generate_draft_id() -> String {
        let now = chrono::Utc::now();
        now.format("draft_%Y%m%d_%H%M%S_%3f").to_string()
    }
}

/// Parse the SQLite-generated ISO-8601 timestamp column.
fn parse_timestamp(ts: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse pick timestamp `{ts}`"))
}
