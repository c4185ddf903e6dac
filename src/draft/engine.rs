// The draft turn engine: pick validation, atomic application, lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::db::{Database, Player};

use super::error::DraftError;
use super::order;
use super::pick::{Pick, PickOutcome};
use super::state::{DraftState, DraftStatus};
use super::team::{Team, TeamKind};
use super::turn;

/// Notification fired after every successful state-changing operation.
///
/// Carries enough for a subscriber to refresh its view; transport (push,
/// poll, WebSocket forwarding) is the subscriber's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DraftEvent {
    Started {
        draft_id: String,
        order: Vec<String>,
    },
    PickApplied {
        draft_id: String,
        #[serde(flatten)]
        outcome: PickOutcome,
    },
    Reset {
        draft_id: String,
    },
    Cancelled {
        draft_id: String,
    },
}

/// Full read-only view of one draft instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub state: DraftState,
    pub teams: Vec<Team>,
    pub picks: Vec<Pick>,
    /// Name of the team on the clock, if the draft is running.
    pub next_team: Option<String>,
    pub available_players: Vec<Player>,
}

/// The turn engine for snake drafts.
///
/// All mutations of a draft instance's state go through this type. Each
/// instance has its own serialization lock, held across the whole
/// read-validate-commit sequence of `apply_pick`, so concurrent callers
/// racing for the same turn slot resolve to exactly one winner. Different
/// instances share nothing but the connection.
pub struct DraftEngine {
    db: Arc<Database>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    events: broadcast::Sender<DraftEvent>,
}

impl DraftEngine {
    pub fn new(db: Arc<Database>) -> Self {
        let (events, _) = broadcast::channel(256);
        DraftEngine {
            db,
            locks: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Subscribe to change notifications. Every successful `start_draft`,
    /// `apply_pick`, `reset_draft`, and `cancel_draft` emits one event.
    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.events.subscribe()
    }

    /// The per-instance serialization lock, created lazily.
    fn instance_lock(&self, draft_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("engine lock map poisoned");
        locks
            .entry(draft_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn emit(&self, event: DraftEvent) {
        // No subscribers is fine; notifications are best-effort.
        let _ = self.events.send(event);
    }

    fn load(&self, draft_id: &str) -> Result<DraftState, DraftError> {
        self.db
            .load_draft(draft_id)
            .map_err(DraftError::storage)?
            .ok_or_else(|| DraftError::DraftNotFound {
                draft_id: draft_id.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Instance lifecycle
    // ------------------------------------------------------------------

    /// Create a new draft instance configured for `total_rounds` rounds and
    /// exactly `capacity` teams.
    pub fn create_draft(
        &self,
        draft_id: &str,
        total_rounds: u32,
        capacity: usize,
    ) -> Result<(), DraftError> {
        if total_rounds == 0 || capacity == 0 {
            return Err(DraftError::PreconditionFailed {
                expected: 1,
                actual: 0,
            });
        }
        self.db
            .create_draft(draft_id, total_rounds, capacity)
            .map_err(DraftError::storage)?;
        info!(draft_id, total_rounds, capacity, "draft instance created");
        Ok(())
    }

    /// Register a team. Only allowed before the draft starts; names are
    /// unique per instance and the roster cannot exceed capacity.
    pub fn register_team(
        &self,
        draft_id: &str,
        name: &str,
        kind: TeamKind,
    ) -> Result<Team, DraftError> {
        let lock = self.instance_lock(draft_id);
        let _guard = lock.lock().expect("instance lock poisoned");

        let state = self.load(draft_id)?;
        match state.status {
            DraftStatus::NotStarted => {}
            DraftStatus::InProgress => return Err(DraftError::AlreadyStarted),
            status => return Err(DraftError::AlreadyTerminal { status }),
        }

        let count = self.db.team_count(draft_id).map_err(DraftError::storage)?;
        if count >= state.capacity {
            return Err(DraftError::RosterFull {
                capacity: state.capacity,
            });
        }
        if self
            .db
            .team_by_name(draft_id, name)
            .map_err(DraftError::storage)?
            .is_some()
        {
            return Err(DraftError::DuplicateTeamName {
                name: name.to_string(),
            });
        }

        let id = self
            .db
            .register_team(draft_id, name, &kind)
            .map_err(DraftError::storage)?;
        info!(draft_id, team = name, kind = %kind, "team registered");
        Ok(Team {
            id,
            name: name.to_string(),
            kind,
        })
    }

    /// Start the draft: requires a full roster, shuffles the order once,
    /// and moves the state machine to `in_progress`. Returns the order.
    pub fn start_draft(&self, draft_id: &str) -> Result<Vec<String>, DraftError> {
        let lock = self.instance_lock(draft_id);
        let _guard = lock.lock().expect("instance lock poisoned");

        let state = self.load(draft_id)?;
        match state.status {
            DraftStatus::NotStarted => {}
            DraftStatus::InProgress => return Err(DraftError::AlreadyStarted),
            status => return Err(DraftError::AlreadyTerminal { status }),
        }

        let teams = self.db.list_teams(draft_id).map_err(DraftError::storage)?;
        let names: Vec<String> = teams.into_iter().map(|t| t.name).collect();
        let order = order::generate(&names, state.capacity)?;

        self.db
            .mark_started(draft_id, &order)
            .map_err(DraftError::storage)?;
        info!(draft_id, ?order, "draft started");
        self.emit(DraftEvent::Started {
            draft_id: draft_id.to_string(),
            order: order.clone(),
        });
        Ok(order)
    }

    /// Cancel a running draft. Terminal; only `reset_draft` can revive the
    /// instance afterwards.
    pub fn cancel_draft(&self, draft_id: &str) -> Result<(), DraftError> {
        let lock = self.instance_lock(draft_id);
        let _guard = lock.lock().expect("instance lock poisoned");

        let state = self.load(draft_id)?;
        match state.status {
            DraftStatus::InProgress => {}
            DraftStatus::NotStarted => return Err(DraftError::NotStarted),
            status => return Err(DraftError::AlreadyTerminal { status }),
        }

        self.db.mark_cancelled(draft_id).map_err(DraftError::storage)?;
        warn!(draft_id, "draft cancelled");
        self.emit(DraftEvent::Cancelled {
            draft_id: draft_id.to_string(),
        });
        Ok(())
    }

    /// Administrative escape hatch: wipe the instance's pick ledger and
    /// return it to `not_started` with zeroed counters. Registered teams
    /// survive; the order is regenerated on the next start.
    pub fn reset_draft(&self, draft_id: &str) -> Result<(), DraftError> {
        let lock = self.instance_lock(draft_id);
        let _guard = lock.lock().expect("instance lock poisoned");

        // Ensure the instance exists so reset reports DraftNotFound rather
        // than silently succeeding.
        self.load(draft_id)?;
        self.db.reset_draft(draft_id).map_err(DraftError::storage)?;
        warn!(draft_id, "draft reset to not_started");
        self.emit(DraftEvent::Reset {
            draft_id: draft_id.to_string(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Turn resolution and picks
    // ------------------------------------------------------------------

    /// Name of the team whose turn it is now, or `None` when the draft is
    /// not running.
    pub fn next_team(&self, draft_id: &str) -> Result<Option<String>, DraftError> {
        let state = self.load(draft_id)?;
        if state.status != DraftStatus::InProgress {
            return Ok(None);
        }
        Ok(
            turn::resolve(&state.draft_order, state.current_round, state.current_pick)
                .map(|s| s.to_string()),
        )
    }

    /// Validate and apply one pick.
    ///
    /// The sequence: status gate, turn-ownership check, team resolution,
    /// player existence and availability, then a single transactional
    /// commit that appends the pick and advances the counters. The whole
    /// sequence runs under the instance lock, so two concurrent calls for
    /// the same turn slot serialize: the second sees the advanced state
    /// and fails with `WrongTurn` (or `PlayerUnavailable`).
    pub fn apply_pick(
        &self,
        draft_id: &str,
        team_name: &str,
        player_id: i64,
    ) -> Result<PickOutcome, DraftError> {
        let lock = self.instance_lock(draft_id);
        let _guard = lock.lock().expect("instance lock poisoned");

        let state = self.load(draft_id)?;
        match state.status {
            DraftStatus::InProgress => {}
            DraftStatus::NotStarted => return Err(DraftError::NotStarted),
            status => return Err(DraftError::AlreadyTerminal { status }),
        }

        let expected = turn::resolve(&state.draft_order, state.current_round, state.current_pick)
            .ok_or(DraftError::NotStarted)?;
        if expected != team_name {
            return Err(DraftError::WrongTurn {
                expected: expected.to_string(),
            });
        }

        let team = self
            .db
            .team_by_name(draft_id, team_name)
            .map_err(DraftError::storage)?
            .ok_or_else(|| DraftError::TeamNotFound {
                name: team_name.to_string(),
            })?;

        let player = self
            .db
            .player(player_id)
            .map_err(DraftError::storage)?
            .ok_or(DraftError::PlayerNotFound { id: player_id })?;
        if self
            .db
            .player_picked(draft_id, player_id)
            .map_err(DraftError::storage)?
        {
            return Err(DraftError::PlayerUnavailable {
                name: player.display_name,
            });
        }

        let adv = state.next_advance();
        let new_status = if adv.is_complete {
            DraftStatus::Completed
        } else {
            DraftStatus::InProgress
        };

        self.db
            .commit_pick(
                draft_id,
                adv.pick_number,
                team.id,
                &team.name,
                player.id,
                &player.display_name,
                adv.round,
                adv.new_round,
                new_status,
            )
            .map_err(DraftError::storage)?;

        let outcome = PickOutcome {
            pick_number: adv.pick_number,
            round: adv.round,
            team_name: team.name,
            player_name: player.display_name,
            is_complete: adv.is_complete,
        };
        info!(
            draft_id,
            pick = outcome.pick_number,
            round = outcome.round,
            team = %outcome.team_name,
            player = %outcome.player_name,
            complete = outcome.is_complete,
            "pick applied"
        );
        self.emit(DraftEvent::PickApplied {
            draft_id: draft_id.to_string(),
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Read views
    // ------------------------------------------------------------------

    /// Full snapshot of a draft instance: state, teams, ledger, next team,
    /// and remaining player pool.
    pub fn snapshot(&self, draft_id: &str) -> Result<DraftSnapshot, DraftError> {
        let state = self.load(draft_id)?;
        let teams = self.db.list_teams(draft_id).map_err(DraftError::storage)?;
        let picks = self.db.load_picks(draft_id).map_err(DraftError::storage)?;
        let available_players = self
            .db
            .list_available_players(draft_id)
            .map_err(DraftError::storage)?;
        let next_team = if state.status == DraftStatus::InProgress {
            turn::resolve(&state.draft_order, state.current_round, state.current_pick)
                .map(|s| s.to_string())
        } else {
            None
        };
        Ok(DraftSnapshot {
            state,
            teams,
            picks,
            next_team,
            available_players,
        })
    }

    /// The team currently on the clock, as a full record.
    pub fn team_on_clock(&self, draft_id: &str) -> Result<Option<Team>, DraftError> {
        let Some(name) = self.next_team(draft_id)? else {
            return Ok(None);
        };
        self.db
            .team_by_name(draft_id, &name)
            .map_err(DraftError::storage)?
            .ok_or_else(|| DraftError::TeamNotFound { name })
            .map(Some)
    }

    /// Remaining player pool for a draft instance.
    pub fn available_players(&self, draft_id: &str) -> Result<Vec<Player>, DraftError> {
        self.db
            .list_available_players(draft_id)
            .map_err(DraftError::storage)
    }
}
