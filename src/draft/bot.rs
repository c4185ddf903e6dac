// Automated picks for bot teams: uniform random policy plus a drive loop.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info};

use super::engine::DraftEngine;
use super::error::DraftError;
use super::pick::PickOutcome;

/// Result of asking the auto-picker to take one turn.
///
/// `NotABotTurn` and `NoPlayersAvailable` are normal negative results, not
/// errors: the turn simply isn't the auto-picker's to take.
#[derive(Debug, Clone, PartialEq)]
pub enum BotTurn {
    /// A bot was on the clock and its pick committed.
    Picked(PickOutcome),
    /// The current turn belongs to a human (named for caller convenience),
    /// or the draft is not running.
    NotABotTurn { next_team: Option<String> },
    /// A bot was on the clock but the player pool for this instance is
    /// exhausted.
    NoPlayersAvailable,
}

/// Drives bot teams' picks through the engine.
///
/// The picker holds no draft state of its own. Each attempt re-resolves the
/// current turn, so a stale attempt after a human raced in simply comes back
/// `NotABotTurn` (or the engine answers `WrongTurn`); serialization is the
/// engine's job, never the think delay's.
pub struct BotPicker {
    engine: Arc<DraftEngine>,
    think_delay: Duration,
}

impl BotPicker {
    pub fn new(engine: Arc<DraftEngine>, think_delay: Duration) -> Self {
        BotPicker {
            engine,
            think_delay,
        }
    }

    /// Take one bot turn, if the current turn belongs to a bot: choose a
    /// player uniformly at random among those still available and drive the
    /// pick through the engine. Pick failures propagate untouched; the
    /// picker never retries on its own.
    pub fn run_bot_turn(&self, draft_id: &str) -> Result<BotTurn, DraftError> {
        self.run_bot_turn_with_rng(draft_id, &mut rand::thread_rng())
    }

    /// Same as [`BotPicker::run_bot_turn`] with an injected RNG so tests
    /// can be deterministic.
    pub fn run_bot_turn_with_rng<R: Rng>(
        &self,
        draft_id: &str,
        rng: &mut R,
    ) -> Result<BotTurn, DraftError> {
        let team = match self.engine.team_on_clock(draft_id)? {
            Some(team) if team.kind.is_bot() => team,
            Some(team) => {
                return Ok(BotTurn::NotABotTurn {
                    next_team: Some(team.name),
                })
            }
            None => return Ok(BotTurn::NotABotTurn { next_team: None }),
        };

        let available = self.engine.available_players(draft_id)?;
        if available.is_empty() {
            debug!(draft_id, team = %team.name, "bot on the clock but player pool is empty");
            return Ok(BotTurn::NoPlayersAvailable);
        }

        let choice = &available[rng.gen_range(0..available.len())];
        let outcome = self.engine.apply_pick(draft_id, &team.name, choice.id)?;
        Ok(BotTurn::Picked(outcome))
    }

    /// Run consecutive bot turns until the turn belongs to a human, the
    /// draft leaves `in_progress`, the pool runs dry, or a pick fails.
    ///
    /// Each iteration sleeps the configured think delay before picking --
    /// pacing only, cancellable by dropping the future -- and re-resolves
    /// the turn afterwards, so a human completing a pick during the sleep
    /// is never skipped and never picked for.
    pub async fn process_pending(&self, draft_id: &str) -> Result<Vec<PickOutcome>, DraftError> {
        let mut outcomes = Vec::new();
        loop {
            // Cheap pre-check so a human turn doesn't pay the think delay.
            match self.engine.team_on_clock(draft_id)? {
                Some(team) if team.kind.is_bot() => {}
                _ => break,
            }

            if !self.think_delay.is_zero() {
                tokio::time::sleep(self.think_delay).await;
            }

            match self.run_bot_turn(draft_id)? {
                BotTurn::Picked(outcome) => {
                    let complete = outcome.is_complete;
                    outcomes.push(outcome);
                    if complete {
                        break;
                    }
                }
                BotTurn::NotABotTurn { .. } | BotTurn::NoPlayersAvailable => break,
            }
        }
        if !outcomes.is_empty() {
            info!(draft_id, count = outcomes.len(), "bot turns processed");
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::draft::state::DraftStatus;
    use crate::draft::team::TeamKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DRAFT: &str = "bot_test_draft";

    fn engine_with(teams: &[(&str, TeamKind)], total_rounds: u32, players: usize) -> Arc<DraftEngine> {
        let db = Arc::new(Database::open(":memory:").unwrap());
        let names: Vec<String> = (1..=players).map(|i| format!("Player {i}")).collect();
        db.import_players(&names).unwrap();

        let engine = Arc::new(DraftEngine::new(db));
        engine.create_draft(DRAFT, total_rounds, teams.len()).unwrap();
        for (name, kind) in teams {
            engine.register_team(DRAFT, name, kind.clone()).unwrap();
        }
        engine
    }

    fn human(owner: &str) -> TeamKind {
        TeamKind::Human {
            owner: owner.to_string(),
        }
    }

    #[test]
    fn bot_picks_when_on_clock() {
        let engine = engine_with(&[("Bot A", TeamKind::Bot), ("Bot B", TeamKind::Bot)], 1, 4);
        engine.start_draft(DRAFT).unwrap();
        let picker = BotPicker::new(Arc::clone(&engine), Duration::ZERO);

        let turn = picker
            .run_bot_turn_with_rng(DRAFT, &mut StdRng::seed_from_u64(1))
            .unwrap();
        match turn {
            BotTurn::Picked(outcome) => {
                assert_eq!(outcome.pick_number, 1);
                assert_eq!(outcome.round, 1);
            }
            other => panic!("expected Picked, got {other:?}"),
        }
        assert_eq!(engine.snapshot(DRAFT).unwrap().picks.len(), 1);
    }

    #[test]
    fn human_turn_is_not_a_bot_turn() {
        // A single human team: whoever is on the clock is human.
        let engine = engine_with(&[("Solo Human", human("user_1"))], 1, 2);
        engine.start_draft(DRAFT).unwrap();
        let picker = BotPicker::new(Arc::clone(&engine), Duration::ZERO);

        let turn = picker.run_bot_turn(DRAFT).unwrap();
        assert_eq!(
            turn,
            BotTurn::NotABotTurn {
                next_team: Some("Solo Human".to_string())
            }
        );
        // Nothing was picked for the human.
        assert!(engine.snapshot(DRAFT).unwrap().picks.is_empty());
    }

    #[test]
    fn not_started_draft_is_not_a_bot_turn() {
        let engine = engine_with(&[("Bot A", TeamKind::Bot)], 1, 2);
        let picker = BotPicker::new(Arc::clone(&engine), Duration::ZERO);
        assert_eq!(
            picker.run_bot_turn(DRAFT).unwrap(),
            BotTurn::NotABotTurn { next_team: None }
        );
    }

    #[test]
    fn empty_pool_reports_no_players_available() {
        // One bot, three rounds, but only two players to draft.
        let engine = engine_with(&[("Bot Warriors", TeamKind::Bot)], 3, 2);
        engine.start_draft(DRAFT).unwrap();
        let picker = BotPicker::new(Arc::clone(&engine), Duration::ZERO);

        assert!(matches!(picker.run_bot_turn(DRAFT).unwrap(), BotTurn::Picked(_)));
        assert!(matches!(picker.run_bot_turn(DRAFT).unwrap(), BotTurn::Picked(_)));
        let turn = picker.run_bot_turn(DRAFT).unwrap();
        assert_eq!(turn, BotTurn::NoPlayersAvailable);

        // State unchanged by the failed attempt.
        let snap = engine.snapshot(DRAFT).unwrap();
        assert_eq!(snap.state.current_pick, 2);
        assert_eq!(snap.state.status, DraftStatus::InProgress);
    }

    #[tokio::test]
    async fn process_pending_runs_all_bot_draft_to_completion() {
        let engine = engine_with(
            &[("Bot A", TeamKind::Bot), ("Bot B", TeamKind::Bot), ("Bot C", TeamKind::Bot)],
            2,
            10,
        );
        engine.start_draft(DRAFT).unwrap();
        let picker = BotPicker::new(Arc::clone(&engine), Duration::ZERO);

        let outcomes = picker.process_pending(DRAFT).await.unwrap();
        assert_eq!(outcomes.len(), 6);
        assert!(outcomes.last().unwrap().is_complete);

        let snap = engine.snapshot(DRAFT).unwrap();
        assert_eq!(snap.state.status, DraftStatus::Completed);
        let numbers: Vec<u32> = snap.picks.iter().map(|p| p.pick_number).collect();
        assert_eq!(numbers, (1..=6).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn process_pending_stops_at_human_turn() {
        // Order is random, so run until the human is on the clock and
        // verify the loop stopped exactly there.
        let engine = engine_with(
            &[
                ("Bot A", TeamKind::Bot),
                ("Bot B", TeamKind::Bot),
                ("Carbon Unit", human("user_1")),
            ],
            2,
            10,
        );
        engine.start_draft(DRAFT).unwrap();
        let picker = BotPicker::new(Arc::clone(&engine), Duration::ZERO);

        let outcomes = picker.process_pending(DRAFT).await.unwrap();

        // The loop must have stopped with the human on the clock, having
        // picked once per preceding bot slot and never for the human.
        let next = engine.next_team(DRAFT).unwrap();
        assert_eq!(next.as_deref(), Some("Carbon Unit"));
        assert!(outcomes.iter().all(|o| o.team_name != "Carbon Unit"));
        assert_eq!(
            engine.snapshot(DRAFT).unwrap().picks.len(),
            outcomes.len()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn think_delay_does_not_block_completion() {
        // Paused tokio time auto-advances sleeps; a long think delay must
        // not change the outcome, only the pacing.
        let engine = engine_with(&[("Bot A", TeamKind::Bot), ("Bot B", TeamKind::Bot)], 1, 4);
        engine.start_draft(DRAFT).unwrap();
        let picker = BotPicker::new(Arc::clone(&engine), Duration::from_secs(2));

        let outcomes = picker.process_pending(DRAFT).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            engine.snapshot(DRAFT).unwrap().state.status,
            DraftStatus::Completed
        );
    }

    #[test]
    fn seeded_rng_is_deterministic() {
        let engine_a = engine_with(&[("Bot A", TeamKind::Bot)], 1, 8);
        let engine_b = engine_with(&[("Bot A", TeamKind::Bot)], 1, 8);
        engine_a.start_draft(DRAFT).unwrap();
        engine_b.start_draft(DRAFT).unwrap();

        let picker_a = BotPicker::new(Arc::clone(&engine_a), Duration::ZERO);
        let picker_b = BotPicker::new(Arc::clone(&engine_b), Duration::ZERO);

        let turn_a = picker_a
            .run_bot_turn_with_rng(DRAFT, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let turn_b = picker_b
            .run_bot_turn_with_rng(DRAFT, &mut StdRng::seed_from_u64(42))
            .unwrap();
        match (turn_a, turn_b) {
            (BotTurn::Picked(a), BotTurn::Picked(b)) => {
                assert_eq!(a.player_name, b.player_name);
            }
            other => panic!("expected two Picked turns, got {other:?}"),
        }
    }
}
