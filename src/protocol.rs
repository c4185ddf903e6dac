// JSON wire messages exchanged with draft clients over the WebSocket.

use serde::{Deserialize, Serialize};

use crate::draft::engine::{DraftEvent, DraftSnapshot};
use crate::draft::error::DraftError;
use crate::draft::pick::PickOutcome;

/// Commands a client may send. JSON objects tagged by `type`, camelCase
/// payload keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Start the draft. Privileged; `requested_by` is the caller's claimed
    /// identity (authentication is the transport's concern).
    StartDraft {
        draft_id: String,
        requested_by: String,
    },
    /// Submit a pick for a team.
    MakePick {
        draft_id: String,
        team_name: String,
        player_id: i64,
    },
    /// Take a single bot turn if a bot is on the clock.
    RunBotTurn { draft_id: String },
    /// Run consecutive bot turns until a human is on the clock or the
    /// draft ends.
    ProcessBotTurns { draft_id: String },
    /// Fetch the full draft snapshot.
    GetState { draft_id: String },
    /// Ask whose turn it is.
    GetNextTeam { draft_id: String },
    /// Privileged: wipe the ledger and return to not_started.
    ResetDraft {
        draft_id: String,
        requested_by: String,
    },
    /// Privileged: cancel a running draft.
    CancelDraft {
        draft_id: String,
        requested_by: String,
    },
}

/// Replies and push notifications sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// A pick was accepted (human or single bot turn).
    PickAccepted {
        message: String,
        #[serde(flatten)]
        outcome: PickOutcome,
    },
    /// The asked-for bot turn was not a bot's to take.
    NotABotTurn { next_team: Option<String> },
    /// A bot was on the clock but no players remain in this instance.
    NoPlayersAvailable { draft_id: String },
    /// Result of a ProcessBotTurns command.
    BotTurnsProcessed {
        draft_id: String,
        picks: Vec<PickOutcome>,
    },
    /// Full snapshot in response to GetState.
    State { snapshot: DraftSnapshot },
    /// Response to GetNextTeam. `team` is null when the draft is not
    /// running.
    NextTeam {
        draft_id: String,
        team: Option<String>,
    },
    /// Generic success acknowledgement (reset, cancel).
    Ack { message: String },
    /// An engine notification forwarded to the client.
    Event {
        #[serde(flatten)]
        event: DraftEvent,
    },
    /// A command failed. `kind` is the stable error identifier;
    /// `expected_team` is set for wrongTurn so the client can resync
    /// without a full reload.
    Error {
        kind: String,
        message: String,
        expected_team: Option<String>,
    },
}

impl ServerMessage {
    /// Build the wire error for an engine failure.
    pub fn from_error(err: &DraftError) -> Self {
        let expected_team = match err {
            DraftError::WrongTurn { expected } => Some(expected.clone()),
            _ => None,
        };
        ServerMessage::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
            expected_team,
        }
    }

    /// Build the acceptance reply for a committed pick.
    pub fn pick_accepted(outcome: PickOutcome) -> Self {
        let message = if outcome.is_complete {
            format!(
                "{} drafted {} with the final pick ({})",
                outcome.team_name, outcome.player_name, outcome.pick_number
            )
        } else {
            format!(
                "{} drafted {} (pick {}, round {})",
                outcome.team_name, outcome.player_name, outcome.pick_number, outcome.round
            )
        };
        ServerMessage::PickAccepted { message, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> PickOutcome {
        PickOutcome {
            pick_number: 3,
            round: 1,
            team_name: "Mudcats".to_string(),
            player_name: "Mike Trout".to_string(),
            is_complete: false,
        }
    }

    #[test]
    fn make_pick_round_trip() {
        let cmd = ClientCommand::MakePick {
            draft_id: "draft_a".to_string(),
            team_name: "Mudcats".to_string(),
            player_id: 17,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"makePick\""));
        assert!(json.contains("\"teamName\":\"Mudcats\""));
        assert!(json.contains("\"playerId\":17"));
        let back: ClientCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn client_command_parses_from_raw_json() {
        let raw = r#"{"type":"startDraft","draftId":"draft_a","requestedBy":"user_1"}"#;
        let cmd: ClientCommand = serde_json::from_str(raw).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::StartDraft {
                draft_id: "draft_a".to_string(),
                requested_by: "user_1".to_string(),
            }
        );
    }

    #[test]
    fn malformed_command_is_an_error_not_a_panic() {
        let raw = r#"{"type":"makePick","draftId":"draft_a"}"#;
        assert!(serde_json::from_str::<ClientCommand>(raw).is_err());
        let raw = r#"{"type":"unknownCommand"}"#;
        assert!(serde_json::from_str::<ClientCommand>(raw).is_err());
        assert!(serde_json::from_str::<ClientCommand>("not json").is_err());
    }

    #[test]
    fn pick_accepted_flattens_outcome() {
        let msg = ServerMessage::pick_accepted(outcome());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "pickAccepted");
        assert_eq!(json["pickNumber"], 3);
        assert_eq!(json["round"], 1);
        assert_eq!(json["isComplete"], false);
        assert_eq!(
            json["message"],
            "Mudcats drafted Mike Trout (pick 3, round 1)"
        );
    }

    #[test]
    fn final_pick_message_mentions_completion() {
        let msg = ServerMessage::pick_accepted(PickOutcome {
            is_complete: true,
            pick_number: 8,
            round: 2,
            ..outcome()
        });
        match msg {
            ServerMessage::PickAccepted { message, .. } => {
                assert!(message.contains("final pick"));
            }
            other => panic!("expected PickAccepted, got {other:?}"),
        }
    }

    #[test]
    fn wrong_turn_error_carries_expected_team() {
        let err = DraftError::WrongTurn {
            expected: "Vorticists".to_string(),
        };
        let msg = ServerMessage::from_error(&err);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "wrongTurn");
        assert_eq!(json["expectedTeam"], "Vorticists");
        assert!(json["message"].as_str().unwrap().contains("Vorticists"));
    }

    #[test]
    fn non_turn_errors_have_no_expected_team() {
        let msg = ServerMessage::from_error(&DraftError::NotStarted);
        match msg {
            ServerMessage::Error {
                kind,
                expected_team,
                ..
            } => {
                assert_eq!(kind, "notStarted");
                assert!(expected_team.is_none());
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn event_message_flattens_the_event_tag() {
        let msg = ServerMessage::Event {
            event: DraftEvent::Reset {
                draft_id: "draft_a".to_string(),
            },
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["event"], "reset");
        assert_eq!(json["draftId"], "draft_a");
    }

    #[test]
    fn server_message_round_trip() {
        let messages = vec![
            ServerMessage::pick_accepted(outcome()),
            ServerMessage::NotABotTurn {
                next_team: Some("Mudcats".to_string()),
            },
            ServerMessage::NoPlayersAvailable {
                draft_id: "draft_a".to_string(),
            },
            ServerMessage::NextTeam {
                draft_id: "draft_a".to_string(),
                team: None,
            },
            ServerMessage::Ack {
                message: "draft reset".to_string(),
            },
        ];
        for msg in messages {
            let json = serde_json::to_string(&msg).unwrap();
            let back: ServerMessage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, msg);
        }
    }
}
