// Application orchestration: the event loop between clients and the engine.
//
// Receives WebSocket events from ws_server, parses client commands,
// dispatches them to the draft engine, and pushes replies plus engine
// notifications back out. Bot turns triggered by a start or a human pick
// run in spawned tasks so the loop keeps serving while bots "think".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use crate::draft::bot::{BotPicker, BotTurn};
use crate::draft::engine::DraftEngine;
use crate::draft::error::DraftError;
use crate::protocol::{ClientCommand, ServerMessage};
use crate::ws_server::WsEvent;

/// Shared handles the command dispatcher needs.
pub struct AppState {
    pub engine: Arc<DraftEngine>,
    pub bot: Arc<BotPicker>,
    /// The only identity allowed to start/reset/cancel the draft.
    pub commissioner: String,
    out_tx: mpsc::Sender<String>,
}

impl AppState {
    pub fn new(
        engine: Arc<DraftEngine>,
        think_delay: Duration,
        commissioner: String,
        out_tx: mpsc::Sender<String>,
    ) -> Self {
        let bot = Arc::new(BotPicker::new(Arc::clone(&engine), think_delay));
        AppState {
            engine,
            bot,
            commissioner,
            out_tx,
        }
    }

    /// Serialize and queue one message for the connected client.
    async fn send(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if self.out_tx.send(json).await.is_err() {
                    warn!("Outbound channel closed, dropping server message");
                }
            }
            Err(e) => error!("Failed to serialize server message: {e}"),
        }
    }
}

/// The application event loop. Runs until the WebSocket channel closes.
pub async fn run(mut ws_rx: mpsc::Receiver<WsEvent>, state: AppState) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut events = state.engine.subscribe();

    loop {
        tokio::select! {
            // --- WebSocket events ---
            ws_event = ws_rx.recv() => {
                match ws_event {
                    Some(WsEvent::Connected { addr }) => {
                        info!("Client connected from {addr}");
                    }
                    Some(WsEvent::Disconnected) => {
                        info!("Client disconnected");
                    }
                    Some(WsEvent::Message(json_str)) => {
                        handle_client_message(&state, &json_str).await;
                    }
                    None => {
                        info!("WebSocket channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Engine notifications, forwarded to the client ---
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        state.send(&ServerMessage::Event { event }).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // The client can refetch a snapshot; only the
                        // incremental stream is lossy.
                        warn!("Event subscriber lagged, skipped {skipped} notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Engine event channel closed");
                        break;
                    }
                }
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Parse and dispatch one raw client message, sending the reply.
pub async fn handle_client_message(state: &AppState, json_str: &str) {
    let cmd: ClientCommand = match serde_json::from_str(json_str) {
        Ok(cmd) => cmd,
        Err(e) => {
            warn!("Failed to parse client command: {e}");
            state
                .send(&ServerMessage::Error {
                    kind: "badRequest".to_string(),
                    message: format!("unrecognized command: {e}"),
                    expected_team: None,
                })
                .await;
            return;
        }
    };

    let reply = dispatch(state, cmd).await;
    state.send(&reply).await;
}

/// Execute one client command against the engine and build the reply.
pub async fn dispatch(state: &AppState, cmd: ClientCommand) -> ServerMessage {
    match cmd {
        ClientCommand::StartDraft {
            draft_id,
            requested_by,
        } => {
            if let Err(e) = authorize(state, &requested_by) {
                return ServerMessage::from_error(&e);
            }
            match state.engine.start_draft(&draft_id) {
                Ok(order) => {
                    // The first team on the clock may be a bot.
                    spawn_bot_processing(state, &draft_id);
                    ServerMessage::Ack {
                        message: format!("draft started; order: {}", order.join(", ")),
                    }
                }
                Err(e) => ServerMessage::from_error(&e),
            }
        }

        ClientCommand::MakePick {
            draft_id,
            team_name,
            player_id,
        } => match state.engine.apply_pick(&draft_id, &team_name, player_id) {
            Ok(outcome) => {
                if !outcome.is_complete {
                    spawn_bot_processing(state, &draft_id);
                }
                ServerMessage::pick_accepted(outcome)
            }
            Err(e) => ServerMessage::from_error(&e),
        },

        ClientCommand::RunBotTurn { draft_id } => match state.bot.run_bot_turn(&draft_id) {
            Ok(BotTurn::Picked(outcome)) => ServerMessage::pick_accepted(outcome),
            Ok(BotTurn::NotABotTurn { next_team }) => ServerMessage::NotABotTurn { next_team },
            Ok(BotTurn::NoPlayersAvailable) => ServerMessage::NoPlayersAvailable { draft_id },
            Err(e) => ServerMessage::from_error(&e),
        },

        ClientCommand::ProcessBotTurns { draft_id } => {
            spawn_bot_processing(state, &draft_id);
            ServerMessage::Ack {
                message: format!("processing pending bot turns for {draft_id}"),
            }
        }

        ClientCommand::GetState { draft_id } => match state.engine.snapshot(&draft_id) {
            Ok(snapshot) => ServerMessage::State { snapshot },
            Err(e) => ServerMessage::from_error(&e),
        },

        ClientCommand::GetNextTeam { draft_id } => match state.engine.next_team(&draft_id) {
            Ok(team) => ServerMessage::NextTeam { draft_id, team },
            Err(e) => ServerMessage::from_error(&e),
        },

        ClientCommand::ResetDraft {
            draft_id,
            requested_by,
        } => {
            if let Err(e) = authorize(state, &requested_by) {
                return ServerMessage::from_error(&e);
            }
            match state.engine.reset_draft(&draft_id) {
                Ok(()) => ServerMessage::Ack {
                    message: format!("draft {draft_id} reset"),
                },
                Err(e) => ServerMessage::from_error(&e),
            }
        }

        ClientCommand::CancelDraft {
            draft_id,
            requested_by,
        } => {
            if let Err(e) = authorize(state, &requested_by) {
                return ServerMessage::from_error(&e);
            }
            match state.engine.cancel_draft(&draft_id) {
                Ok(()) => ServerMessage::Ack {
                    message: format!("draft {draft_id} cancelled"),
                },
                Err(e) => ServerMessage::from_error(&e),
            }
        }
    }
}

/// Gate a privileged command on the caller's claimed identity.
/// Authentication itself is the transport's concern; the engine trusts the
/// claim but only the configured commissioner may pass.
fn authorize(state: &AppState, requested_by: &str) -> Result<(), DraftError> {
    if requested_by.is_empty() {
        return Err(DraftError::NotAuthenticated);
    }
    if requested_by != state.commissioner {
        return Err(DraftError::NotAuthorized {
            who: requested_by.to_string(),
        });
    }
    Ok(())
}

/// Drain pending bot turns in a background task so the event loop keeps
/// serving during think delays. Safe to call redundantly: an extra task
/// finds no bot on the clock and exits.
fn spawn_bot_processing(state: &AppState, draft_id: &str) {
    let bot = Arc::clone(&state.bot);
    let out_tx = state.out_tx.clone();
    let draft_id = draft_id.to_string();

    tokio::spawn(async move {
        match bot.process_pending(&draft_id).await {
            Ok(picks) => {
                if !picks.is_empty() {
                    let msg = ServerMessage::BotTurnsProcessed { draft_id, picks };
                    if let Ok(json) = serde_json::to_string(&msg) {
                        let _ = out_tx.send(json).await;
                    }
                }
            }
            // A human racing the bot loop surfaces as WrongTurn here; the
            // next human pick spawns a fresh drain, so just note it.
            Err(e) if e.is_recoverable() => {
                info!(%draft_id, "bot turn superseded: {e}");
            }
            Err(e) => {
                error!(%draft_id, "bot processing failed: {e}");
            }
        }
    });
}
