// Participating teams: human entrants and generated bots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a team is driven by a human or by the auto-picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TeamKind {
    /// A human participant. `owner` is the external identity reference of
    /// the user controlling the team (opaque to the engine).
    Human { owner: String },
    /// A simulated participant with no owner; picks are generated by policy.
    Bot,
}

impl TeamKind {
    pub fn is_bot(&self) -> bool {
        matches!(self, TeamKind::Bot)
    }

    /// Database discriminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamKind::Human { .. } => "human",
            TeamKind::Bot => "bot",
        }
    }

    /// Rebuild from the database discriminator and optional owner column.
    /// Returns `None` for an unrecognized discriminator.
    pub fn from_db(kind: &str, owner: Option<String>) -> Option<Self> {
        match kind {
            "human" => Some(TeamKind::Human {
                owner: owner.unwrap_or_default(),
            }),
            "bot" => Some(TeamKind::Bot),
            _ => None,
        }
    }

    /// The owner reference, if any.
    pub fn owner(&self) -> Option<&str> {
        match self {
            TeamKind::Human { owner } => Some(owner),
            TeamKind::Bot => None,
        }
    }
}

impl fmt::Display for TeamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One registered team in a draft instance.
///
/// Teams are immutable once registered except for the display name; the
/// engine only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Database row id.
    pub id: i64,
    /// Display name, unique within one draft instance.
    pub name: String,
    #[serde(flatten)]
    pub kind: TeamKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_db_round_trip() {
        let human = TeamKind::Human {
            owner: "user_42".to_string(),
        };
        assert_eq!(
            TeamKind::from_db(human.as_str(), Some("user_42".to_string())),
            Some(human)
        );
        assert_eq!(TeamKind::from_db("bot", None), Some(TeamKind::Bot));
        assert_eq!(TeamKind::from_db("alien", None), None);
    }

    #[test]
    fn is_bot() {
        assert!(TeamKind::Bot.is_bot());
        assert!(!TeamKind::Human {
            owner: "user_1".into()
        }
        .is_bot());
    }

    #[test]
    fn owner_only_for_humans() {
        let human = TeamKind::Human {
            owner: "user_7".to_string(),
        };
        assert_eq!(human.owner(), Some("user_7"));
        assert_eq!(TeamKind::Bot.owner(), None);
    }

    #[test]
    fn team_serializes_with_flattened_kind() {
        let team = Team {
            id: 3,
            name: "Bot Warriors".to_string(),
            kind: TeamKind::Bot,
        };
        let json = serde_json::to_value(&team).unwrap();
        assert_eq!(json["name"], "Bot Warriors");
        assert_eq!(json["kind"], "bot");
    }
}
