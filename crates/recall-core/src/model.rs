//! Server entities as seen by the client.
//!
//! Everything here is owned by the server; the client reads these shapes and
//! creates test sessions, nothing more. Unknown fields are ignored so newer
//! servers keep working with older clients.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of reviewing a single card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAnswerStatus {
    /// Not answered yet.
    Null,
    Remember,
    Forgot,
}

impl UserAnswerStatus {
    /// Human-readable condition shown next to a card.
    pub fn label(&self) -> &'static str {
        match self {
            UserAnswerStatus::Null => "Не ответил",
            UserAnswerStatus::Remember => "Вспомнил",
            UserAnswerStatus::Forgot => "Забыл",
        }
    }

    /// Whether the card still waits for an answer.
    pub fn is_pending(&self) -> bool {
        matches!(self, UserAnswerStatus::Null)
    }
}

impl fmt::Display for UserAnswerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAnswerStatus::Null => write!(f, "null"),
            UserAnswerStatus::Remember => write!(f, "remember"),
            UserAnswerStatus::Forgot => write!(f, "forgot"),
        }
    }
}

impl FromStr for UserAnswerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "null" => Ok(UserAnswerStatus::Null),
            "remember" => Ok(UserAnswerStatus::Remember),
            "forgot" => Ok(UserAnswerStatus::Forgot),
            other => Err(format!("unknown user answer status: {other}")),
        }
    }
}

/// A quiz instance over a selection of course modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    #[serde(default)]
    pub course_id: i64,
    #[serde(default)]
    pub module_ids: Vec<i64>,
    pub is_shuffled: bool,
    pub is_active: bool,
    /// Free-form advice generated once every card is answered.
    #[serde(default)]
    pub recommendations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregated view of a test session, as listed on the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSessionSummary {
    pub uuid: Uuid,
    pub is_active: bool,
    pub is_shuffled: bool,
    #[serde(default)]
    pub module_ids: Vec<i64>,
    #[serde(default)]
    pub has_recommendations: bool,
    pub count_null: u32,
    pub count_remember: u32,
    pub count_forget: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub course_name: String,
}

impl TestSessionSummary {
    /// Total number of cards in the session.
    pub fn total(&self) -> u32 {
        self.count_null + self.count_remember + self.count_forget
    }
}

/// A test session together with every answer slot it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSessionDetail {
    pub test_session: TestSession,
    #[serde(default)]
    pub user_answers: Vec<FullUserAnswer>,
}

impl TestSessionDetail {
    /// The first card that has not been answered yet, in session order.
    pub fn next_pending(&self) -> Option<&FullUserAnswer> {
        self.user_answers.iter().find(|a| a.status.is_pending())
    }

    /// Counts of (remembered, forgotten, unanswered) cards.
    pub fn tally(&self) -> (usize, usize, usize) {
        self.user_answers
            .iter()
            .fold((0, 0, 0), |(r, f, n), a| match a.status {
                UserAnswerStatus::Remember => (r + 1, f, n),
                UserAnswerStatus::Forgot => (r, f + 1, n),
                UserAnswerStatus::Null => (r, f, n + 1),
            })
    }
}

/// One answer slot of a test session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: i64,
    pub uuid: Uuid,
    pub card_id: i64,
    pub test_session_id: i64,
    pub status: UserAnswerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An answer slot with the card and module text denormalized into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullUserAnswer {
    pub id: i64,
    #[serde(default)]
    pub uid: i64,
    pub uuid: Uuid,
    pub card_id: i64,
    pub test_session_id: i64,
    pub status: UserAnswerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    pub module_id: i64,
    #[serde(default)]
    pub module_name: String,
}

/// Response to an answer update: the new answer and its (possibly closed) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswerUpdate {
    #[serde(rename = "data")]
    pub user_answer: UserAnswer,
    pub test_session: TestSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    #[serde(default)]
    pub uid: i64,
    pub uuid: Uuid,
    pub question: String,
    pub answer: String,
    pub module_id: i64,
    pub is_active: bool,
    #[serde(default)]
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub uuid: Uuid,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of the answer leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    pub remember_count: u32,
    pub forgot_count: u32,
    pub answered_count: u32,
    pub started_sessions: u32,
}

impl LeaderboardEntry {
    /// Display name: first and last name, or the username when both are blank.
    pub fn display_name(&self) -> String {
        let full = match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        };
        let full = full.trim().to_string();
        if full.is_empty() {
            self.username.clone().unwrap_or_default()
        } else {
            full
        }
    }
}

/// Bearer token issued by `/api/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

/// Body of `POST /api/test-sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTestSession {
    pub course_slug: String,
    #[serde(default)]
    pub module_ids: Vec<i64>,
    #[serde(default)]
    pub shuffle: bool,
}

/// Envelope used by listing endpoints that wrap their rows in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}
