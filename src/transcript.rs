//! Append-only chat transcript with per-turn tokens.

use serde::Serialize;

/// Identifies one submission. Later submissions always get larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TurnToken(u64);

impl TurnToken {
    pub const FIRST: Self = Self(1);

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub turn: TurnToken,
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    latest: Option<TurnToken>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user submission and issues the token its reply must carry.
    pub fn submit(&mut self, text: &str) -> TurnToken {
        let token = match self.latest {
            Some(TurnToken(n)) => TurnToken(n + 1),
            None => TurnToken::FIRST,
        };
        self.latest = Some(token);
        self.entries.push(TranscriptEntry {
            turn: token,
            sender: Sender::User,
            text: text.to_string(),
        });
        token
    }

    pub fn is_current(&self, token: TurnToken) -> bool {
        self.latest == Some(token)
    }

    /// Appends a bot reply if `token` is still the newest turn; stale replies are dropped.
    pub fn deliver(&mut self, token: TurnToken, text: String) -> Option<&TranscriptEntry> {
        if !self.is_current(token) {
            return None;
        }
        self.entries.push(TranscriptEntry {
            turn: token,
            sender: Sender::Bot,
            text,
        });
        self.entries.last()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }
}
