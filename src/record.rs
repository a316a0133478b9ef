use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiceLevel {
    Mild,
    Medium,
    Spicy,
    Nuclear,
}

impl SpiceLevel {
    /// Selector order, mildest first.
    pub const ALL: [SpiceLevel; 4] = [
        SpiceLevel::Mild,
        SpiceLevel::Medium,
        SpiceLevel::Spicy,
        SpiceLevel::Nuclear,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SpiceLevel::Mild => "mild",
            SpiceLevel::Medium => "medium",
            SpiceLevel::Spicy => "spicy",
            SpiceLevel::Nuclear => "nuclear",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpiceLevel::Mild => "Mild",
            SpiceLevel::Medium => "Medium",
            SpiceLevel::Spicy => "Spicy",
            SpiceLevel::Nuclear => "Nuclear",
        }
    }
}

impl fmt::Display for SpiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown spice level {0:?}")]
pub struct UnknownSpiceLevel(pub String);

impl FromStr for SpiceLevel {
    type Err = UnknownSpiceLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpiceLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSpiceLevel(s.to_string()))
    }
}

/// Lifecycle state of a record. Only the database moves records between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    New,
    Other(String),
}

impl Status {
    pub const NEW: &'static str = "new";
}

impl From<String> for Status {
    fn from(name: String) -> Self {
        if name == Status::NEW {
            Status::New
        } else {
            Status::Other(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub opinion: String,
    pub spice_level: SpiceLevel,
    pub status: Status,
    /// Chat display name of whoever submitted it, if known.
    pub submitter: Option<String>,
}

impl Record {
    pub fn submitted(
        opinion: impl Into<String>,
        spice_level: SpiceLevel,
        submitter: impl Into<String>,
    ) -> Self {
        Record {
            opinion: opinion.into(),
            spice_level,
            status: Status::New,
            submitter: Some(submitter.into()),
        }
    }

    /// How the submitter is credited on the stored record.
    pub fn attribution(&self) -> Option<String> {
        self.submitter
            .as_deref()
            .map(|name| format!("@{} on Slack", name))
    }
}
