//! Vote module - a juror's verdict on an approved case

use crate::{CaseId, UserId, ValidationError, VoteId};

/// A juror's binary judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The juror finds for the case
    Guilty,

    /// The juror finds against the case
    NotGuilty,
}

impl Verdict {
    /// Get the verdict name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Guilty => "guilty",
            Verdict::NotGuilty => "not_guilty",
        }
    }

    /// Parse a verdict from a string, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "guilty" => Some(Verdict::Guilty),
            "not_guilty" => Some(Verdict::NotGuilty),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verdict {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::new(format!("Invalid verdict: {}", s)))
    }
}

/// A cast vote
///
/// Votes are immutable once stored; at most one exists per (case, juror).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    /// Unique identifier
    pub id: VoteId,

    /// Case voted on
    pub case_id: CaseId,

    /// Juror who voted
    pub juror: UserId,

    /// The juror's judgment
    pub verdict: Verdict,

    /// When the vote was cast (Unix seconds)
    pub voted_at: u64,
}

impl Vote {
    /// Create a new vote
    pub fn new(case_id: CaseId, juror: UserId, verdict: Verdict, voted_at: u64) -> Self {
        Self {
            id: VoteId::new(),
            case_id,
            juror,
            verdict,
            voted_at,
        }
    }
}

/// Guilty / not-guilty counts for one case
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Number of guilty verdicts
    pub guilty: usize,

    /// Number of not-guilty verdicts
    pub not_guilty: usize,
}

impl Tally {
    /// Count the verdicts in `votes`
    pub fn of<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        votes.into_iter().fold(Tally::default(), |mut tally, vote| {
            match vote.verdict {
                Verdict::Guilty => tally.guilty += 1,
                Verdict::NotGuilty => tally.not_guilty += 1,
            }
            tally
        })
    }

    /// Total votes counted
    pub fn total(&self) -> usize {
        self.guilty + self.not_guilty
    }
}
