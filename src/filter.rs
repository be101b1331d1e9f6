// Search filtering and sort ordering for note views

use crate::models::Note;
use eyre::eyre;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Display order for the notes view, by creation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Newest => write!(f, "newest"),
            SortOrder::Oldest => write!(f, "oldest"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(eyre!("Invalid sort order: {} (expected newest or oldest)", other)),
        }
    }
}

/// Search term as typed by the user, plus the normalized needle used for matching
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    needle: String,
}

impl SearchTerm {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.trim().to_lowercase();
        Self { raw, needle }
    }

    /// The term exactly as it was set
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the term filters nothing out
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Case-insensitive substring match against a note title
    pub fn matches(&self, note: &Note) -> bool {
        self.is_empty() || note.title().to_lowercase().contains(&self.needle)
    }
}

/// Compute the view over `notes`: filter by `term`, then order by `order`.
///
/// Returns indices into `notes`. The sort is stable, so notes with equal
/// `created_at` keep their collection order.
pub fn filter_and_sort(notes: &[Note], term: &SearchTerm, order: SortOrder) -> Vec<usize> {
    let mut view: Vec<usize> = notes
        .iter()
        .enumerate()
        .filter(|(_, note)| term.matches(note))
        .map(|(i, _)| i)
        .collect();

    match order {
        SortOrder::Newest => view.sort_by(|&a, &b| notes[b].created_at().cmp(&notes[a].created_at())),
        SortOrder::Oldest => view.sort_by(|&a, &b| notes[a].created_at().cmp(&notes[b].created_at())),
    }

    view
}
