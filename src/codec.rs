// JSON encoding of the persisted note collection

use crate::models::Note;
use eyre::{Context, Result};

/// Encode the full collection as a JSON array
pub fn encode_notes(notes: &[Note]) -> Result<String> {
    serde_json::to_string(notes).context("Failed to serialize notes")
}

/// Decode a JSON array of notes
///
/// Unknown fields are ignored. Timestamps may be ISO-8601 strings or epoch milliseconds.
pub fn decode_notes(data: &str) -> Result<Vec<Note>> {
    serde_json::from_str(data).context("Failed to parse persisted notes")
}
