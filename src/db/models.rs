use serde::{Deserialize, Serialize};

/// Persisted record of one fully processed audio upload.
///
/// Every field except `last_viewed` is immutable after creation. `turns`
/// is the count of associated turn rows, set once when the conversation is
/// created. `storage_path` is the directory key under the blob root and
/// equals `id` by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub fingerprint: String,
    pub filename: String,
    pub format: String,
    /// Seconds; end offset of the last turn, 0.0 when there are no turns.
    pub duration: f64,
    /// Expected speaker count configured at processing time.
    pub speakers: u32,
    pub turns: u32,
    /// RFC 3339 creation timestamp.
    pub processed_at: String,
    /// RFC 3339; updated each time the conversation is displayed.
    pub last_viewed: String,
    pub storage_path: String,
}

/// Persisted, numbered record of one utterance plus its audio segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub conversation_id: String,
    /// 1-based sequence index, unique within a conversation, chronological.
    pub number: u32,
    pub speaker: String,
    pub text: String,
    pub start_ms: i64,
    pub end_ms: i64,
    /// Path of the segment blob, relative to the blob store root.
    pub audio_path: String,
}
