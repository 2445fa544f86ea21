use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// One speaker turn as reported by the diarization service: label, text,
/// and millisecond offsets into the submitted audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Seam for the transcription/diarization collaborator.
///
/// `transcribe` is a blocking long-running call (tens of seconds to
/// minutes) with a single terminal outcome: the ordered utterance list, or
/// an error. No partial or streaming results are consumed. Tests
/// substitute a mock implementation here.
pub trait SpeakerTranscriber {
    fn name(&self) -> &str;

    fn transcribe(
        &self,
        audio_path: &Path,
        speakers_expected: u32,
    ) -> Result<Vec<Utterance>, CollaboratorError>;
}
