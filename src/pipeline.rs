// Segmentation pipeline: turn one audio upload into ordered,
// speaker-attributed, time-bounded audio+text turns, and persist them.
//
// Persistence order matters: every blob is written before the conversation
// row and its turn rows go in as one transaction. A failed transaction
// tears the blob tree back down, and a crash in between leaves only
// orphan files that the startup sweep collects. A turn row never points
// at a missing blob.

use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::audio::{convert, AudioClip};
use crate::blobs::BlobStore;
use crate::db::{conversations, turns, Conversation, Database, Turn};
use crate::error::PipelineError;
use crate::fingerprint::fingerprint;
use crate::transcribe::{SpeakerTranscriber, Utterance};

/// Result of a processing request. Finding an existing conversation with
/// the same fingerprint is a state the caller branches on, not an error.
#[derive(Debug)]
pub enum Outcome {
    Created(Conversation),
    Duplicate(Conversation),
}

/// An utterance that survived clamping, with its final sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTurn {
    pub number: u32,
    pub speaker: String,
    pub text: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

pub struct Pipeline<'a> {
    db: &'a Database,
    blobs: &'a BlobStore,
    transcriber: &'a dyn SpeakerTranscriber,
}

/// Deletes the converted temp file when processing ends, on every path.
struct TempFile(PathBuf);

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(
        db: &'a Database,
        blobs: &'a BlobStore,
        transcriber: &'a dyn SpeakerTranscriber,
    ) -> Self {
        Self {
            db,
            blobs,
            transcriber,
        }
    }

    /// Process one upload end to end.
    ///
    /// With `force`, the fingerprint short-circuit is skipped; the unique
    /// index still rejects a second row while the original exists, so
    /// forcing is only useful after a delete.
    pub fn process(
        &self,
        audio_path: &Path,
        speakers_expected: u32,
        force: bool,
    ) -> Result<Outcome, PipelineError> {
        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let format = audio_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if format != "wav" && format != "ogg" {
            return Err(PipelineError::UnsupportedFormat(format));
        }

        let bytes = std::fs::read(audio_path).map_err(|source| PipelineError::ReadInput {
            path: audio_path.to_path_buf(),
            source,
        })?;

        let fp = fingerprint(&bytes);

        if !force {
            if let Some(existing) = self.db.find_by_fingerprint(&fp)? {
                tracing::info!(
                    "Fingerprint {} already processed as conversation {}",
                    &fp[..16],
                    existing.id
                );
                return Ok(Outcome::Duplicate(existing));
            }
        }

        // Legacy container: convert to WAV once, up front.
        let (wav_path, _temp_wav) = if format == "ogg" {
            let out = std::env::temp_dir().join(format!("speakersplit-{}.wav", Uuid::new_v4()));
            convert::ogg_to_wav(audio_path, &out)?;
            (out.clone(), Some(TempFile(out)))
        } else {
            (audio_path.to_path_buf(), None)
        };

        let clip = AudioClip::from_wav_file(&wav_path)?;
        let total_ms = clip.len_ms();

        tracing::info!(
            "Transcribing {} ({} ms) with {} expected speakers via {}",
            filename,
            total_ms,
            speakers_expected,
            self.transcriber.name()
        );
        let utterances = self.transcriber.transcribe(&wav_path, speakers_expected)?;

        let planned = plan_turns(&utterances, total_ms);
        let duration = planned
            .last()
            .map(|t| t.end_ms as f64 / 1000.0)
            .unwrap_or(0.0);

        let conv_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        // Blobs first.
        self.blobs.write_original(&conv_id, &bytes, &format)?;

        let mut turn_rows = Vec::with_capacity(planned.len());
        for turn in &planned {
            let segment = clip.slice(turn.start_ms, turn.end_ms);
            let segment_bytes = segment.to_wav_bytes()?;
            let audio_path =
                self.blobs
                    .write_segment(&conv_id, &turn.speaker, turn.number, &segment_bytes)?;

            turn_rows.push(Turn {
                id: Uuid::new_v4().to_string(),
                conversation_id: conv_id.clone(),
                number: turn.number,
                speaker: turn.speaker.clone(),
                text: turn.text.clone(),
                start_ms: turn.start_ms,
                end_ms: turn.end_ms,
                audio_path,
            });
        }

        let conversation = Conversation {
            id: conv_id.clone(),
            fingerprint: fp,
            filename,
            format,
            duration,
            speakers: speakers_expected,
            turns: planned.len() as u32,
            processed_at: now.clone(),
            last_viewed: now,
            storage_path: conv_id.clone(),
        };

        // Then all rows in one transaction.
        let persisted = self.db.with_tx(|conn| {
            conversations::insert(conn, &conversation)?;
            for turn in &turn_rows {
                turns::insert(conn, turn)?;
            }
            Ok(())
        });

        if let Err(e) = persisted {
            // Roll the blob tree back so nothing half-written survives.
            if let Err(cleanup) = self.blobs.delete_conversation_tree(&conv_id) {
                tracing::warn!("Failed to clean up blob tree {}: {}", conv_id, cleanup);
            }
            return Err(e.into());
        }

        tracing::info!(
            "Created conversation {} with {} turns ({:.1}s)",
            conversation.id,
            conversation.turns,
            conversation.duration
        );
        Ok(Outcome::Created(conversation))
    }
}

/// Clamp utterance bounds to the audio, drop degenerate ranges, and assign
/// contiguous 1-based numbers to the survivors in chronological order.
pub fn plan_turns(utterances: &[Utterance], total_ms: i64) -> Vec<PlannedTurn> {
    let mut planned = Vec::with_capacity(utterances.len());
    let mut number = 0u32;

    for utterance in utterances {
        let start_ms = utterance.start_ms.max(0);
        let end_ms = utterance.end_ms.min(total_ms);

        // Zero-length or out-of-range artifact from the collaborator.
        if end_ms <= start_ms {
            tracing::debug!(
                "Dropping degenerate utterance from {} ({}..{} ms)",
                utterance.speaker,
                utterance.start_ms,
                utterance.end_ms
            );
            continue;
        }

        number += 1;
        planned.push(PlannedTurn {
            number,
            speaker: utterance.speaker.clone(),
            text: utterance.text.clone(),
            start_ms,
            end_ms,
        });
    }

    planned
}
