use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::TranscriptionConfig;
use crate::error::CollaboratorError;
use crate::transcribe::backend::{SpeakerTranscriber, Utterance};

/// AssemblyAI speech-to-text client with speaker diarization.
///
/// Three-step flow: upload the raw audio bytes, submit a transcript job
/// with speaker labels enabled, then poll until the job reaches a terminal
/// status. API reference: POST /v2/upload, POST /v2/transcript,
/// GET /v2/transcript/{id}.
pub struct AssemblyAiTranscriber {
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    deadline: Duration,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Serialize)]
struct CreateTranscriptRequest {
    audio_url: String,
    speaker_labels: bool,
    speakers_expected: u32,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    error: Option<String>,
    utterances: Option<Vec<WireUtterance>>,
}

#[derive(Debug, Deserialize)]
struct WireUtterance {
    speaker: String,
    text: String,
    start: i64,
    end: i64,
}

impl AssemblyAiTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = if config.api_key.is_empty() {
            std::env::var("SPEAKERSPLIT_API_KEY").map_err(|_| {
                anyhow::anyhow!(
                    "Transcription API key not configured. \
                     Set [transcription] api_key or SPEAKERSPLIT_API_KEY"
                )
            })?
        } else {
            config.api_key.clone()
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            deadline: Duration::from_secs(config.deadline_secs),
            client,
        })
    }

    fn upload(&self, audio_path: &Path) -> Result<String, CollaboratorError> {
        let bytes = std::fs::read(audio_path)?;

        let response = self
            .client
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()?
            .error_for_status()?;

        let body: UploadResponse = response.json()?;
        Ok(body.upload_url)
    }

    fn submit(&self, audio_url: String, speakers_expected: u32) -> Result<String, CollaboratorError> {
        let request = CreateTranscriptRequest {
            audio_url,
            speaker_labels: true,
            speakers_expected,
        };

        let response = self
            .client
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request)
            .send()?
            .error_for_status()?;

        let body: TranscriptResponse = response.json()?;
        Ok(body.id)
    }

    fn poll(&self, transcript_id: &str) -> Result<Vec<Utterance>, CollaboratorError> {
        let started = Instant::now();

        loop {
            let response = self
                .client
                .get(format!("{}/v2/transcript/{}", self.base_url, transcript_id))
                .header("authorization", &self.api_key)
                .send()?
                .error_for_status()?;

            let body: TranscriptResponse = response.json()?;

            match body.status.as_str() {
                "completed" => {
                    let utterances = body.utterances.unwrap_or_default();
                    return Ok(utterances
                        .into_iter()
                        .map(|u| Utterance {
                            speaker: u.speaker,
                            text: u.text,
                            start_ms: u.start,
                            end_ms: u.end,
                        })
                        .collect());
                }
                "error" => {
                    return Err(CollaboratorError::Processing(
                        body.error.unwrap_or_else(|| "unspecified error".to_string()),
                    ));
                }
                "queued" | "processing" => {
                    if started.elapsed() > self.deadline {
                        return Err(CollaboratorError::Timeout(self.deadline.as_secs()));
                    }
                    tracing::debug!("Transcript {} still {}", transcript_id, body.status);
                    std::thread::sleep(self.poll_interval);
                }
                other => {
                    return Err(CollaboratorError::Protocol(format!(
                        "unknown transcript status: {other}"
                    )));
                }
            }
        }
    }
}

impl SpeakerTranscriber for AssemblyAiTranscriber {
    fn name(&self) -> &str {
        "assemblyai"
    }

    fn transcribe(
        &self,
        audio_path: &Path,
        speakers_expected: u32,
    ) -> Result<Vec<Utterance>, CollaboratorError> {
        tracing::info!("Uploading {} for transcription", audio_path.display());
        let audio_url = self.upload(audio_path)?;

        let transcript_id = self.submit(audio_url, speakers_expected)?;
        tracing::info!("Transcript job {} submitted, polling", transcript_id);

        self.poll(&transcript_id)
    }
}
