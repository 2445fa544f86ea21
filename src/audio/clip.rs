// In-memory PCM audio with millisecond slicing.
//
// This is the codec collaborator for the segmentation pipeline: decode a
// WAV container, cut sub-ranges by time, and re-encode each cut as a
// standalone WAV blob.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Decoded 16-bit PCM audio, interleaved when multi-channel.
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

impl AudioClip {
    pub fn from_wav_file(path: &Path) -> Result<Self, hound::Error> {
        let reader = hound::WavReader::open(path)?;
        Self::from_reader(reader)
    }

    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, hound::Error> {
        let reader = hound::WavReader::new(Cursor::new(bytes))?;
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(reader: hound::WavReader<R>) -> Result<Self, hound::Error> {
        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(hound::Error::Unsupported);
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<i16>, _>>()?;

        Ok(Self {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    /// Total length in milliseconds.
    pub fn len_ms(&self) -> i64 {
        let frames = self.samples.len() as i64 / self.channels as i64;
        frames * 1000 / self.sample_rate as i64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Cut `[start_ms, end_ms)` into a new clip. Bounds are clamped to the
    /// clip; an inverted range yields an empty clip.
    pub fn slice(&self, start_ms: i64, end_ms: i64) -> AudioClip {
        let total_frames = self.samples.len() as i64 / self.channels as i64;
        let to_frame = |ms: i64| (ms * self.sample_rate as i64 / 1000).clamp(0, total_frames);

        let start_frame = to_frame(start_ms.max(0));
        let end_frame = to_frame(end_ms.max(0)).max(start_frame);

        let start = (start_frame * self.channels as i64) as usize;
        let end = (end_frame * self.channels as i64) as usize;

        AudioClip {
            samples: self.samples[start..end].to_vec(),
            channels: self.channels,
            sample_rate: self.sample_rate,
        }
    }

    /// Encode as a self-contained WAV blob.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, hound::Error> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}
