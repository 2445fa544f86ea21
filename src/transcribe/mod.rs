pub mod assemblyai;
pub mod backend;

pub use backend::{SpeakerTranscriber, Utterance};
