use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "speakersplit",
    version,
    about = "Split multi-speaker recordings into per-utterance segments with a chat-style transcript"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio file, split it by speaker, and save the result
    Process {
        /// Audio file to process (wav, or ogg via conversion)
        file: PathBuf,

        /// Expected number of speakers
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
        speakers: Option<u32>,

        /// Skip the duplicate check (only useful after deleting the original)
        #[arg(long)]
        force: bool,
    },

    /// List processed conversations, newest first
    List,

    /// Show a conversation as a chat transcript
    Show {
        /// Conversation id
        id: String,
    },

    /// Copy a conversation's original audio and segments to a directory
    Export {
        /// Conversation id
        id: String,

        /// Destination directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Delete a conversation, its turns, and its audio files
    Delete {
        /// Conversation id
        id: String,
    },

    /// Show conversation count, file count, and storage usage
    Status,

    /// Write a commented default config file
    InitConfig,
}
