// CLI command handlers. Each handler opens the stores it needs, runs one
// synchronous operation, and prints a result; state lives in the database
// and the blob tree, never in the process.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::blobs::BlobStore;
use crate::config::Config;
use crate::db::Database;
use crate::pipeline::{Outcome, Pipeline};
use crate::transcribe::assemblyai::AssemblyAiTranscriber;
use crate::view::{self, ConversationView};

/// Open the database and blob store, then sweep blob directories that no
/// conversation row references (recovery after a crash mid-persist).
fn open_stores(config: &Config) -> Result<(Database, BlobStore)> {
    let db = Database::open(&config.db_path())?;
    let blobs = BlobStore::new(config.blob_root());

    let known: HashSet<String> = db
        .list_conversations()?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let removed = blobs.sweep_orphans(&known)?;
    if !removed.is_empty() {
        tracing::info!("Swept {} orphaned blob tree(s) at startup", removed.len());
    }

    Ok((db, blobs))
}

pub fn process(config: &Config, file: &Path, speakers: Option<u32>, force: bool) -> Result<()> {
    let (db, blobs) = open_stores(config)?;
    let transcriber = AssemblyAiTranscriber::new(&config.transcription)?;
    let pipeline = Pipeline::new(&db, &blobs, &transcriber);

    let speakers = speakers.unwrap_or(config.processing.default_speakers);

    match pipeline.process(file, speakers, force)? {
        Outcome::Created(conversation) => {
            println!(
                "Processed {} into {} turns ({}).",
                conversation.filename,
                conversation.turns,
                view::format_duration(conversation.duration)
            );
            println!("Conversation id: {}", conversation.id);
            println!("View it with: speakersplit show {}", conversation.id);
        }
        Outcome::Duplicate(existing) => {
            println!("This audio was already processed.");
            println!(
                "  {} | processed {} | {} turns | {}",
                existing.filename,
                &existing.processed_at[..10.min(existing.processed_at.len())],
                existing.turns,
                view::format_duration(existing.duration)
            );
            println!("  fingerprint: {}...", &existing.fingerprint[..16]);
            println!();
            println!("View the saved result with: speakersplit show {}", existing.id);
            println!("To reprocess anyway, delete it first: speakersplit delete {}", existing.id);
        }
    }

    Ok(())
}

pub fn list(config: &Config) -> Result<()> {
    let (db, _blobs) = open_stores(config)?;
    let conversations = db.list_conversations()?;
    print!("{}", view::render_history(&conversations, Utc::now()));
    Ok(())
}

pub fn show(config: &Config, id: &str) -> Result<()> {
    let (db, _blobs) = open_stores(config)?;

    let conversation = db
        .get_conversation(id)?
        .with_context(|| format!("No conversation with id {id}"))?;
    let turns = db.list_turns(id)?;

    db.touch_last_viewed(id, &Utc::now().to_rfc3339())?;

    let view_state = ConversationView {
        conversation,
        turns,
    };
    print!("{}", view::render_transcript(&view_state));
    Ok(())
}

/// Copy the original upload and every segment blob into `out`, flattened
/// the way the in-app bulk download named them.
pub fn export(config: &Config, id: &str, out: &Path) -> Result<()> {
    let (db, blobs) = open_stores(config)?;

    let conversation = db
        .get_conversation(id)?
        .with_context(|| format!("No conversation with id {id}"))?;
    let turns = db.list_turns(id)?;

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let original = blobs.read(&format!("{id}/original.{}", conversation.format))?;
    std::fs::write(out.join(&conversation.filename), original)?;

    let mut exported = 1;
    for turn in &turns {
        let bytes = blobs.read(&turn.audio_path)?;
        let name = PathBuf::from(&turn.audio_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("turn_{:03}.wav", turn.number));
        std::fs::write(out.join(name), bytes)?;
        exported += 1;
    }

    println!("Exported {} file(s) to {}", exported, out.display());
    Ok(())
}

/// Deletion is total: turn rows, the conversation row, then the blob tree.
/// Rows go first so no turn row ever outlives its blob.
pub fn delete(config: &Config, id: &str) -> Result<()> {
    let (db, blobs) = open_stores(config)?;

    let conversation = db
        .get_conversation(id)?
        .with_context(|| format!("No conversation with id {id}"))?;

    db.delete_turns(id)?;
    db.delete_conversation(id)?;
    blobs.delete_conversation_tree(id)?;

    println!("Deleted {} ({})", conversation.filename, id);
    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    let (db, blobs) = open_stores(config)?;

    let conversations = db.list_conversations()?;
    let (file_count, total_bytes) = blobs.tree_stats()?;
    let total_mb = total_bytes as f64 / 1_048_576.0;

    println!("speakersplit status:");
    println!("  Database:      {}", db.db_path().display());
    println!("  Blob root:     {}", blobs.root().display());
    println!("  Conversations: {}", conversations.len());
    println!("  Audio files:   {}", file_count);
    println!("  Storage used:  {:.1} MB", total_mb);

    Ok(())
}

/// Write a commented default config to the platform config location (or
/// the explicitly given path). Refuses to overwrite an existing file.
pub fn init_config(explicit_path: Option<&Path>) -> Result<()> {
    let target = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => dirs::config_dir()
            .context("Could not determine the platform config directory")?
            .join("speakersplit")
            .join("config.toml"),
    };

    if target.exists() {
        anyhow::bail!("Config file already exists: {}", target.display());
    }

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, Config::generate_default_commented())?;

    println!("Wrote default config to {}", target.display());
    Ok(())
}
