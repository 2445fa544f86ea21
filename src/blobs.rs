use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// File-tree store for original uploads and per-turn audio segments.
///
/// Layout under the root:
/// `<conversation_id>/original.<format>` and
/// `<conversation_id>/segments/<speaker>_<number:03>.wav`.
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn conversation_dir(&self, conv_id: &str) -> PathBuf {
        self.root.join(conv_id)
    }

    /// Write the original upload bytes verbatim. Creates the conversation
    /// directory if absent; a second write for the same id replaces the
    /// file (dedup is the repository's job, not this layer's).
    pub fn write_original(
        &self,
        conv_id: &str,
        bytes: &[u8],
        format: &str,
    ) -> Result<(), StoreError> {
        let dir = self.conversation_dir(conv_id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(format!("original.{format}")), bytes)?;
        Ok(())
    }

    /// Write one segment blob. The filename is derived from speaker and
    /// turn number, so re-running segmentation for the same conversation id
    /// deterministically overwrites the same files. Returns the path
    /// relative to the store root, for the caller to record on the turn.
    pub fn write_segment(
        &self,
        conv_id: &str,
        speaker: &str,
        number: u32,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        let relative = segment_path(conv_id, speaker, number);
        let absolute = self.root.join(&relative);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&absolute, bytes)?;
        Ok(relative)
    }

    /// Read a blob back by its recorded relative path.
    pub fn read(&self, relative_path: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.root.join(relative_path);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("blob {relative_path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn original_path(&self, conv_id: &str, format: &str) -> PathBuf {
        self.conversation_dir(conv_id).join(format!("original.{format}"))
    }

    /// Recursively remove the conversation's entire directory. A missing
    /// directory is a no-op, not an error.
    pub fn delete_conversation_tree(&self, conv_id: &str) -> Result<(), StoreError> {
        let dir = self.conversation_dir(conv_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Remove conversation directories with no corresponding row.
    ///
    /// Blobs are written before the row transaction commits, so a crash in
    /// between leaves directories that nothing references. Run at startup;
    /// returns the removed ids.
    pub fn sweep_orphans(&self, known_ids: &HashSet<String>) -> Result<Vec<String>, StoreError> {
        let mut removed = Vec::new();

        if !self.root.exists() {
            return Ok(removed);
        }

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !known_ids.contains(&name) {
                std::fs::remove_dir_all(entry.path())?;
                tracing::info!("Removed orphaned blob tree: {}", name);
                removed.push(name);
            }
        }

        Ok(removed)
    }

    /// Returns (total_files, total_bytes) under the store root.
    pub fn tree_stats(&self) -> Result<(usize, u64), StoreError> {
        if !self.root.exists() {
            return Ok((0, 0));
        }
        dir_stats(&self.root)
    }
}

/// Derived segment path: `<conv_id>/segments/<speaker_lower>_<number:03>.wav`.
pub fn segment_path(conv_id: &str, speaker: &str, number: u32) -> String {
    format!(
        "{conv_id}/segments/{}_{number:03}.wav",
        speaker.to_lowercase()
    )
}

fn dir_stats(path: &Path) -> Result<(usize, u64), StoreError> {
    let mut count = 0;
    let mut bytes = 0;

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            count += 1;
            bytes += metadata.len();
        } else if metadata.is_dir() {
            let (sub_count, sub_bytes) = dir_stats(&entry.path())?;
            count += sub_count;
            bytes += sub_bytes;
        }
    }

    Ok((count, bytes))
}
