//! On-disk audio cache: one `<key>.mp3` file per (model, text) pair.
//!
//! Keys go through [`sanitize_key`], an allow-list filter that guarantees the
//! resulting file name is a single path component inside the output
//! directory. Writes land in a uniquely named temp file first and are renamed
//! into place, so a reader never observes a partially written entry.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, warn};

/// File extension of every cache entry.
pub const AUDIO_EXTENSION: &str = "mp3";
/// Longest stem, in characters, before the hash suffix kicks in.
pub const MAX_KEY_CHARS: usize = 50;
const HASH_SUFFIX_LEN: usize = 8;

/// A sanitized cache key. Only [`sanitize_key`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a synthesis of `text` with voice `model`.
    pub fn for_request(model: &str, text: &str) -> Self {
        sanitize_key(&format!("{}_{}", model, text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, AUDIO_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn arbitrary input into a safe file stem.
///
/// Unicode alphanumerics, `-`, `_` and `.` survive; every other character
/// (separators, whitespace, control and shell-special characters) becomes
/// `_`. Leading dots are replaced so the stem is never `.`, `..` or hidden.
/// Stems longer than [`MAX_KEY_CHARS`] are cut and end in `-` plus the first
/// eight hex digits of the SHA-256 of the trimmed input, so long inputs
/// sharing a prefix still get distinct files.
pub fn sanitize_key(raw: &str) -> CacheKey {
    let trimmed = raw.trim();

    let mut stem = String::with_capacity(trimmed.len());
    let mut leading = true;
    for c in trimmed.chars() {
        let keep = is_key_char(c) && !(leading && c == '.');
        leading = leading && c == '.';
        stem.push(if keep { c } else { '_' });
    }

    if stem.chars().count() > MAX_KEY_CHARS {
        let digest = hex::encode(Sha256::digest(trimmed.as_bytes()));
        let keep = MAX_KEY_CHARS - HASH_SUFFIX_LEN - 1;
        stem = stem.chars().take(keep).collect();
        stem.push('-');
        stem.push_str(&digest[..HASH_SUFFIX_LEN]);
    }

    if stem.is_empty() {
        stem.push('_');
    }
    CacheKey(stem)
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Flat directory of cached MP3 files.
#[derive(Debug, Clone)]
pub struct AudioCache {
    dir: PathBuf,
}

impl AudioCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory (and parents) if absent.
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        let path = self.dir.join(key.file_name());
        debug_assert_eq!(path.parent(), Some(self.dir.as_path()));
        path
    }

    /// Path of the cached file for `key`, if one exists.
    pub async fn lookup(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.path_for(key);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            Ok(_) => {
                warn!("Cache path {} exists but is not a file", path.display());
                None
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Could not stat {}: {}", path.display(), e);
                None
            }
        }
    }

    pub async fn read(&self, key: &CacheKey) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(key)).await
    }

    /// Cached path and bytes for `key`. An entry that disappears between the
    /// existence check and the read counts as a miss.
    pub async fn load(&self, key: &CacheKey) -> io::Result<Option<(PathBuf, Vec<u8>)>> {
        let Some(path) = self.lookup(key).await else {
            return Ok(None);
        };
        match fs::read(&path).await {
            Ok(audio) => Ok(Some((path, audio))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Cache entry {} vanished before read", key);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Write `audio` for `key`, replacing any existing entry.
    pub async fn store(&self, key: &CacheKey, audio: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(key);
        let temp_path = self.dir.join(format!(
            "{}.{}.tmp",
            key.file_name(),
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = write_synced(&temp_path, audio).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove {}: {}", temp_path.display(), cleanup);
                }
            }
            return Err(e);
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        debug!("Stored {} bytes at {}", audio.len(), path.display());
        Ok(path)
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
