//! On-disk copies of the last fetched page and the last extracted stories.

use std::path::{Path, PathBuf};

use storyline_common::{Result, StorylineError};
use storyline_scan::Story;
use tokio::sync::Mutex;

/// Raw page cache. Reads and writes go through one lock so concurrent
/// requests never observe a half-written file.
#[derive(Debug)]
pub struct PageCache {
    page_file: PathBuf,
    lock: Mutex<()>,
}

impl PageCache {
    pub fn new(page_file: impl Into<PathBuf>) -> Self {
        Self {
            page_file: page_file.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn page_file(&self) -> &Path {
        &self.page_file
    }

    pub async fn store_page(&self, html: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        ensure_parent(&self.page_file).await?;
        tokio::fs::write(&self.page_file, html)
            .await
            .map_err(|e| StorylineError::cache(&self.page_file, e))?;
        tracing::debug!(path = %self.page_file.display(), bytes = html.len(), "cache.page.stored");
        Ok(())
    }

    /// Read the cached page; invalid UTF-8 is replaced rather than rejected.
    pub async fn load_page(&self) -> Result<String> {
        let _guard = self.lock.lock().await;
        let bytes = tokio::fs::read(&self.page_file)
            .await
            .map_err(|e| StorylineError::cache(&self.page_file, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Write stories as pretty-printed JSON.
pub async fn write_stories(path: &Path, stories: &[Story]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(stories)?;
    json.push('\n');
    ensure_parent(path).await?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| StorylineError::cache(path, e))?;
    tracing::info!(path = %path.display(), count = stories.len(), "cache.stories.saved");
    Ok(())
}

async fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StorylineError::cache(dir, e)),
        _ => Ok(()),
    }
}
