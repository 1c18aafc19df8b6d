
use std::fs;

use tracing::{info, warn};
use url::Url;

use crate::chunker::{Chunk, chunk};
use crate::{RagError, Result};
use crate::config::Config;
use crate::fetcher::{FetcherConfig, PageFetcher};
use crate::loader::load_folder;

/// Run the ingestion half of the pipeline: fetch every configured URL,
/// persist the rendered HTML under the data directory, load all persisted
/// pages back, and chunk each into one concatenated sequence.
#[inline]
pub async fn ingest(config: &Config) -> Result<Vec<Chunk>> {
    fs::create_dir_all(&config.data_dir)?;

    let fetcher = PageFetcher::new(FetcherConfig::default())
        .map_err(|e| RagError::Fetch(format!("{:#}", e)))?;
    for url in &config.urls {
        info!("Fetching {}", url);
        let html = fetcher.fetch_rendered(url).await;
        if html.is_empty() {
            warn!("No content rendered for {}, skipping", url);
            continue;
        }

        let file_path = config.data_dir.join(page_file_name(url));
        fs::write(&file_path, &html)?;
        info!("Saved {} bytes to {:?}", html.len(), file_path);
    }

    let pages = load_folder(&config.data_dir)?;
    info!("Loaded {} pages from {:?}", pages.len(), config.data_dir);

    let mut chunks = Vec::new();
    for page in &pages {
        chunks.extend(chunk(page, &config.chunking));
    }
    info!("Chunked {} pages into {} chunks", pages.len(), chunks.len());

    Ok(chunks)
}

/// Derive a filesystem-safe file name for a fetched page from its URL.
/// Deterministic: the same URL always maps to the same file, so refetching
/// overwrites rather than accumulating duplicates.
#[inline]
pub fn page_file_name(url: &Url) -> String {
    let host = url.host_str().unwrap_or("page");
    let mut name = String::with_capacity(host.len() + url.path().len() + 5);
    for ch in host.chars().chain(url.path().chars()) {
        if ch.is_ascii_alphanumeric() {
            name.push(ch);
        } else if !name.ends_with('_') {
            name.push('_');
        }
    }
    let trimmed = name.trim_matches('_');
    if trimmed.is_empty() {
        "page.html".to_string()
    } else {
        format!("{}.html", trimmed)
    }
}
