use super::{error::SentencesError, types::*};
use pulldown_cmark::{Options, Parser, html};
use std::{io::ErrorKind, path::Path, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub struct SentenceStore {
    config: SentencesConfig,
    catalog: Arc<RwLock<Arc<SentenceCatalog>>>,
}

impl SentenceStore {
    pub fn new(config: SentencesConfig) -> Self {
        Self {
            config,
            catalog: Arc::new(RwLock::new(Arc::new(SentenceCatalog::default()))),
        }
    }

    pub async fn refresh(&self) -> Result<usize, SentencesError> {
        info!(
            "Refreshing sentences from directory: {:?}",
            self.config.data_directory
        );

        let sentences = load_sentences(&self.config.data_directory, &self.config.file_name).await?;
        let count = sentences.len();
        info!("Found {} sentences", count);

        let mut catalog = self.catalog.write().await;
        *catalog = Arc::new(SentenceCatalog::new(sentences));

        Ok(count)
    }

    pub fn start_background_refresh(store: Arc<SentenceStore>, interval_minutes: u64) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_minutes * 60));
            interval.tick().await; // Skip the first immediate tick

            loop {
                interval.tick().await;
                info!("Starting scheduled sentences refresh");

                if let Err(e) = store.refresh().await {
                    error!("Failed to refresh sentences: {}", e);
                }
            }
        });
    }

    /// Snapshot of the currently loaded entries. Holding it never blocks a refresh.
    pub async fn catalog(&self) -> Arc<SentenceCatalog> {
        self.catalog.read().await.clone()
    }

    pub fn get_config(&self) -> &SentencesConfig {
        &self.config
    }
}

/// Reads `<root>/<date>/<file_name>` for every immediate subdirectory of `root`.
///
/// A missing root is an empty site. Folders without the file, or whose file is
/// blank after trimming, are skipped. The result is sorted by date key, newest first.
pub async fn load_sentences(root: &Path, file_name: &str) -> Result<Vec<Sentence>, SentencesError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Data directory {:?} does not exist, no sentences loaded", root);
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut sentences = Vec::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to list {:?}, keeping entries read so far: {}", root, e);
                break;
            }
        };

        // Follows symlinks, so a linked date folder counts as a folder.
        match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => continue,
            Err(e) => {
                warn!("Failed to stat {:?}, skipping: {}", entry.path(), e);
                continue;
            }
        }

        let Some(date) = entry.file_name().to_str().map(str::to_string) else {
            debug!("Skipping non UTF-8 folder {:?}", entry.path());
            continue;
        };

        let file_path = entry.path().join(file_name);
        let content = match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No {} in {:?}, skipping", file_name, entry.path());
                continue;
            }
            Err(e) => {
                error!("Failed to read {:?}: {}", file_path, e);
                continue;
            }
        };

        let content = content.trim();
        if content.is_empty() {
            debug!("Empty entry for {}, skipping", date);
            continue;
        }

        sentences.push(Sentence {
            date,
            content: content.to_string(),
        });
    }

    sentences.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(sentences)
}

/// Loads entries from `root` using the default `README.md` file name.
pub async fn get_all_sentences(root: &Path) -> Result<Vec<Sentence>, SentencesError> {
    load_sentences(root, super::DEFAULT_FILE_NAME).await
}

pub fn render_markdown(content: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(content, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// `2024-01-02` becomes `1月2日`; keys that are not dates are shown as is.
pub fn format_month_day(date: &str) -> String {
    match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(day) => day.format("%-m月%-d日").to_string(),
        Err(_) => date.to_string(),
    }
}

pub fn format_full_date(date: &str) -> String {
    match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(day) => day.format("%Y年%-m月%-d日").to_string(),
        Err(_) => date.to_string(),
    }
}
