use crate::{Config, likes::LikesConfig};
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Static files directory does not exist: {0}")]
    StaticDirectoryMissing(String),

    #[error("Like service base URL is invalid: {0}")]
    InvalidLikesUrl(#[from] url::ParseError),
}

impl StartupCheckError {
    /// Critical failures stop the server; the rest degrade a feature.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::InvalidLikesUrl(_))
    }
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let data_dir = &config.sentences.data_directory;
    match tokio::fs::read_dir(data_dir).await {
        Ok(_) => info!("Data directory is accessible: {:?}", data_dir),
        Err(e) => {
            warn!("Data directory {:?} is not readable: {}", data_dir, e);
            warn!("The timeline will be empty until it exists");
        }
    }

    let templates_dir = &config.templates.directory;
    if !templates_dir.exists() {
        warn!("Templates directory does not exist: {:?}", templates_dir);
        warn!("This may cause issues with page rendering");
    } else {
        info!("Templates directory exists: {:?}", templates_dir);
    }

    let static_dir = &config.static_files.directory;
    if !static_dir.exists() {
        error!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing(
            static_dir.display().to_string(),
        ));
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    match &config.likes {
        LikesConfig::Http(http) => match url::Url::parse(&http.base_url) {
            Ok(url) => info!("Like service at {}", url),
            Err(e) => {
                error!("Like service base URL {:?} is invalid: {}", http.base_url, e);
                errors.push(StartupCheckError::InvalidLikesUrl(e));
            }
        },
        LikesConfig::Null => warn!("No like service configured, counts will show as 0"),
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
