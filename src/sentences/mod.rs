pub mod core;
pub mod error;
pub mod handlers;
pub mod types;

pub use core::{SentenceStore, get_all_sentences, load_sentences};
pub use error::SentencesError;
pub use types::{Sentence, SentenceCatalog, SentencesConfig};

pub const DEFAULT_FILE_NAME: &str = "README.md";
