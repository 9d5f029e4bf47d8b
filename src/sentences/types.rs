use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf};

/// One day's entry, keyed by the name of its date folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub date: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct SentenceCatalog {
    sentences: Vec<Sentence>,
    by_date: HashMap<String, usize>,
}

impl SentenceCatalog {
    /// Expects `sentences` already sorted newest first with unique dates.
    pub fn new(sentences: Vec<Sentence>) -> Self {
        let by_date = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| (sentence.date.clone(), index))
            .collect();

        Self { sentences, by_date }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn get(&self, date: &str) -> Option<&Sentence> {
        self.by_date.get(date).map(|&index| &self.sentences[index])
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SentencesConfig {
    pub data_directory: PathBuf,
    pub file_name: String,
    pub refresh_interval_minutes: Option<u64>,
}

impl Default for SentencesConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            file_name: String::from(super::DEFAULT_FILE_NAME),
            refresh_interval_minutes: None,
        }
    }
}
