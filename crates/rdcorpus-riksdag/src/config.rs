//! Riksdag preprocessing configuration

use std::path::PathBuf;

use rdcorpus_core::DEFAULT_MAX_BATCH_BYTES;

use crate::corpus::CorpusTable;

/// Runtime configuration for the preprocessing run
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the downloaded `*.zip` archives
    pub input_dir: PathBuf,
    /// Root of the per-corpus output tree
    pub output_dir: PathBuf,
    /// JSON ledger of processed entries
    pub ledger_path: PathBuf,
    /// Corpus ids to process; empty means all
    pub corpora: Vec<String>,
    /// Archive file names to leave untouched
    pub skip_files: Vec<String>,
    /// Process only this entry and dump it to `test.xml`
    pub debug_entry: Option<String>,
    /// Flush threshold for one batch file
    pub max_batch_bytes: usize,
    pub corpus_table: CorpusTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("rawdata"),
            output_dir: PathBuf::from("material"),
            ledger_path: PathBuf::from("processed.json"),
            corpora: Vec::new(),
            skip_files: Vec::new(),
            debug_entry: None,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
            corpus_table: CorpusTable::riksdagen(),
        }
    }
}

impl Config {
    /// Whether documents of `corpus_id` should be produced.
    pub fn wants_corpus(&self, corpus_id: &str) -> bool {
        self.corpora.is_empty() || self.corpora.iter().any(|c| c == corpus_id)
    }

    pub fn skips_file(&self, archive_name: &str) -> bool {
        self.skip_files.iter().any(|f| f == archive_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.input_dir, PathBuf::from("rawdata"));
        assert_eq!(config.output_dir, PathBuf::from("material"));
        assert_eq!(config.ledger_path, PathBuf::from("processed.json"));
        assert_eq!(config.max_batch_bytes, 10 * 1024 * 1024);
        assert!(config.debug_entry.is_none());
        assert!(!config.corpus_table.is_empty());
    }

    #[test]
    fn empty_corpus_list_selects_everything() {
        let mut config = Config::default();
        assert!(config.wants_corpus("rd-bet"));
        config.corpora = vec!["rd-mot".into()];
        assert!(!config.wants_corpus("rd-bet"));
        assert!(config.wants_corpus("rd-mot"));
    }
}
