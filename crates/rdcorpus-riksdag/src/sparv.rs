//! Per-corpus Sparv configuration written next to the corpus sources

use std::io;
use std::path::{Path, PathBuf};

use rdcorpus_core::write_atomic;

use crate::corpus::CorpusInfo;

pub const CONFIG_FILE: &str = "config.yaml";
const NAME_PREFIX: &str = "Riksdagens öppna data: ";

fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render the configuration for one corpus.
pub fn corpus_config(corpus: &CorpusInfo) -> String {
    format!(
        "parent: ../{CONFIG_FILE}\n\
         \n\
         metadata:\n  \
           id: {}\n  \
           name:\n    \
             swe: {}\n  \
           description:\n    \
             swe: {}\n",
        corpus.id,
        yaml_string(&format!("{NAME_PREFIX}{}", corpus.name)),
        yaml_string(&corpus.description),
    )
}

/// Write `<corpus_dir>/config.yaml` unless it already exists.
///
/// Returns the path when a file was written.
pub fn write_corpus_config(corpus_dir: &Path, corpus: &CorpusInfo) -> io::Result<Option<PathBuf>> {
    let path = corpus_dir.join(CONFIG_FILE);
    if path.is_file() {
        return Ok(None);
    }
    write_atomic(&path, corpus_config(corpus).as_bytes())?;
    log::info!("  Config {} written", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> CorpusInfo {
        CorpusInfo::new("rd-bet", "Betänkande", "Utskottens \"betänkanden\"")
    }

    #[test]
    fn config_inherits_parent_and_quotes_values() {
        let text = corpus_config(&corpus());
        assert_eq!(
            text,
            "parent: ../config.yaml\n\nmetadata:\n  id: rd-bet\n  name:\n    swe: \"Riksdagens öppna data: Betänkande\"\n  description:\n    swe: \"Utskottens \\\"betänkanden\\\"\"\n"
        );
    }

    #[test]
    fn existing_config_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_dir = dir.path().join("rd-bet");

        let written = write_corpus_config(&corpus_dir, &corpus()).unwrap();
        assert_eq!(written, Some(corpus_dir.join(CONFIG_FILE)));

        std::fs::write(corpus_dir.join(CONFIG_FILE), "edited").unwrap();
        assert_eq!(write_corpus_config(&corpus_dir, &corpus()).unwrap(), None);
        assert_eq!(
            std::fs::read_to_string(corpus_dir.join(CONFIG_FILE)).unwrap(),
            "edited"
        );
    }
}
