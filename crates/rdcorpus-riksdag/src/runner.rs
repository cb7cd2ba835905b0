//! Main runner for the Riksdag preprocessing pipeline

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use rdcorpus_core::{ProgressContext, fmt_num};

use crate::config::Config;
use crate::extract::ExtractOptions;
use crate::ledger::Ledger;
use crate::sparv::write_corpus_config;
use crate::worker::{ArchiveStats, ArchiveTarget, dump_entry, process_archive};

/// Pipeline execution summary
#[derive(Debug, Default, Clone)]
pub struct Summary {
    /// Archives processed in this run
    pub archives: usize,
    /// Archives skipped by name or corpus filter
    pub archives_skipped: usize,
    pub entries_written: usize,
    /// Entries already in the ledger
    pub entries_skipped: usize,
    /// Entries without text
    pub entries_empty: usize,
    pub entries_failed: usize,
    pub batches_written: usize,
    pub elapsed: Duration,
}

impl Summary {
    fn add(&mut self, stats: &ArchiveStats) {
        self.entries_written += stats.entries_written;
        self.entries_skipped += stats.entries_skipped;
        self.entries_empty += stats.entries_empty;
        self.entries_failed += stats.entries_failed;
        self.batches_written += stats.batches_written;
    }
}

/// Source archives in `input_dir`, sorted by name.
///
/// Hidden files and anything not ending in `.zip` are ignored.
pub fn list_archives(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        bail!("Input directory {} does not exist", input_dir.display());
    }
    let pattern = format!(
        "{}/*",
        glob::Pattern::escape(&input_dir.to_string_lossy())
    );
    let mut archives = Vec::new();
    for path in glob::glob(&pattern).context("Invalid input directory pattern")? {
        let path = path.context("Failed to list input directory")?;
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name.starts_with('.') || !name.ends_with(".zip") || !path.is_file() {
            log::info!("Ignoring {}", path.display());
            continue;
        }
        archives.push(path);
    }
    archives.sort();
    Ok(archives)
}

/// Run the preprocessing pipeline
///
/// In debug mode (`config.debug_entry`) the first archive containing the
/// entry is searched, the entry is dumped, and the run ends without
/// touching the ledger.
pub fn run(config: &Config, progress: &ProgressContext) -> Result<Summary> {
    let start = Instant::now();
    let opts = ExtractOptions::default();

    let archives = list_archives(&config.input_dir)?;
    log::info!(
        "Found {} archives in {}",
        archives.len(),
        config.input_dir.display()
    );

    let mut ledger = if config.debug_entry.is_some() {
        Ledger::default()
    } else {
        Ledger::load(&config.ledger_path)?
    };
    let mut summary = Summary::default();

    for archive_path in &archives {
        let archive_name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if config.skips_file(&archive_name) {
            log::info!("Skipping {archive_name}");
            summary.archives_skipped += 1;
            continue;
        }

        let route = config
            .corpus_table
            .resolve_archive(&archive_name)
            .with_context(|| format!("Cannot route archive {}", archive_path.display()))?;
        log::debug!(
            "{archive_name}: prefix '{}' -> {}",
            route.prefix,
            route.corpus.id
        );
        if !config.wants_corpus(&route.corpus.id) {
            log::debug!("Skipping {archive_name} (corpus {} not selected)", route.corpus.id);
            summary.archives_skipped += 1;
            continue;
        }

        let corpus_dir = config.output_dir.join(&route.corpus.id);

        if let Some(entry) = &config.debug_entry {
            if dump_entry(archive_path, entry, &config.output_dir, &opts)? {
                summary.archives += 1;
                summary.elapsed = start.elapsed();
                return Ok(summary);
            }
            continue;
        }

        progress.println(format!("Processing {}", archive_path.display()));
        write_corpus_config(&corpus_dir, route.corpus).with_context(|| {
            format!("Failed to write corpus config in {}", corpus_dir.display())
        })?;

        let target_dir = corpus_dir.join("source").join(&route.subdir);
        let target = ArchiveTarget {
            dir: &target_dir,
            stub: &route.subdir,
            max_batch_bytes: config.max_batch_bytes,
        };
        let mut section = ledger.archive(&archive_name);
        let stats = process_archive(archive_path, &target, &mut section, &opts, progress)?;
        log::info!(
            "  {archive_name}: {} written, {} skipped, {} empty, {} failed, {} batches",
            stats.entries_written,
            stats.entries_skipped,
            stats.entries_empty,
            stats.entries_failed,
            stats.batches_written
        );

        ledger.set_archive(archive_name, section);
        ledger.persist(&config.ledger_path)?;
        summary.archives += 1;
        summary.add(&stats);
    }

    if let Some(entry) = &config.debug_entry {
        log::warn!("Entry '{entry}' not found in any selected archive");
    }

    summary.elapsed = start.elapsed();

    log::info!("=== Preprocessing Summary ===");
    log::info!(
        "Archives: {} processed ({} skipped)",
        summary.archives,
        summary.archives_skipped
    );
    log::info!(
        "Entries: {} written, {} already done, {} empty, {} failed",
        fmt_num(summary.entries_written),
        fmt_num(summary.entries_skipped),
        fmt_num(summary.entries_empty),
        fmt_num(summary.entries_failed)
    );
    log::info!("Batches: {}", summary.batches_written);
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_visible_zip_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["mot-2018-2021.xml.zip", "bet-2018-2021.xml.zip", ".hidden.zip", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("dir.zip")).unwrap();

        let names: Vec<String> = list_archives(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["bet-2018-2021.xml.zip", "mot-2018-2021.xml.zip"]);
    }

    #[test]
    fn missing_input_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_archives(&dir.path().join("rawdata")).is_err());
    }

    #[test]
    fn unknown_prefix_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rawdata");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("nytt-2020-2021.xml.zip"), b"").unwrap();

        let config = Config {
            input_dir: input,
            output_dir: dir.path().join("material"),
            ledger_path: dir.path().join("processed.json"),
            ..Default::default()
        };
        let err = run(&config, &ProgressContext::with_tty(false)).unwrap_err();
        assert!(format!("{err:#}").contains("nytt"));
    }

    #[test]
    fn skipped_archive_is_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rawdata");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("bet-2018-2021.xml.zip"), b"not a zip").unwrap();

        let config = Config {
            input_dir: input,
            output_dir: dir.path().join("material"),
            ledger_path: dir.path().join("processed.json"),
            skip_files: vec!["bet-2018-2021.xml.zip".into()],
            ..Default::default()
        };
        let summary = run(&config, &ProgressContext::with_tty(false)).unwrap();
        assert_eq!(summary.archives, 0);
        assert_eq!(summary.archives_skipped, 1);
    }
}
