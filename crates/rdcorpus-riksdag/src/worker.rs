//! Worker for processing one source archive

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use rdcorpus_core::{BatchSink, ProgressContext, cleanup_tmp_files, write_atomic, write_batch_file};
use zip::ZipArchive;

use crate::extract::{ExtractOptions, extract};
use crate::ledger::ArchiveLedger;

/// Debug dump of the normalized document, wrapped like a batch file.
pub const DEBUG_OUTPUT: &str = "test.xml";
/// Debug dump of the parsed fragments before reduction.
pub const DEBUG_ORIGINAL: &str = "test_orig.xml";

/// Counters for one archive
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveStats {
    pub entries_written: usize,
    pub entries_skipped: usize,
    pub entries_empty: usize,
    pub entries_failed: usize,
    pub batches_written: usize,
}

/// Where and how one archive's batches are written.
#[derive(Debug, Clone)]
pub struct ArchiveTarget<'a> {
    /// `<output>/<corpus-id>/source/<subdir>`
    pub dir: &'a Path,
    /// Batch file stem, the archive's sub-directory name
    pub stub: &'a str,
    pub max_batch_bytes: usize,
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    ZipArchive::new(file).with_context(|| format!("Failed to read zip {}", path.display()))
}

/// Process every entry of `archive_path` not yet in `ledger`.
///
/// Extracted documents are batched into `target`; `ledger` is updated in
/// memory only, the caller persists it. An entry that fails to parse is
/// logged, left out of the ledger, and does not stop the archive.
pub fn process_archive(
    archive_path: &Path,
    target: &ArchiveTarget<'_>,
    ledger: &mut ArchiveLedger,
    opts: &ExtractOptions,
    progress: &ProgressContext,
) -> Result<ArchiveStats> {
    let archive_name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut archive = open_archive(archive_path)?;

    cleanup_tmp_files(target.dir)
        .with_context(|| format!("Failed to clean {}", target.dir.display()))?;

    let pb = progress.archive_bar(&archive_name, archive.len() as u64);
    let mut sink = BatchSink::new(
        target.dir,
        target.stub,
        ledger.next_batch_index(),
        target.max_batch_bytes,
    );
    let mut stats = ArchiveStats::default();
    let mut buf = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("Failed to read entry {i} of {archive_name}"))?;
        pb.inc(1);
        if file.is_dir() {
            continue;
        }
        let entry = file.name().to_owned();
        if ledger.is_processed(&entry) {
            log::debug!("  Skipping file '{entry}' (already processed)");
            stats.entries_skipped += 1;
            continue;
        }

        buf.clear();
        file.read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {entry} from {archive_name}"))?;
        drop(file);
        pb.set_message(entry.clone());

        match extract(&buf, &entry, opts) {
            Ok(Some(extraction)) => {
                let batch = sink
                    .push(extraction.xml)
                    .with_context(|| format!("Failed to write batch in {}", target.dir.display()))?;
                ledger.record(entry, Some(batch));
                stats.entries_written += 1;
            }
            Ok(None) => {
                log::debug!("  No content in '{entry}'");
                ledger.record(entry, None);
                stats.entries_empty += 1;
            }
            Err(e) => {
                log::error!("  {archive_name}/{entry}: {e}");
                stats.entries_failed += 1;
            }
        }
    }

    let written = sink
        .finish()
        .with_context(|| format!("Failed to write batch in {}", target.dir.display()))?;
    stats.batches_written = written.len();
    pb.finish_and_clear();

    Ok(stats)
}

/// Extract a single named entry and dump it under `output_dir`.
///
/// Returns `false` if the archive has no such entry. The ledger is not
/// involved.
pub fn dump_entry(
    archive_path: &Path,
    entry: &str,
    output_dir: &Path,
    opts: &ExtractOptions,
) -> Result<bool> {
    let mut archive = open_archive(archive_path)?;
    let mut buf = Vec::new();
    match archive.by_name(entry) {
        Ok(mut file) => {
            file.read_to_end(&mut buf)
                .with_context(|| format!("Failed to read {entry}"))?;
        }
        Err(zip::result::ZipError::FileNotFound) => return Ok(false),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {entry}"));
        }
    }

    let opts = ExtractOptions {
        debug: true,
        ..opts.clone()
    };
    match extract(&buf, entry, &opts).with_context(|| format!("Failed to extract {entry}"))? {
        Some(extraction) => {
            let path = output_dir.join(DEBUG_OUTPUT);
            write_batch_file(&path, &[extraction.xml])
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let orig = output_dir.join(DEBUG_ORIGINAL);
            write_atomic(&orig, extraction.snapshots.join("\n").as_bytes())
                .with_context(|| format!("Failed to write {}", orig.display()))?;
            log::info!("Wrote {} and {}", path.display(), orig.display());
        }
        None => log::info!("No content in '{entry}', nothing written"),
    }
    Ok(true)
}
