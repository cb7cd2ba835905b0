//! Preprocess subcommand

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rdcorpus_core::{SharedProgress, fmt_num};
use rdcorpus_riksdag::Summary;

use super::styled_table;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Corpus ids to process (default: all)
    #[arg(long, value_delimiter = ',')]
    pub corpora: Vec<String>,

    /// Archive file names to skip
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Process a single entry and dump it to test.xml (ledger untouched)
    #[arg(long)]
    pub debug_entry: Option<String>,

    /// Directory with the downloaded zip archives
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output root for the corpus directories
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Processing ledger path
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Flush threshold for one batch file in bytes
    #[arg(long)]
    pub max_batch_bytes: Option<usize>,
}

impl PreprocessArgs {
    /// Merge with the file config; flags win.
    pub fn into_runtime(self, config: &Config) -> rdcorpus_riksdag::Config {
        let mut runtime = config.runtime();
        if let Some(input) = self.input {
            runtime.input_dir = input;
        }
        if let Some(output) = self.output {
            runtime.output_dir = output;
        }
        if let Some(ledger) = self.ledger {
            runtime.ledger_path = ledger;
        }
        if let Some(max) = self.max_batch_bytes {
            runtime.max_batch_bytes = max;
        }
        runtime.corpora = self.corpora;
        runtime.skip_files = self.skip;
        runtime.debug_entry = self.debug_entry;
        runtime
    }
}

pub fn run(args: PreprocessArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let runtime = args.into_runtime(config);
    let summary = rdcorpus_riksdag::run(&runtime, progress)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &Summary) {
    let mut table = styled_table(&["Preprocess", "Value"]);
    let rows = [
        (
            "Archives",
            format!(
                "{} ({} skipped)",
                summary.archives, summary.archives_skipped
            ),
        ),
        ("Entries written", fmt_num(summary.entries_written)),
        ("Already processed", fmt_num(summary.entries_skipped)),
        ("Without text", fmt_num(summary.entries_empty)),
        ("Failed", fmt_num(summary.entries_failed)),
        ("Batches", summary.batches_written.to_string()),
        ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
    ];
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    eprintln!("\n{table}");
}
