//! rdcorpus - Riksdag corpus preprocessing
//!
//! Normalizes zipped Riksdagens öppna data records into batched corpus
//! source files, one corpus per document series.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "rdcorpus")]
#[command(about = "Preprocess Riksdagens öppna data into corpus source files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./rdcorpus.toml or ~/.config/rdcorpus/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize archives and write batch files
    Preprocess(cmd::preprocess::PreprocessArgs),
    /// Show the processing ledger per archive
    Status(cmd::status::StatusArgs),
    /// List archive prefixes and their corpora
    Corpora,
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(rdcorpus_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug
    //   non-TTY: info unless --debug
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    rdcorpus_core::init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Preprocess(args) => cmd::preprocess::run(args, &config, &progress),
        Command::Status(args) => cmd::status::run(args, &config),
        Command::Corpora => cmd::corpora::run(&config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Input directory",
                &config.paths.input_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Output directory",
                &config.paths.output_dir.display().to_string(),
            ]);
            table.add_row(vec!["Ledger", &config.paths.ledger.display().to_string()]);
            table.add_row(vec![
                "Max batch size",
                &format!("{} bytes", rdcorpus_core::fmt_num(config.batch.max_bytes)),
            ]);
            table.add_row(vec![
                "Corpus prefixes",
                &format!(
                    "{} ({} from config)",
                    config.corpus_table().len(),
                    config.corpora.len()
                ),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
