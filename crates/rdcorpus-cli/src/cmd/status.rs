//! Status subcommand: ledger contents per archive

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use rdcorpus_core::fmt_num;
use rdcorpus_riksdag::Ledger;

use super::styled_table;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Processing ledger path (default: from config)
    #[arg(long)]
    pub ledger: Option<PathBuf>,
}

/// One row per archive: entries, entries without output, distinct batches.
fn ledger_rows(ledger: &Ledger) -> Vec<[String; 4]> {
    ledger
        .iter()
        .map(|(archive, section)| {
            [
                archive.to_string(),
                fmt_num(section.len()),
                fmt_num(section.empty_entries()),
                section.batches().len().to_string(),
            ]
        })
        .collect()
}

pub fn run(args: StatusArgs, config: &Config) -> Result<()> {
    let path = args.ledger.unwrap_or_else(|| config.paths.ledger.clone());
    let ledger = Ledger::load(&path)?;
    if ledger.is_empty() {
        eprintln!("No archives recorded in {}", path.display());
        return Ok(());
    }

    let mut table = styled_table(&["Archive", "Entries", "Empty", "Batches"]);
    for row in ledger_rows(&ledger) {
        table.add_row(row);
    }
    eprintln!("\n{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdcorpus_riksdag::ArchiveLedger;

    #[test]
    fn rows_count_entries_and_batches() {
        let mut section = ArchiveLedger::default();
        section.record("a.xml", Some("bet-2018-2021-1.xml".into()));
        section.record("b.xml", Some("bet-2018-2021-1.xml".into()));
        section.record("c.xml", None);
        section.record("d.xml", Some("bet-2018-2021-2.xml".into()));
        let mut ledger = Ledger::default();
        ledger.set_archive("bet-2018-2021.xml.zip", section);

        assert_eq!(
            ledger_rows(&ledger),
            vec![["bet-2018-2021.xml.zip".to_string(), "4".into(), "1".into(), "2".into()]]
        );
    }

    #[test]
    fn missing_ledger_is_reported_empty() {
        let dir = tempfile::tempdir().unwrap();
        let args = StatusArgs {
            ledger: Some(dir.path().join("processed.json")),
        };
        assert!(run(args, &Config::default()).is_ok());
    }
}
