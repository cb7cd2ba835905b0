//! Corpora subcommand

use anyhow::Result;

use super::styled_table;
use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let mut table = styled_table(&["Prefix", "Corpus", "Name"]);
    for (prefix, info) in config.corpus_table().iter() {
        table.add_row(vec![prefix, info.id.as_str(), info.name.as_str()]);
    }
    eprintln!("\n{table}");
    Ok(())
}
