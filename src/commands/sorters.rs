//! List registered sorters and their availability on this machine.

use anyhow::Result;
use clap::Parser;

use spikesort_lib::sorter::all_sorters;

use crate::commands::command::Command;

/// List registered sorters with availability and version.
#[derive(Debug, Parser)]
#[command(
    name = "sorters",
    about = "\x1b[38;5;166m[UTILITIES]\x1b[0m      \x1b[36mList registered sorters and their availability\x1b[0m",
    long_about = r#"
List registered sorters with their availability and version.

Availability is probed fresh at invocation time, so installing or removing
an external sorter is reflected on the next call. External tools are
installed out-of-band; each missing sorter prints its installation help
with --help-missing.

Example usage:
  spikesort sorters
  spikesort sorters --installed
"#
)]
pub struct Sorters {
    /// Show only sorters that are installed
    #[arg(long = "installed", default_value = "false")]
    pub installed_only: bool,

    /// Print installation help for sorters that are missing
    #[arg(long = "help-missing", default_value = "false")]
    pub help_missing: bool,
}

impl Command for Sorters {
    fn execute(&self) -> Result<()> {
        for sorter in all_sorters() {
            let installed = sorter.is_installed();
            if self.installed_only && !installed {
                continue;
            }
            let version = if installed {
                sorter.version().unwrap_or_else(|e| format!("version query failed: {e}"))
            } else {
                "not installed".to_string()
            };
            let gpu = if sorter.requires_gpu() { " [GPU]" } else { "" };
            println!("{:<16} {}{}", sorter.name(), version, gpu);
            println!("  {}", sorter.description());
            if !installed && self.help_missing {
                println!("{}", sorter.installation_help());
            }
        }
        Ok(())
    }
}
