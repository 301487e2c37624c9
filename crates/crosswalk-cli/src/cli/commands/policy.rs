//! CLI command: crosswalk policy-export (alias: ampel-export)
//!
//! Usage:
//!   crosswalk policy-export catalog.yaml [-o ./ampel-policies]

use anyhow::{Context, Result};
use crosswalk_core::io::{read_document, write_policy_files};
use crosswalk_core::policy::catalog_to_policy_files;

use crate::cli::args::PolicyExportArgs;
use crate::exit_codes;

pub fn run(args: PolicyExportArgs) -> Result<i32> {
    let catalog = read_document(&args.catalog)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    let files = catalog_to_policy_files(&catalog)
        .with_context(|| format!("failed to convert catalog {}", args.catalog.display()))?;
    let written = write_policy_files(&args.output, &files)?;

    eprintln!(
        "Converted {} controls to Ampel policies in {}",
        written.len(),
        args.output.display()
    );
    Ok(exit_codes::SUCCESS)
}
