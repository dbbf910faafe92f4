//! Reference list generation.

use anyhow::Result;
use wsrun_core::{generate_references, LocateOptions};

use crate::formatting::{print_invalid_descriptors, print_success};

pub fn cmd_generate(locate: LocateOptions, file: Option<String>) -> Result<()> {
    let report = generate_references(&locate, file.as_deref())?;
    print_invalid_descriptors(&report.invalid);
    print_success(&format!(
        "Wrote {} references to {}",
        report.references,
        report.path.display()
    ));
    Ok(())
}
