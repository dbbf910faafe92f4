//! CLI formatting utilities.
//!
//! Child output is streamed on stdout/stderr untouched apart from its label,
//! so everything produced here that is not a command result goes to stderr.

mod headers;
mod output;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{print_invalid_descriptors, print_run_failures};
pub use status::{print_error, print_success};
pub use tables::print_workspace_table;
