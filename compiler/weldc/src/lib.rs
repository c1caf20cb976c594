//! The weld driver.
//!
//! Parses options, runs the pipeline for each input in its own
//! [`Session`], and hands back reports for the binary to print and write:
//!
//! ```text
//! .decls.json ─▶ Frontend ─▶ import ─▶ select ─▶ layouts ─▶ names ─▶ generate ─▶ .rs
//! ```

mod directive;
mod error;
mod options;
mod session;

pub use directive::{read_directives, DirectiveError};
pub use error::RunError;
pub use options::{parse_args, parse_flags, BindgenOptions, Cli, Command, UsageError, USAGE};
pub use session::{RunReport, Session};

use rayon::prelude::*;
use weld_import::Frontend;

/// Run every input of `cli`, in parallel, reporting in input order.
pub fn run_all(cli: &Cli, frontend: &(dyn Frontend + Sync)) -> Vec<RunReport> {
    cli.inputs
        .par_iter()
        .map(|path| Session::run_file(path, &cli.options, frontend))
        .collect()
}
