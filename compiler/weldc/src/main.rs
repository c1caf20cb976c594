//! weld command-line interface.
//!
//! Exit status: 0 on success, 1 when any run failed, 2 on invalid usage.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use weld_import::JsonFrontend;
use weldc::{parse_args, run_all, Cli, Command, RunError, RunReport, UsageError, USAGE};

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args) {
        Ok(Command::Help) => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        Ok(Command::Version) => {
            println!("weld {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Ok(Command::Generate(cli)) => generate(&cli),
        Err(err) => usage_error(&err),
    }
}

/// Install a subscriber only when `WELD_LOG` or `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let filter = match (std::env::var("WELD_LOG"), std::env::var("RUST_LOG")) {
        (Ok(directives), _) | (Err(_), Ok(directives)) => EnvFilter::new(directives),
        (Err(_), Err(_)) => return,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_tree::HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_targets(true),
        )
        .init();
}

fn usage_error(err: &UsageError) -> ExitCode {
    eprintln!("error: {err}");
    eprintln!();
    eprintln!("Run `weld help` for usage.");
    ExitCode::from(2)
}

fn generate(cli: &Cli) -> ExitCode {
    if let Err(err) = cli.options.validate() {
        return usage_error(&err);
    }
    let destinations = match destinations(cli) {
        Ok(destinations) => destinations,
        Err(err) => return usage_error(&err),
    };

    let reports = run_all(cli, &JsonFrontend);

    let mut failed = false;
    for (report, destination) in reports.into_iter().zip(destinations) {
        failed |= !finish(report, destination.as_deref());
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Where each input's bindings go; `None` is standard output.
fn destinations(cli: &Cli) -> Result<Vec<Option<PathBuf>>, UsageError> {
    let Some(output) = &cli.output else {
        return Ok(vec![None; cli.inputs.len()]);
    };
    if cli.inputs.len() == 1 && !output.is_dir() {
        return Ok(vec![Some(output.clone())]);
    }
    if output.exists() && !output.is_dir() {
        return Err(UsageError::OutputNotDirectory);
    }
    Ok(cli
        .inputs
        .iter()
        .map(|input| Some(output.join(output_name(input))))
        .collect())
}

/// `dir/api.decls.json` → `api.rs`.
fn output_name(input: &Path) -> PathBuf {
    let file = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file
        .strip_suffix(".decls.json")
        .or_else(|| file.strip_suffix(".json"))
        .unwrap_or(&file);
    PathBuf::from(format!("{stem}.rs"))
}

/// Print the report's diagnostics and write its output. Returns whether
/// the run succeeded.
fn finish(report: RunReport, destination: Option<&Path>) -> bool {
    let input = report.input.display().to_string();
    for diagnostic in &report.diagnostics {
        eprintln!("{diagnostic}");
    }

    let written = match report.result {
        Ok(bindings) => write_bindings(&bindings, destination),
        Err(err) => Err(err),
    };
    match written {
        Ok(()) => true,
        Err(err) => {
            eprintln!("{}", err.to_diagnostic(&input));
            eprintln!("error: no bindings written for `{input}`");
            false
        }
    }
}

fn write_bindings(bindings: &str, destination: Option<&Path>) -> Result<(), RunError> {
    let Some(path) = destination else {
        print!("{bindings}");
        return Ok(());
    };
    let io = |source| RunError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    std::fs::write(path, bindings).map_err(io)
}
