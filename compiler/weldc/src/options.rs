//! Run configuration and its command-line syntax.
//!
//! The same flag parser reads the command line and inline `weld-flags`
//! directives. Directive options are layered on top of the command line
//! with [`BindgenOptions::merge`].

use std::path::PathBuf;

use weld_codegen::CodegenOptions;
use weld_filter::{DeniedDependencyPolicy, FilterOptions};
use weld_import::{FrontendFlags, InstantiationPolicy, InstantiationSelection};
use weld_layout::{TargetAbi, TargetError, DEFAULT_TARGET};
use weld_names::{EnumStyle, NamingOptions};

/// Everything that configures one run.
///
/// Settings that have a default are `Option`s here so that a directive
/// can tell "not given" from "given as the default".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindgenOptions {
    /// Flags after `--`, plus `--target`.
    pub frontend: FrontendFlags,
    pub filter: FilterOptions,
    pub flatten_namespaces: Option<bool>,
    pub enum_style: Option<EnumStyle>,
    pub instantiate: InstantiationSelection,
    pub layout_tests: Option<bool>,
    pub derive_debug: Option<bool>,
}

impl BindgenOptions {
    /// Layer `other` on top of `self`.
    ///
    /// Pattern lists and front-end include paths and defines are appended;
    /// settings are replaced when `other` gives them. Instantiation patterns
    /// accumulate, while `--instantiate all|none` replaces the selection.
    pub fn merge(&mut self, other: &BindgenOptions) {
        self.frontend.merge(&other.frontend);
        self.filter.merge(&other.filter);

        if other.flatten_namespaces.is_some() {
            self.flatten_namespaces = other.flatten_namespaces;
        }
        if other.enum_style.is_some() {
            self.enum_style = other.enum_style;
        }
        if other.layout_tests.is_some() {
            self.layout_tests = other.layout_tests;
        }
        if other.derive_debug.is_some() {
            self.derive_debug = other.derive_debug;
        }

        match (&mut self.instantiate, &other.instantiate) {
            (_, InstantiationSelection::Opaque) => {}
            (InstantiationSelection::Matching(mine), InstantiationSelection::Matching(theirs)) => {
                mine.extend(theirs.iter().cloned());
            }
            (mine, theirs) => mine.clone_from(theirs),
        }
    }

    pub fn naming(&self) -> NamingOptions {
        let defaults = NamingOptions::default();
        NamingOptions {
            flatten_namespaces: self
                .flatten_namespaces
                .unwrap_or(defaults.flatten_namespaces),
            enum_style: self.enum_style.unwrap_or(defaults.enum_style),
        }
    }

    pub fn codegen(&self) -> CodegenOptions {
        let defaults = CodegenOptions::default();
        CodegenOptions {
            layout_tests: self.layout_tests.unwrap_or(defaults.layout_tests),
            derive_debug: self.derive_debug.unwrap_or(defaults.derive_debug),
        }
    }

    /// The target triple, or [`DEFAULT_TARGET`].
    pub fn triple(&self) -> &str {
        self.frontend.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }

    pub fn target(&self) -> Result<TargetAbi, TargetError> {
        TargetAbi::from_triple(self.triple())
    }

    pub fn policy(&self) -> Result<Box<dyn InstantiationPolicy + Send + Sync>, regex::Error> {
        self.instantiate.policy()
    }

    /// Check everything that can be checked before reading any input:
    /// patterns, target and instantiation patterns.
    pub fn validate(&self) -> Result<(), UsageError> {
        self.filter
            .compile()
            .map_err(|err| UsageError::InvalidValue {
                flag: err.option.to_owned(),
                message: err.to_string(),
            })?;
        self.target().map_err(|err| UsageError::InvalidValue {
            flag: "--target".to_owned(),
            message: err.to_string(),
        })?;
        self.policy().map_err(|err| UsageError::InvalidValue {
            flag: "--instantiate-matching".to_owned(),
            message: err.to_string(),
        })?;
        Ok(())
    }
}

/// A command line or directive that does not parse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("unknown flag `{0}`")]
    UnknownFlag(String),
    #[error("`{0}` expects a value")]
    MissingValue(String),
    #[error("invalid value for `{flag}`: {message}")]
    InvalidValue { flag: String, message: String },
    #[error("no input files")]
    NoInputs,
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    #[error("`-o` must name a directory when there is more than one input")]
    OutputNotDirectory,
}

/// What the command line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Generate(Cli),
}

/// A `weld [OPTIONS] <INPUT>...` invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cli {
    pub inputs: Vec<PathBuf>,
    /// A file for a single input, a directory for several.
    pub output: Option<PathBuf>,
    pub options: BindgenOptions,
}

/// Parse the command line, without the program name.
pub fn parse_args(args: &[String]) -> Result<Command, UsageError> {
    match args.first().map(String::as_str) {
        None => return Ok(Command::Help),
        Some("help" | "--help" | "-h") => return Ok(Command::Help),
        Some("version" | "--version" | "-V") => return Ok(Command::Version),
        Some(_) => {}
    }

    let mut cli = Cli::default();
    let mut flags = Flags::new(args);
    while let Some(arg) = flags.shift() {
        if arg == "-o" || flag_name(arg) == "--output" {
            cli.output = Some(PathBuf::from(flags.value(arg)?));
        } else if arg == "--" {
            parse_frontend_flags(&mut flags, &mut cli.options.frontend)?;
        } else if arg.starts_with('-') {
            apply_flag(arg, &mut flags, &mut cli.options)?;
        } else {
            cli.inputs.push(PathBuf::from(arg));
        }
    }

    if cli.inputs.is_empty() {
        return Err(UsageError::NoInputs);
    }
    Ok(Command::Generate(cli))
}

/// Parse the flags of an inline directive. Inputs and `-o` are not
/// accepted there.
pub fn parse_flags(args: &[String]) -> Result<BindgenOptions, UsageError> {
    let mut options = BindgenOptions::default();
    let mut flags = Flags::new(args);
    while let Some(arg) = flags.shift() {
        if arg == "--" {
            parse_frontend_flags(&mut flags, &mut options.frontend)?;
        } else if arg == "-o" || flag_name(arg) == "--output" || !arg.starts_with('-') {
            return Err(UsageError::UnexpectedArgument(arg.to_owned()));
        } else {
            apply_flag(arg, &mut flags, &mut options)?;
        }
    }
    Ok(options)
}

/// Cursor over arguments. Value flags take `--flag value` or `--flag=value`.
struct Flags<'a> {
    args: &'a [String],
    pos: usize,
}

impl<'a> Flags<'a> {
    fn new(args: &'a [String]) -> Self {
        Flags { args, pos: 0 }
    }

    fn shift(&mut self) -> Option<&'a str> {
        let arg = self.args.get(self.pos)?;
        self.pos += 1;
        Some(arg.as_str())
    }

    fn value(&mut self, arg: &'a str) -> Result<&'a str, UsageError> {
        if let Some((_, value)) = arg.split_once('=') {
            return Ok(value);
        }
        self.shift()
            .ok_or_else(|| UsageError::MissingValue(arg.to_owned()))
    }
}

fn flag_name(arg: &str) -> &str {
    arg.split_once('=').map_or(arg, |(name, _)| name)
}

fn apply_flag<'a>(
    arg: &'a str,
    flags: &mut Flags<'a>,
    options: &mut BindgenOptions,
) -> Result<(), UsageError> {
    let name = flag_name(arg);
    match name {
        "--allow-item" => options.filter.allow_items.push(flags.value(arg)?.to_owned()),
        "--allow-type" => options.filter.allow_types.push(flags.value(arg)?.to_owned()),
        "--allow-function" => options
            .filter
            .allow_functions
            .push(flags.value(arg)?.to_owned()),
        "--deny" => options.filter.deny.push(flags.value(arg)?.to_owned()),
        "--opaque-type" => options.filter.opaque.push(flags.value(arg)?.to_owned()),
        "--denied-dependency" => {
            options.filter.denied_dependency =
                parse_value::<DeniedDependencyPolicy>(name, flags.value(arg)?)?;
        }
        "--include-system-headers" => options.filter.include_system_headers = true,
        "--flatten-namespaces" => options.flatten_namespaces = Some(true),
        "--keep-namespaces" => options.flatten_namespaces = Some(false),
        "--enum-style" => {
            options.enum_style = Some(parse_value::<EnumStyle>(name, flags.value(arg)?)?);
        }
        "--instantiate" => {
            options.instantiate = match flags.value(arg)? {
                "all" => InstantiationSelection::All,
                "none" => InstantiationSelection::Opaque,
                other => {
                    return Err(UsageError::InvalidValue {
                        flag: name.to_owned(),
                        message: format!("unknown selection `{other}` (expected `all` or `none`)"),
                    })
                }
            };
        }
        "--instantiate-matching" => {
            let pattern = flags.value(arg)?.to_owned();
            match &mut options.instantiate {
                InstantiationSelection::Matching(patterns) => patterns.push(pattern),
                selection => *selection = InstantiationSelection::Matching(vec![pattern]),
            }
        }
        "--target" => options.frontend.target = Some(flags.value(arg)?.to_owned()),
        "--no-layout-tests" => options.layout_tests = Some(false),
        "--layout-tests" => options.layout_tests = Some(true),
        "--no-derive-debug" => options.derive_debug = Some(false),
        "--derive-debug" => options.derive_debug = Some(true),
        _ => return Err(UsageError::UnknownFlag(arg.to_owned())),
    }
    Ok(())
}

fn parse_value<T>(flag: &str, value: &str) -> Result<T, UsageError>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse().map_err(|message| UsageError::InvalidValue {
        flag: flag.to_owned(),
        message,
    })
}

/// Front-end flags: `-I<dir>`, `-I <dir>`, `-D<name>[=<value>]`,
/// `-std=<std>`, `--target=<triple>`.
fn parse_frontend_flags(
    flags: &mut Flags<'_>,
    frontend: &mut FrontendFlags,
) -> Result<(), UsageError> {
    while let Some(arg) = flags.shift() {
        if arg == "-I" {
            let dir = flags
                .shift()
                .ok_or_else(|| UsageError::MissingValue("-I".to_owned()))?;
            frontend.include_paths.push(PathBuf::from(dir));
        } else if let Some(dir) = arg.strip_prefix("-I") {
            frontend.include_paths.push(PathBuf::from(dir));
        } else if let Some(define) = arg.strip_prefix("-D") {
            if define.is_empty() {
                return Err(UsageError::MissingValue("-D".to_owned()));
            }
            let define = match define.split_once('=') {
                Some((name, value)) => (name.to_owned(), Some(value.to_owned())),
                None => (define.to_owned(), None),
            };
            frontend.defines.push(define);
        } else if let Some(std) = arg.strip_prefix("-std=") {
            frontend.std = Some(std.to_owned());
        } else if flag_name(arg) == "--target" {
            frontend.target = Some(flags.value(arg)?.to_owned());
        } else {
            return Err(UsageError::UnknownFlag(arg.to_owned()));
        }
    }
    Ok(())
}

pub const USAGE: &str = "\
weld: generate Rust bindings from C/C++ declaration dumps

Usage: weld [OPTIONS] <INPUT>... [-- <FRONTEND FLAGS>]
       weld help
       weld version

Inputs are .decls.json declaration dumps. A dump may start with
`// weld-flags: <OPTIONS>` lines, which apply on top of the command line.

Output:
  -o, --output <PATH>            Output file; a directory for several inputs
                                 (each input is written to <stem>.rs)

Selection:
  --allow-item <REGEX>           Emit matching declarations of any kind
  --allow-type <REGEX>           Emit matching structs, unions, enums, typedefs
  --allow-function <REGEX>       Emit matching functions
  --deny <REGEX>                 Never emit matching declarations
  --opaque-type <REGEX>          Emit matching types without their contents
  --denied-dependency <POLICY>   opaque-item (default) or opaque-field
  --include-system-headers       Also emit declarations from system headers

Naming:
  --flatten-namespaces           One module for everything (default)
  --keep-namespaces              One module per C++ namespace
  --enum-style <STYLE>           rust (default) or consts

Templates:
  --instantiate <all|none>       Bind every or no template instantiation
  --instantiate-matching <REGEX> Bind instantiations named like `Box<int>`

Target and output shape:
  --target <TRIPLE>              Target ABI (default: x86_64-unknown-linux-gnu)
  --no-layout-tests              Omit compile-time layout assertions
  --no-derive-debug              Do not derive or implement Debug

Front-end flags (after --):
  -I<DIR>  -D<NAME>[=<VALUE>]  -std=<STD>  --target=<TRIPLE>

Set WELD_LOG (or RUST_LOG), e.g. WELD_LOG=debug, to trace the pipeline.";

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
