//! One run: one input, start to finish.
//!
//! A [`Session`] owns everything a run mutates (the interner and the
//! diagnostic queue); stages get shared references to the snapshots of the
//! stages before them. Sessions share nothing, so the driver runs one per
//! input in parallel.

use std::path::{Path, PathBuf};

use weld_codegen::{generate, CodegenInput};
use weld_diagnostic::{Diagnostic, DiagnosticQueue};
use weld_filter::select;
use weld_import::{import_units, Frontend, SourceInput};
use weld_ir::StringInterner;
use weld_layout::resolve_layouts;
use weld_names::resolve_names;

use crate::directive::read_directives;
use crate::options::BindgenOptions;
use crate::RunError;

/// The outcome of one run.
#[derive(Debug)]
pub struct RunReport {
    pub input: PathBuf,
    /// The generated bindings, or why there are none.
    pub result: Result<String, RunError>,
    /// Item-scoped warnings, sorted by origin.
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Every diagnostic of the run, the fatal error last.
    pub fn all_diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.diagnostics.clone();
        if let Err(err) = &self.result {
            all.push(err.to_diagnostic(&self.input.display().to_string()));
        }
        all
    }
}

pub struct Session {
    input: SourceInput,
    options: BindgenOptions,
    interner: StringInterner,
    diagnostics: DiagnosticQueue,
}

impl Session {
    /// `options` are the command-line options; the input's directives are
    /// applied on top of them when the session runs.
    pub fn new(input: SourceInput, options: BindgenOptions) -> Self {
        Session {
            input,
            options,
            interner: StringInterner::new(),
            diagnostics: DiagnosticQueue::new(),
        }
    }

    /// Read `path` and run it. A read failure is reported like any other
    /// front-end failure.
    pub fn run_file(path: &Path, options: &BindgenOptions, frontend: &dyn Frontend) -> RunReport {
        match SourceInput::read(path) {
            Ok(input) => Session::new(input, options.clone()).run(frontend),
            Err(err) => RunReport {
                input: path.to_path_buf(),
                result: Err(err.into()),
                diagnostics: Vec::new(),
            },
        }
    }

    pub fn run(mut self, frontend: &dyn Frontend) -> RunReport {
        let result = self.generate(frontend);
        RunReport {
            input: self.input.path,
            result,
            diagnostics: self.diagnostics.flush(),
        }
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(input = %self.input.path.display(), frontend = frontend.name())
    )]
    fn generate(&mut self, frontend: &dyn Frontend) -> Result<String, RunError> {
        if let Some(directives) = read_directives(&self.input.text)? {
            self.options.merge(&directives);
        }
        let options = &self.options;
        let filter = options.filter.compile()?;
        let target = options.target()?;
        let policy = options.policy()?;

        let units = frontend.parse(&self.input, &options.frontend)?;
        let graph = import_units(
            &units,
            &mut self.interner,
            &mut self.diagnostics,
            policy.as_ref(),
        );
        let set = select(&graph, &self.interner, &filter, &mut self.diagnostics);
        let layouts = resolve_layouts(
            &graph,
            &self.interner,
            &target,
            set.ids(),
            &mut self.diagnostics,
        );
        let names = resolve_names(&graph, &self.interner, &set, &layouts, &options.naming())?;

        let input = CodegenInput {
            graph: &graph,
            interner: &self.interner,
            target: &target,
            set: &set,
            layouts: &layouts,
            names: &names,
        };
        let bindings = generate(&input, &options.codegen(), &mut self.diagnostics)?;
        tracing::debug!(
            items = graph.len(),
            emitted = set.len(),
            warnings = self.diagnostics.warning_count(),
            "run complete"
        );
        Ok(bindings)
    }
}
