#![forbid(unsafe_code)]

use std::collections::HashMap;

use ail_ast::{Decl, Program, Span};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::checker::{Analysis, Checker, VerifiedUnit};
use crate::config::CheckConfig;
use crate::depgraph::UnitGraph;
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::index::ModuleIndex;

/// One parsed source unit.
#[derive(Clone, Debug)]
pub struct Unit {
    pub name: String,
    pub program: Program,
}

impl Unit {
    pub fn new(name: impl Into<String>, program: Program) -> Self {
        Self {
            name: name.into(),
            program,
        }
    }

    /// Name and span of the first `module` declaration.
    fn module(&self) -> Option<(String, Span)> {
        self.program.decls.iter().find_map(|d| match d {
            Decl::Module(m) => Some((m.name(), m.span)),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub struct UnitReport {
    pub name: String,
    pub module: Option<String>,
    pub result: Result<VerifiedUnit, Diagnostics>,
}

impl UnitReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Errors on failure, warnings on success.
    pub fn diagnostics(&self) -> &Diagnostics {
        match &self.result {
            Ok(unit) => &unit.warnings,
            Err(diags) => diags,
        }
    }
}

/// Per-unit results in input order.
#[derive(Debug, Default)]
pub struct WorkspaceReport {
    pub units: Vec<UnitReport>,
}

impl WorkspaceReport {
    pub fn is_ok(&self) -> bool {
        self.units.iter().all(UnitReport::is_ok)
    }

    pub fn get(&self, name: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn error_count(&self) -> usize {
        self.units
            .iter()
            .map(|u| u.diagnostics().error_count())
            .sum()
    }
}

/// Checks many units in `use` dependency order.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    checker: Checker,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CheckConfig) -> Self {
        Self {
            checker: Checker::with_config(config),
        }
    }

    /// Units of one dependency level are checked in parallel against an
    /// index holding the exports of every earlier level. Units on an import
    /// cycle, and units depending on one, are checked last, one at a time.
    #[instrument(skip_all, fields(units = units.len()))]
    pub fn check(&self, units: &[Unit]) -> WorkspaceReport {
        let declared: Vec<Option<(String, Span)>> = units.iter().map(Unit::module).collect();
        let modules: Vec<Option<String>> = declared
            .iter()
            .map(|d| d.as_ref().map(|(m, _)| m.clone()))
            .collect();

        let mut extra: Vec<Diagnostics> = vec![Diagnostics::new(); units.len()];
        let mut exporting = vec![true; units.len()];
        let mut first_owner: HashMap<&str, usize> = HashMap::new();
        for (i, d) in declared.iter().enumerate() {
            let Some((module, span)) = d else { continue };
            if let Some(&first) = first_owner.get(module.as_str()) {
                extra[i].push(Diagnostic::new(
                    ErrorKind::DuplicateModule,
                    format!(
                        "module `{module}` is already declared by unit `{}`",
                        units[first].name
                    ),
                    *span,
                ));
                exporting[i] = false;
            } else {
                first_owner.insert(module, i);
            }
        }

        let programs: Vec<&Program> = units.iter().map(|u| &u.program).collect();
        let graph = UnitGraph::build(&programs, &modules);
        let schedule = graph.schedule();
        debug!(
            levels = schedule.levels.len(),
            blocked = schedule.blocked.len(),
            cycles = schedule.cycles.len(),
            "scheduled units"
        );

        for group in &schedule.cycles {
            let names: Vec<&str> = group
                .iter()
                .filter_map(|&u| modules[u].as_deref())
                .collect();
            for &u in group {
                for span in graph.import_spans(u, group) {
                    extra[u].push(Diagnostic::new(
                        ErrorKind::CyclicImport,
                        format!("import cycle between modules {}", names.join(", ")),
                        span,
                    ));
                }
            }
        }

        let mut index = ModuleIndex::new();
        let mut analyses: Vec<Option<Analysis>> = (0..units.len()).map(|_| None).collect();
        for level in &schedule.levels {
            let analyze = |&i: &usize| (i, self.checker.analyze(&units[i].program, &index));
            let done: Vec<(usize, Analysis)> = if self.checker.config().parallel {
                level.par_iter().map(analyze).collect()
            } else {
                level.iter().map(analyze).collect()
            };
            for (i, analysis) in done {
                publish(&mut index, &analysis, exporting[i]);
                analyses[i] = Some(analysis);
            }
        }
        for &i in &schedule.blocked {
            let analysis = self.checker.analyze(&units[i].program, &index);
            publish(&mut index, &analysis, exporting[i]);
            analyses[i] = Some(analysis);
        }

        let reports: Vec<UnitReport> = units
            .iter()
            .zip(analyses)
            .zip(extra)
            .zip(modules)
            .map(|(((unit, analysis), extra), module)| {
                let result = match analysis {
                    Some(a) => merge(a.result, extra),
                    None => Err(extra),
                };
                UnitReport {
                    name: unit.name.clone(),
                    module,
                    result,
                }
            })
            .collect();

        let report = WorkspaceReport { units: reports };
        info!(
            units = report.units.len(),
            errors = report.error_count(),
            "checked workspace"
        );
        report
    }
}

fn publish(index: &mut ModuleIndex, analysis: &Analysis, exporting: bool) {
    if let (true, Some(exports)) = (exporting, &analysis.exports) {
        index.insert(exports.clone());
    }
}

/// Adds workspace-level findings to a unit result. Imports already reported
/// as cyclic are not also reported as unresolved.
fn merge(
    result: Result<VerifiedUnit, Diagnostics>,
    extra: Diagnostics,
) -> Result<VerifiedUnit, Diagnostics> {
    if extra.is_empty() {
        return result;
    }
    let cyclic: Vec<Span> = extra
        .iter()
        .filter(|d| d.kind == ErrorKind::CyclicImport)
        .map(|d| d.span)
        .collect();
    let mut diags = match result {
        Ok(unit) => unit.warnings,
        Err(diags) => diags,
    };
    diags.retain(|d| !(d.kind == ErrorKind::UnresolvedImport && cyclic.contains(&d.span)));
    diags.extend(extra);
    diags.sort();
    Err(diags)
}
