#![forbid(unsafe_code)]

use std::collections::HashSet;

use ail_ast::{Block, Decl, Ident, Param, Program, span};
use ail_parse::FormatCheck;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::config::CheckConfig;
use crate::env::{Item, UnitEnv};
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::exhaustive::check_matches;
use crate::faults::{Fault, FaultScanner};
use crate::flow::PathGraph;
use crate::index::{ModuleExports, ModuleIndex};
use crate::ownership::{MoveChecker, MoveSite};
use crate::resolve::{BodyResolver, Resolutions};
use crate::returns::check_returns;
use crate::typeck::{TypeChecker, TypeTable};
use crate::types::Type;

/// A unit that passed every check, with its annotations.
#[derive(Debug)]
pub struct VerifiedUnit {
    pub program: Program,
    /// Declared module, if any.
    pub module: Option<String>,
    pub types: TypeTable,
    pub resolutions: Resolutions,
    /// Every point where a Move binding is consumed.
    pub moves: Vec<MoveSite>,
    /// Runtime faults some path reaches.
    pub faults: Vec<Fault>,
    /// Warnings and informational findings.
    pub warnings: Diagnostics,
}

impl VerifiedUnit {
    pub fn canonical_text(&self) -> String {
        ail_parse::format_program(&self.program)
    }
}

/// Outcome of one unit plus the exports dependents are checked against,
/// present even when the unit failed.
pub(crate) struct Analysis {
    pub exports: Option<ModuleExports>,
    pub result: Result<VerifiedUnit, Diagnostics>,
}

/// A function or test body together with its signature.
struct Body<'p> {
    name: &'p Ident,
    params: &'p [Param],
    param_types: Vec<Type>,
    ret: Type,
    block: &'p Block,
}

#[derive(Default)]
struct PostReport {
    diags: Diagnostics,
    moves: Vec<MoveSite>,
    faults: Vec<Fault>,
}

#[derive(Clone, Debug, Default)]
pub struct Checker {
    config: CheckConfig,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CheckConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Verifies one unit against the modules already in `index`.
    #[instrument(skip_all, fields(decls = program.decls.len()))]
    pub fn check_unit(
        &self,
        program: &Program,
        index: &ModuleIndex,
    ) -> Result<VerifiedUnit, Diagnostics> {
        self.analyze(program, index).result
    }

    /// Parses, verifies and format-checks source text. A non-canonical
    /// layout is reported as an informational `NotCanonical` finding.
    pub fn check_source(
        &self,
        src: &str,
        index: &ModuleIndex,
    ) -> miette::Result<Result<VerifiedUnit, Diagnostics>> {
        let program = ail_parse::parse_source(src)?;
        let format = ail_parse::check_program_format(src, &program);
        let mut result = self.check_unit(&program, index);
        if let FormatCheck::NotCanonical { diff, .. } = format {
            let changed = diff
                .iter()
                .filter(|l| !matches!(l, ail_parse::DiffLine::Same(_)))
                .count();
            let note = Diagnostic::new(
                ErrorKind::NotCanonical,
                format!("source is not in canonical form ({changed} line(s) differ)"),
                span(0, 0),
            );
            let diags = match &mut result {
                Ok(unit) => &mut unit.warnings,
                Err(diags) => diags,
            };
            diags.push(note);
            diags.sort();
        }
        Ok(result)
    }

    pub(crate) fn analyze(&self, program: &Program, index: &ModuleIndex) -> Analysis {
        let mut diags = Diagnostics::new();
        let env = UnitEnv::collect(program, index, &mut diags);
        let exports = env.exports();
        debug!(module = %env.module, diagnostics = diags.len(), "collected unit items");

        let bodies = collect_bodies(program, &env);

        let mut resolutions = Resolutions::default();
        let mut resolved = Vec::with_capacity(bodies.len());
        for body in &bodies {
            let found = BodyResolver::new(&env, &mut resolutions, &body.name.node)
                .resolve(body.params, body.block);
            resolved.push(found.is_empty());
            diags.extend(found);
        }
        let bodies: Vec<Body<'_>> = bodies
            .into_iter()
            .zip(resolved)
            .filter_map(|(b, ok)| ok.then_some(b))
            .collect();
        debug!(bindings = resolutions.len(), diagnostics = diags.len(), "resolved names");

        let mut types = TypeTable::default();
        for body in &bodies {
            let mut tc =
                TypeChecker::new(&env, &resolutions, &mut types, &body.name.node, body.ret.clone());
            for (p, ty) in body.params.iter().zip(&body.param_types) {
                tc.bind_param(&p.name, ty.clone());
            }
            diags.extend(tc.check_block(body.block));
        }
        debug!(exprs = types.expr_count(), diagnostics = diags.len(), "checked types");

        let post = |body: &Body<'_>| self.post_passes(&env, &resolutions, &types, body);
        let reports: Vec<PostReport> = if self.config.parallel {
            bodies.par_iter().map(post).collect()
        } else {
            bodies.iter().map(post).collect()
        };

        let mut moves = Vec::new();
        let mut faults = Vec::new();
        for r in reports {
            diags.extend(r.diags);
            moves.extend(r.moves);
            faults.extend(r.faults);
        }
        diags.sort();
        debug!(
            moves = moves.len(),
            faults = faults.len(),
            errors = diags.error_count(),
            warnings = diags.warning_count(),
            "finished unit"
        );

        if diags.has_errors() {
            return Analysis {
                exports,
                result: Err(diags),
            };
        }
        let unit = VerifiedUnit {
            program: program.clone(),
            module: env.declared_module.clone(),
            types,
            resolutions,
            moves,
            faults,
            warnings: diags,
        };
        Analysis {
            exports,
            result: Ok(unit),
        }
    }

    /// Ownership, match/return coverage and fault annotation only read the
    /// typed body, so they run side by side.
    fn post_passes(
        &self,
        env: &UnitEnv<'_>,
        res: &Resolutions,
        types: &TypeTable,
        body: &Body<'_>,
    ) -> PostReport {
        let graph = PathGraph::build(body.block);
        let name = body.name.node.as_str();
        let config = &self.config;

        let ownership = || MoveChecker::new(&graph, res, types, name).run();
        let coverage = || {
            let mut diags =
                check_matches(env, res, types, body.block, name, config.report_unreachable);
            diags.extend(check_returns(&graph, body.name, config.report_unreachable));
            diags
        };
        let faults = || FaultScanner::new(&graph, types, config.fault_policy, name).run();

        let (owned, (covered, faulted)) = if config.parallel {
            rayon::join(ownership, || rayon::join(coverage, faults))
        } else {
            (ownership(), (coverage(), faults()))
        };

        let mut report = PostReport::default();
        report.diags.extend(owned.diags);
        report.diags.extend(covered);
        report.diags.extend(faulted.diags);
        report.moves = owned.moves;
        report.faults = faulted.faults;
        report
    }
}

/// Bodies of every function and test that owns its name.
fn collect_bodies<'p>(program: &'p Program, env: &UnitEnv<'_>) -> Vec<Body<'p>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut bodies = Vec::new();
    for decl in &program.decls {
        match decl {
            Decl::Type(t) => {
                seen.insert(&t.name.node);
            }
            Decl::Fn(f) => {
                if !seen.insert(&f.name.node) {
                    continue;
                }
                let Some(sig) = env.function(&f.name.node) else {
                    continue;
                };
                bodies.push(Body {
                    name: &f.name,
                    params: &f.params,
                    param_types: sig.params.iter().map(|(_, t)| t.clone()).collect(),
                    ret: sig.ret.clone(),
                    block: &f.body,
                });
            }
            Decl::Test(t) => {
                if !seen.insert(&t.name.node) || !matches!(env.lookup(&t.name.node), Some(Item::Test)) {
                    continue;
                }
                bodies.push(Body {
                    name: &t.name,
                    params: &[],
                    param_types: Vec::new(),
                    ret: Type::UNIT,
                    block: &t.body,
                });
            }
            Decl::Module(_) | Decl::Use(_) => {}
        }
    }
    bodies
}
