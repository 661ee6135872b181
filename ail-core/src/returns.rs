#![forbid(unsafe_code)]

use ail_ast::Ident;

use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::flow::{NodeKind, PathGraph};

/// Every path through a body must end in `^` or `panic!`.
///
/// With `report_unreachable`, the first statement of each run that no path
/// reaches gets an `UnreachableStatement` warning.
pub fn check_returns(graph: &PathGraph<'_>, name: &Ident, report_unreachable: bool) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let reachable = graph.reachable();

    if reachable[graph.end()] {
        diags.push(
            Diagnostic::new(
                ErrorKind::IncompleteReturnCoverage,
                format!("a path through `{}` ends without `^` or `panic!`", name.node),
                name.span,
            )
            .in_decl(Some(&name.node)),
        );
    }

    if report_unreachable {
        let mut prev_reachable = true;
        for (i, node) in graph.nodes() {
            let NodeKind::Stmt(stmt) = node.kind else {
                continue;
            };
            if !reachable[i] && prev_reachable {
                diags.push(
                    Diagnostic::new(
                        ErrorKind::UnreachableStatement,
                        "no path reaches this statement",
                        stmt.span(),
                    )
                    .in_decl(Some(&name.node)),
                );
            }
            prev_reachable = reachable[i];
        }
    }
    diags
}
