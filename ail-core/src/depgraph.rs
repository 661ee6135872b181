//! `use` dependencies between the units of a workspace.

#![forbid(unsafe_code)]

use std::collections::HashMap;

use ail_ast::{Decl, Program, Span};

/// An import of unit `target`'s module, written at `span`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Dep {
    target: usize,
    span: Span,
}

/// Directed graph from each unit to the units whose modules it imports.
#[derive(Clone, Debug, Default)]
pub struct UnitGraph {
    deps: Vec<Vec<Dep>>,
}

/// Order in which units can be checked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    /// Units whose dependencies all appear in earlier levels.
    pub levels: Vec<Vec<usize>>,
    /// Units on an import cycle or downstream of one, in input order.
    pub blocked: Vec<usize>,
    /// Strongly connected groups of two or more units.
    pub cycles: Vec<Vec<usize>>,
}

impl UnitGraph {
    /// `modules[i]` is the module unit `i` declares. When two units declare
    /// one name, imports of it point at the first.
    pub fn build(programs: &[&Program], modules: &[Option<String>]) -> Self {
        let mut owner: HashMap<&str, usize> = HashMap::new();
        for (i, m) in modules.iter().enumerate() {
            if let Some(m) = m {
                owner.entry(m.as_str()).or_insert(i);
            }
        }

        let deps = programs
            .iter()
            .enumerate()
            .map(|(i, program)| {
                program
                    .decls
                    .iter()
                    .filter_map(|d| match d {
                        Decl::Use(u) => Some(u),
                        _ => None,
                    })
                    .filter_map(|u| {
                        let target = *owner.get(u.module_path().as_str())?;
                        // Self imports are reported by the unit itself.
                        (target != i).then_some(Dep {
                            target,
                            span: u.span,
                        })
                    })
                    .collect()
            })
            .collect();
        Self { deps }
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// Spans of the imports of `unit` that point into `group`.
    pub fn import_spans(&self, unit: usize, group: &[usize]) -> Vec<Span> {
        self.deps[unit]
            .iter()
            .filter(|d| group.contains(&d.target))
            .map(|d| d.span)
            .collect()
    }

    /// Levels by repeatedly taking every unit with no unscheduled
    /// dependency; whatever is left is blocked by a cycle.
    pub fn schedule(&self) -> Schedule {
        let n = self.deps.len();
        let mut remaining: Vec<usize> = (0..n)
            .map(|i| {
                let mut targets: Vec<usize> = self.deps[i].iter().map(|d| d.target).collect();
                targets.sort_unstable();
                targets.dedup();
                targets.len()
            })
            .collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, deps) in self.deps.iter().enumerate() {
            let mut targets: Vec<usize> = deps.iter().map(|d| d.target).collect();
            targets.sort_unstable();
            targets.dedup();
            for t in targets {
                dependents[t].push(i);
            }
        }

        let mut done = vec![false; n];
        let mut levels = Vec::new();
        let mut ready: Vec<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
        while !ready.is_empty() {
            let mut next = Vec::new();
            for &u in &ready {
                done[u] = true;
                for &d in &dependents[u] {
                    remaining[d] -= 1;
                    if remaining[d] == 0 {
                        next.push(d);
                    }
                }
            }
            next.sort_unstable();
            levels.push(ready);
            ready = next;
        }

        let blocked: Vec<usize> = (0..n).filter(|&i| !done[i]).collect();
        let cycles = self
            .components(&blocked)
            .into_iter()
            .filter(|c| c.len() > 1)
            .collect();
        Schedule {
            levels,
            blocked,
            cycles,
        }
    }

    /// Strongly connected components of the subgraph on `nodes`.
    fn components(&self, nodes: &[usize]) -> Vec<Vec<usize>> {
        struct Tarjan<'g> {
            graph: &'g UnitGraph,
            within: Vec<bool>,
            index: Vec<Option<usize>>,
            low: Vec<usize>,
            on_stack: Vec<bool>,
            stack: Vec<usize>,
            next: usize,
            out: Vec<Vec<usize>>,
        }

        impl Tarjan<'_> {
            fn visit(&mut self, v: usize) {
                self.index[v] = Some(self.next);
                self.low[v] = self.next;
                self.next += 1;
                self.stack.push(v);
                self.on_stack[v] = true;

                for i in 0..self.graph.deps[v].len() {
                    let w = self.graph.deps[v][i].target;
                    if !self.within[w] {
                        continue;
                    }
                    match self.index[w] {
                        None => {
                            self.visit(w);
                            self.low[v] = self.low[v].min(self.low[w]);
                        }
                        Some(iw) if self.on_stack[w] => self.low[v] = self.low[v].min(iw),
                        Some(_) => {}
                    }
                }

                if Some(self.low[v]) == self.index[v] {
                    let mut component = Vec::new();
                    while let Some(w) = self.stack.pop() {
                        self.on_stack[w] = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort_unstable();
                    self.out.push(component);
                }
            }
        }

        let n = self.deps.len();
        let mut within = vec![false; n];
        for &v in nodes {
            within[v] = true;
        }
        let mut t = Tarjan {
            graph: self,
            within,
            index: vec![None; n],
            low: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            next: 0,
            out: Vec::new(),
        };
        for &v in nodes {
            if t.index[v].is_none() {
                t.visit(v);
            }
        }
        t.out.sort();
        t.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(module: &str, uses: &[&str]) -> (Program, Option<String>) {
        let mut src = format!("module {module}\n");
        for u in uses {
            src.push_str(&format!("use {u}\n"));
        }
        let program = ail_parse::parse_source(&src).expect("parse");
        (program, Some(module.to_string()))
    }

    fn graph(units: &[(Program, Option<String>)]) -> UnitGraph {
        let programs: Vec<&Program> = units.iter().map(|(p, _)| p).collect();
        let modules: Vec<Option<String>> = units.iter().map(|(_, m)| m.clone()).collect();
        UnitGraph::build(&programs, &modules)
    }

    #[test]
    fn chain_is_levelled_in_dependency_order() {
        // app -> db -> config
        let units = [
            unit("app", &["db::open"]),
            unit("db", &["config::Settings"]),
            unit("config", &[]),
        ];
        let schedule = graph(&units).schedule();
        assert_eq!(schedule.levels, vec![vec![2], vec![1], vec![0]]);
        assert!(schedule.blocked.is_empty());
        assert!(schedule.cycles.is_empty());
    }

    #[test]
    fn independent_units_share_a_level() {
        let units = [
            unit("a", &["c::X"]),
            unit("b", &["c::Y"]),
            unit("c", &[]),
        ];
        let schedule = graph(&units).schedule();
        assert_eq!(schedule.levels, vec![vec![2], vec![0, 1]]);
    }

    #[test]
    fn cycle_and_its_dependents_are_blocked() {
        // a <-> b, c -> a
        let units = [
            unit("a", &["b::F"]),
            unit("b", &["a::G"]),
            unit("c", &["a::G"]),
        ];
        let g = graph(&units);
        let schedule = g.schedule();
        assert!(schedule.levels.is_empty());
        assert_eq!(schedule.blocked, vec![0, 1, 2]);
        assert_eq!(schedule.cycles, vec![vec![0, 1]]);
        assert_eq!(g.import_spans(0, &[0, 1]).len(), 1);
        assert!(g.import_spans(2, &[0, 1]).len() == 1);
    }

    #[test]
    fn self_import_is_not_an_edge() {
        let units = [unit("a", &["a::F"])];
        let schedule = graph(&units).schedule();
        assert_eq!(schedule.levels, vec![vec![0]]);
    }

    #[test]
    fn unknown_modules_are_ignored() {
        let units = [unit("a", &["std::io"])];
        let g = graph(&units);
        assert_eq!(g.schedule().levels, vec![vec![0]]);
    }
}
