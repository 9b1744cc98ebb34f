//! The planner: reorders `where` clauses for selectivity (unless the caller
//! opts out with `planner: User`), and schedules `Not`/`Or`/`Filter`/`Bind`
//! clauses only once the variables they read are available.

use std::collections::HashSet;

use crate::graph::{Graph, Pattern as GPattern, Slot as GSlot};
use crate::query::ast::{Clause, Expr, PatternSlot, PlannerMode, QPattern};

fn pattern_to_graph_pattern_literal_only(qp: &QPattern) -> GPattern {
    let slot = |s: &PatternSlot| match s {
        PatternSlot::Const(v) => GSlot::Const(v.clone()),
        PatternSlot::Var(_) => GSlot::Var,
    };
    GPattern::new(slot(&qp.s), slot(&qp.p), slot(&qp.o))
}

fn pattern_var_names(qp: &QPattern) -> Vec<&str> {
    [&qp.s, &qp.p, &qp.o]
        .into_iter()
        .filter_map(|s| match s {
            PatternSlot::Var(name) => Some(name.as_str()),
            PatternSlot::Const(_) => None,
        })
        .collect()
}

fn expr_free_vars(expr: &Expr, out: &mut HashSet<String>) {
    match expr {
        Expr::Lit(_) => {}
        Expr::Var(name) => {
            out.insert(name.clone());
        }
        Expr::App(_, args) => {
            for a in args {
                expr_free_vars(a, out);
            }
        }
    }
}

fn clause_filter_bind_free_vars(clauses: &[Clause], out: &mut HashSet<String>) {
    for c in clauses {
        match c {
            Clause::Filter(e) | Clause::Bind(e, _) => expr_free_vars(e, out),
            Clause::Not(sub) => clause_filter_bind_free_vars(sub, out),
            Clause::Or(branches) => {
                for b in branches {
                    clause_filter_bind_free_vars(b, out);
                }
            }
            Clause::Pattern(_) => {}
        }
    }
}

/// Variables a clause must already see bound before it can run correctly.
/// Pattern clauses impose no such requirement (an unbound variable in a
/// pattern simply becomes a wildcard); `Filter`/`Bind` need every variable
/// their expression reads; `Not`/`Or` inherit the `Filter`/`Bind`
/// requirements of their nested clauses.
fn free_vars(clause: &Clause) -> HashSet<String> {
    let mut out = HashSet::new();
    match clause {
        Clause::Pattern(_) => {}
        Clause::Filter(e) | Clause::Bind(e, _) => expr_free_vars(e, &mut out),
        Clause::Not(sub) => clause_filter_bind_free_vars(sub, &mut out),
        Clause::Or(branches) => {
            for b in branches {
                clause_filter_bind_free_vars(b, &mut out);
            }
        }
    }
    out
}

fn bound_vars_after_placing(clause: &Clause, bound: &mut HashSet<String>) {
    match clause {
        Clause::Pattern(qp) => {
            for name in pattern_var_names(qp) {
                bound.insert(name.to_string());
            }
        }
        Clause::Bind(_, target) => match target {
            crate::query::ast::BindTarget::Var(name) => {
                bound.insert(name.clone());
            }
            crate::query::ast::BindTarget::Tuple(names) => {
                bound.extend(names.iter().cloned());
            }
        },
        Clause::Not(_) | Clause::Or(_) | Clause::Filter(_) => {}
    }
}

/// Reorders `clauses` for execution. With `PlannerMode::User`, returns them
/// unchanged.
pub fn plan(graph: &Graph, clauses: Vec<Clause>, mode: PlannerMode) -> Vec<Clause> {
    if mode == PlannerMode::User {
        return clauses;
    }

    let mut remaining: Vec<(usize, Clause)> = clauses.into_iter().enumerate().collect();
    let mut bound: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let satisfiable_idx = remaining
            .iter()
            .position(|(_, c)| free_vars(c).is_subset(&bound));

        let Some(_) = satisfiable_idx else {
            // No clause is satisfiable (a Filter/Bind/Not/Or references a
            // variable nothing will ever bind). Give up reordering the
            // rest rather than loop forever; execution will surface
            // whatever error the unresolved reference causes.
            for (_, c) in remaining.drain(..) {
                out.push(c);
            }
            break;
        };

        // Prefer a non-pattern clause that has just become satisfiable —
        // it is placed as soon as it can run. Otherwise pick the most
        // selective pattern among the satisfiable candidates.
        let non_pattern_pos = remaining.iter().position(|(_, c)| {
            !matches!(c, Clause::Pattern(_)) && free_vars(c).is_subset(&bound)
        });

        let chosen_pos = if let Some(pos) = non_pattern_pos {
            pos
        } else {
            remaining
                .iter()
                .enumerate()
                .filter(|(_, (_, c))| matches!(c, Clause::Pattern(_)))
                .min_by_key(|(_, (_orig_idx, c))| {
                    let Clause::Pattern(qp) = c else { unreachable!() };
                    let gp = pattern_to_graph_pattern_literal_only(qp);
                    graph.count_triple(&gp)
                })
                .map(|(pos, _)| pos)
                .unwrap_or(0)
        };

        let (_, clause) = remaining.remove(chosen_pos);
        bound_vars_after_placing(&clause, &mut bound);
        out.push(clause);
    }

    out
}
