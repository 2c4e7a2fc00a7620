//! `IFS(...)` and `IF(...)` conditionals gated on the navigation context.

use appsheet_nav_core::{BranchOrigin, DataDependence};

use super::{Destination, ExpressionStrategy};
use crate::parser::context::{first_clause, or_clauses, or_constraints};
use crate::parser::split::{call_body, split_top_level};
use crate::parser::{ParseStats, TargetParser};

/// `IFS(cond1, expr1, cond2, expr2, ...)`.
///
/// Each pair's condition contributes its first `CONTEXT` comparison to the
/// targets of its expression. A trailing unpaired argument is ignored.
pub struct IfsStrategy;

impl ExpressionStrategy for IfsStrategy {
    fn name(&self) -> &'static str {
        "ifs"
    }

    fn matches(&self, expression: &str) -> bool {
        call_body(expression, "IFS").is_some()
    }

    fn extract(
        &self,
        parser: &TargetParser,
        expression: &str,
        stats: &mut ParseStats,
    ) -> Vec<Destination> {
        let Some(body) = call_body(expression, "IFS") else {
            return Vec::new();
        };
        let parts = split_top_level(body, usize::MAX);

        let mut found = Vec::new();
        for (offset, pair) in parts.chunks_exact(2).enumerate() {
            let (condition, action) = (pair[0], pair[1]);
            let gate = first_clause(condition, &mut stats.contexts)
                .map(|clause| clause.constraints(false))
                .unwrap_or_default();
            let branch = BranchOrigin {
                index: offset + 1,
                text: format!("{condition}, {action}"),
            };
            for destination in parser.destinations(action, stats) {
                let mut destination = destination.constrain(&gate);
                destination.branch = Some(branch.clone());
                found.push(destination);
            }
        }
        found
    }
}

/// `IF(condition, when_true, when_false)`.
pub struct IfStrategy;

impl ExpressionStrategy for IfStrategy {
    fn name(&self) -> &'static str {
        "if"
    }

    fn matches(&self, expression: &str) -> bool {
        call_body(expression, "IF").is_some()
    }

    fn extract(
        &self,
        parser: &TargetParser,
        expression: &str,
        stats: &mut ParseStats,
    ) -> Vec<Destination> {
        let Some(body) = call_body(expression, "IF") else {
            return Vec::new();
        };
        let parts = split_top_level(body, 3);
        let [condition, when_true, when_false] = parts[..] else {
            return Vec::new();
        };

        if condition.to_uppercase().contains("OR(") {
            if let Some(found) = or_clauses(condition, &mut stats.contexts) {
                let (true_gate, false_gate) = or_constraints(&found);
                let mut targets: Vec<Destination> = parser
                    .destinations(when_true, stats)
                    .into_iter()
                    .map(|destination| destination.constrain(&true_gate))
                    .collect();
                targets.extend(
                    parser
                        .destinations(when_false, stats)
                        .into_iter()
                        .map(|destination| destination.constrain(&false_gate)),
                );
                return targets;
            }
        }

        if let Some(clause) = first_clause(condition, &mut stats.contexts) {
            let true_gate = clause.constraints(false);
            let false_gate = clause.constraints(true);
            let mut targets: Vec<Destination> = parser
                .destinations(when_true, stats)
                .into_iter()
                .map(|destination| destination.constrain(&true_gate))
                .collect();
            targets.extend(
                parser
                    .destinations(when_false, stats)
                    .into_iter()
                    .map(|destination| destination.constrain(&false_gate)),
            );
            return targets;
        }

        let navigates = |branch: &str| {
            let upper = branch.to_uppercase();
            upper.contains("LINKTOVIEW") || upper.contains("LINKTOROW")
        };
        if !navigates(when_true) && !navigates(when_false) {
            let mut targets = parser.destinations(when_true, stats);
            targets.extend(parser.destinations(when_false, stats));
            return targets;
        }

        let mut targets = Vec::new();
        for (branch, taken) in [(when_true, true), (when_false, false)] {
            if !navigates(branch) {
                continue;
            }
            for mut destination in parser.destinations(branch, stats) {
                destination.data_dependence = Some(DataDependence {
                    condition: condition.to_string(),
                    branch: taken,
                });
                targets.push(destination);
            }
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsheet_nav_core::{ContextField, Polarity, ViewContext};

    fn extract(strategy: &dyn ExpressionStrategy, expression: &str) -> Vec<Destination> {
        let parser = TargetParser::new();
        let mut stats = ParseStats::default();
        assert!(strategy.matches(expression), "{expression}");
        strategy.extract(&parser, expression, &mut stats)
    }

    fn deck<'a>(view: &'a str) -> ViewContext<'a> {
        ViewContext {
            view,
            view_type: "deck",
            table: "Order",
        }
    }

    #[test]
    fn test_if_single_clause_inverts_false_branch() {
        let found = extract(
            &IfStrategy,
            r#"=IF(CONTEXT("ViewType")="deck", LINKTOVIEW("A"), LINKTOVIEW("B"))"#,
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].target_view, "A");
        assert_eq!(found[0].constraints.view_type.must_be_list(), "deck");
        assert_eq!(found[1].target_view, "B");
        assert_eq!(found[1].constraints.view_type.must_not_be_list(), "deck");
        assert!(found[1].constraints.view_type.allowed.is_none());
    }

    #[test]
    fn test_if_or_condition() {
        let found = extract(
            &IfStrategy,
            r#"IF(OR(CONTEXT("View")="Inbox", CONTEXT("View")="Archive"), LINKTOVIEW("A"), LINKTOVIEW("B"))"#,
        );
        assert!(found[0].constraints.admits(&deck("Archive")));
        assert!(!found[0].constraints.admits(&deck("Orders")));
        assert!(!found[1].constraints.admits(&deck("Inbox")));
        assert!(found[1].constraints.admits(&deck("Orders")));
    }

    #[test]
    fn test_if_data_dependent_branches() {
        let found = extract(
            &IfStrategy,
            r#"IF([Paid], LINKTOROW([Invoice], "Invoice Detail"), "")"#,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target_view, "Invoice Detail");
        assert_eq!(found[0].row_expr, "[Invoice]");
        let tag = found[0].data_dependence.as_ref().unwrap();
        assert_eq!(tag.match_type(), "data_dependent_true");
        assert_eq!(tag.pattern(), "data_dependent:[Paid]");
        assert!(found[0].constraints.is_unconstrained());
    }

    #[test]
    fn test_if_with_wrong_arity_yields_nothing() {
        assert!(extract(&IfStrategy, r#"IF(CONTEXT("View")="A", LINKTOVIEW("B"))"#).is_empty());
    }

    #[test]
    fn test_ifs_branches_are_indexed_and_gated() {
        let found = extract(
            &IfsStrategy,
            r#"=IFS(CONTEXT("View")="Inbox", LINKTOVIEW("Inbox Detail"), CONTEXT("Table")<>"Order", LINKTOVIEW("Other"), TRUE)"#,
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].branch.as_ref().unwrap().index, 1);
        assert_eq!(
            found[0].branch.as_ref().unwrap().text,
            r#"CONTEXT("View")="Inbox", LINKTOVIEW("Inbox Detail")"#
        );
        assert!(found[0].constraints.admits(&deck("inbox")));
        assert_eq!(found[1].branch.as_ref().unwrap().index, 2);
        assert!(!found[1].constraints.admits(&deck("Inbox")));
    }

    #[test]
    fn test_nested_conditionals_and_constraints() {
        let found = extract(
            &IfStrategy,
            r#"IF(CONTEXT("ViewType")="deck", IF(CONTEXT("View")="Inbox", LINKTOVIEW("A"), ""), "")"#,
        );
        assert_eq!(found.len(), 1);
        let mut expected = appsheet_nav_core::ContextConstraints::none();
        expected.add(ContextField::ViewType, Polarity::MustBe, "deck");
        expected.add(ContextField::View, Polarity::MustBe, "Inbox");
        assert_eq!(found[0].constraints, expected);
    }
}
