//! `LINKTOVIEW(...)` and `LINKTOROW(...)`.

use std::sync::LazyLock;

use appsheet_nav_core::strip_delimiters;
use regex::Regex;

use super::{Destination, ExpressionStrategy};
use crate::parser::split::last_top_level_comma;
use crate::parser::{ParseStats, TargetParser};

pub struct LinkToViewStrategy;

impl ExpressionStrategy for LinkToViewStrategy {
    fn name(&self) -> &'static str {
        "linktoview"
    }

    fn matches(&self, expression: &str) -> bool {
        expression.to_uppercase().contains("LINKTOVIEW")
    }

    /// Quoted view names win; an unquoted argument is used only where it
    /// does not overlap a quoted match.
    fn extract(
        &self,
        _parser: &TargetParser,
        expression: &str,
        stats: &mut ParseStats,
    ) -> Vec<Destination> {
        static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"(?i)LINKTOVIEW\s*\(\s*"([^"]+)"\s*\)"#).expect("static regex must compile")
        });
        static UNQUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"(?i)LINKTOVIEW\s*\(([^")][^)]*)\)"#).expect("static regex must compile")
        });

        stats.targets.record_linktoview();

        let mut found = Vec::new();
        let mut quoted_spans = Vec::new();
        for caps in QUOTED_RE.captures_iter(expression) {
            if let Some(whole) = caps.get(0) {
                quoted_spans.push(whole.range());
            }
            let view = strip_delimiters(&caps[1]);
            if !view.is_empty() {
                found.push(Destination::to_view(view));
            }
        }

        for caps in UNQUOTED_RE.captures_iter(expression) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let overlaps = quoted_spans.iter().any(|quoted| {
                (whole.start() >= quoted.start && whole.start() < quoted.end)
                    || (whole.end() > quoted.start && whole.end() <= quoted.end)
            });
            if overlaps {
                continue;
            }
            let view = strip_delimiters(&caps[1]);
            if !view.is_empty() {
                found.push(Destination::to_view(view));
            }
        }
        found
    }
}

pub struct LinkToRowStrategy;

impl ExpressionStrategy for LinkToRowStrategy {
    fn name(&self) -> &'static str {
        "linktorow"
    }

    fn matches(&self, expression: &str) -> bool {
        expression.to_uppercase().contains("LINKTOROW")
    }

    /// Splits the arguments at the last top-level comma into the row
    /// selector and the view name.
    ///
    /// `LINKTOROW([_THISROW], CONTEXT("View"))` re-opens the current row to
    /// force a sync and yields nothing.
    fn extract(
        &self,
        _parser: &TargetParser,
        expression: &str,
        stats: &mut ParseStats,
    ) -> Vec<Destination> {
        static LINKTOROW_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?is)LINKTOROW\s*\((.*)\)").expect("static regex must compile")
        });

        stats.targets.record_linktorow();

        let Some(content) = LINKTOROW_RE
            .captures(expression)
            .and_then(|caps| caps.get(1))
            .map(|content| content.as_str())
        else {
            return Vec::new();
        };
        let Some(comma) = last_top_level_comma(content).filter(|offset| *offset > 0) else {
            return Vec::new();
        };

        let row_expr = content[..comma].trim();
        let view = strip_delimiters(&content[comma + 1..]);
        if row_expr.to_uppercase().contains("[_THISROW]") && view.to_uppercase().contains("CONTEXT")
        {
            return Vec::new();
        }
        if view.is_empty() {
            return Vec::new();
        }

        vec![Destination {
            target_view: view.to_string(),
            row_expr: row_expr.to_string(),
            ..Destination::default()
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(strategy: &dyn ExpressionStrategy, expression: &str) -> (Vec<Destination>, ParseStats) {
        let parser = TargetParser::new();
        let mut stats = ParseStats::default();
        let found = strategy.extract(&parser, expression, &mut stats);
        (found, stats)
    }

    #[test]
    fn test_linktoview_quoted_and_smart_quoted() {
        let (found, stats) = run(&LinkToViewStrategy, r#"=LINKTOVIEW("Customer Detail")"#);
        assert_eq!(found, vec![Destination::to_view("Customer Detail")]);
        assert_eq!(stats.targets.linktoview, 1);

        let (found, _) = run(&LinkToViewStrategy, "LINKTOVIEW(\u{201C}Inbox\u{201D})");
        assert_eq!(found[0].target_view, "Inbox");
    }

    #[test]
    fn test_linktoview_unquoted_argument() {
        let (found, _) = run(&LinkToViewStrategy, "LINKTOVIEW(Session confirmation)");
        assert_eq!(found, vec![Destination::to_view("Session confirmation")]);
    }

    #[test]
    fn test_linktoview_inside_concatenate() {
        let (found, _) = run(
            &LinkToViewStrategy,
            r#"CONCATENATE(LINKTOVIEW("Orders"), "&at=", TEXT(TODAY()))"#,
        );
        assert_eq!(found, vec![Destination::to_view("Orders")]);
    }

    #[test]
    fn test_linktorow_splits_at_last_top_level_comma() {
        let (found, stats) = run(
            &LinkToRowStrategy,
            r#"LINKTOROW(ANY(SELECT(Order[Id], [Customer] = [_THISROW].[Id])), "Order Detail")"#,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target_view, "Order Detail");
        assert_eq!(
            found[0].row_expr,
            "ANY(SELECT(Order[Id], [Customer] = [_THISROW].[Id]))"
        );
        assert_eq!(stats.targets.linktorow, 1);
        assert_eq!(stats.targets.total, 1);
    }

    #[test]
    fn test_linktorow_forced_sync_is_not_navigation() {
        let (found, stats) = run(&LinkToRowStrategy, r#"LINKTOROW([_THISROW], CONTEXT("View"))"#);
        assert!(found.is_empty());
        assert_eq!(stats.targets.linktorow, 1);
    }

    #[test]
    fn test_linktorow_without_view_argument() {
        let (found, _) = run(&LinkToRowStrategy, "LINKTOROW([Id])");
        assert!(found.is_empty());
    }
}
