//! Deep-link URL fragments: `#control=<view>` and `#page=detail&table=<table>`.

use std::sync::LazyLock;

use appsheet_nav_core::strip_delimiters;
use regex::Regex;

use super::{Destination, ExpressionStrategy};
use crate::parser::{ParseStats, TargetParser};

static CONTROL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#control=([^"&]+)"#).expect("static regex must compile"));

static DETAIL_PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"#page=detail&table=([^&"]+)"#).expect("static regex must compile")
});

pub struct DirectStrategy;

impl ExpressionStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn matches(&self, expression: &str) -> bool {
        expression.contains("#control=") || expression.contains("#page=")
    }

    fn extract(
        &self,
        parser: &TargetParser,
        expression: &str,
        stats: &mut ParseStats,
    ) -> Vec<Destination> {
        stats.targets.record_direct();

        let mut found: Vec<Destination> = CONTROL_RE
            .captures_iter(expression)
            .map(|caps| strip_delimiters(&caps[1].replace("%20", " ")).to_string())
            .filter(|view| !view.is_empty())
            .map(Destination::to_view)
            .collect();

        for caps in DETAIL_PAGE_RE.captures_iter(expression) {
            let table = caps[1].replace("%20", " ");
            let table = strip_delimiters(&table);
            if table.is_empty() {
                continue;
            }
            found.push(Destination::to_view(parser.detail_view_for(table)));
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsheet_nav_core::{View, ViewType};

    #[test]
    fn test_control_fragment() {
        let parser = TargetParser::new();
        let mut stats = ParseStats::default();
        let found = DirectStrategy.extract(&parser, r##"="#control=Order%20List""##, &mut stats);
        assert_eq!(found, vec![Destination::to_view("Order List")]);
        assert_eq!(stats.targets.direct, 1);
        assert_eq!(stats.targets.total, 1);
    }

    #[test]
    fn test_detail_page_uses_system_detail_view() {
        let views = vec![
            View::new("Order_Detail_Renamed", ViewType::Detail)
                .with_source("Order Lines")
                .system(),
        ];
        let parser = TargetParser::with_views(&views);
        let mut stats = ParseStats::default();

        let found = DirectStrategy.extract(
            &parser,
            r##"CONCATENATE("#page=detail&table=Order%20Lines&row=", [Id])"##,
            &mut stats,
        );
        assert_eq!(found[0].target_view, "Order_Detail_Renamed");

        let found = DirectStrategy.extract(&parser, "#page=detail&table=Customer", &mut stats);
        assert_eq!(found[0].target_view, "Customer_Detail");
    }
}
