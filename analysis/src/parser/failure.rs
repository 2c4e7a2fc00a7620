//! Classification of navigation formulas that yield no target.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::COLUMN_REFERENCE_RE;

/// Why a navigation formula could not be turned into a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    EmptyExpression,
    /// Leaves the app through an `http(s)://` link.
    ExternalUrl,
    /// Navigates back through history; the destination depends on the path
    /// taken.
    ParentView,
    ColumnReference,
    /// `mailto:`, `sms:`, `tel:` or `geo:` links.
    ExternalProtocol,
    UnknownPattern,
}

impl FailureReason {
    /// Classifies a formula that produced no target.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_analysis::FailureReason;
    ///
    /// assert_eq!(FailureReason::classify(""), FailureReason::EmptyExpression);
    /// assert_eq!(FailureReason::classify("=LINKTOPARENTVIEW()"), FailureReason::ParentView);
    /// assert_eq!(
    ///     FailureReason::classify("CONCATENATE(\"mailto:\", [Email])"),
    ///     FailureReason::ExternalProtocol
    /// );
    /// ```
    pub fn classify(expression: &str) -> Self {
        if expression.is_empty() {
            return Self::EmptyExpression;
        }
        let upper = expression.to_uppercase();
        if upper.contains("HTTP://") || upper.contains("HTTPS://") {
            return Self::ExternalUrl;
        }
        if upper.contains("LINKTOPARENTVIEW") {
            return Self::ParentView;
        }
        if COLUMN_REFERENCE_RE.is_match(expression.trim()) {
            return Self::ColumnReference;
        }
        if ["MAILTO:", "SMS:", "TEL:", "GEO:"]
            .iter()
            .any(|scheme| upper.contains(scheme))
        {
            return Self::ExternalProtocol;
        }
        Self::UnknownPattern
    }

    /// The label written to the unparseable-expressions file.
    pub fn label(self) -> &'static str {
        match self {
            Self::EmptyExpression => "Empty expression",
            Self::ExternalUrl => "External URL",
            Self::ParentView => "LINKTOPARENTVIEW - requires navigation history",
            Self::ColumnReference => "Simple column reference",
            Self::ExternalProtocol => "External protocol (mailto/sms/tel/geo)",
            Self::UnknownPattern => "Unknown pattern",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
