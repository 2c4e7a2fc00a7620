//! Extraction of `CONTEXT(...)` comparisons from conditions.

use std::sync::LazyLock;

use appsheet_nav_core::{ContextConstraints, ContextField, Polarity, strip_delimiters};
use regex::Regex;

use super::ContextCounts;

static CONTEXT_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)CONTEXT\s*\(\s*"(View|ViewType|Table)"\s*\)\s*(==|=|<>|!=)\s*"([^"]+)""#)
        .expect("static regex must compile")
});

/// One `CONTEXT("<field>") <op> "<value>"` comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContextClause {
    pub(crate) field: ContextField,
    pub(crate) polarity: Polarity,
    pub(crate) value: String,
}

impl ContextClause {
    fn from_parts(field: &str, operator: &str, value: &str) -> Option<Self> {
        Some(Self {
            field: ContextField::from_context_arg(field)?,
            polarity: Polarity::from_operator(operator)?,
            value: strip_delimiters(value).to_string(),
        })
    }

    /// The clause as a constraint set, optionally in the opposite direction.
    pub(crate) fn constraints(&self, inverted: bool) -> ContextConstraints {
        let polarity = if inverted {
            self.polarity.inverted()
        } else {
            self.polarity
        };
        let mut constraints = ContextConstraints::none();
        constraints.add(self.field, polarity, &self.value);
        constraints
    }
}

fn clauses(condition: &str) -> impl Iterator<Item = ContextClause> + '_ {
    CONTEXT_CLAUSE_RE
        .captures_iter(condition)
        .filter_map(|caps| ContextClause::from_parts(&caps[1], &caps[2], &caps[3]))
}

/// The first comparison in a branch condition, falling back to
/// `LEFT(CONTEXT("View"), n) <op> "value"` as a view comparison.
pub(crate) fn first_clause(condition: &str, counts: &mut ContextCounts) -> Option<ContextClause> {
    static LEFT_VIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"(?i)LEFT\s*\(\s*CONTEXT\s*\(\s*"View"\s*\)\s*,\s*\d+\s*\)\s*(==|=|<>|!=)\s*"([^"]+)""#,
        )
        .expect("static regex must compile")
    });

    if let Some(clause) = clauses(condition).next() {
        counts.record(clause.field, 1);
        return Some(clause);
    }
    let caps = LEFT_VIEW_RE.captures(condition)?;
    let clause = ContextClause::from_parts("View", &caps[1], &caps[2])?;
    counts.record(ContextField::View, 1);
    Some(clause)
}

/// Equality comparisons inside an `OR(...)`, when the condition has one.
pub(crate) fn or_clauses(condition: &str, counts: &mut ContextCounts) -> Option<Vec<ContextClause>> {
    static OR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?is)\bOR\s*\((.*)\)").expect("static regex must compile"));

    let body = OR_RE.captures(condition)?.get(1)?.as_str();
    let found: Vec<ContextClause> = clauses(body)
        .filter(|clause| clause.polarity == Polarity::MustBe)
        .collect();
    if found.is_empty() {
        return None;
    }
    for clause in &found {
        counts.record(clause.field, 1);
    }
    Some(found)
}

/// Constraints for the branch taken when an `OR` of equalities holds, and
/// for the branch taken when it does not.
///
/// The negation of an `OR` is exactly the conjunction of the negated
/// equalities. The positive side is only representable when every equality
/// tests the same field; otherwise it is left unconstrained.
pub(crate) fn or_constraints(found: &[ContextClause]) -> (ContextConstraints, ContextConstraints) {
    let mut when_true = ContextConstraints::none();
    let mut when_false = ContextConstraints::none();
    let single_field = found.windows(2).all(|pair| pair[0].field == pair[1].field);
    for clause in found {
        if single_field {
            when_true.add(clause.field, Polarity::MustBe, &clause.value);
        }
        when_false.add(clause.field, Polarity::MustNotBe, &clause.value);
    }
    (when_true, when_false)
}

/// Every comparison in a visibility condition, collected as one constraint
/// set. Comparisons on the same field and direction become alternatives.
pub(crate) fn condition_constraints(condition: &str) -> ContextConstraints {
    let mut constraints = ContextConstraints::none();
    if !condition.to_uppercase().contains("CONTEXT") {
        return constraints;
    }
    for clause in clauses(condition) {
        constraints.add(clause.field, clause.polarity, &clause.value);
    }
    constraints
}

/// [`condition_constraints`] for a navigation action's own condition.
///
/// A condition shaped like `IF(<...CONTEXT...>, x, TRUE)` (or with `TRUE`
/// as the first branch) passes outside the tested context too, so it
/// contributes nothing.
pub(crate) fn guarded_condition_constraints(condition: &str) -> ContextConstraints {
    static DATA_DEPENDENT_GUARD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)=?if\s*\(.*context.*,.*,\s*true\s*\)|=?if\s*\(.*context.*,\s*true\s*,.*\)",
        )
        .expect("static regex must compile")
    });

    if DATA_DEPENDENT_GUARD_RE.is_match(condition) {
        return ContextConstraints::none();
    }
    condition_constraints(condition)
}

/// Counts every `CONTEXT("View" | "ViewType" | "Table")` mention.
pub(crate) fn count_mentions(condition: &str, counts: &mut ContextCounts) {
    static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)CONTEXT\s*\(\s*"(View|ViewType|Table)"\s*\)"#)
            .expect("static regex must compile")
    });

    for caps in MENTION_RE.captures_iter(condition) {
        if let Some(field) = ContextField::from_context_arg(&caps[1]) {
            counts.record(field, 1);
        }
    }
}
