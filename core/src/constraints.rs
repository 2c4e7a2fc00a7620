//! Context constraints and their combination algebra.
//!
//! A navigation possibility is often gated on where the user currently is:
//! `CONTEXT("View")`, `CONTEXT("ViewType")` and `CONTEXT("Table")`
//! comparisons in an action's formulas. Each of the three context fields
//! carries a positive constraint ("must be one of") and a negative one
//! ("must not be any of").
//!
//! Constraints coming from different scopes (an action's own condition, the
//! branch a target was extracted from, each enclosing group action) are
//! ANDed with [`ContextConstraints::and`]: positive sets intersect, negative
//! sets unite. A positive constraint that has been narrowed to nothing is
//! kept as an explicit empty set rather than collapsing back to
//! "unconstrained", which keeps the operation associative and makes the
//! contradiction visible.
//!
//! # Examples
//!
//! ```
//! use appsheet_nav_core::{ContextConstraints, ContextField, Polarity, ViewContext};
//!
//! let mut group = ContextConstraints::default();
//! group.add(ContextField::View, Polarity::MustBe, "Orders");
//! group.add(ContextField::View, Polarity::MustBe, "Archive");
//!
//! let mut child = ContextConstraints::default();
//! child.add(ContextField::View, Polarity::MustBe, "Archive");
//! child.add(ContextField::ViewType, Polarity::MustNotBe, "form");
//!
//! let combined = group.and(&child);
//! let here = ViewContext { view: "archive", view_type: "deck", table: "Order" };
//! assert!(combined.admits(&here));
//!
//! let elsewhere = ViewContext { view: "Orders", view_type: "deck", table: "Order" };
//! assert!(!combined.admits(&elsewhere));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::names::{LIST_DELIMITER, normalize_value, split_list};

/// Runtime context attribute a constraint is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextField {
    /// `CONTEXT("View")`: the current view's name.
    View,
    /// `CONTEXT("ViewType")`: the current view's type.
    ViewType,
    /// `CONTEXT("Table")`: the current view's resolved table.
    Table,
}

impl ContextField {
    /// All fields, in output column order.
    pub const ALL: [ContextField; 3] = [Self::View, Self::ViewType, Self::Table];

    /// Parses the quoted argument of a `CONTEXT(...)` call, case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_core::ContextField;
    ///
    /// assert_eq!(ContextField::from_context_arg("VIEWTYPE"), Some(ContextField::ViewType));
    /// assert_eq!(ContextField::from_context_arg("Host"), None);
    /// ```
    pub fn from_context_arg(arg: &str) -> Option<Self> {
        match arg.trim().to_ascii_lowercase().as_str() {
            "view" => Some(Self::View),
            "viewtype" => Some(Self::ViewType),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::ViewType => "view_type",
            Self::Table => "table",
        }
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a context comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    /// `=` / `==`: the context must be one of the values.
    MustBe,
    /// `<>` / `!=`: the context must not be any of the values.
    MustNotBe,
}

impl Polarity {
    /// Maps a comparison operator to a polarity.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_core::Polarity;
    ///
    /// assert_eq!(Polarity::from_operator("=="), Some(Polarity::MustBe));
    /// assert_eq!(Polarity::from_operator("<>"), Some(Polarity::MustNotBe));
    /// assert_eq!(Polarity::from_operator(">"), None);
    /// ```
    pub fn from_operator(operator: &str) -> Option<Self> {
        match operator.trim() {
            "=" | "==" => Some(Self::MustBe),
            "<>" | "!=" => Some(Self::MustNotBe),
            _ => None,
        }
    }

    /// The polarity that applies to the other branch of a conditional.
    pub fn inverted(self) -> Self {
        match self {
            Self::MustBe => Self::MustNotBe,
            Self::MustNotBe => Self::MustBe,
        }
    }
}

/// A set of context values, compared by their normalized form.
///
/// The first spelling inserted for a value is kept for display. Equality and
/// ordering only consider normalized forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ValueSet {
    entries: BTreeMap<String, String>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a `|||`-delimited list.
    pub fn parse_list(field: &str) -> Self {
        split_list(field).into_iter().collect()
    }

    /// Inserts a value; blank values are ignored. Returns `true` if the
    /// normalized value was not present yet.
    pub fn insert(&mut self, value: &str) -> bool {
        let key = normalize_value(value);
        if key.is_empty() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, value.trim().to_string());
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains_key(&normalize_value(value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values present in both sets. Display spellings come from `self`.
    pub fn intersection(&self, other: &ValueSet) -> ValueSet {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| other.entries.contains_key(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        ValueSet { entries }
    }

    /// Values present in either set. Display spellings prefer `self`.
    pub fn union(&self, other: &ValueSet) -> ValueSet {
        let mut entries = self.entries.clone();
        for (key, value) in &other.entries {
            entries
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        ValueSet { entries }
    }

    /// Display spellings, ordered by normalized form.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Normalized forms, in order.
    pub fn normalized(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Display spellings joined with `|||`.
    pub fn to_list(&self) -> String {
        self.iter().collect::<Vec<_>>().join(LIST_DELIMITER)
    }

    /// Normalized forms joined with `|||`.
    pub fn to_normalized_list(&self) -> String {
        self.normalized().collect::<Vec<_>>().join(LIST_DELIMITER)
    }
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.keys().eq(other.entries.keys())
    }
}

impl Eq for ValueSet {}

impl<S: AsRef<str>> FromIterator<S> for ValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for ValueSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl From<ValueSet> for Vec<String> {
    fn from(set: ValueSet) -> Self {
        set.entries.into_values().collect()
    }
}

/// Positive and negative constraint on a single context field.
///
/// `allowed == None` means any value is allowed; `Some(empty)` means no
/// value can satisfy the constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConstraint {
    pub allowed: Option<ValueSet>,
    pub forbidden: ValueSet,
}

impl FieldConstraint {
    /// Builds a constraint from the legacy pair of `|||` lists. An empty
    /// positive list means "unconstrained".
    pub fn from_lists(must_be: &str, must_not_be: &str) -> Self {
        let allowed = ValueSet::parse_list(must_be);
        Self {
            allowed: (!allowed.is_empty()).then_some(allowed),
            forbidden: ValueSet::parse_list(must_not_be),
        }
    }

    /// A positive constraint that nothing satisfies.
    pub fn contradiction() -> Self {
        Self {
            allowed: Some(ValueSet::new()),
            forbidden: ValueSet::new(),
        }
    }

    /// Adds an alternative to the positive list (OR within one source).
    pub fn allow(&mut self, value: &str) {
        self.allowed.get_or_insert_with(ValueSet::new).insert(value);
    }

    /// Adds a value to the negative list.
    pub fn forbid(&mut self, value: &str) {
        self.forbidden.insert(value);
    }

    /// ANDs two constraints on the same field.
    pub fn and(&self, other: &FieldConstraint) -> FieldConstraint {
        let allowed = match (&self.allowed, &other.allowed) {
            (Some(left), Some(right)) => Some(left.intersection(right)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        };
        FieldConstraint {
            allowed,
            forbidden: self.forbidden.union(&other.forbidden),
        }
    }

    /// Returns `true` if `value` satisfies both the positive and the
    /// negative constraint.
    pub fn admits(&self, value: &str) -> bool {
        let allowed = self.allowed.as_ref().is_none_or(|set| set.contains(value));
        allowed && !self.forbidden.contains(value)
    }

    /// Returns `true` if the positive constraint has been narrowed to nothing.
    pub fn is_contradictory(&self) -> bool {
        self.allowed.as_ref().is_some_and(ValueSet::is_empty)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.allowed.is_none() && self.forbidden.is_empty()
    }

    /// Positive list in legacy `|||` form (empty when unconstrained or
    /// contradictory).
    pub fn must_be_list(&self) -> String {
        self.allowed
            .as_ref()
            .map(ValueSet::to_list)
            .unwrap_or_default()
    }

    pub fn must_not_be_list(&self) -> String {
        self.forbidden.to_list()
    }
}

/// The current location of the user, as seen by context comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContext<'a> {
    pub view: &'a str,
    pub view_type: &'a str,
    pub table: &'a str,
}

impl ViewContext<'_> {
    pub fn get(&self, field: ContextField) -> &str {
        match field {
            ContextField::View => self.view,
            ContextField::ViewType => self.view_type,
            ContextField::Table => self.table,
        }
    }
}

/// Constraints on all three context fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConstraints {
    pub view: FieldConstraint,
    pub view_type: FieldConstraint,
    pub table: FieldConstraint,
}

impl ContextConstraints {
    /// Constraints that admit every context.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn field(&self, field: ContextField) -> &FieldConstraint {
        match field {
            ContextField::View => &self.view,
            ContextField::ViewType => &self.view_type,
            ContextField::Table => &self.table,
        }
    }

    pub fn field_mut(&mut self, field: ContextField) -> &mut FieldConstraint {
        match field {
            ContextField::View => &mut self.view,
            ContextField::ViewType => &mut self.view_type,
            ContextField::Table => &mut self.table,
        }
    }

    /// Records one comparison. Several comparisons with the same field and
    /// polarity accumulate as alternatives.
    pub fn add(&mut self, field: ContextField, polarity: Polarity, value: &str) {
        let constraint = self.field_mut(field);
        match polarity {
            Polarity::MustBe => constraint.allow(value),
            Polarity::MustNotBe => constraint.forbid(value),
        }
    }

    /// ANDs two constraint sets field by field.
    ///
    /// Associative and commutative; [`ContextConstraints::none`] is the
    /// identity.
    pub fn and(&self, other: &ContextConstraints) -> ContextConstraints {
        ContextConstraints {
            view: self.view.and(&other.view),
            view_type: self.view_type.and(&other.view_type),
            table: self.table.and(&other.table),
        }
    }

    /// Returns `true` if the context satisfies every field.
    pub fn admits(&self, context: &ViewContext<'_>) -> bool {
        self.first_violation(context).is_none()
    }

    /// Returns the first field the context fails, if any.
    pub fn first_violation(&self, context: &ViewContext<'_>) -> Option<ContextField> {
        ContextField::ALL
            .into_iter()
            .find(|field| !self.field(*field).admits(context.get(*field)))
    }

    /// Fields whose positive constraint was narrowed to nothing.
    pub fn contradictory_fields(&self) -> Vec<ContextField> {
        ContextField::ALL
            .into_iter()
            .filter(|field| self.field(*field).is_contradictory())
            .collect()
    }

    pub fn is_contradictory(&self) -> bool {
        ContextField::ALL
            .into_iter()
            .any(|field| self.field(field).is_contradictory())
    }

    pub fn is_unconstrained(&self) -> bool {
        ContextField::ALL
            .into_iter()
            .all(|field| self.field(field).is_unconstrained())
    }
}
