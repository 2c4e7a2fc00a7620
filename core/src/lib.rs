//! Core model and constraint algebra for AppSheet navigation analysis.
//!
//! This crate defines the records the analysis works on and the pure logic
//! shared by every stage:
//!
//! - [`Action`], [`View`], [`Column`], [`Slice`], [`FormatRule`]: the
//!   application metadata read from the documentation export.
//! - [`NavigationTarget`]: one destination parsed from an action's
//!   navigation formula.
//! - [`NavigationEdge`]: a conditioned way of moving from one view to
//!   another.
//! - [`ContextConstraints`]: `CONTEXT("View" | "ViewType" | "Table")`
//!   conditions with an associative AND ([`ContextConstraints::and`]).
//! - [`ViewNameRegistry`]: resolves any spelling of a view name to its
//!   canonical record.
//!
//! Validation ([`validate_views`], [`validate_actions`]) reports duplicate
//! names and self-referencing groups without rejecting the input.
//!
//! # Example
//!
//! ```
//! use appsheet_nav_core::*;
//!
//! let registry = ViewNameRegistry::from_names(["Order Detail"]);
//!
//! let mut target = NavigationTarget::default();
//! target.source_action = "Open Order".into();
//! target.target_view = "order detail".into();
//! target
//!     .constraints
//!     .add(ContextField::ViewType, Polarity::MustBe, "deck");
//!
//! assert_eq!(registry.resolve(&target.target_view), Some("Order Detail"));
//!
//! let from_deck = ViewContext { view: "Orders", view_type: "deck", table: "Order" };
//! let from_form = ViewContext { view: "New Order", view_type: "form", table: "Order" };
//! assert!(target.constraints.admits(&from_deck));
//! assert!(!target.constraints.admits(&from_form));
//! ```

mod constraints;
mod model;
mod names;
mod navigation;
mod validate;

pub use constraints::{
    ContextConstraints, ContextField, FieldConstraint, Polarity, ValueSet, ViewContext,
};
pub use model::*;
pub use names::{
    LIST_DELIMITER, ViewNameRegistry, fold_quotes, join_list, normalize_value, split_list,
    strip_delimiters, view_key,
};
pub use navigation::*;
pub use validate::{ValidationError, validate_actions, validate_views};
