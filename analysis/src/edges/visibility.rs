//! Where an action can actually be tapped, per view type.

use appsheet_nav_core::{Prominence, View, ViewType, normalize_value};

use crate::index::ColumnIndex;

/// The parts of an action that decide its placement.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub action: &'a str,
    pub prominence: &'a Prominence,
    pub attach_to_column: &'a str,
}

pub(crate) fn lists_action(list: &[String], action: &str) -> bool {
    let wanted = normalize_value(action);
    !wanted.is_empty() && list.iter().any(|item| normalize_value(item) == wanted)
}

/// An inline action needs its column displayed by the view and, when the
/// table's columns are known, present in the table.
pub(crate) fn inline_column_shown(
    view: &View,
    table: &str,
    column: &str,
    columns: Option<&ColumnIndex>,
) -> bool {
    if column.trim().is_empty() || !view.shows_column(column) {
        return false;
    }
    match columns {
        Some(index) if !table.is_empty() => index.exists(table, column).unwrap_or(true),
        _ => true,
    }
}

/// Whether an action in the view's `available_actions` is reachable from
/// the view's UI.
///
/// - `detail`: any of `Primary`, `Display_Prominently`, `Display_Overlay`,
///   or `Display_Inline` on a displayed column.
/// - `table`: `Primary` row actions, or `Display_Inline` on a displayed
///   column. Tables have no action bar.
/// - `deck` / `gallery`: in the action bar, i.e. in `referenced_actions`
///   and not wired to an event.
/// - Other types accept any available action.
///
/// `Do_Not_Display` is never visible.
pub fn is_visible(
    placement: Placement<'_>,
    view: &View,
    table: &str,
    columns: Option<&ColumnIndex>,
) -> bool {
    if *placement.prominence == Prominence::DoNotDisplay {
        return false;
    }
    if !lists_action(&view.available_actions, placement.action) {
        return false;
    }
    let inline_shown = || {
        *placement.prominence == Prominence::DisplayInline
            && inline_column_shown(view, table, placement.attach_to_column, columns)
    };

    match view.view_type {
        ViewType::Detail => match placement.prominence {
            Prominence::Primary | Prominence::DisplayProminently | Prominence::DisplayOverlay => {
                true
            }
            Prominence::DisplayInline => {
                placement.attach_to_column.trim().is_empty() || inline_shown()
            }
            _ => false,
        },
        ViewType::Table => *placement.prominence == Prominence::Primary || inline_shown(),
        ViewType::Deck | ViewType::Gallery => {
            lists_action(&view.referenced_actions, placement.action)
                && !lists_action(&view.event_actions, placement.action)
        }
        _ => true,
    }
}
