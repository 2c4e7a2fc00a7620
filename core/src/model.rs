//! Input records: actions, views, columns, slices and format rules.
//!
//! These types describe one application's metadata as produced by the
//! documentation export. They are built once from the input files and never
//! mutated by the analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::names::{normalize_value, split_list};

/// Sentinel placed in a view's configuration or event list for automatic
/// row navigation.
pub const AUTO_MARKER: &str = "**auto**";

/// What an action does, from its technical type name.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::ActionKind;
///
/// let kind = ActionKind::from_technical_name("execute_group");
/// assert!(kind.is_group());
/// assert!(kind.is_navigation_candidate());
/// assert!(ActionKind::from_technical_name("Navigate").is_navigation());
/// assert_eq!(ActionKind::from_technical_name("set_columns").technical_name(), "set_columns");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// `go_to_view`: navigation through a formula.
    GoToView,
    /// `Navigate`: navigation through a formula (alternate spelling).
    Navigate,
    /// `execute_group`: runs an ordered list of other actions.
    ExecuteGroup,
    /// `open_url`: leaves the app.
    OpenUrl,
    /// Anything else, kept verbatim.
    Other(String),
}

impl ActionKind {
    pub fn from_technical_name(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "go_to_view" => Self::GoToView,
            "navigate" => Self::Navigate,
            "execute_group" => Self::ExecuteGroup,
            "open_url" => Self::OpenUrl,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn technical_name(&self) -> &str {
        match self {
            Self::GoToView => "go_to_view",
            Self::Navigate => "Navigate",
            Self::ExecuteGroup => "execute_group",
            Self::OpenUrl => "open_url",
            Self::Other(name) => name,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::GoToView | Self::Navigate)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::ExecuteGroup)
    }

    /// Returns `true` for the kinds the navigation parser processes.
    pub fn is_navigation_candidate(&self) -> bool {
        self.is_navigation() || self.is_group()
    }
}

impl Default for ActionKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ActionKind {
    fn from(name: String) -> Self {
        Self::from_technical_name(&name)
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.technical_name().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.technical_name())
    }
}

/// Where an action is placed in a view.
///
/// Parsing accepts both `Display_Inline` and `Display inline` spellings.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::Prominence;
///
/// assert_eq!(Prominence::parse("Display inline"), Prominence::DisplayInline);
/// assert_eq!(Prominence::parse("DO_NOT_DISPLAY"), Prominence::DoNotDisplay);
/// assert_eq!(Prominence::parse(""), Prominence::Unspecified);
/// assert_eq!(Prominence::DisplayOverlay.as_str(), "Display_Overlay");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Prominence {
    DoNotDisplay,
    DisplayInline,
    DisplayProminently,
    DisplayOverlay,
    Primary,
    #[default]
    Unspecified,
    Other(String),
}

impl Prominence {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let key = trimmed.replace(' ', "_").to_ascii_lowercase();
        match key.as_str() {
            "" => Self::Unspecified,
            "do_not_display" => Self::DoNotDisplay,
            "display_inline" => Self::DisplayInline,
            "display_prominently" => Self::DisplayProminently,
            "display_overlay" => Self::DisplayOverlay,
            "primary" => Self::Primary,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DoNotDisplay => "Do_Not_Display",
            Self::DisplayInline => "Display_Inline",
            Self::DisplayProminently => "Display_Prominently",
            Self::DisplayOverlay => "Display_Overlay",
            Self::Primary => "Primary",
            Self::Unspecified => "",
            Self::Other(text) => text,
        }
    }
}

impl From<String> for Prominence {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<Prominence> for String {
    fn from(prominence: Prominence) -> Self {
        prominence.as_str().to_string()
    }
}

impl fmt::Display for Prominence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a record was created by the user or generated by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Provenance {
    /// `No`
    User,
    /// `Yes`
    System,
    /// `Unsure`
    Unsure,
    #[default]
    Unknown,
}

impl Provenance {
    /// Parses the `is_system_*` flag column.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Self::System,
            "no" | "false" => Self::User,
            "unsure" => Self::Unsure,
            _ => Self::Unknown,
        }
    }

    pub fn as_flag(self) -> &'static str {
        match self {
            Self::User => "No",
            Self::System => "Yes",
            Self::Unsure => "Unsure",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_system(self) -> bool {
        self == Self::System
    }
}

/// A named operation scoped to a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub table: String,
    pub kind: ActionKind,
    /// Human-readable type label (`Navigate`, `Add row`, ...).
    pub plain_english_type: String,
    /// Raw navigation formula.
    pub navigate_target: String,
    /// Raw visibility formula.
    pub only_if: String,
    /// Child actions of a group, in execution order.
    pub referenced_actions: Vec<String>,
    pub prominence: Prominence,
    pub attach_to_column: String,
    pub provenance: Provenance,
    /// Columns the action's formulas mention, as `Table[Column]`.
    pub referenced_columns: Vec<String>,
}

impl Action {
    pub fn new(name: impl Into<String>, table: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            kind,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, formula: impl Into<String>) -> Self {
        self.navigate_target = formula.into();
        self
    }

    pub fn with_only_if(mut self, formula: impl Into<String>) -> Self {
        self.only_if = formula.into();
        self
    }

    pub fn with_prominence(mut self, prominence: Prominence) -> Self {
        self.prominence = prominence;
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.referenced_actions = children.into_iter().map(Into::into).collect();
        self
    }

    pub fn attached_to(mut self, column: impl Into<String>) -> Self {
        self.attach_to_column = column.into();
        self
    }

    /// Returns `true` if the visibility formula is empty or trivially true.
    pub fn is_unconditional(&self) -> bool {
        matches!(
            normalize_value(&self.only_if).as_str(),
            "" | "true" | "=true" | "true()" | "=true()"
        )
    }

    /// Returns `true` if the visibility formula is literally `false`.
    pub fn is_hidden_by_condition(&self) -> bool {
        matches!(normalize_value(&self.only_if).as_str(), "false" | "=false")
    }
}

/// The kind of screen a view renders.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::ViewType;
///
/// assert_eq!(ViewType::parse("Deck"), ViewType::Deck);
/// assert!(ViewType::Gallery.is_collection());
/// assert_eq!(ViewType::parse("map").as_str(), "map");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewType {
    Table,
    Deck,
    Gallery,
    Detail,
    Form,
    Dashboard,
    Other(String),
    #[default]
    Unknown,
}

impl ViewType {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Self::Unknown,
            "table" => Self::Table,
            "deck" => Self::Deck,
            "gallery" => Self::Gallery,
            "detail" => Self::Detail,
            "form" => Self::Form,
            "dashboard" => Self::Dashboard,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Table => "table",
            Self::Deck => "deck",
            Self::Gallery => "gallery",
            Self::Detail => "detail",
            Self::Form => "form",
            Self::Dashboard => "dashboard",
            Self::Other(text) => text,
            Self::Unknown => "",
        }
    }

    /// Table, deck and gallery views list rows and support row selection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Table | Self::Deck | Self::Gallery)
    }
}

impl From<String> for ViewType {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<ViewType> for String {
    fn from(view_type: ViewType) -> Self {
        view_type.as_str().to_string()
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a view appears in the app's navigation chrome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewCategory {
    Primary,
    Menu,
    Ref,
    System,
    Other(String),
    #[default]
    Unknown,
}

impl ViewCategory {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Self::Unknown,
            "primary" => Self::Primary,
            "menu" => Self::Menu,
            "ref" => Self::Ref,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Primary => "primary",
            Self::Menu => "menu",
            Self::Ref => "ref",
            Self::System => "system",
            Self::Other(text) => text,
            Self::Unknown => "",
        }
    }
}

impl From<String> for ViewCategory {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<ViewCategory> for String {
    fn from(category: ViewCategory) -> Self {
        category.as_str().to_string()
    }
}

/// One entry of a view's configured `Events` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEvent {
    /// Event type, lowercased (`row selected`, `form saved`, ...).
    pub event_type: String,
    pub action: String,
}

/// A named screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub view_type: ViewType,
    pub category: ViewCategory,
    /// Primary-bar position (`first`, `middle`, `next`, `later`, `last`).
    pub position: String,
    /// Table or slice the view is built on.
    pub data_source: String,
    /// Table behind `data_source`, when the export resolved it.
    pub source_table: String,
    pub is_system: bool,
    pub show_if: String,
    pub available_actions: Vec<String>,
    pub referenced_actions: Vec<String>,
    pub event_actions: Vec<String>,
    pub view_columns: Vec<String>,
    /// Raw configuration JSON.
    pub configuration: String,
    pub dashboard_entries: Vec<String>,
    pub referenced_columns: Vec<String>,
}

impl View {
    pub fn new(name: impl Into<String>, view_type: ViewType) -> Self {
        Self {
            name: name.into(),
            view_type,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: ViewCategory, position: &str) -> Self {
        self.category = category;
        self.position = position.to_string();
        self
    }

    pub fn with_source(mut self, data_source: &str) -> Self {
        self.data_source = data_source.to_string();
        self.source_table = data_source.to_string();
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }

    /// The data source name, falling back to the source table.
    pub fn data_source_name(&self) -> &str {
        if self.data_source.trim().is_empty() {
            self.source_table.trim()
        } else {
            self.data_source.trim()
        }
    }

    /// Events configured in the view's configuration JSON. Malformed or
    /// absent configuration yields no events.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_core::{View, ViewType};
    ///
    /// let mut view = View::new("Orders", ViewType::Deck);
    /// view.configuration =
    ///     r#"{"Events":[{"EventType":"Row Selected","EventAction":"Open Order"}]}"#.into();
    /// let events = view.configured_events();
    /// assert_eq!(events[0].event_type, "row selected");
    /// assert_eq!(events[0].action, "Open Order");
    /// ```
    pub fn configured_events(&self) -> Vec<ViewEvent> {
        let Ok(config) = serde_json::from_str::<serde_json::Value>(&self.configuration) else {
            return Vec::new();
        };
        let Some(events) = config.get("Events").and_then(|value| value.as_array()) else {
            return Vec::new();
        };
        events
            .iter()
            .map(|event| ViewEvent {
                event_type: event
                    .get("EventType")
                    .and_then(|value| value.as_str())
                    .unwrap_or_default()
                    .trim()
                    .to_lowercase(),
                action: event
                    .get("EventAction")
                    .and_then(|value| value.as_str())
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            })
            .collect()
    }

    /// Returns `true` if the raw configuration mentions automatic row
    /// navigation.
    pub fn has_auto_marker(&self) -> bool {
        self.configuration.contains(AUTO_MARKER)
    }

    pub fn shows_column(&self, column: &str) -> bool {
        let wanted = normalize_value(column);
        !wanted.is_empty()
            && self
                .view_columns
                .iter()
                .any(|shown| normalize_value(shown) == wanted)
    }
}

/// A column of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub table: String,
    pub name: String,
    /// `Table[Column]` as exported; may be empty.
    pub unique_identifier: String,
    pub is_virtual: bool,
    /// AppSheet column type (`Text`, `Ref`, ...).
    pub data_type: String,
    /// Whether the column is its table's label.
    pub is_label: bool,
    /// Target table of a `Ref` column.
    pub ref_table: String,
    pub referenced_columns: Vec<String>,
    pub hidden: bool,
    pub app_formula: String,
    pub show_if: String,
    pub valid_if: String,
    pub type_qualifier_formulas: String,
}

impl Column {
    /// The `Table[Column]` identifier other records use to reference this
    /// column.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_core::Column;
    ///
    /// let column = Column {
    ///     table: "Order".into(),
    ///     name: "Total".into(),
    ///     ..Column::default()
    /// };
    /// assert_eq!(column.identifier(), "Order[Total]");
    /// ```
    pub fn identifier(&self) -> String {
        let exported = self.unique_identifier.trim();
        if exported.is_empty() {
            format!("{}[{}]", self.table, self.name)
        } else {
            exported.to_string()
        }
    }

    pub fn is_ref(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("ref")
    }
}

/// A filtered projection of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub name: String,
    pub source_table: String,
    pub columns: Vec<String>,
    pub actions: Vec<String>,
    pub referenced_columns: Vec<String>,
}

/// A conditional formatting rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatRule {
    pub name: String,
    pub table: String,
    pub condition: String,
    pub disabled: bool,
    pub formatted_columns: Vec<String>,
    pub formatted_actions: Vec<String>,
    pub referenced_columns: Vec<String>,
}

impl FormatRule {
    pub fn formatted_items_count(&self) -> usize {
        self.formatted_columns.len() + self.formatted_actions.len()
    }
}

/// Parses a `Yes`/`No` style flag.
pub fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "y" | "1"
    )
}

/// Splits a `|||` list field, dropping the automatic-navigation sentinel.
pub fn split_action_list(field: &str) -> Vec<String> {
    split_list(field)
        .into_iter()
        .filter(|item| item != AUTO_MARKER)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_round_trips_through_string() {
        for name in ["go_to_view", "Navigate", "execute_group", "open_url", "set_columns"] {
            let kind = ActionKind::from_technical_name(name);
            assert_eq!(String::from(kind), name);
        }
    }

    #[test]
    fn test_configured_events_tolerates_bad_json() {
        let mut view = View::new("Orders", ViewType::Deck);
        view.configuration = "{not json".into();
        assert!(view.configured_events().is_empty());
        view.configuration = r#"{"Events":"nope"}"#.into();
        assert!(view.configured_events().is_empty());
    }

    #[test]
    fn test_data_source_falls_back_to_source_table() {
        let mut view = View::new("Orders", ViewType::Table);
        view.source_table = "Order".into();
        assert_eq!(view.data_source_name(), "Order");
        view.data_source = "Open Orders".into();
        assert_eq!(view.data_source_name(), "Open Orders");
    }

    #[test]
    fn test_action_unconditional_formulas() {
        let action = Action::new("Go", "T", ActionKind::GoToView);
        assert!(action.is_unconditional());
        assert!(action.clone().with_only_if("=TRUE").is_unconditional());
        assert!(!action.clone().with_only_if("[Status] = \"Open\"").is_unconditional());
        assert!(action.with_only_if(" FALSE ").is_hidden_by_condition());
    }

    #[test]
    fn test_shows_column_ignores_case() {
        let mut view = View::new("Order Detail", ViewType::Detail);
        view.view_columns = vec!["Customer".into(), "Total".into()];
        assert!(view.shows_column("customer"));
        assert!(!view.shows_column("Notes"));
        assert!(!view.shows_column(""));
    }

    #[test]
    fn test_split_action_list_drops_auto_marker() {
        assert_eq!(split_action_list("**auto**|||Edit"), vec!["Edit"]);
    }
}
