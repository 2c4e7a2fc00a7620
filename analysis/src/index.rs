//! Lookup tables shared by the edge generator and the detectors.

use std::collections::{HashMap, HashSet};

use appsheet_nav_core::{Column, Slice, View, normalize_value};

/// Columns per table, keyed by normalized names.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    tables: HashMap<String, HashSet<String>>,
}

impl ColumnIndex {
    pub fn from_columns(columns: &[Column]) -> Self {
        let mut tables: HashMap<String, HashSet<String>> = HashMap::new();
        for column in columns {
            let table = normalize_value(&column.table);
            let name = normalize_value(&column.name);
            if table.is_empty() || name.is_empty() {
                continue;
            }
            tables.entry(table).or_default().insert(name);
        }
        Self { tables }
    }

    /// Whether `column` exists in `table`, or `None` when nothing is known
    /// about the table.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_analysis::ColumnIndex;
    /// use appsheet_nav_core::Column;
    ///
    /// let index = ColumnIndex::from_columns(&[Column {
    ///     table: "Order".into(),
    ///     name: "Status".into(),
    ///     ..Column::default()
    /// }]);
    /// assert_eq!(index.exists("order", "STATUS"), Some(true));
    /// assert_eq!(index.exists("Order", "Total"), Some(false));
    /// assert_eq!(index.exists("Customer", "Name"), None);
    /// ```
    pub fn exists(&self, table: &str, column: &str) -> Option<bool> {
        self.tables
            .get(&normalize_value(table))
            .map(|names| names.contains(&normalize_value(column)))
    }

    pub fn columns_of(&self, table: &str) -> Option<&HashSet<String>> {
        self.tables.get(&normalize_value(table))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Resolves view data sources through slices to their tables.
#[derive(Debug, Clone, Default)]
pub struct TableResolver {
    slices: HashMap<String, String>,
}

impl TableResolver {
    pub fn from_slices(slices: &[Slice]) -> Self {
        let mut map = HashMap::new();
        for slice in slices {
            let key = normalize_value(&slice.name);
            let table = slice.source_table.trim();
            if key.is_empty() || table.is_empty() {
                continue;
            }
            map.entry(key).or_insert_with(|| table.to_string());
        }
        Self { slices: map }
    }

    /// The table behind a data source name; unknown names are tables.
    pub fn table_of<'a>(&'a self, data_source: &'a str) -> &'a str {
        self.slices
            .get(&normalize_value(data_source))
            .map(String::as_str)
            .unwrap_or_else(|| data_source.trim())
    }

    pub fn view_table<'a>(&'a self, view: &'a View) -> &'a str {
        self.table_of(view.data_source_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsheet_nav_core::ViewType;

    #[test]
    fn test_slice_resolves_to_source_table() {
        let resolver = TableResolver::from_slices(&[Slice {
            name: "Open Orders".into(),
            source_table: "Order".into(),
            ..Slice::default()
        }]);
        let view = View::new("Open", ViewType::Deck).with_source("open orders");
        assert_eq!(resolver.view_table(&view), "Order");
        assert_eq!(resolver.table_of(" Customer "), "Customer");
    }
}
