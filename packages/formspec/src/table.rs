//! Tabular widget state.
//!
//! The real tabular display is a collaborator; this is the slice of its state
//! the dialog core must own: rows, selection, scroll position, the dynamic
//! data snapshot carried across regenerations, and the opaque event string a
//! submit reports.

use crate::text::{split_escaped, unescape};


/// Scroll/selection state preserved across a regeneration, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicData {
    /// One-based selected row, 0 for none.
    pub selected: usize,
    pub scroll: i32,
}

/// Column description from `tablecolumns[]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableColumn {
    pub ty: String,
    pub options: Vec<(String, String)>,
}

/// Table-wide option from `tableoptions[]`, a `key=value` pair.
pub fn split_option(s: &str) -> (String, String) {
    match s.split_once('=') {
        Some((k, v)) => (k.to_owned(), v.to_owned()),
        None => (s.to_owned(), String::new()),
    }
}

/// Live state of one `table[]`/`textlist[]` element.
#[derive(Debug, Clone, Default)]
pub struct TableState {
    pub options: Vec<(String, String)>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<String>,
    /// One-based selected row, 0 for none.
    selected: usize,
    scroll: i32,
    // event description pending for the next submit
    event: Option<String>,
}

impl TableState {
    /// Build from `textlist[]`-style flat rows: one implicit text column.
    pub fn text_rows(rows: Vec<String>) -> Self {
        TableState { rows, ..Self::default() }
    }

    /// Split a `table[]` cell list into rows, one row per column group.
    pub fn set_cells(&mut self, cells: Vec<String>) {
        let per_row = self.columns.len().max(1);
        self.rows = cells
            .chunks(per_row)
            .map(|chunk| chunk.join(","))
            .collect();
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// One-based selection; 0 or out-of-range clears it.
    pub fn set_selected(&mut self, selected: usize) {
        self.selected = if selected >= 1 && selected <= self.rows.len() {
            selected
        } else {
            0
        };
    }

    pub fn dynamic_data(&self) -> DynamicData {
        DynamicData { selected: self.selected, scroll: self.scroll }
    }

    pub fn set_dynamic_data(&mut self, data: DynamicData) {
        self.set_selected(data.selected);
        self.scroll = data.scroll;
    }

    /// Record a user click on a one-based row, marking a pending `CHG` event
    /// (or `DCL` for the second click of a double click).
    pub fn row_clicked(&mut self, row: usize, double: bool) {
        self.set_selected(row);
        if self.selected != 0 {
            let tag = if double { "DCL" } else { "CHG" };
            self.event = Some(format!("{}:{}", tag, self.selected));
        }
    }

    /// Consume the pending event description; `INV` when there is none.
    pub fn take_event(&mut self) -> String {
        self.event.take().unwrap_or_else(|| "INV".to_owned())
    }
}

/// Parse a `tablecolumns[]` body into column descriptions.
pub fn parse_columns(body: &str) -> Vec<TableColumn> {
    split_escaped(body, ';').iter()
        .map(|part| {
            let col_parts = split_escaped(part, ',');
            let mut column = TableColumn::default();
            if let Some(ty) = col_parts.first() {
                column.ty = ty.clone();
            }
            column.options = col_parts[1.min(col_parts.len())..].iter()
                .map(|opt| split_option(&unescape(opt)))
                .collect();
            column
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_bounds() {
        let mut table = TableState::text_rows(vec!["a".into(), "b".into()]);
        table.set_selected(2);
        assert_eq!(table.selected(), 2);
        table.set_selected(3);
        assert_eq!(table.selected(), 0);
    }

    #[test]
    fn events_are_one_shot() {
        let mut table = TableState::text_rows(vec!["a".into(), "b".into()]);
        table.row_clicked(1, false);
        assert_eq!(table.take_event(), "CHG:1");
        assert_eq!(table.take_event(), "INV");
        table.row_clicked(2, true);
        assert_eq!(table.take_event(), "DCL:2");
    }

    #[test]
    fn dynamic_data_round_trip() {
        let mut table = TableState::text_rows(vec!["a".into(), "b".into(), "c".into()]);
        table.row_clicked(3, false);
        let data = table.dynamic_data();
        let mut rebuilt = TableState::text_rows(vec!["a".into(), "b".into(), "c".into()]);
        rebuilt.set_dynamic_data(data);
        assert_eq!(rebuilt.selected(), 3);
    }

    #[test]
    fn cells_group_by_columns() {
        let mut table = TableState::default();
        table.columns = parse_columns("text;text");
        table.set_cells(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(table.rows, vec!["a,b".to_owned(), "c,d".to_owned()]);
    }
}
