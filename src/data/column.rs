use std::ops::{Index, IndexMut};

use super::cell::DataCell;
use super::{strict_ensure, NumericFormat, TableError};

/// One named, ordered sequence of cells spanning all rows.
///
/// Insertion order is row order. The `hidden` flag is set during header
/// filtering; hidden columns keep consuming their slot while a parse is in
/// flight and are dropped afterwards.
#[derive(Debug, Clone, Default)]
pub struct Column {
    cells: Vec<DataCell>,
    header: String,
    hidden: bool,
}

impl Column {
    pub fn new(header: impl Into<String>) -> Self {
        Column {
            cells: Vec::new(),
            header: header.into(),
            hidden: false,
        }
    }

    pub fn append(&mut self, cell: DataCell) {
        self.cells.push(cell);
    }

    /// Removes the cell at `pos`. Erasing past the end is a logic error.
    pub fn erase_item(&mut self, pos: usize) {
        strict_ensure!(
            pos < self.cells.len(),
            "erase_item position {} out of range ({} cells)",
            pos,
            self.cells.len()
        );
        self.cells.remove(pos);
    }

    /// Removes a set of cells. Indices may come in any order and may
    /// repeat; removal happens highest-first so earlier removals cannot
    /// shift indices that are still pending.
    pub fn erase_items(&mut self, rows: &[usize]) {
        let mut rows = rows.to_vec();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        self.erase_sorted_desc(&rows);
    }

    // `rows` must be sorted descending and deduplicated.
    pub(crate) fn erase_sorted_desc(&mut self, rows: &[usize]) {
        for &row in rows {
            self.erase_item(row);
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn set_header(&mut self, header: impl Into<String>) {
        self.header = header.into();
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn get(&self, pos: usize) -> Option<&DataCell> {
        self.cells.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut DataCell> {
        self.cells.get_mut(pos)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataCell> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Releases excess reserved capacity after bulk loading.
    pub fn shrink_to_fit(&mut self) {
        self.cells.shrink_to_fit();
    }

    /// Re-parses every cell as a timestamp with the given chrono format.
    /// With `nullable`, empty cells stay empty; otherwise they must parse
    /// like any other. The first failure propagates and leaves the column
    /// partially converted.
    pub fn convert_to_timestamp(&mut self, nullable: bool, format: &str) -> Result<(), TableError> {
        let text_format = NumericFormat::default();
        for cell in &mut self.cells {
            if nullable && cell.empty() {
                continue;
            }
            let text = cell.to_string(&text_format);
            *cell = DataCell::from_time_string(&text, format)?;
        }
        Ok(())
    }
}

impl Index<usize> for Column {
    type Output = DataCell;

    fn index(&self, pos: usize) -> &DataCell {
        &self.cells[pos]
    }
}

impl IndexMut<usize> for Column {
    fn index_mut(&mut self, pos: usize) -> &mut DataCell {
        &mut self.cells[pos]
    }
}

impl<'a> IntoIterator for &'a Column {
    type Item = &'a DataCell;
    type IntoIter = std::slice::Iter<'a, DataCell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CellKind;

    fn int_column(values: &[i32]) -> Column {
        let mut column = Column::new("numbers");
        for &value in values {
            column.append(DataCell::from(value));
        }
        column
    }

    #[test]
    fn append_and_erase() {
        let mut column = int_column(&[1, 2, 3]);
        assert_eq!(column.len(), 3);
        column.erase_item(1);
        assert_eq!(column.len(), 2);
        assert_eq!(column[0].integer(), 1);
        assert_eq!(column[1].integer(), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn erase_past_the_end_panics() {
        int_column(&[1]).erase_item(1);
    }

    #[test]
    fn erase_items_handles_unsorted_duplicates() {
        let mut column = int_column(&[10, 20, 30, 40, 50]);
        column.erase_items(&[3, 0, 3]);
        let left: Vec<i32> = column.iter().map(DataCell::integer).collect();
        assert_eq!(left, vec![20, 30, 50]);
    }

    #[test]
    fn header_and_hidden() {
        let mut column = Column::new("original");
        assert_eq!(column.header(), "original");
        assert!(!column.hidden());
        column.set_header("renamed");
        column.set_hidden(true);
        assert_eq!(column.header(), "renamed");
        assert!(column.hidden());
    }

    #[test]
    fn convert_to_timestamp() {
        let mut column = Column::new("when");
        column.append(DataCell::from("2015-03-14 09:26:53"));
        column.append(DataCell::new());
        column.append(DataCell::from("2016-01-02 03:04:05"));

        column.convert_to_timestamp(true, "").unwrap();
        assert_eq!(column[0].kind(), CellKind::Timestamp);
        assert!(column[1].empty());
        assert_eq!(column[2].kind(), CellKind::Timestamp);

        let mut bad = Column::new("when");
        bad.append(DataCell::from("not a date"));
        assert!(bad.convert_to_timestamp(true, "").is_err());
    }
}
