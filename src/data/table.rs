use std::ops::{Index, IndexMut};

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

use super::column::Column;
use super::{strict_ensure, TableError};

/// An ordered collection of named columns forming a rectangular dataset.
///
/// The table exclusively owns its columns. Row-oriented operations apply to
/// every column, so a table is never observable with columns of different
/// lengths; the per-column work is fanned out over Rayon since no two tasks
/// touch the same column.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of rows. Columns are kept equal-length, so the first one
    /// speaks for all.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn item(&self, column: usize) -> &Column {
        &self.columns[column]
    }

    pub fn item_mut(&mut self, column: usize) -> &mut Column {
        &mut self.columns[column]
    }

    /// Index of the first column whose header matches `name`.
    pub fn get_column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|column| column.header() == name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        Ok(&self.columns[self.get_column_index(name)?])
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, TableError> {
        let index = self.get_column_index(name)?;
        Ok(&mut self.columns[index])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Column> {
        self.columns.iter_mut()
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<Column> {
        &mut self.columns
    }

    /// Removes a whole column definition.
    pub fn erase_column(&mut self, column: usize) {
        strict_ensure!(
            column < self.columns.len(),
            "erase_column index {} out of range ({} columns)",
            column,
            self.columns.len()
        );
        self.columns.remove(column);
    }

    /// Empties every column, keeping the column definitions.
    pub fn clear(&mut self) {
        for column in &mut self.columns {
            column.clear();
        }
    }

    /// Removes one row from every column.
    pub fn erase_row(&mut self, row: usize) {
        strict_ensure!(
            row < self.rows(),
            "erase_row index {} out of range ({} rows)",
            row,
            self.rows()
        );
        self.columns
            .par_iter_mut()
            .for_each(|column| column.erase_item(row));
    }

    /// Removes a set of rows from every column. Indices may come in any
    /// order and may repeat; they are sorted descending and deduplicated
    /// once, so earlier removals never shift pending ones.
    pub fn erase_rows(&mut self, rows: &[usize]) {
        let mut rows = rows.to_vec();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        strict_ensure!(
            rows.first().is_none_or(|&row| row < self.rows()),
            "erase_rows index {:?} out of range ({} rows)",
            rows.first(),
            self.rows()
        );
        self.columns
            .par_iter_mut()
            .for_each(|column| column.erase_sorted_desc(&rows));
    }

    /// Removes every row the predicate selects, scanning last to first so
    /// indices not yet visited stay valid while rows disappear.
    pub fn erase_rows_if(&mut self, predicate: impl Fn(usize, &Table) -> bool) {
        for row in (0..self.rows()).rev() {
            if predicate(row, self) {
                self.erase_row(row);
            }
        }
    }
}

impl Index<usize> for Table {
    type Output = Column;

    fn index(&self, column: usize) -> &Column {
        &self.columns[column]
    }
}

impl IndexMut<usize> for Table {
    fn index_mut(&mut self, column: usize) -> &mut Column {
        &mut self.columns[column]
    }
}

impl Index<&str> for Table {
    type Output = Column;

    fn index(&self, name: &str) -> &Column {
        match self.column(name) {
            Ok(column) => column,
            Err(_) => panic!("missing column: {name}"),
        }
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
