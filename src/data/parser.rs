use std::borrow::Cow;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::warn;
use memchr::{memchr, memchr3};
use memmap2::Mmap;

use super::cell::DataCell;
use super::column::Column;
use super::table::Table;
use super::{strict_ensure, NumericFormat, TableError};

const DELIMITER: u8 = b',';
const QUOTE: u8 = b'"';

// space, form feed, newline, carriage return, tab, vertical tab
const TRIM_SET: &[u8] = b" \x0C\n\r\t\x0B";

// Progress is rate-limited by bytes scanned; a debug binary is slow enough
// to warrant a much shorter cadence.
#[cfg(debug_assertions)]
const PROGRESS_INTERVAL: usize = 256 * 1024;
#[cfg(not(debug_assertions))]
const PROGRESS_INTERVAL: usize = 5 * 1024 * 1024;

/// Parameters for [`parse_csv_data`].
///
/// `header_row` is the zero-based file row whose cells name the columns;
/// rows before it are discarded. The column filter keeps a column when it
/// returns true. The progress callback receives human-readable status lines
/// at a byte cadence during the scan; supplying or omitting it never
/// changes the parsed result.
pub struct CsvParams<'a> {
    path: PathBuf,
    header_row: usize,
    numeric_format: NumericFormat,
    column_filter: Option<Box<dyn Fn(&str) -> bool + 'a>>,
    progress_cb: Option<Box<dyn FnMut(&str) + 'a>>,
}

impl<'a> CsvParams<'a> {
    pub fn new(path: impl AsRef<Path>) -> Self {
        CsvParams {
            path: path.as_ref().to_path_buf(),
            header_row: 0,
            numeric_format: NumericFormat::default(),
            column_filter: None,
            progress_cb: None,
        }
    }

    pub fn header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    pub fn numeric_format(mut self, format: NumericFormat) -> Self {
        self.numeric_format = format;
        self
    }

    pub fn column_filter(mut self, filter: impl Fn(&str) -> bool + 'a) -> Self {
        self.column_filter = Some(Box::new(filter));
        self
    }

    pub fn progress(mut self, progress_cb: impl FnMut(&str) + 'a) -> Self {
        self.progress_cb = Some(Box::new(progress_cb));
        self
    }
}

/// Parses a CSV file into a [`Table`] using default parameters.
pub fn parse_csv_file(path: impl AsRef<Path>, header_row: usize) -> Result<Table, TableError> {
    parse_csv_data(CsvParams::new(path).header_row(header_row))
}

/// Parses a CSV file into a [`Table`].
///
/// The file is memory-mapped and scanned exactly once. A missing or
/// unreadable file, a zero-length file, or any conversion failure mid-scan
/// aborts the whole parse; a partial table is never returned.
pub fn parse_csv_data(params: CsvParams<'_>) -> Result<Table, TableError> {
    let file = File::open(&params.path)?;
    // Safety: the map is read-only and private to this parse call.
    let mmap = unsafe { Mmap::map(&file)? };
    if mmap.is_empty() {
        return Err(TableError::EmptySource(params.path.clone()));
    }
    delineate_rows(&mmap, params)
}

/// Counts quote nesting during the scan. A depth counter rather than a
/// boolean, matching the cell-boundary rules: delimiters and newlines are
/// structural only at depth zero.
#[derive(Debug, Default)]
struct QuoteStack(usize);

impl QuoteStack {
    fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn push(&mut self) {
        self.0 += 1;
    }

    fn pop(&mut self) {
        strict_ensure!(self.0 > 0, "tried to pop an empty quote stack");
        self.0 = self.0.saturating_sub(1);
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Lazily-initialized `[first, last]` byte range of the cell being scanned.
/// No bytes are copied until a boundary is reached.
#[derive(Debug, Clone, Copy)]
struct CellSpan {
    first: usize,
    last: usize,
    empty: bool,
}

impl CellSpan {
    fn new() -> Self {
        CellSpan {
            first: 0,
            last: 0,
            empty: true,
        }
    }

    fn append(&mut self, pos: usize) {
        if self.empty {
            self.first = pos;
            self.empty = false;
        }
        self.last = pos;
    }

    fn clear(&mut self) {
        self.empty = true;
    }

    fn is_empty(&self) -> bool {
        self.empty
    }

    fn as_slice<'b>(&self, buffer: &'b [u8]) -> &'b [u8] {
        if self.empty {
            &[]
        } else {
            &buffer[self.first..=self.last]
        }
    }
}

fn trim(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !TRIM_SET.contains(first) {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !TRIM_SET.contains(last) {
            break;
        }
        bytes = rest;
    }
    bytes
}

// Strips one surrounding quote pair, and only when both boundary bytes are
// quotes; a lone leading or trailing quote stays.
fn dequote(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= 2 && bytes[0] == QUOTE && bytes[bytes.len() - 1] == QUOTE {
        &bytes[1..bytes.len() - 1]
    } else {
        bytes
    }
}

// Collapses every "" pair to a single quote.
fn unescape_quotes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut n = 0;
    while n < bytes.len() {
        out.push(bytes[n]);
        if bytes[n] == QUOTE && n + 1 < bytes.len() && bytes[n + 1] == QUOTE {
            n += 2;
        } else {
            n += 1;
        }
    }
    out
}

fn clean_cell_text(raw: &[u8], had_escape: bool) -> Cow<'_, str> {
    let bytes = dequote(trim(raw));
    if had_escape {
        let unescaped = unescape_quotes(bytes);
        Cow::Owned(String::from_utf8_lossy(&unescaped).into_owned())
    } else {
        String::from_utf8_lossy(bytes)
    }
}

// Builds the table as cell boundaries arrive from the scan loop.
struct CellSink<'a, 'buf> {
    buffer: &'buf [u8],
    header_row: usize,
    numeric_format: NumericFormat,
    column_filter: Option<Box<dyn Fn(&str) -> bool + 'a>>,
    table: Table,
    row: usize,
    column: usize,
}

impl CellSink<'_, '_> {
    fn flush_cell(&mut self, span: &CellSpan, had_escape: bool) -> Result<(), TableError> {
        if self.row < self.header_row {
            return Ok(());
        }

        // Grow until the referenced column exists.
        while self.table.len() <= self.column {
            self.table.append(Column::default());
        }

        let text = clean_cell_text(span.as_slice(self.buffer), had_escape);
        let column = self.table.item_mut(self.column);

        if self.row == self.header_row {
            let hidden = match &self.column_filter {
                Some(filter) => !filter(&text),
                None => false,
            };
            column.set_hidden(hidden);
            column.set_header(text.into_owned());
        } else if !column.hidden() {
            column.append(DataCell::from_string(&text, &self.numeric_format)?);
        }

        self.column += 1;
        Ok(())
    }

    fn end_row(&mut self) {
        self.column = 0;
        self.row += 1;
    }

    fn into_table(self) -> Table {
        let mut table = self.table;
        if self.column_filter.is_some() {
            table.columns_mut().retain(|column| !column.hidden());
        }
        table
    }
}

/// Separates the mapped bytes into cells and rows: a single forward pass,
/// no backtracking, hopping between structural bytes with memchr.
fn delineate_rows(buffer: &[u8], params: CsvParams<'_>) -> Result<Table, TableError> {
    let CsvParams {
        path: _,
        header_row,
        numeric_format,
        column_filter,
        mut progress_cb,
    } = params;

    let file_size = buffer.len();
    let started = Instant::now();
    let mut next_progress_at = PROGRESS_INTERVAL;

    let mut sink = CellSink {
        buffer,
        header_row,
        numeric_format,
        column_filter,
        table: Table::new(),
        row: 0,
        column: 0,
    };

    let mut cell = CellSpan::new();
    let mut quotes = QuoteStack::default();
    // Set right after a quote closed a region; the next byte being another
    // quote means the pair was an escaped literal quote.
    let mut prev_quote = false;
    let mut had_escape = false;

    let mut pos = 0;
    while pos < file_size {
        let byte = buffer[pos];

        if byte == QUOTE {
            if prev_quote {
                cell.append(pos);
                quotes.push();
                prev_quote = false;
                had_escape = true;
            } else if quotes.is_empty() {
                cell.append(pos);
                quotes.push();
            } else {
                cell.append(pos);
                quotes.pop();
                prev_quote = true;
            }
            pos += 1;
        } else if (byte == DELIMITER || byte == b'\n') && quotes.is_empty() {
            sink.flush_cell(&cell, had_escape)?;
            cell.clear();
            quotes.reset();
            prev_quote = false;
            had_escape = false;
            if byte == b'\n' {
                sink.end_row();
            }
            pos += 1;
        } else {
            // Plain content, including delimiters and newlines at quote
            // depth > 0. The current byte is never structural here, so the
            // hop is at least one byte and the loop always advances.
            prev_quote = false;
            let window = &buffer[pos..];
            let hop = if quotes.is_empty() {
                memchr3(QUOTE, DELIMITER, b'\n', window)
            } else {
                memchr(QUOTE, window)
            }
            .unwrap_or(window.len());
            cell.append(pos);
            cell.append(pos + hop - 1);
            pos += hop;
        }

        if pos >= next_progress_at {
            if let Some(progress_cb) = progress_cb.as_deref_mut() {
                display_progress(progress_cb, file_size, pos, started);
            }
            next_progress_at += PROGRESS_INTERVAL;
        }
    }

    // A final cell not terminated by a newline still counts.
    if !cell.is_empty() || sink.column > 0 {
        sink.flush_cell(&cell, had_escape)?;
    }

    if let Some(progress_cb) = progress_cb.as_deref_mut() {
        progress_cb("Loading CSV data... processing");
    }

    let mut table = sink.into_table();
    rectangularize(&mut table);
    Ok(table)
}

// Pads short columns with empty cells up to the longest column, then
// releases excess capacity. A repair, not a failure.
fn rectangularize(table: &mut Table) {
    let max_rows = table.iter().map(Column::len).max().unwrap_or(0);
    for column in table.iter_mut() {
        let missing = max_rows - column.len();
        if missing > 0 {
            warn!(
                "column {:?} was missing {} cells; padding with empty cells",
                column.header(),
                missing
            );
            for _ in 0..missing {
                column.append(DataCell::new());
            }
        }
        column.shrink_to_fit();
    }
}

fn human_bytes(value: f64) -> (f64, char) {
    for (exponent, postfix) in [(50, 'P'), (40, 'T'), (30, 'G'), (20, 'M'), (10, 'K')] {
        let divisor = f64::powi(2.0, exponent);
        if value >= divisor {
            return (value / divisor, postfix);
        }
    }
    (value, ' ')
}

fn display_progress(
    progress_cb: &mut dyn FnMut(&str),
    file_size: usize,
    file_pos: usize,
    started: Instant,
) {
    let elapsed = started.elapsed().as_secs_f64();
    if elapsed < 1.0 {
        return;
    }

    let (done, done_unit) = human_bytes(file_pos as f64);
    let (total, total_unit) = human_bytes(file_size as f64);
    let rate = file_pos as f64 / elapsed;
    let (speed, speed_unit) = human_bytes(rate);
    let seconds_left = (file_size - file_pos) as f64 / rate;

    progress_cb(&format!(
        "Loading CSV data... {done:.2}{done_unit}B of {total:.2}{total_unit}B \
         ({speed:.2}{speed_unit}B/s) {seconds_left:.0}s left"
    ));
}
