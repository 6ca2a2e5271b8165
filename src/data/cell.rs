use std::cmp::Ordering;

use chrono::NaiveDateTime;

use super::variant::Variant;
use super::{CellKind, NumericFormat, TableError, DEFAULT_TIMESTAMP_FORMAT};

/// Comparator selected once per column by [`DataCell::get_compare`] and
/// reused across a whole sort without per-pair dispatch.
pub type CellComparator = fn(&DataCell, &DataCell) -> Ordering;

/// One typed value at a (row, column) position.
///
/// A thin wrapper over [`Variant`] adding text-to-value inference,
/// formatting and ordering. Immutable once constructed except through
/// whole-value assignment.
#[derive(Debug, Clone, Default)]
pub struct DataCell {
    value: Variant,
}

/// Classifies raw text per the engine's inference rules.
///
/// Empty text is `EmptyString`. A single leading `-` is accepted; a second
/// `-`, a decimal point in the final position, a second decimal point, or
/// any non-digit ends the numeric interpretation and yields `String`.
/// Otherwise the text is `Real` when a decimal point was seen and
/// `Integer` when not. Timestamps are never inferred from bare text; they
/// only come from [`DataCell::from_time_string`].
pub fn infer_cell_kind(text: &str, format: &NumericFormat) -> CellKind {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return CellKind::EmptyString;
    }

    let start = usize::from(bytes[0] == b'-');
    let mut has_decimal = false;

    for n in start..bytes.len() {
        let byte = bytes[n];
        if byte == b'-' {
            return CellKind::String;
        } else if byte == format.decimal_point() {
            if has_decimal || n + 1 == bytes.len() {
                return CellKind::String;
            }
            has_decimal = true;
        } else if !byte.is_ascii_digit() {
            return CellKind::String;
        }
    }

    if has_decimal {
        CellKind::Real
    } else {
        CellKind::Integer
    }
}

impl DataCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cell from raw text by running type inference.
    ///
    /// Empty text gives an empty cell. Text that classifies as numeric but
    /// fails conversion (an `i32` overflow, or the bare `-` the scan
    /// accepts) is an error, which aborts a surrounding parse.
    pub fn from_string(text: &str, format: &NumericFormat) -> Result<DataCell, TableError> {
        match infer_cell_kind(text, format) {
            CellKind::EmptyString => Ok(DataCell::new()),
            CellKind::Integer => atoi_simd::parse::<i32>(text.as_bytes())
                .map(DataCell::from)
                .map_err(|_| TableError::NumberParse {
                    value: text.to_string(),
                }),
            CellKind::Real => {
                let normalized = format.normalize(text);
                fast_float::parse::<f32, _>(normalized.as_ref())
                    .map(DataCell::from)
                    .map_err(|_| TableError::NumberParse {
                        value: text.to_string(),
                    })
            }
            CellKind::String => Ok(DataCell::from(text)),
            CellKind::Timestamp => unreachable!("inference never yields timestamps"),
        }
    }

    /// Builds a timestamp cell by parsing `text` with a chrono format
    /// string. Empty text gives an empty cell; an empty format falls back
    /// to [`DEFAULT_TIMESTAMP_FORMAT`]. Unparsable text is an error, not a
    /// silent empty.
    pub fn from_time_string(text: &str, format: &str) -> Result<DataCell, TableError> {
        if text.is_empty() {
            return Ok(DataCell::new());
        }
        let format = if format.is_empty() {
            DEFAULT_TIMESTAMP_FORMAT
        } else {
            format
        };
        NaiveDateTime::parse_from_str(text, format)
            .map(DataCell::from)
            .map_err(|source| TableError::TimestampParse {
                value: text.to_string(),
                format: format.to_string(),
                source,
            })
    }

    pub fn kind(&self) -> CellKind {
        self.value.kind()
    }

    pub fn empty(&self) -> bool {
        self.value.empty()
    }

    pub fn integer(&self) -> i32 {
        self.value.integer()
    }

    pub fn real(&self) -> f32 {
        self.value.real()
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.value.timestamp()
    }

    /// The cell value as a float, valid for integer and real cells only.
    pub fn numeric(&self) -> f32 {
        match &self.value {
            Variant::Integer(value) => *value as f32,
            Variant::Real(value) => *value,
            other => panic!("numeric() called on a {:?} cell", other.kind()),
        }
    }

    pub fn to_string(&self, format: &NumericFormat) -> String {
        self.value.string(format)
    }

    pub fn compare(lhs: &DataCell, rhs: &DataCell) -> Ordering {
        Variant::compare(&lhs.value, &rhs.value)
    }

    pub fn cmp_integer(lhs: &DataCell, rhs: &DataCell) -> Ordering {
        lhs.integer().cmp(&rhs.integer())
    }

    pub fn cmp_real(lhs: &DataCell, rhs: &DataCell) -> Ordering {
        lhs.real().total_cmp(&rhs.real())
    }

    pub fn cmp_timestamp(lhs: &DataCell, rhs: &DataCell) -> Ordering {
        lhs.timestamp().cmp(&rhs.timestamp())
    }

    pub fn cmp_other(lhs: &DataCell, rhs: &DataCell) -> Ordering {
        lhs.to_string(&NumericFormat::default())
            .cmp(&rhs.to_string(&NumericFormat::default()))
    }

    /// Picks the comparator matching the reference cell's kind, so a sort
    /// can select once and reuse it for every pair in a column.
    pub fn get_compare(cell: &DataCell) -> CellComparator {
        match cell.kind() {
            CellKind::Integer => Self::cmp_integer,
            CellKind::Real => Self::cmp_real,
            CellKind::Timestamp => Self::cmp_timestamp,
            CellKind::EmptyString | CellKind::String => Self::cmp_other,
        }
    }
}

impl From<Variant> for DataCell {
    fn from(value: Variant) -> Self {
        DataCell { value }
    }
}

impl From<i32> for DataCell {
    fn from(value: i32) -> Self {
        DataCell {
            value: Variant::from(value),
        }
    }
}

impl From<f32> for DataCell {
    fn from(value: f32) -> Self {
        DataCell {
            value: Variant::from(value),
        }
    }
}

impl From<NaiveDateTime> for DataCell {
    fn from(value: NaiveDateTime) -> Self {
        DataCell {
            value: Variant::from(value),
        }
    }
}

impl From<&str> for DataCell {
    fn from(value: &str) -> Self {
        DataCell {
            value: Variant::from(value),
        }
    }
}

impl From<String> for DataCell {
    fn from(value: String) -> Self {
        DataCell {
            value: Variant::from(value),
        }
    }
}

impl PartialEq for DataCell {
    fn eq(&self, other: &Self) -> bool {
        DataCell::compare(self, other) == Ordering::Equal
    }
}

impl PartialOrd for DataCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(DataCell::compare(self, other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> NumericFormat {
        NumericFormat::default()
    }

    #[test]
    fn inference_grid() {
        let f = fmt();
        assert_eq!(infer_cell_kind("", &f), CellKind::EmptyString);
        assert_eq!(infer_cell_kind("-", &f), CellKind::Integer);
        assert_eq!(infer_cell_kind("123", &f), CellKind::Integer);
        assert_eq!(infer_cell_kind("-123", &f), CellKind::Integer);
        assert_eq!(infer_cell_kind("12.5", &f), CellKind::Real);
        assert_eq!(infer_cell_kind("-.5", &f), CellKind::Real);
        assert_eq!(infer_cell_kind("12.5.6", &f), CellKind::String);
        assert_eq!(infer_cell_kind("12-3", &f), CellKind::String);
        assert_eq!(infer_cell_kind("abc", &f), CellKind::String);
        assert_eq!(infer_cell_kind("12.", &f), CellKind::String);
        assert_eq!(infer_cell_kind("1e5", &f), CellKind::String);
    }

    #[test]
    fn inference_honors_decimal_point() {
        let comma = NumericFormat::new(',');
        assert_eq!(infer_cell_kind("12,5", &comma), CellKind::Real);
        assert_eq!(infer_cell_kind("12.5", &comma), CellKind::String);
    }

    #[test]
    fn from_string_round_trips() {
        let f = fmt();
        for text in ["123", "-123", "0", "12.5", "-0.5"] {
            let cell = DataCell::from_string(text, &f).unwrap();
            assert_eq!(cell.to_string(&f), text, "round-tripping {text:?}");
        }

        let cell = DataCell::from_string("hello world", &f).unwrap();
        assert_eq!(cell.kind(), CellKind::String);
        assert_eq!(cell.to_string(&f), "hello world");

        let cell = DataCell::from_string("", &f).unwrap();
        assert!(cell.empty());
    }

    #[test]
    fn from_string_conversion_failures() {
        let f = fmt();
        // classified integer, but out of i32 range
        assert!(matches!(
            DataCell::from_string("99999999999", &f),
            Err(TableError::NumberParse { .. })
        ));
        // the scan accepts a bare minus, conversion does not
        assert!(matches!(
            DataCell::from_string("-", &f),
            Err(TableError::NumberParse { .. })
        ));
    }

    #[test]
    fn time_string_round_trip() {
        let cell = DataCell::from_time_string("2015-03-14 09:26:53", "").unwrap();
        assert_eq!(cell.kind(), CellKind::Timestamp);
        assert_eq!(cell.to_string(&fmt()), "2015-03-14 09:26:53");

        let cell = DataCell::from_time_string("14/03/2015 09:26", "%d/%m/%Y %H:%M").unwrap();
        assert_eq!(cell.timestamp().format("%Y-%m-%d").to_string(), "2015-03-14");
    }

    #[test]
    fn time_string_edge_cases() {
        assert!(DataCell::from_time_string("", "").unwrap().empty());
        assert!(matches!(
            DataCell::from_time_string("not a date", ""),
            Err(TableError::TimestampParse { .. })
        ));
    }

    #[test]
    fn numeric_accessor() {
        let f = fmt();
        assert_eq!(DataCell::from_string("3", &f).unwrap().numeric(), 3.0);
        assert_eq!(DataCell::from_string("2.5", &f).unwrap().numeric(), 2.5);
    }

    #[test]
    #[should_panic(expected = "numeric() called")]
    fn numeric_on_string_panics() {
        DataCell::from("abc").numeric();
    }

    #[test]
    fn comparator_selection() {
        let f = fmt();
        let reference = DataCell::from_string("10", &f).unwrap();
        let cmp = DataCell::get_compare(&reference);

        let mut cells: Vec<DataCell> = ["3", "1", "2"]
            .iter()
            .map(|t| DataCell::from_string(t, &f).unwrap())
            .collect();
        cells.sort_by(|a, b| cmp(a, b));
        let sorted: Vec<i32> = cells.iter().map(DataCell::integer).collect();
        assert_eq!(sorted, vec![1, 2, 3]);

        let cmp = DataCell::get_compare(&DataCell::from("zebra"));
        assert_eq!(
            cmp(&DataCell::from("apple"), &DataCell::from("banana")),
            Ordering::Less
        );
    }
}
