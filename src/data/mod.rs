use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

pub mod cell;
pub mod column;
pub mod parser;
pub mod table;
pub mod variant;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data in source: {0}")]
    EmptySource(PathBuf),

    #[error("could not convert {value:?} to a number")]
    NumberParse { value: String },

    #[error("could not convert {value:?} to a timestamp with format {format:?}")]
    TimestampParse {
        value: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("missing column: {0}")]
    MissingColumn(String),
}

/// Timestamp format used when the caller does not supply one.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The type tag of a cell value.
///
/// `EmptyString` is the "no value" state. [`Variant::kind`] normalizes it to
/// `String` so downstream dispatch can treat empty cells as string-like;
/// emptiness itself is queried through `empty()`.
///
/// [`Variant::kind`]: crate::data::variant::Variant::kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    EmptyString,
    Integer,
    Real,
    String,
    Timestamp,
}

impl CellKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, CellKind::Integer | CellKind::Real)
    }
}

/// Caller-owned numeric formatting context.
///
/// Replaces locale lookups with the two facts the engine actually needs:
/// which byte is the decimal point, and how to render reals back out.
/// Threaded explicitly through inference, parsing and formatting, so there
/// is no hidden global locale state.
#[derive(Debug, Clone)]
pub struct NumericFormat {
    decimal_point: u8,
}

impl NumericFormat {
    pub fn new(decimal_point: char) -> Self {
        assert!(
            decimal_point.is_ascii() && !decimal_point.is_ascii_digit(),
            "decimal point must be a non-digit ASCII character"
        );
        Self {
            decimal_point: decimal_point as u8,
        }
    }

    pub fn decimal_point(&self) -> u8 {
        self.decimal_point
    }

    /// Rewrites the configured decimal point to `.` so the text can be fed
    /// to a float parser.
    pub(crate) fn normalize<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.decimal_point == b'.' {
            Cow::Borrowed(text)
        } else {
            Cow::Owned(text.replace(self.decimal_point as char, "."))
        }
    }

    pub fn format_real(&self, value: f32) -> String {
        let text = value.to_string();
        if self.decimal_point == b'.' {
            text
        } else {
            text.replace('.', &(self.decimal_point as char).to_string())
        }
    }
}

impl Default for NumericFormat {
    fn default() -> Self {
        Self { decimal_point: b'.' }
    }
}

// Precondition checks that compile down to nothing in release builds unless
// the `strict` feature keeps them on.
macro_rules! strict_ensure {
    ($cond:expr, $($arg:tt)+) => {
        if cfg!(any(debug_assertions, feature = "strict")) && !($cond) {
            panic!($($arg)+);
        }
    };
}
pub(crate) use strict_ensure;
