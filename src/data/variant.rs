use std::cmp::Ordering;

use chrono::NaiveDateTime;

use super::{strict_ensure, CellKind, NumericFormat, DEFAULT_TIMESTAMP_FORMAT};

/// Tagged-union cell value.
///
/// Exactly one payload is valid per tag. A string payload is exclusively
/// owned: cloning deep-copies the buffer, and moving a variant out with
/// [`std::mem::take`] leaves `Empty` behind. Empty text and the empty state
/// are the same thing; [`Variant::from_text`] never produces a
/// zero-length `String` payload.
#[derive(Debug, Clone, Default)]
pub enum Variant {
    #[default]
    Empty,
    Integer(i32),
    Real(f32),
    Timestamp(NaiveDateTime),
    String(String),
}

impl Variant {
    /// Builds a string variant, normalizing empty text to `Empty`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Variant::Empty
        } else {
            Variant::String(text)
        }
    }

    /// The type tag, with `Empty` reporting as `String` so callers can
    /// dispatch on "string-like" without a separate empty case. Use
    /// [`Variant::empty`] to tell the two apart.
    pub fn kind(&self) -> CellKind {
        match self {
            Variant::Empty | Variant::String(_) => CellKind::String,
            Variant::Integer(_) => CellKind::Integer,
            Variant::Real(_) => CellKind::Real,
            Variant::Timestamp(_) => CellKind::Timestamp,
        }
    }

    pub fn empty(&self) -> bool {
        match self {
            Variant::Empty => true,
            Variant::String(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Extracts the integer payload. Calling this on any other tag is a
    /// logic error.
    pub fn integer(&self) -> i32 {
        match self {
            Variant::Integer(value) => *value,
            other => panic!("integer() called on a {:?} variant", other.kind()),
        }
    }

    /// Extracts the real payload. Calling this on any other tag is a logic
    /// error.
    pub fn real(&self) -> f32 {
        match self {
            Variant::Real(value) => *value,
            other => panic!("real() called on a {:?} variant", other.kind()),
        }
    }

    /// Extracts the timestamp payload. Calling this on any other tag is a
    /// logic error.
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            Variant::Timestamp(value) => *value,
            other => panic!("timestamp() called on a {:?} variant", other.kind()),
        }
    }

    /// Renders the active payload as text. String payloads come back
    /// verbatim, reals honor the configured decimal point, timestamps use
    /// [`DEFAULT_TIMESTAMP_FORMAT`].
    pub fn string(&self, format: &NumericFormat) -> String {
        match self {
            Variant::Empty => String::new(),
            Variant::String(text) => text.clone(),
            Variant::Integer(value) => value.to_string(),
            Variant::Real(value) => format.format_real(*value),
            Variant::Timestamp(value) => value.format(DEFAULT_TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Three-way comparison. Both operands must carry the same kind;
    /// comparing across kinds is a logic error. Empty compares equal to
    /// empty and lexicographically against strings (as `""`).
    pub fn compare(lhs: &Variant, rhs: &Variant) -> Ordering {
        strict_ensure!(
            lhs.kind() == rhs.kind(),
            "can only compare like variant kinds: {:?} vs {:?}",
            lhs.kind(),
            rhs.kind()
        );
        match (lhs, rhs) {
            (Variant::Integer(a), Variant::Integer(b)) => a.cmp(b),
            (Variant::Real(a), Variant::Real(b)) => a.total_cmp(b),
            (Variant::Timestamp(a), Variant::Timestamp(b)) => a.cmp(b),
            (a, b) => a.text().cmp(b.text()),
        }
    }

    // Borrowed text for the string-like kinds; non-strings read as empty.
    fn text(&self) -> &str {
        match self {
            Variant::String(text) => text,
            _ => "",
        }
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Integer(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Variant::Real(value)
    }
}

impl From<NaiveDateTime> for Variant {
    fn from(value: NaiveDateTime) -> Self {
        Variant::Timestamp(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::from_text(value)
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::from_text(value)
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        Variant::compare(self, other) == Ordering::Equal
    }
}

impl PartialOrd for Variant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Variant::compare(self, other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fmt() -> NumericFormat {
        NumericFormat::default()
    }

    #[test]
    fn empty_text_is_the_empty_state() {
        let v = Variant::from_text("");
        assert!(v.empty());
        assert_eq!(v.kind(), CellKind::String);
        assert_eq!(v.string(&fmt()), "");
        assert_eq!(v, Variant::Empty);
    }

    #[test]
    fn move_leaves_empty_behind() {
        let mut a = Variant::from_text("hello");
        let b = std::mem::take(&mut a);
        assert!(a.empty());
        assert_eq!(b.string(&fmt()), "hello");
    }

    #[test]
    fn clone_is_a_deep_copy() {
        let a = Variant::from_text("payload");
        let b = a.clone();
        drop(a);
        assert_eq!(b.string(&fmt()), "payload");

        // repeated clone/drop cycles must not disturb the survivor
        let c = b.clone();
        let d = c.clone();
        drop(c);
        drop(b);
        assert_eq!(d.string(&fmt()), "payload");
    }

    #[test]
    fn kind_normalizes_empty_to_string() {
        assert_eq!(Variant::Empty.kind(), CellKind::String);
        assert_eq!(Variant::from(12).kind(), CellKind::Integer);
        assert_eq!(Variant::from(1.5f32).kind(), CellKind::Real);
        assert!(!Variant::from(12).empty());
    }

    #[test]
    fn compare_like_kinds() {
        assert_eq!(
            Variant::compare(&Variant::from(1), &Variant::from(2)),
            Ordering::Less
        );
        assert_eq!(
            Variant::compare(&Variant::from(2.5f32), &Variant::from(2.5f32)),
            Ordering::Equal
        );
        assert_eq!(
            Variant::compare(&Variant::from("b"), &Variant::from("a")),
            Ordering::Greater
        );
        assert_eq!(
            Variant::compare(&Variant::Empty, &Variant::Empty),
            Ordering::Equal
        );
        // empty sorts before any non-empty string
        assert_eq!(
            Variant::compare(&Variant::Empty, &Variant::from("a")),
            Ordering::Less
        );

        let early = NaiveDate::from_ymd_opt(2009, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let late = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(
            Variant::compare(&Variant::from(early), &Variant::from(late)),
            Ordering::Less
        );
    }

    #[test]
    #[should_panic(expected = "like variant kinds")]
    fn compare_across_kinds_panics() {
        Variant::compare(&Variant::from(1), &Variant::from("1"));
    }

    #[test]
    #[should_panic(expected = "integer() called")]
    fn integer_accessor_on_string_panics() {
        Variant::from_text("abc").integer();
    }

    #[test]
    fn string_rendering() {
        assert_eq!(Variant::from(-42).string(&fmt()), "-42");
        assert_eq!(Variant::from(12.5f32).string(&fmt()), "12.5");
        assert_eq!(
            Variant::from(12.5f32).string(&NumericFormat::new(',')),
            "12,5"
        );

        let ts = NaiveDate::from_ymd_opt(2015, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        assert_eq!(Variant::from(ts).string(&fmt()), "2015-03-14 09:26:53");
    }
}
