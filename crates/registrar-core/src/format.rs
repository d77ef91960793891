//! Textual identifier formats.
//!
//! Three identifier shapes are issued by the system:
//!
//! | Kind | Shape | Example |
//! |------|-------|---------|
//! | User matricule | `{prefix}{yy}{seq:03}` | `PROF26001` |
//! | Student matricule | `{school3}STU{yy}{seq:03}` | `ECOSTU26001` |
//! | Registration number | `REG-{school2}-{yyyy}-{seq:03}` | `REG-TG-2026-001` |
//!
//! Everything in this module is pure. Parsing returns `Option` rather than an
//! error so callers decide whether a mismatch is fatal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use utoipa::ToSchema;

/// Width of the zero-padded sequence component.
pub const SEQUENCE_WIDTH: usize = 3;
/// Highest sequence representable in [`SEQUENCE_WIDTH`] digits.
pub const MAX_SEQUENCE: u32 = 999;

pub const STUDENT_MARKER: &str = "STU";
pub const REGISTRATION_PREFIX: &str = "REG";

pub const DEFAULT_STUDENT_SCHOOL_CODE: &str = "ECO";
pub const DEFAULT_REGISTRATION_SCHOOL_CODE: &str = "TG";

pub const STUDENT_SCHOOL_CODE_WIDTH: usize = 3;
pub const REGISTRATION_SCHOOL_CODE_WIDTH: usize = 2;

/// Filler for school codes shorter than their slot.
const SCHOOL_CODE_PADDING: char = 'X';

static USER_MATRICULE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{3,5})(\d{2})(\d{3})$").expect("user matricule regex is valid")
});

static STUDENT_MATRICULE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{3})STU(\d{2})(\d{3})$").expect("student matricule regex is valid")
});

static REGISTRATION_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^REG-([A-Z]{2,4})-(\d{4})-(\d{3})$").expect("registration number regex is valid")
});

/// The components of a user matricule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParsedMatricule {
    /// Role prefix, e.g. `PROF`.
    pub prefix: String,
    /// Four-digit year, e.g. `2026`.
    pub year: String,
    pub sequence: u32,
}

/// Which identifier shape a string has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    UserMatricule,
    StudentMatricule,
    RegistrationNumber,
}

impl IdentifierKind {
    /// Classify an identifier by shape. The three shapes are disjoint.
    pub fn detect(value: &str) -> Option<Self> {
        if is_valid_user_matricule(value) {
            Some(Self::UserMatricule)
        } else if is_valid_student_matricule(value) {
            Some(Self::StudentMatricule)
        } else if is_valid_registration_number(value) {
            Some(Self::RegistrationNumber)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserMatricule => "user_matricule",
            Self::StudentMatricule => "student_matricule",
            Self::RegistrationNumber => "registration_number",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last two digits of `year`, zero padded (`2026` → `"26"`, `2005` → `"05"`).
pub fn two_digit_year(year: i32) -> String {
    format!("{:02}", year.rem_euclid(100))
}

/// Four-digit year (`2026` → `"2026"`).
pub fn four_digit_year(year: i32) -> String {
    format!("{:04}", year)
}

/// Normalize a caller-supplied school code to a fixed-width slot.
///
/// Keeps ASCII letters only, upper-cases them, truncates to `width` and pads
/// with `X`. A missing or letter-less code yields `default`.
pub fn normalize_school_code(code: Option<&str>, width: usize, default: &str) -> String {
    let letters: String = code
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .take(width)
        .collect();

    if letters.is_empty() {
        return default.to_string();
    }

    let mut normalized = letters;
    while normalized.len() < width {
        normalized.push(SCHOOL_CODE_PADDING);
    }
    normalized
}

/// School code slot of a student matricule (`"Lomé"` → `"LOM"`, none → `"ECO"`).
pub fn student_school_code(code: Option<&str>) -> String {
    normalize_school_code(
        code,
        STUDENT_SCHOOL_CODE_WIDTH,
        DEFAULT_STUDENT_SCHOOL_CODE,
    )
}

/// School code slot of a registration number (`"ECOL"` → `"EC"`, none → `"TG"`).
pub fn registration_school_code(code: Option<&str>) -> String {
    normalize_school_code(
        code,
        REGISTRATION_SCHOOL_CODE_WIDTH,
        DEFAULT_REGISTRATION_SCHOOL_CODE,
    )
}

/// `PROF` + `26` + `1` → `PROF26001`.
pub fn format_user_matricule(prefix: &str, year_two_digit: &str, sequence: u32) -> String {
    format!(
        "{}{}",
        user_scope_prefix(prefix, year_two_digit),
        pad_sequence(sequence)
    )
}

/// `Some("Lomé")` + `26` + `1` → `LOMSTU26001`.
pub fn format_student_matricule(
    school_code: Option<&str>,
    year_two_digit: &str,
    sequence: u32,
) -> String {
    format!(
        "{}{}",
        student_scope_prefix(&student_school_code(school_code), year_two_digit),
        pad_sequence(sequence)
    )
}

/// `Some("TG")` + `2026` + `1` → `REG-TG-2026-001`.
pub fn format_registration_number(
    school_code: Option<&str>,
    year_four_digit: &str,
    sequence: u32,
) -> String {
    format!(
        "{}{}",
        registration_scope_prefix(&registration_school_code(school_code), year_four_digit),
        pad_sequence(sequence)
    )
}

/// Common leading text of every user matricule in a (prefix, year) scope.
pub fn user_scope_prefix(prefix: &str, year_two_digit: &str) -> String {
    format!("{prefix}{year_two_digit}")
}

/// Common leading text of every student matricule in a (school, year) scope.
pub fn student_scope_prefix(school_code: &str, year_two_digit: &str) -> String {
    format!("{school_code}{STUDENT_MARKER}{year_two_digit}")
}

/// Common leading text of every registration number in a (school, year) scope.
pub fn registration_scope_prefix(school_code: &str, year_four_digit: &str) -> String {
    format!("{REGISTRATION_PREFIX}-{school_code}-{year_four_digit}-")
}

/// Sequences above [`MAX_SEQUENCE`] widen rather than wrap.
fn pad_sequence(sequence: u32) -> String {
    format!("{:0width$}", sequence, width = SEQUENCE_WIDTH)
}

/// Split a user matricule into prefix, four-digit year and sequence.
///
/// Returns `None` if `identifier` is not shaped like `^[A-Z]{3,5}\d{2}\d{3}$`.
pub fn parse(identifier: &str) -> Option<ParsedMatricule> {
    let captures = USER_MATRICULE_REGEX.captures(identifier)?;
    let prefix = captures.get(1)?.as_str();
    let year = captures.get(2)?.as_str();
    let sequence = captures.get(3)?.as_str().parse().ok()?;

    Some(ParsedMatricule {
        prefix: prefix.to_string(),
        year: format!("20{year}"),
        sequence,
    })
}

pub fn is_valid_user_matricule(value: &str) -> bool {
    USER_MATRICULE_REGEX.is_match(value)
}

pub fn is_valid_student_matricule(value: &str) -> bool {
    STUDENT_MATRICULE_REGEX.is_match(value)
}

pub fn is_valid_registration_number(value: &str) -> bool {
    REGISTRATION_NUMBER_REGEX.is_match(value)
}

/// Whether `value` has any of the three identifier shapes.
pub fn is_valid_format(value: &str) -> bool {
    IdentifierKind::detect(value).is_some()
}
