use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Expiry date of a product batch.
///
/// Carried on optical labels in the compact `YYMMDD` form (AI 17) and in
/// the ISO `YYYY-MM-DD` form everywhere else. Compact years map to
/// `2000 + YY`, so only years 2000–2099 are representable.
///
/// The day is bounded 1–31 without reference to the month's actual length:
/// already-issued labels carry dates like `240231`, and rejecting them on
/// re-scan would orphan existing stock.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExpiryDate {
    year: u16,
    month: u8,
    day: u8,
}

impl ExpiryDate {
    /// Create an expiry date, validating field ranges.
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, TypeError> {
        if !(2000..=2099).contains(&year) {
            return Err(TypeError::InvalidExpiry(format!(
                "year {year} outside representable range 2000-2099"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(TypeError::InvalidExpiry(format!(
                "month {month} outside 1-12"
            )));
        }
        if !(1..=31).contains(&day) {
            return Err(TypeError::InvalidExpiry(format!("day {day} outside 1-31")));
        }
        Ok(Self { year, month, day })
    }

    /// Parse an ISO `YYYY-MM-DD` date.
    pub fn parse_iso(s: &str) -> Result<Self, TypeError> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 || parts[0].len() != 4 || parts[1].len() != 2 || parts[2].len() != 2 {
            return Err(TypeError::InvalidExpiry(format!(
                "expected YYYY-MM-DD, got {s:?}"
            )));
        }
        let year = parse_digits(parts[0])?;
        let month = parse_digits(parts[1])?;
        let day = parse_digits(parts[2])?;
        Self::new(year, month as u8, day as u8)
    }

    /// Parse a compact `YYMMDD` date as carried by AI 17.
    pub fn parse_compact(s: &str) -> Result<Self, TypeError> {
        // All-digit before slicing: a 6-byte input can still hold a
        // multi-byte character, and byte indexing must not split it.
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidExpiry(format!(
                "expected YYMMDD, got {s:?}"
            )));
        }
        let yy = parse_digits(&s[0..2])?;
        let month = parse_digits(&s[2..4])?;
        let day = parse_digits(&s[4..6])?;
        Self::new(2000 + yy, month as u8, day as u8)
    }

    /// ISO `YYYY-MM-DD` form.
    pub fn iso(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// Compact `YYMMDD` form as carried by AI 17.
    pub fn compact(&self) -> String {
        format!("{:02}{:02}{:02}", self.year - 2000, self.month, self.day)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

fn parse_digits(s: &str) -> Result<u16, TypeError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TypeError::InvalidExpiry(format!(
            "non-digit characters in {s:?}"
        )));
    }
    s.parse::<u16>()
        .map_err(|e| TypeError::InvalidExpiry(e.to_string()))
}

impl TryFrom<String> for ExpiryDate {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_iso(&value)
    }
}

impl From<ExpiryDate> for String {
    fn from(value: ExpiryDate) -> Self {
        value.iso()
    }
}

impl fmt::Debug for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExpiryDate({})", self.iso())
    }
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso())
    }
}

/// The (GTIN, lot, expiry) triple that names a batch.
///
/// `gtin14` is the normalized 14-digit GTIN with a verified check digit.
/// Produce identities through `ccl-codec`, which owns padding, check-digit
/// and lot validation; this type carries the already-normalized form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductIdentity {
    pub gtin14: String,
    pub lot: String,
    pub expiry: ExpiryDate,
}

impl ProductIdentity {
    pub fn new(gtin14: impl Into<String>, lot: impl Into<String>, expiry: ExpiryDate) -> Self {
        Self {
            gtin14: gtin14.into(),
            lot: lot.into(),
            expiry,
        }
    }
}

impl fmt::Display for ProductIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.gtin14, self.lot, self.expiry.compact())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_roundtrip() {
        let d = ExpiryDate::parse_iso("2026-05-31").unwrap();
        assert_eq!(d.iso(), "2026-05-31");
        assert_eq!(d.compact(), "260531");
    }

    #[test]
    fn compact_roundtrip() {
        let d = ExpiryDate::parse_compact("240229").unwrap();
        assert_eq!(d.year(), 2024);
        assert_eq!(d.iso(), "2024-02-29");
        assert_eq!(d.compact(), "240229");
    }

    #[test]
    fn day_bound_is_fixed_not_per_month() {
        // Documented relaxation: Feb 31 passes the 1-31 bound.
        let d = ExpiryDate::parse_compact("240231").unwrap();
        assert_eq!(d.iso(), "2024-02-31");
    }

    #[test]
    fn month_zero_rejected() {
        let err = ExpiryDate::parse_compact("240031").unwrap_err();
        assert!(matches!(err, TypeError::InvalidExpiry(_)));
    }

    #[test]
    fn day_32_rejected() {
        assert!(ExpiryDate::parse_compact("240132").is_err());
        assert!(ExpiryDate::parse_iso("2024-01-32").is_err());
    }

    #[test]
    fn non_digits_rejected() {
        assert!(ExpiryDate::parse_compact("24AB31").is_err());
        assert!(ExpiryDate::parse_iso("2024-xx-01").is_err());
    }

    #[test]
    fn multibyte_compact_input_rejected() {
        // 6 bytes, but the second character is 2 bytes wide.
        assert!(matches!(
            ExpiryDate::parse_compact("0é101"),
            Err(TypeError::InvalidExpiry(_))
        ));
    }

    #[test]
    fn year_outside_compact_range_rejected() {
        assert!(ExpiryDate::parse_iso("1999-01-01").is_err());
        assert!(ExpiryDate::parse_iso("2100-01-01").is_err());
    }

    #[test]
    fn serde_as_iso_string() {
        let d = ExpiryDate::parse_iso("2025-12-01").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2025-12-01\"");
        let parsed: ExpiryDate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn identity_display() {
        let id = ProductIdentity::new(
            "09506000134352",
            "LOT42",
            ExpiryDate::parse_compact("261231").unwrap(),
        );
        assert_eq!(format!("{id}"), "09506000134352/LOT42/261231");
    }
}
