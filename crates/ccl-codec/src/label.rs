use ccl_types::{ExpiryDate, ProductIdentity};

use crate::error::CodecError;
use crate::gtin::normalize_gtin;

/// ASCII group separator delimiting variable-length fields in machine form.
const GS: char = '\u{1D}';

/// Symbology identifier prefixes emitted by scanners, stripped before
/// matching the machine form.
const SYMBOLOGY_PREFIXES: [&str; 4] = ["]d2", "]Q3", "]C1", "]e0"];

/// Maximum length for AI 10 (lot) and AI 21 (serial) values.
const MAX_FIELD_LEN: usize = 20;

/// Input fields for [`encode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierFields {
    /// GTIN as 8, 12, 13, or 14 digits.
    pub gtin: String,
    pub lot: String,
    pub expiry: ExpiryDate,
    pub serial: Option<String>,
}

/// A fully encoded product identifier: normalized fields plus both label
/// forms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedIdentifier {
    pub gtin14: String,
    pub lot: String,
    pub expiry: ExpiryDate,
    pub serial: Option<String>,
    /// `(01)…[(21)…](10)…(17)…`
    pub human_form: String,
    /// `01…[21…<GS>]10…<GS>17…`
    pub machine_form: String,
}

impl EncodedIdentifier {
    pub fn expiry_iso(&self) -> String {
        self.expiry.iso()
    }

    pub fn expiry_compact(&self) -> String {
        self.expiry.compact()
    }

    /// The identity triple this label names.
    pub fn identity(&self) -> ProductIdentity {
        ProductIdentity::new(self.gtin14.clone(), self.lot.clone(), self.expiry)
    }
}

/// Encode identity fields into both label forms.
pub fn encode(fields: &IdentifierFields) -> Result<EncodedIdentifier, CodecError> {
    let gtin14 = normalize_gtin(&fields.gtin)?;
    validate_field(&fields.lot).map_err(CodecError::InvalidLot)?;
    if let Some(serial) = &fields.serial {
        validate_field(serial).map_err(CodecError::InvalidSerial)?;
    }
    let compact = fields.expiry.compact();

    let mut human = format!("(01){gtin14}");
    let mut machine = format!("01{gtin14}");
    if let Some(serial) = &fields.serial {
        human.push_str(&format!("(21){serial}"));
        machine.push_str(&format!("21{serial}{GS}"));
    }
    human.push_str(&format!("(10){}(17){compact}", fields.lot));
    machine.push_str(&format!("10{}{GS}17{compact}", fields.lot));

    Ok(EncodedIdentifier {
        gtin14,
        lot: fields.lot.clone(),
        expiry: fields.expiry,
        serial: fields.serial.clone(),
        human_form: human,
        machine_form: machine,
    })
}

/// Decode a raw label string in either form.
///
/// Strips known symbology prefixes, then dispatches on the leading
/// characters. The result is re-encoded, so `encode(decode(x)) == x` for
/// any `x` produced by [`encode`].
pub fn decode(raw: &str) -> Result<EncodedIdentifier, CodecError> {
    let mut stripped = raw;
    for prefix in SYMBOLOGY_PREFIXES {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            stripped = rest;
            break;
        }
    }

    let fields = if stripped.starts_with("(01)") {
        parse_human(stripped)?
    } else if stripped.starts_with("01") {
        parse_machine(stripped)?
    } else {
        return Err(CodecError::UnrecognizedForm(
            "expected a (01) group or a 01 tag".into(),
        ));
    };
    encode(&fields)
}

fn parse_human(s: &str) -> Result<IdentifierFields, CodecError> {
    let mut rest = s;
    let gtin = take_group(&mut rest, "01")?;
    let serial = if rest.starts_with("(21)") {
        Some(take_group(&mut rest, "21")?.to_string())
    } else {
        None
    };
    let lot = take_group(&mut rest, "10")?;
    let exp = take_group(&mut rest, "17")?;
    if !rest.is_empty() {
        return Err(CodecError::UnrecognizedForm(format!(
            "trailing data after (17) group: {rest:?}"
        )));
    }
    Ok(IdentifierFields {
        gtin: gtin.to_string(),
        lot: lot.to_string(),
        expiry: parse_expiry(exp)?,
        serial,
    })
}

/// Consume a `(ai)value` group, the value running to the next `(` or the end.
fn take_group<'a>(rest: &mut &'a str, ai: &str) -> Result<&'a str, CodecError> {
    let tag = format!("({ai})");
    let Some(after) = rest.strip_prefix(tag.as_str()) else {
        return Err(CodecError::UnrecognizedForm(format!(
            "expected ({ai}) group"
        )));
    };
    let end = after.find('(').unwrap_or(after.len());
    *rest = &after[end..];
    Ok(&after[..end])
}

fn parse_machine(s: &str) -> Result<IdentifierFields, CodecError> {
    let rest = match s.strip_prefix("01") {
        Some(r) => r,
        None => return Err(CodecError::UnrecognizedForm("expected 01 tag".into())),
    };
    if rest.len() < 14 || !rest.as_bytes()[..14].iter().all(u8::is_ascii_digit) {
        return Err(CodecError::InvalidGtin(
            "machine form requires 14 digits after the 01 tag".into(),
        ));
    }
    let gtin = &rest[..14];
    let mut rest = &rest[14..];

    let serial = if let Some(after) = rest.strip_prefix("21") {
        let gs = after.find(GS).ok_or_else(|| {
            CodecError::UnrecognizedForm("serial field missing group separator".into())
        })?;
        rest = &after[gs + 1..];
        Some(after[..gs].to_string())
    } else {
        None
    };

    let after = match rest.strip_prefix("10") {
        Some(r) => r,
        None => return Err(CodecError::UnrecognizedForm("expected 10 tag".into())),
    };
    let (lot, exp) = if let Some(gs) = after.find(GS) {
        let tail = match after[gs + 1..].strip_prefix("17") {
            Some(t) => t,
            None => {
                return Err(CodecError::UnrecognizedForm(
                    "expected 17 tag after group separator".into(),
                ))
            }
        };
        (&after[..gs], tail)
    } else {
        // No separator: the 17 tag and its 6 digits must close the string.
        if after.len() < 8 {
            return Err(CodecError::UnrecognizedForm(
                "truncated machine form".into(),
            ));
        }
        // Byte index into untrusted text; a multi-byte character in the
        // lot can put the split mid-character.
        let split = after.len() - 8;
        if !after.is_char_boundary(split) || &after.as_bytes()[split..split + 2] != b"17" {
            return Err(CodecError::UnrecognizedForm("expected 17 tag".into()));
        }
        (&after[..split], &after[split + 2..])
    };

    Ok(IdentifierFields {
        gtin: gtin.to_string(),
        lot: lot.to_string(),
        expiry: parse_expiry(exp)?,
        serial,
    })
}

fn parse_expiry(s: &str) -> Result<ExpiryDate, CodecError> {
    ExpiryDate::parse_compact(s).map_err(|e| CodecError::InvalidExpiry(e.to_string()))
}

/// AI 10/21 value rule: 1-20 characters, alphanumeric plus `-`, `.`, `_`, `/`.
fn validate_field(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("empty".into());
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(format!(
            "{} characters exceeds the {MAX_FIELD_LEN}-character limit",
            value.len()
        ));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/')))
    {
        return Err(format!("disallowed character {bad:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(serial: Option<&str>) -> IdentifierFields {
        IdentifierFields {
            gtin: "950600013435".into(),
            lot: "ABC-123".into(),
            expiry: ExpiryDate::parse_compact("261130").unwrap(),
            serial: serial.map(String::from),
        }
    }

    #[test]
    fn encode_both_forms() {
        let enc = encode(&fields(None)).unwrap();
        assert_eq!(enc.gtin14, "09506000134352");
        assert_eq!(enc.human_form, "(01)09506000134352(10)ABC-123(17)261130");
        assert_eq!(
            enc.machine_form,
            "010950600013435210ABC-123\u{1D}17261130"
        );
        assert_eq!(enc.expiry_iso(), "2026-11-30");
        assert_eq!(enc.expiry_compact(), "261130");
    }

    #[test]
    fn encode_with_serial() {
        let enc = encode(&fields(Some("SN001"))).unwrap();
        assert_eq!(
            enc.human_form,
            "(01)09506000134352(21)SN001(10)ABC-123(17)261130"
        );
        assert_eq!(
            enc.machine_form,
            "010950600013435221SN001\u{1D}10ABC-123\u{1D}17261130"
        );
    }

    #[test]
    fn decode_human_form() {
        let enc = encode(&fields(Some("SN001"))).unwrap();
        let decoded = decode(&enc.human_form).unwrap();
        assert_eq!(decoded, enc);
    }

    #[test]
    fn decode_machine_form() {
        let enc = encode(&fields(Some("SN001"))).unwrap();
        let decoded = decode(&enc.machine_form).unwrap();
        assert_eq!(decoded, enc);
    }

    #[test]
    fn decode_strips_symbology_prefix() {
        let enc = encode(&fields(None)).unwrap();
        for prefix in SYMBOLOGY_PREFIXES {
            let scanned = format!("{prefix}{}", enc.machine_form);
            assert_eq!(decode(&scanned).unwrap(), enc);
        }
    }

    #[test]
    fn decode_tolerates_missing_separator_before_17() {
        // Lot runs straight into the 17 tag, no GS.
        let raw = "010950600013435210ABC-12317261130";
        let decoded = decode(raw).unwrap();
        assert_eq!(decoded.lot, "ABC-123");
        assert_eq!(decoded.expiry_compact(), "261130");
    }

    #[test]
    fn lot_containing_17_survives_with_separator() {
        let input = IdentifierFields {
            gtin: "950600013435".into(),
            lot: "L17".into(),
            expiry: ExpiryDate::parse_compact("261130").unwrap(),
            serial: None,
        };
        let enc = encode(&input).unwrap();
        let decoded = decode(&enc.machine_form).unwrap();
        assert_eq!(decoded.lot, "L17");
    }

    #[test]
    fn lot_rules_enforced() {
        let mut f = fields(None);
        f.lot = "A".repeat(21);
        assert!(matches!(encode(&f), Err(CodecError::InvalidLot(_))));
        f.lot = "BAD LOT".into();
        assert!(matches!(encode(&f), Err(CodecError::InvalidLot(_))));
        f.lot = String::new();
        assert!(matches!(encode(&f), Err(CodecError::InvalidLot(_))));
    }

    #[test]
    fn bad_expiry_in_label_rejected() {
        let raw = "(01)09506000134352(10)ABC(17)261331";
        assert!(matches!(decode(raw), Err(CodecError::InvalidExpiry(_))));
        // Multi-byte character inside the (17) group.
        let raw = "(01)09506000134352(10)ABC(17)0é101";
        assert!(matches!(decode(raw), Err(CodecError::InvalidExpiry(_))));
    }

    #[test]
    fn multibyte_lot_in_machine_form_rejected() {
        // No separator: the 17-tag scan lands mid-character.
        assert!(matches!(
            decode("010950600013435210é1234567"),
            Err(CodecError::UnrecognizedForm(_))
        ));
        // With a separator the field rule rejects the character itself.
        assert!(matches!(
            decode("010950600013435210é\u{1D}17261130"),
            Err(CodecError::InvalidLot(_))
        ));
    }

    #[test]
    fn unrecognized_input_rejected() {
        assert!(matches!(
            decode("hello"),
            Err(CodecError::UnrecognizedForm(_))
        ));
        assert!(matches!(
            decode("(01)09506000134352(10)ABC"),
            Err(CodecError::UnrecognizedForm(_))
        ));
    }

    #[test]
    fn trailing_data_rejected() {
        let raw = "(01)09506000134352(10)ABC(17)261130(99)X";
        assert!(matches!(
            decode(raw),
            Err(CodecError::UnrecognizedForm(_))
        ));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_fields() -> impl Strategy<Value = IdentifierFields> {
            let gtin = prop_oneof![
                "[0-9]{8}",
                "[0-9]{12}",
                "[0-9]{13}",
            ];
            let field = "[A-Za-z0-9._/-]{1,20}";
            let expiry = (2000u16..=2099, 1u8..=12, 1u8..=31)
                .prop_map(|(y, m, d)| ExpiryDate::new(y, m, d).unwrap());
            (gtin, field, expiry, proptest::option::of(field))
                .prop_map(|(gtin, lot, expiry, serial)| IdentifierFields {
                    gtin,
                    lot,
                    expiry,
                    serial,
                })
        }

        proptest! {
            #[test]
            fn round_trip_machine(fields in arb_fields()) {
                let enc = encode(&fields).unwrap();
                prop_assert_eq!(decode(&enc.machine_form).unwrap(), enc);
            }

            #[test]
            fn round_trip_human(fields in arb_fields()) {
                let enc = encode(&fields).unwrap();
                prop_assert_eq!(decode(&enc.human_form).unwrap(), enc);
            }
        }
    }
}
