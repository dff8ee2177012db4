use crate::error::CodecError;

/// Compute the GS1 check digit for a 13-digit GTIN body.
///
/// Standard weighted (3,1,3,1,…) mod-10 algorithm over the reversed digit
/// string: the rightmost body digit gets weight 3.
pub fn check_digit(body13: &str) -> Result<u8, CodecError> {
    if body13.len() != 13 || !body13.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidGtin(format!(
            "check digit requires a 13-digit body, got {body13:?}"
        )));
    }
    let sum: u32 = body13
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 0 {
                digit * 3
            } else {
                digit
            }
        })
        .sum();
    Ok(((10 - sum % 10) % 10) as u8)
}

/// Normalize a supplied GTIN to its 14-digit form.
///
/// 8-, 12-, and 13-digit inputs are treated as check-digit-less bodies:
/// left-padded to 13 digits, then the computed check digit is appended.
/// A 14-digit input already carries a check digit, which must verify
/// against the recomputation over its first 13 digits.
pub fn normalize_gtin(raw: &str) -> Result<String, CodecError> {
    if raw.is_empty() {
        return Err(CodecError::InvalidGtin("empty".into()));
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidGtin(format!(
            "non-digit characters in {raw:?}"
        )));
    }
    match raw.len() {
        8 | 12 | 13 => {
            let body = format!("{raw:0>13}");
            let check = check_digit(&body)?;
            Ok(format!("{body}{check}"))
        }
        14 => {
            let expected = check_digit(&raw[..13])?;
            let found = raw.as_bytes()[13] - b'0';
            if found != expected {
                return Err(CodecError::CheckDigitMismatch { expected, found });
            }
            Ok(raw.to_string())
        }
        len => Err(CodecError::InvalidGtin(format!(
            "unsupported length {len}; expected 8, 12, 13, or 14 digits"
        ))),
    }
}
