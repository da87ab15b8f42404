//! Text encoding for timestamps kept in a settings store.
//!
//! A value is persisted as `base64(decimal(millis))` using the standard
//! alphabet with padding. Decoding ignores ASCII whitespace anywhere in the
//! input, since older writers wrapped the output and appended a newline.

use crate::{Error, Result, Timestamp};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Encodes a timestamp (sentinels included) into its persisted form.
#[must_use]
pub fn encode_timestamp(ts: Timestamp) -> String {
    BASE64.encode(ts.millis().to_string())
}

/// Decodes a persisted value back into a timestamp.
///
/// # Errors
///
/// Returns an error if the value is not valid base64, not UTF-8, or does not
/// hold a decimal `i64`.
pub fn decode_timestamp(encoded: &str) -> Result<Timestamp> {
    let compact: String = encoded.split_ascii_whitespace().collect();
    let bytes = BASE64.decode(compact.as_bytes())?;
    let text = String::from_utf8(bytes)?;
    let millis = text
        .trim()
        .parse::<i64>()
        .map_err(|e| Error::InvalidTimestamp(format!("{text:?}: {e}")))?;
    Ok(Timestamp::from_millis(millis))
}
