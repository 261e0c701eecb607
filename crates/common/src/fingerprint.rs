//! Pseudo-anonymous voter identifiers.
//!
//! A fingerprint deters casual duplicate voting without accounts. It is not a
//! security boundary: two browsers reporting identical signals collide and are
//! treated as the same voter.

use serde::Deserialize;

/// Prefix for every generated identifier.
pub const IDENTIFIER_PREFIX: &str = "user_";

/// Client-observable signals a fingerprint is derived from.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSignals {
    /// `User-Agent` string.
    pub user_agent: String,
    /// Preferred language tag, e.g. `id-ID`.
    pub language: String,
    /// Platform string reported by the browser.
    pub platform: String,
    /// Screen width in CSS pixels.
    pub screen_width: u32,
    /// Screen height in CSS pixels.
    pub screen_height: u32,
}

/// Derive a stable identifier from client signals.
///
/// Folds a 32-bit polynomial rolling hash over the UTF-16 code units of the
/// joined signals and renders its magnitude in base 36.
#[must_use]
pub fn fingerprint(signals: &ClientSignals) -> String {
    let joined = format!(
        "{}-{}-{}-{}x{}",
        signals.user_agent,
        signals.language,
        signals.platform,
        signals.screen_width,
        signals.screen_height
    );

    let hash = joined.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });

    format!("{IDENTIFIER_PREFIX}{}", to_base36(hash.unsigned_abs()))
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
