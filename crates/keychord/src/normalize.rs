//! Key name normalization
//!
//! Some platforms report the same physical key under different names. This
//! maps those names onto the canonical spelling used for stack entries and
//! registrations. Modifier names are never rewritten.

/// Map a raw platform key name onto its canonical name.
///
/// - `"Esc"` becomes `"Escape"`
/// - `"Spacebar"` becomes `" "`
/// - anything else is returned unchanged
pub fn normalize(key: &str) -> &str {
    match key {
        "Esc" => "Escape",
        "Spacebar" => " ",
        other => other,
    }
}
