//! # Layout
//!
//! Request-time geometry. Field positions come from the template; the only
//! values computed per badge are the name's draw origin and, when the badge
//! is re-projected, where the composed page sits on the larger sheet.

use crate::templates::{NameField, PageSize};

/// Left x at which a run of `text_width` points is centered in `field`.
///
/// `text_width` is the glyph-metric width at the draw size, not a character
/// count.
pub fn centered_origin(field: &NameField, text_width: f64) -> f64 {
    field.center_x() - text_width / 2.0
}

/// Lower-left offset that centers `inner` horizontally on `outer` and
/// aligns their top edges.
pub fn top_centered_offset(outer: PageSize, inner: PageSize) -> (f64, f64) {
    (
        (outer.width - inner.width) / 2.0,
        outer.height - inner.height,
    )
}

/// Download name of a badge: `badge_<name>.pdf`, whitespace runs collapsed
/// to a single underscore.
pub fn badge_filename(holder_name: &str) -> String {
    let mut out = String::with_capacity(holder_name.len() + 10);
    out.push_str("badge_");

    let mut in_whitespace = false;
    for ch in holder_name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }

    out.push_str(".pdf");
    out
}
