// Number helpers shared by the geometry code

/// Replace non-finite input with a fallback so degenerate drag states still
/// produce well-defined geometry.
#[inline]
pub fn finite_or(x: f64, fallback: f64) -> f64 { if x.is_finite() { x } else { fallback } }

/// Format a number the way JavaScript's `Number#toString` does, so path
/// strings match what the browser would have produced.
pub fn js_number(mut v: f64, buf: &mut ryu_js::Buffer) -> &str {
    if !v.is_finite() {
        return "0";
    }
    if v == -0.0 {
        v = 0.0;
    }
    buf.format_finite(v)
}
