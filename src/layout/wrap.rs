//! Greedy word wrapping against measured glyph widths.

/// Width measurement for a font at a given size.
pub trait FontMetrics {
    /// Rendered width of `text` in points at `font_size`.
    fn width_of_text_at_size(&self, text: &str, font_size: f32) -> f32;
}

/// Split `text` into lines no wider than `max_width`.
///
/// Words are never broken: a word that is wider than `max_width` on its own
/// ends up alone on an oversized line.
pub fn wrap_text<M: FontMetrics + ?Sized>(
    text: &str,
    metrics: &M,
    font_size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = format!("{line}{word} ");
        if metrics.width_of_text_at_size(&candidate, font_size) > max_width {
            if !line.is_empty() {
                lines.push(line.trim_end().to_string());
            }
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }

    let rest = line.trim_end();
    if !rest.is_empty() {
        lines.push(rest.to_string());
    }

    lines
}
