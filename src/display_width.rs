use unicode_width::UnicodeWidthStr;

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Lines of a node or edge label. Labels break on `\n`; a trailing break adds no line.
pub fn label_lines(s: &str) -> Vec<&str> {
    let lines: Vec<&str> = s.lines().collect();
    if lines.is_empty() { vec![""] } else { lines }
}

/// A label on one line, its lines joined with ` / `.
pub fn single_line(s: &str) -> String {
    label_lines(s)
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Pad `s` with spaces up to `width` display columns.
pub fn pad_to(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{s}{}", " ".repeat(fill))
}
