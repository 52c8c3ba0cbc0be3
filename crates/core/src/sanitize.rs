/// Characters that are unsafe in filenames on at least one mainstream
/// filesystem. Replaced rather than stripped so distinct inputs stay distinct.
const DISALLOWED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Names Windows reserves regardless of extension.
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make one path segment safe for any target filesystem.
///
/// Disallowed characters become underscores, runs of underscores collapse,
/// and leading/trailing dots and whitespace are trimmed. A value that
/// sanitizes to nothing becomes "untitled" so a rename never produces an
/// empty segment.
pub fn sanitize_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_underscore = false;
    for c in input.chars() {
        let mapped = if DISALLOWED.contains(&c) || c.is_control() {
            '_'
        } else {
            c
        };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        out.push(mapped);
    }

    let trimmed = out.trim_matches(|c: char| c.is_whitespace() || c == '.');
    let mut result = trimmed.trim_matches('_').to_string();

    if RESERVED.iter().any(|r| result.eq_ignore_ascii_case(r)) {
        result.push('_');
    }
    if result.is_empty() {
        result = "untitled".to_string();
    }
    result
}
