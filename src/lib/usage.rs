//! Usage text rendering

/// Width of the separator printed between a context message and the usage line
pub const SEPARATOR_WIDTH: usize = 50;

/// Render usage text, optionally prefixed by a context message and a
/// separator line
pub fn format_usage(program: &str, usage_text: &str, message: Option<&str>) -> String {
    let mut content = String::new();
    if let Some(message) = message {
        content.push_str(message);
        content.push('\n');
        content.push_str(&"=".repeat(SEPARATOR_WIDTH));
        content.push('\n');
    }
    content.push_str(&format!("Usage: {}", program));
    if !usage_text.is_empty() {
        content.push(' ');
        content.push_str(usage_text);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_usage() {
        assert_eq!(format_usage("sync", "-s src dest", None), "Usage: sync -s src dest");
    }

    #[test]
    fn test_usage_without_help_text() {
        assert_eq!(format_usage("sync", "", None), "Usage: sync");
    }

    #[test]
    fn test_usage_with_message() {
        let text = format_usage("sync", "file", Some("No input file specified."));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "No input file specified.");
        assert_eq!(lines[1], "=".repeat(SEPARATOR_WIDTH));
        assert_eq!(lines[2], "Usage: sync file");
    }
}
