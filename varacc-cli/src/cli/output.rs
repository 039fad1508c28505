/// Standard output utilities for consistent command formatting
use colored::*;

/// Display a section header with an underline
pub fn section_header(title: &str) {
    eprintln!("\n{}", title.bold().cyan());
    eprintln!("{}", "─".repeat(title.len()).dimmed());
}

/// Display a success message
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green(), message);
}

/// Display an info message
pub fn info(message: &str) {
    eprintln!("{} {}", "●".blue(), message);
}

/// Display a warning message
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Tree structure item
pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    let prefix = if is_last { "└─" } else { "├─" };
    if let Some(val) = value {
        eprintln!("{} {}: {}", prefix.dimmed(), label, val);
    } else {
        eprintln!("{} {}", prefix.dimmed(), label);
    }
}

/// Tree section with nested items
pub fn tree_section(title: &str, items: &[(&str, String)], is_last: bool) {
    tree_item(is_last, title, None);
    let continuation = if is_last { "   " } else { "│  " };
    for (i, (label, value)) in items.iter().enumerate() {
        let prefix = if i == items.len() - 1 { "└─" } else { "├─" };
        eprintln!("{}{} {}: {}", continuation.dimmed(), prefix.dimmed(), label, value);
    }
}

/// Format a count with thousands separators
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(3000000000), "3,000,000,000");
    }
}
