//! Parsing of pipe-delimited CLI table output.

/// Extract the second `|`-separated field of every line, trimmed.
///
/// Tuned for CLI renderings such as `name | value` rows framed by
/// `+---+---+` separators. Lines without a second field (borders, blank
/// lines, notices) are skipped. Order is preserved.
pub fn parse_rows(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split('|').nth(1))
        .map(|field| field.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_value_rows() {
        assert_eq!(parse_rows("col1 | 5\n+---+---+\ncol2 | 7\n"), vec!["5", "7"]);
    }

    #[test]
    fn test_pipe_wrapped_values() {
        let text = "|public.orders|\n|public.users|\n\n(2 rows)\n";
        assert_eq!(parse_rows(text), vec!["public.orders", "public.users"]);
    }

    #[test]
    fn test_mysql_table_borders() {
        let text = "\
+-----------+
| Tables    |
+-----------+
| customers |
| orders    |
+-----------+
";
        assert_eq!(parse_rows(text), vec!["Tables", "customers", "orders"]);
    }

    #[test]
    fn test_values_without_pipes_yield_nothing() {
        assert!(parse_rows("users\norders\n").is_empty());
        assert!(parse_rows("").is_empty());
    }

    #[test]
    fn test_empty_second_field_is_kept() {
        assert_eq!(parse_rows("a |  | c\n"), vec![""]);
    }
}
