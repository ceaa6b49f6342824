//! JSON with `//` and `/* */` comments.
//!
//! Comments are removed before the text reaches `serde_json`. Newlines inside
//! removed comments are kept so parse errors still point at the right line.

use serde::de::DeserializeOwned;

/// Remove line and block comments that appear outside string literals.
pub fn strip_comments(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        result.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                // Line comment runs to (but not including) the newline
                while let Some(&ch) = chars.peek() {
                    if ch == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            ('/', Some('*')) => {
                chars.next(); // consume '*'
                let mut prev = '\0';
                for ch in chars.by_ref() {
                    if prev == '*' && ch == '/' {
                        break;
                    }
                    if ch == '\n' {
                        result.push('\n');
                    }
                    prev = ch;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

/// Strip comments and deserialize.
pub fn parse_jsonc<T: DeserializeOwned>(s: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(&strip_comments(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_line_comments() {
        let text = "{\n  // the answer\n  \"a\": 42 // trailing\n}";
        let value: Value = parse_jsonc(text).unwrap();
        assert_eq!(value["a"], 42);
    }

    #[test]
    fn test_block_comments() {
        let text = "{ /* one\n two */ \"a\": [1, /* inline */ 2] }";
        let value: Value = parse_jsonc(text).unwrap();
        assert_eq!(value["a"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_block_comment_keeps_line_count() {
        let stripped = strip_comments("/* a\nb\nc */x");
        assert_eq!(stripped, "\n\nx");
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let text = r#"{ "url": "postgres://host/db", "glob": "/* not a comment */" }"#;
        let value: Value = parse_jsonc(text).unwrap();
        assert_eq!(value["url"], "postgres://host/db");
        assert_eq!(value["glob"], "/* not a comment */");
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{ "q": "say \"//hi\"" } // done"#;
        let value: Value = parse_jsonc(text).unwrap();
        assert_eq!(value["q"], "say \"//hi\"");
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_jsonc::<Value>("{ \"a\": }").is_err());
    }
}
