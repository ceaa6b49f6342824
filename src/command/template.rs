//! Placeholder substitution for argument and query templates.
//!
//! Three forms are supported:
//! - `{field}` resolved against a profile (argument templates and options)
//! - `{0}`, `{1}` or `{}` resolved positionally (the "show records" query)
//! - a single `%s` (the "desc table" / "desc function" queries)
//!
//! In the brace forms `{{` and `}}` are literal braces; in the `%` form `%%`
//! is a literal percent sign.

use super::error::BuildError;
use crate::config::Profile;

/// Render every `{key}` in `template` through `resolve`.
fn render<F>(template: &str, mut resolve: F) -> Result<String, BuildError>
where
    F: FnMut(&str) -> Result<String, BuildError>,
{
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                result.push('{');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(BuildError::MalformedTemplate(template.to_string()))
                        }
                        Some(ch) => key.push(ch),
                    }
                }
                result.push_str(&resolve(&key)?);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                result.push('}');
            }
            '}' => return Err(BuildError::MalformedTemplate(template.to_string())),
            _ => result.push(c),
        }
    }

    Ok(result)
}

/// Substitute `{field}` placeholders with profile values.
pub fn render_profile(template: &str, profile: &Profile) -> Result<String, BuildError> {
    render(template, |key| {
        profile
            .field(key)
            .ok_or_else(|| BuildError::MissingField(key.to_string()))
    })
}

/// Substitute `{0}`, `{1}`, ... (or auto-numbered `{}`) with `args`.
pub fn render_positional(template: &str, args: &[&str]) -> Result<String, BuildError> {
    let mut next_auto = 0;
    render(template, |key| {
        let index = if key.is_empty() {
            next_auto += 1;
            next_auto - 1
        } else {
            key.parse::<usize>()
                .map_err(|_| BuildError::MissingField(key.to_string()))?
        };
        args.get(index)
            .map(|arg| arg.to_string())
            .ok_or_else(|| BuildError::MissingArgument(format!("{{{}}}", key)))
    })
}

/// Replace the single `%s` in `template` with `value`.
pub fn substitute_percent(template: &str, value: &str) -> Result<String, BuildError> {
    let mut result = String::with_capacity(template.len() + value.len());
    let mut chars = template.chars();
    let mut used = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => result.push('%'),
            Some('s') if !used => {
                result.push_str(value);
                used = true;
            }
            Some('s') => return Err(BuildError::MissingArgument("%s".to_string())),
            _ => return Err(BuildError::MalformedTemplate(template.to_string())),
        }
    }

    if !used {
        return Err(BuildError::MalformedTemplate(format!(
            "no %s placeholder in '{}'",
            template
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileStore;

    fn profile() -> Profile {
        let store = ProfileStore::parse(
            r#"{ "connections": { "p": {
                "type": "pgsql", "host": "localhost", "port": 5432,
                "username": "u", "database": "d"
            } } }"#,
        )
        .unwrap();
        store.get("p").unwrap().clone()
    }

    #[test]
    fn test_render_profile_fields() {
        let rendered = render_profile("-h {host} -p {port} -U {username} {database}", &profile());
        assert_eq!(rendered.unwrap(), "-h localhost -p 5432 -U u d");
    }

    #[test]
    fn test_render_profile_missing_field() {
        let result = render_profile("{username}/{password}", &profile());
        assert!(matches!(result, Err(BuildError::MissingField(name)) if name == "password"));
    }

    #[test]
    fn test_render_escaped_braces() {
        assert_eq!(
            render_profile("{{literal}} {host}", &profile()).unwrap(),
            "{literal} localhost"
        );
    }

    #[test]
    fn test_render_malformed() {
        assert!(matches!(
            render_profile("-h {host", &profile()),
            Err(BuildError::MalformedTemplate(_))
        ));
        assert!(matches!(
            render_profile("-h host}", &profile()),
            Err(BuildError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn test_render_positional() {
        assert_eq!(
            render_positional("select * from {0} limit {1}", &["users", "50"]).unwrap(),
            "select * from users limit 50"
        );
        assert_eq!(
            render_positional("{} and {}", &["a", "b"]).unwrap(),
            "a and b"
        );
        assert!(matches!(
            render_positional("{2}", &["a"]),
            Err(BuildError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_substitute_percent() {
        assert_eq!(substitute_percent("\\d+ %s", "users").unwrap(), "\\d+ users");
        assert_eq!(
            substitute_percent("desc %s -- 100%%", "t").unwrap(),
            "desc t -- 100%"
        );
    }

    #[test]
    fn test_substitute_percent_errors() {
        assert!(matches!(
            substitute_percent("desc table", "t"),
            Err(BuildError::MalformedTemplate(_))
        ));
        assert!(matches!(
            substitute_percent("%s %s", "t"),
            Err(BuildError::MissingArgument(_))
        ));
        assert!(matches!(
            substitute_percent("like 'a%'", "t"),
            Err(BuildError::MalformedTemplate(_))
        ));
    }
}
