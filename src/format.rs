//! Cosmetic SQL formatting.
//!
//! Keyword and identifier case plus comment stripping work on the
//! `sqlparser` token stream, so string literals and quoted identifiers are
//! never touched. Re-layout is delegated to `sqlformat`.

use sqlformat::{FormatOptions, Indent, QueryParams};
use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};

use crate::config::{FormatSettings, LetterCase};

/// Format `sql`, or `None` if it cannot be tokenized.
///
/// Callers leave the original text in place on `None`.
pub fn format_sql(sql: &str, options: &FormatSettings) -> Option<String> {
    let dialect = GenericDialect {};
    let tokens = match Tokenizer::new(&dialect, sql).with_unescape(false).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::debug!(error = %e, "cannot format SQL");
            return None;
        }
    };

    let mut text = String::with_capacity(sql.len());
    for token in tokens {
        match token {
            Token::Word(word) if word.quote_style.is_none() => {
                let case = if word.keyword == Keyword::NoKeyword {
                    options.identifier_case
                } else {
                    options.keyword_case
                };
                text.push_str(&apply_case(&word.value, case));
            }
            Token::Whitespace(Whitespace::SingleLineComment { comment, .. })
                if options.strip_comments =>
            {
                if comment.ends_with('\n') {
                    text.push('\n');
                }
            }
            Token::Whitespace(Whitespace::MultiLineComment(_)) if options.strip_comments => {
                text.push(' ');
            }
            other => text.push_str(&other.to_string()),
        }
    }

    if !options.reindent {
        return Some(text);
    }

    let indent = if options.indent_tabs {
        Indent::Tabs
    } else {
        Indent::Spaces(options.indent_width)
    };
    let format_options = FormatOptions {
        indent,
        // Case was applied above
        uppercase: None,
        lines_between_queries: 1,
        ..Default::default()
    };

    Some(sqlformat::format(&text, &QueryParams::None, &format_options))
}

fn apply_case(word: &str, case: Option<LetterCase>) -> String {
    match case {
        None => word.to_string(),
        Some(LetterCase::Upper) => word.to_uppercase(),
        Some(LetterCase::Lower) => word.to_lowercase(),
        Some(LetterCase::Capitalize) => {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        }
    }
}
