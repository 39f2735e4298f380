//! Template interpolation against source rows.
//!
//! A template is a string with `{field}` placeholders; a backslash escapes a
//! brace and leaves it literal. Fields resolve by linear search of the source
//! header. An empty field value, or a value in the skip set, suppresses the
//! whole result so the caller drops the quad for this row.

use std::collections::HashSet;

use crate::errors::MappingError;


/// Tokens the operator wants treated as empty fields, set once from the CLI
/// and handed to the evaluator explicitly.
#[derive(Debug, Clone, Default)]
pub struct SkipTokens {
    tokens: HashSet<String>,
}

impl SkipTokens {
    pub fn new() -> SkipTokens {
        SkipTokens { tokens: HashSet::new() }
    }

    /// Build from the CLI's comma-separated list.
    pub fn from_list(list: &str) -> SkipTokens {
        let tokens = list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        SkipTokens { tokens }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.tokens.contains(value)
    }
}


/// The placeholder names of a template, in order of appearance, escaped
/// braces skipped. Duplicates are kept: a field may appear more than once.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut found = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'{' => {
                let Some(end) = template[i + 1..].find('}') else {
                    break;
                };
                found.push(template[i + 1..i + 1 + end].to_string());
                i += end + 2;
            }
            _ => i += 1,
        }
    }

    found
}

/// Fill a template from a row. Returns `Ok(None)` when a referenced field is
/// empty or in the skip set; a field missing from the header is fatal.
/// With `encode_iri` set, each substituted value is percent-encoded before
/// insertion.
pub fn expand(
    template: &str,
    header: &[String],
    row: &[String],
    encode_iri: bool,
    skips: &SkipTokens,
) -> Result<Option<String>, MappingError> {
    let mut filled = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // escaped brace stays literal, backslash included
                filled.push(c);
                if let Some(&next) = chars.peek() {
                    if next == '{' || next == '}' {
                        filled.push(next);
                        chars.next();
                    }
                }
            }
            '{' => {
                let mut field = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    field.push(c);
                }

                let index = header
                    .iter()
                    .position(|h| h == &field)
                    .ok_or_else(|| MappingError::NoColumn(field.clone()))?;
                let value = row.get(index).map(String::as_str).unwrap_or("");

                if value.is_empty() || skips.contains(value) {
                    return Ok(None);
                }

                if encode_iri {
                    filled.push_str(&percent_encode(value));
                } else {
                    filled.push_str(value);
                }
            }
            _ => filled.push(c),
        }
    }

    Ok(Some(filled))
}

/// Percent-encode a value destined for an IRI position. The table is fixed;
/// everything else passes through untouched.
pub fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '!' => encoded.push_str("%21"),
            '"' => encoded.push_str("%22"),
            '#' => encoded.push_str("%23"),
            '$' => encoded.push_str("%24"),
            '%' => encoded.push_str("%25"),
            '&' => encoded.push_str("%26"),
            '\'' => encoded.push_str("%27"),
            '(' => encoded.push_str("%28"),
            ')' => encoded.push_str("%29"),
            '*' => encoded.push_str("%2A"),
            '+' => encoded.push_str("%2B"),
            ',' => encoded.push_str("%2C"),
            '/' => encoded.push_str("%2F"),
            ':' => encoded.push_str("%3A"),
            ';' => encoded.push_str("%3B"),
            '<' => encoded.push_str("%3C"),
            '=' => encoded.push_str("%3D"),
            '>' => encoded.push_str("%3E"),
            '?' => encoded.push_str("%3F"),
            '@' => encoded.push_str("%40"),
            '[' => encoded.push_str("%5B"),
            '\\' => encoded.push_str("%5C"),
            ']' => encoded.push_str("%5D"),
            '{' => encoded.push_str("%7B"),
            '|' => encoded.push_str("%7C"),
            '}' => encoded.push_str("%7D"),
            _ => encoded.push(c),
        }
    }
    encoded
}
