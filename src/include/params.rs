//! Parameter grammar for the include directive.
//!
//! A parameter string is a whitespace-separated sequence of tokens:
//!
//! ```text
//! key \s* = \s* ( "double quoted" | 'single quoted' | bareword )
//! ```
//!
//! `key` is one or more word characters or dashes. Inside quotes a backslash
//! escapes the following character; only the escaped quote itself is decoded
//! (`\"` in double quotes, `\'` in single quotes), other pairs stay verbatim.
//! A bareword (`[\w.-]+`) is a literal (`true`, `false`, `nil`, `null`, an
//! integer or a float) or else names a context variable. Every token must be
//! followed by whitespace or the end of the input.
//!
//! The same scanner validates the string when the directive is parsed and
//! decodes it at render time. It is a single forward pass with no
//! backtracking, so its running time is linear in the input length.

use serde_json::{Map, Number, Value};

use crate::constants::SYNTAX_EXAMPLE;
use crate::core::{PartialsError, Result};
use crate::templating::RenderContext;

/// An undecoded parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawValue<'a> {
    /// Contents of a `"..."` literal, escapes undecoded.
    Double(&'a str),
    /// Contents of a `'...'` literal, escapes undecoded.
    Single(&'a str),
    /// A bareword.
    Bare(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawParam<'a> {
    pub key: &'a str,
    pub value: RawValue<'a>,
}

impl RawValue<'_> {
    /// Decodes the value; barewords are looked up in `context`.
    ///
    /// An unbound variable resolves to `null`.
    pub(crate) fn resolve(&self, context: &RenderContext) -> Value {
        match *self {
            RawValue::Double(text) => Value::String(text.replace("\\\"", "\"")),
            RawValue::Single(text) => Value::String(text.replace("\\'", "'")),
            RawValue::Bare(word) => {
                literal(word).unwrap_or_else(|| context.get(word).cloned().unwrap_or(Value::Null))
            }
        }
    }
}

fn literal(word: &str) -> Option<Value> {
    match word {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "nil" | "null" => return Some(Value::Null),
        _ => {}
    }

    let digits = word.strip_prefix('-').unwrap_or(word);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(int) = word.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    word.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

/// Scans a whole parameter string.
///
/// Returns the byte offset of the first character that does not fit the
/// grammar on failure.
pub(crate) fn scan_params(input: &str) -> std::result::Result<Vec<RawParam<'_>>, usize> {
    let bytes = input.as_bytes();
    let mut params = Vec::new();
    let mut pos = skip_whitespace(bytes, 0);

    while pos < bytes.len() {
        let key_start = pos;
        pos = take_while(bytes, pos, is_key_byte);
        if pos == key_start {
            return Err(pos);
        }
        let key = &input[key_start..pos];

        pos = skip_whitespace(bytes, pos);
        if bytes.get(pos) != Some(&b'=') {
            return Err(pos);
        }
        pos = skip_whitespace(bytes, pos + 1);

        let value = match bytes.get(pos) {
            Some(&quote @ (b'"' | b'\'')) => {
                let start = pos + 1;
                let end = find_closing_quote(bytes, start, quote).ok_or(pos)?;
                pos = end + 1;
                if quote == b'"' {
                    RawValue::Double(&input[start..end])
                } else {
                    RawValue::Single(&input[start..end])
                }
            }
            _ => {
                let start = pos;
                pos = take_while(bytes, pos, is_bare_byte);
                if pos == start {
                    return Err(pos);
                }
                RawValue::Bare(&input[start..pos])
            }
        };

        if pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
            return Err(pos);
        }
        params.push(RawParam { key, value });
        pos = skip_whitespace(bytes, pos);
    }

    Ok(params)
}

/// Checks that `input` is entirely made of valid parameter tokens.
///
/// # Errors
///
/// [`PartialsError::Syntax`] quoting the parameter string and the canonical
/// directive syntax.
pub fn validate_params(input: &str) -> Result<()> {
    scan_params(input).map(|_| ()).map_err(|offset| invalid_syntax(input, offset))
}

/// Parses a parameter string into an insertion-ordered mapping.
///
/// A repeated key keeps the position of its first occurrence and the value of
/// its last.
pub fn parse_params(input: &str, context: &RenderContext) -> Result<Map<String, Value>> {
    let raw = scan_params(input).map_err(|offset| invalid_syntax(input, offset))?;

    let mut params = Map::new();
    for param in raw {
        params.insert(param.key.to_string(), param.value.resolve(context));
    }
    Ok(params)
}

/// Names of the variables the parameter string looks up, in order.
///
/// Literal barewords are skipped. Returns nothing for a string that does not
/// match the grammar.
pub(crate) fn referenced_variables(input: &str) -> Vec<&str> {
    scan_params(input)
        .map(|params| {
            params
                .into_iter()
                .filter_map(|param| match param.value {
                    RawValue::Bare(word) if literal(word).is_none() => Some(word),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn invalid_syntax(input: &str, offset: usize) -> PartialsError {
    tracing::debug!("Invalid include parameters at byte {}: {:?}", offset, input);
    PartialsError::Syntax {
        message: format!(
            "Invalid syntax for include tag:\n\n\t{input}\n\nValid syntax:\n\n\t{SYNTAX_EXAMPLE}\n"
        ),
    }
}

fn find_closing_quote(bytes: &[u8], mut pos: usize, quote: u8) -> Option<usize> {
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return Some(pos),
            _ => pos += 1,
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], pos: usize) -> usize {
    take_while(bytes, pos, |b| b.is_ascii_whitespace())
}

fn take_while(bytes: &[u8], mut pos: usize, predicate: impl Fn(u8) -> bool) -> usize {
    while pos < bytes.len() && predicate(bytes[pos]) {
        pos += 1;
    }
    pos
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_bare_byte(b: u8) -> bool {
    is_key_byte(b) || b == b'.'
}
