//! Extraction of registered directives from template source.
//!
//! The scanner splits source into literal text and `{% name markup %}` blocks
//! whose `name` is a registered tag. Everything else, including tera's own
//! block tags, stays in the text. `{% raw %}` blocks, `{# #}` comments and
//! `{{ }}` expressions are skipped as a whole so directive-looking text inside
//! them is never picked up.
//!
//! Directives inside `{% filter %}` blocks are flagged: tera passes the
//! body, marker included, through the filter.
//!
//! The scan is a single forward pass over the source.

/// A registered directive found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawDirective<'a> {
    pub name: &'a str,
    pub markup: &'a str,
    /// `{%-`: trim whitespace before the directive.
    pub trim_left: bool,
    /// `-%}`: trim whitespace after the directive.
    pub trim_right: bool,
    /// Inside a `{% filter %}` block.
    pub in_filter: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Directive(RawDirective<'a>),
}

/// Splits `source` into text and directives for which `is_tag` returns true.
pub(crate) fn scan<'a>(source: &'a str, is_tag: impl Fn(&str) -> bool) -> Vec<Segment<'a>> {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;
    let mut filter_depth = 0usize;

    while let Some(offset) = source[pos..].find('{') {
        let open = pos + offset;
        match bytes.get(open + 1) {
            Some(b'{') => pos = skip_past(source, open + 2, "}}"),
            Some(b'#') => pos = skip_past(source, open + 2, "#}"),
            Some(b'%') => {
                let Some(close) = source[open + 2..].find("%}").map(|i| open + 2 + i) else {
                    // Unterminated block; tera reports it when compiling.
                    break;
                };
                let end = close + 2;
                let (trim_left, trim_right, body) = split_block(&source[open + 2..close]);
                let name_len = body.find(char::is_whitespace).unwrap_or(body.len());
                let name = &body[..name_len];

                if name == "raw" {
                    pos = skip_raw(source, end);
                } else if name == "filter" || name == "endfilter" {
                    filter_depth = if name == "filter" {
                        filter_depth + 1
                    } else {
                        filter_depth.saturating_sub(1)
                    };
                    pos = end;
                } else if is_tag(name) {
                    if open > text_start {
                        segments.push(Segment::Text(&source[text_start..open]));
                    }
                    segments.push(Segment::Directive(RawDirective {
                        name,
                        markup: body[name_len..].trim(),
                        trim_left,
                        trim_right,
                        in_filter: filter_depth > 0,
                    }));
                    text_start = end;
                    pos = end;
                } else {
                    pos = end;
                }
            }
            _ => pos = open + 1,
        }
    }

    if text_start < source.len() {
        segments.push(Segment::Text(&source[text_start..]));
    }
    segments
}

/// Strips whitespace-control dashes and surrounding whitespace from a block body.
fn split_block(inner: &str) -> (bool, bool, &str) {
    let (trim_left, inner) = match inner.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let (trim_right, inner) = match inner.strip_suffix('-') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    (trim_left, trim_right, inner.trim())
}

fn skip_past(source: &str, from: usize, delimiter: &str) -> usize {
    source[from..].find(delimiter).map_or(source.len(), |i| from + i + delimiter.len())
}

/// Returns the position just past the `{% endraw %}` closing a raw block.
fn skip_raw(source: &str, from: usize) -> usize {
    let mut pos = from;
    while let Some(offset) = source[pos..].find("{%") {
        let open = pos + offset;
        let Some(close) = source[open + 2..].find("%}").map(|i| open + 2 + i) else {
            return source.len();
        };
        let (_, _, body) = split_block(&source[open + 2..close]);
        if body == "endraw" {
            return close + 2;
        }
        pos = open + 2;
    }
    source.len()
}
