//! Message format rendering
//!
//! Server format strings reference row fields by name:
//!
//! - `%name%` is replaced by the row's `name` field (empty when absent)
//! - `%'text'%` is an untranslated literal and renders as `text`
//! - `[text]` is an optional element, kept only if one of its placeholders
//!   has a value; `[a|b]` picks whichever side has a value
//!
//! Bracketed text without any placeholder is kept verbatim, brackets included.

use super::Row;

/// Render a format string against the fields of a row
pub fn render(format: &str, args: &Row) -> String {
    if !format.contains('%') && !format.contains('[') {
        return format.to_string();
    }
    substitute(&resolve_alternates(format, args), args)
}

/// Names of the `%name%` placeholders in a format, in order of appearance
///
/// Literals (`%'text'%`) are not names. Duplicates are reported once.
pub fn placeholder_names(format: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for token in Placeholders::new(format) {
        if let Token::Name(name) = token.kind {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

// =============================================================================
// Placeholder Scanning
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Name(&'a str),
    Literal(&'a str),
}

#[derive(Debug, Clone, Copy)]
struct Placeholder<'a> {
    start: usize,
    end: usize,
    kind: Token<'a>,
}

/// Iterator over `%...%` tokens of a string
struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Placeholders<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.text[self.pos..];
            let open = rest.find('%')?;
            let after_open = &rest[open + 1..];
            let close = after_open.find('%')?;

            let start = self.pos + open;
            let end = start + close + 2;
            let inner = &after_open[..close];

            if inner.len() >= 2 && inner.starts_with('\'') && inner.ends_with('\'') {
                self.pos = end;
                let kind = Token::Literal(&inner[1..inner.len() - 1]);
                return Some(Placeholder { start, end, kind });
            }

            // A bare '%' (as in "50% done") is text; retry from the next '%'
            if inner.is_empty() || inner.contains(char::is_whitespace) {
                self.pos = start + 1;
                continue;
            }

            self.pos = end;
            return Some(Placeholder {
                start,
                end,
                kind: Token::Name(inner),
            });
        }
    }
}

/// True if any placeholder in `text` would render non-empty
fn has_value(text: &str, args: &Row) -> bool {
    Placeholders::new(text).any(|p| match p.kind {
        Token::Literal(_) => true,
        Token::Name(name) => args.get(name).map(|v| !v.as_bytes().is_empty()).unwrap_or(false),
    })
}

// =============================================================================
// Rendering Passes
// =============================================================================

/// Resolve `[...]` optional elements
fn resolve_alternates(format: &str, args: &Row) -> String {
    let mut out = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(open) = rest.find('[') {
        let body = &rest[open + 1..];
        let close = match body.find(|c: char| c == '[' || c == ']') {
            Some(i) if body.as_bytes()[i] == b']' => i,
            // Nested or unterminated bracket: copy through the '[' and go on
            _ => {
                out.push_str(&rest[..=open]);
                rest = body;
                continue;
            }
        };

        out.push_str(&rest[..open]);
        let inner = &body[..close];
        out.push_str(&choose_alternate(inner, args));
        rest = &body[close + 1..];
    }

    out.push_str(rest);
    out
}

fn choose_alternate(inner: &str, args: &Row) -> String {
    let parts: Vec<&str> = inner.split('|').collect();
    match parts.as_slice() {
        [first, second] => {
            let chosen = if first.contains('%') {
                if has_value(first, args) { first } else { second }
            } else if second.contains('%') {
                if has_value(second, args) { second } else { first }
            } else {
                return format!("[{}]", inner);
            };
            chosen.to_string()
        }
        [single] => {
            if has_value(single, args) {
                single.to_string()
            } else if !single.contains('%') {
                format!("[{}]", single)
            } else {
                String::new()
            }
        }
        _ => format!("[{}]", inner),
    }
}

/// Replace `%...%` placeholders
fn substitute(text: &str, args: &Row) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for placeholder in Placeholders::new(text) {
        out.push_str(&text[last..placeholder.start]);
        match placeholder.kind {
            Token::Literal(literal) => out.push_str(literal),
            Token::Name(name) => {
                if let Some(value) = args.get(name) {
                    out.push_str(&value.to_text_lossy());
                }
            }
        }
        last = placeholder.end;
    }

    out.push_str(&text[last..]);
    out
}
