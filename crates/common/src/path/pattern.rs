//! Shell-style matching of a single path element.
//!
//! Supported syntax:
//! - `*` matches any run of characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[^a-z]` character classes
//! - `\c` matches `c` literally
//!
//! Patterns are rewritten into [`glob::Pattern`] syntax, which has no
//! escapes and negates with `[!`. Elements never contain `/`, so the
//! separator options of the glob crate never come into play.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error in pattern {0:?}")]
pub struct PatternError(pub String);

/// Whether `elem` contains any character with special meaning to [`matches`].
pub fn has_meta(elem: &str) -> bool {
    elem.contains(['*', '?', '[', '\\'])
}

/// Compiles one element pattern for repeated matching.
pub fn compile(pattern: &str) -> Result<glob::Pattern, PatternError> {
    let bad = || PatternError(pattern.to_string());
    let translated = translate(pattern).ok_or_else(bad)?;
    glob::Pattern::new(&translated).map_err(|_| bad())
}

/// Checks the pattern is well formed without matching anything.
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    compile(pattern).map(|_| ())
}

/// Reports whether `name` matches the shell pattern `pattern` in full.
pub fn matches(pattern: &str, name: &str) -> Result<bool, PatternError> {
    Ok(compile(pattern)?.matches(name))
}

fn translate(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            // the glob crate reads `**` as a recursive wildcard
            '*' => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push('*');
            }
            '\\' => match chars.next()? {
                c @ ('*' | '?' | '[') => {
                    out.push('[');
                    out.push(c);
                    out.push(']');
                }
                c => out.push(c),
            },
            '[' => push_class(&mut out, &mut chars)?,
            c => out.push(c),
        }
    }
    Some(out)
}

/// Reads a class up to its closing `]` and writes it in glob syntax.
fn push_class(out: &mut String, chars: &mut Peekable<Chars<'_>>) -> Option<()> {
    let negated = chars.peek() == Some(&'^');
    if negated {
        chars.next();
    }
    let mut ranges: Vec<(char, char)> = Vec::new();
    loop {
        if chars.peek() == Some(&']') && !ranges.is_empty() {
            chars.next();
            break;
        }
        let lo = class_char(chars)?;
        let hi = if chars.peek() == Some(&'-') {
            chars.next();
            class_char(chars)?
        } else {
            lo
        };
        ranges.push((lo, hi));
    }

    // glob only takes `]` as the first member, and a leading `!` negates
    if ranges.iter().any(|&(lo, hi)| hi == ']' && lo != ']') {
        return None;
    }
    ranges.sort_by_key(|&(lo, _)| lo != ']');
    if ranges.iter().filter(|&&(lo, _)| lo == ']').count() > 1 {
        return None;
    }
    if !negated && ranges[0].0 == '!' {
        match ranges.iter().position(|&(lo, _)| lo != '!') {
            Some(i) => ranges.swap(0, i),
            None if ranges.iter().all(|&r| r == ('!', '!')) => {
                out.push('!');
                return Some(());
            }
            None => return None,
        }
    }

    out.push('[');
    if negated {
        out.push('!');
    }
    for (i, &(lo, hi)) in ranges.iter().enumerate() {
        if i == 0 && (lo, hi) == (']', ']') {
            // a lone `]` is one character; what follows must not read as a range
            if ranges.get(1).is_some_and(|&(next, _)| next == '-') {
                return None;
            }
            out.push(']');
            continue;
        }
        // every other member is written as a full range so members never merge
        out.push(lo);
        out.push('-');
        out.push(hi);
    }
    out.push(']');
    Some(())
}

fn class_char(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    match chars.next()? {
        '-' | ']' => None,
        '\\' => chars.next(),
        c => Some(c),
    }
}
