use std::collections::BTreeSet;

#[derive(Clone, Copy, PartialEq)]
enum Previous {
    Other,
    Access,
}

/// Rewrites the free identifiers of a code fragment
///
/// The closure receives each identifier and returns its replacement (or None
/// to keep it). Comments, string and character literals, numbers and names
/// following `.`, `->` or `::` are left untouched.
pub fn rewrite_identifiers<F>(code: &str, mut replace: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let chars: Vec<char> = code.chars().collect();
    let mut out = String::with_capacity(code.len());
    let mut previous = Previous::Other;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c == '/' && next == Some('/') {
            while i < chars.len() && chars[i] != '\n' {
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        if c == '/' && next == Some('*') {
            out.push_str("/*");
            i += 2;
            while i < chars.len() {
                if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                    out.push_str("*/");
                    i += 2;
                    break;
                }
                out.push(chars[i]);
                i += 1;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            out.push(c);
            i += 1;
            while i < chars.len() {
                out.push(chars[i]);
                if chars[i] == '\\' && i + 1 < chars.len() {
                    out.push(chars[i + 1]);
                    i += 2;
                    continue;
                }
                i += 1;
                if chars[i - 1] == c {
                    break;
                }
            }
            previous = Previous::Other;
            continue;
        }
        if c.is_ascii_digit() {
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.' || chars[i] == '_') {
                out.push(chars[i]);
                i += 1;
            }
            previous = Previous::Other;
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let replacement = if previous == Previous::Access {
                None
            } else {
                replace(&word)
            };
            out.push_str(replacement.as_deref().unwrap_or(&word));
            previous = Previous::Other;
            continue;
        }
        if c == '.' || (c == '-' && next == Some('>')) || (c == ':' && next == Some(':')) {
            if c != '.' {
                out.push(c);
                i += 1;
            }
            out.push(chars[i]);
            i += 1;
            previous = Previous::Access;
            continue;
        }
        if !c.is_whitespace() {
            previous = Previous::Other;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Returns the free identifiers used by a code fragment
pub fn free_identifiers(code: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    rewrite_identifiers(code, |word| {
        found.insert(word.to_string());
        None
    });
    found
}

/// Replaces the free occurrences of a name by an expression
pub fn substitute(code: &str, name: &str, expression: &str) -> String {
    rewrite_identifiers(code, |word| {
        if word == name {
            Some(expression.to_string())
        } else {
            None
        }
    })
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
