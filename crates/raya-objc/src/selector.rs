//! Host method name to foreign selector conversion
//!
//! Host names spell argument boundaries with underscores, so
//! `setValue_forKey` becomes `setValue:forKey:`. The rule is purely lexical
//! and does no camel-casing:
//!
//! - an underscore preceded by a character other than `_` becomes `:`
//! - a trailing `:` is added when the method takes arguments
//!
//! Names in camel case (`doSomethingWith`) therefore map to the familiar
//! `doSomethingWith:`.

/// Selector for a host method taking `arity` arguments
pub fn selector_for_method(name: &str, arity: usize) -> String {
    let mut selector = String::with_capacity(name.len() + 1);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        match (c, prev) {
            ('_', Some(p)) if p != '_' => selector.push(':'),
            _ => selector.push(c),
        }
        prev = Some(c);
    }

    if arity > 0 && !selector.ends_with(':') {
        selector.push(':');
    }
    selector
}

/// Selector for an explicitly exported method.
///
/// The first character is kept as written; every later underscore becomes
/// a colon. A trailing colon is added unless the method's encoding takes no
/// arguments.
pub fn selector_for_export(name: &str, takes_no_arguments: bool) -> String {
    let mut chars = name.chars();
    let mut selector = String::with_capacity(name.len() + 1);

    if let Some(first) = chars.next() {
        selector.push(first);
    }
    selector.extend(chars.map(|c| if c == '_' { ':' } else { c }));

    if !selector.ends_with(':') && !takes_no_arguments {
        selector.push(':');
    }
    selector
}

/// Number of arguments a selector takes
pub fn selector_arity(selector: &str) -> usize {
    selector.matches(':').count()
}
