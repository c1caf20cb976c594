//! Turning C spellings into Rust identifiers.

/// Strict, reserved and weak keywords, plus the path keywords.
const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "macro_rules", "match", "mod", "move", "mut",
    "override", "priv", "pub", "raw", "ref", "return", "safe", "self", "static", "struct",
    "super", "trait", "true", "try", "type", "typeof", "union", "unsafe", "unsized", "use",
    "virtual", "where", "while", "yield",
];

/// Primitive type names. A type or module with one of these names would
/// shadow the primitive in generated signatures.
const PRIMITIVES: &[&str] = &[
    "bool", "char", "f32", "f64", "i128", "i16", "i32", "i64", "i8", "isize", "str", "u128",
    "u16", "u32", "u64", "u8", "usize",
];

pub fn is_keyword(s: &str) -> bool {
    s == "_" || KEYWORDS.contains(&s)
}

pub fn is_primitive(s: &str) -> bool {
    PRIMITIVES.contains(&s)
}

/// Replace characters Rust does not accept in identifiers.
///
/// Invalid characters become `_`; a run of them collapses to one `_`, and a
/// trailing one is dropped (`vec<int>` is `vec_int`). A leading digit gets a
/// `_` prefix. The result is never empty.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 1);
    let mut replaced = false;
    for c in raw.chars() {
        if c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
            replaced = false;
        } else if !replaced {
            out.push('_');
            replaced = true;
        }
    }
    if replaced && out.len() > 1 {
        out.pop();
    }
    if out.is_empty() {
        out.push('_');
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Append `_` to keywords; with `is_type`, to primitive type names too.
pub fn escape(ident: String, is_type: bool) -> String {
    if is_keyword(&ident) || (is_type && is_primitive(&ident)) {
        ident + "_"
    } else {
        ident
    }
}

/// `sanitize` then `escape`.
pub fn rust_ident(raw: &str, is_type: bool) -> String {
    escape(sanitize(raw), is_type)
}

/// Whether `s` is usable as a plain (non-raw) Rust identifier.
pub fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        && !is_keyword(s)
}

#[cfg(test)]
mod tests;
