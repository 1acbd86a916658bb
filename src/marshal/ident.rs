//! C identifier and literal helpers.

const CPP_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while", "bool", "catch", "class", "delete", "friend", "inline", "new",
    "namespace", "operator", "private", "protected", "public", "tempate", "this", "throw", "try",
    "template", "__int8", "__int16", "__int32", "__int64", "_int8", "_int16", "_int32", "_int64",
];

/// Returns true if `word` is a reserved C/C++ word.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    match word.chars().next() {
        Some(first) if first.is_uppercase() => false,
        Some(_) => CPP_KEYWORDS.contains(&word),
        None => false,
    }
}

/// Turns an arbitrary managed name into a valid C identifier.
///
/// Characters that cannot appear in an identifier become `_`, and reserved words are prefixed
/// with `_` until they no longer collide.
#[must_use]
pub fn make_c_identifier(name: &str) -> String {
    if name.is_empty() {
        return "_id".to_string();
    }

    let mut result: String = name
        .chars()
        .enumerate()
        .map(|(i, ch)| {
            let valid = if i == 0 {
                ch.is_alphabetic()
            } else {
                ch.is_alphanumeric()
            };
            if valid {
                ch
            } else {
                '_'
            }
        })
        .collect();

    while is_keyword(&result) {
        result.insert(0, '_');
    }

    result
}

/// Renders `text` as a double-quoted C string literal.
#[must_use]
pub fn string_to_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('"');
    for ch in text.chars() {
        match ch {
            '\'' => literal.push_str("\\'"),
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\u{7}' => literal.push_str("\\a"),
            '\u{8}' => literal.push_str("\\b"),
            '\u{c}' => literal.push_str("\\f"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\u{b}' => literal.push_str("\\v"),
            other => literal.push(other),
        }
    }
    literal.push('"');
    literal
}
