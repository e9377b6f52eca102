//! Identifier escaping and placeholder naming

/// Quote an identifier with backticks, one part per `.` segment.
///
/// `*` segments are left bare so `user.*` stays a wildcard.
pub fn escape_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("`{}`", part.trim_matches('`').replace('`', "``"))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Qualify `field` with `prefix` when one is given.
pub(crate) fn qualified(prefix: Option<&str>, field: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, field),
        _ => field.to_string(),
    }
}

/// Derive a placeholder base name from a (possibly qualified) field name.
///
/// Placeholder names are restricted to `[A-Za-z0-9_]`, and never start with
/// a digit.
pub(crate) fn placeholder_base(field: &str) -> String {
    let mut base: String = field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
        base.insert(0, 'p');
    }
    base
}
