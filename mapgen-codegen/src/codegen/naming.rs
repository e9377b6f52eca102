//! Identifier helpers shared by the emitters

use heck::ToSnakeCase;

/// Strict and reserved keywords, sorted for `binary_search`.
const RUST_KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be written as raw identifiers.
const PATH_KEYWORDS: &[&str] = &["Self", "crate", "self", "super"];

/// snake_case form of a column, alias or key name: `userId` -> `user_id`
pub fn to_field_name(name: &str) -> String {
    name.to_snake_case()
}

/// File stem of a generated type: `UserAddress` -> `user_address`
pub fn to_module_name(classname: &str) -> String {
    classname.to_snake_case()
}

/// Primary key lookup name: `["user_id", "role"]` -> `find_by_user_id_and_role`
pub fn generate_find_by_method_name(fields: &[String]) -> String {
    let parts: Vec<String> = fields.iter().map(|f| to_field_name(f)).collect();
    format!("find_by_{}", parts.join("_and_"))
}

pub fn is_rust_keyword(name: &str) -> bool {
    RUST_KEYWORDS.binary_search(&name).is_ok()
}

/// Field identifier for `name`, usable as a struct field and method name.
///
/// Keywords become raw identifiers (`type` -> `r#type`), except the path
/// keywords which take a trailing underscore (`self` -> `self_`).
pub fn escape_field_name(name: &str) -> String {
    let snake = to_field_name(name);
    if PATH_KEYWORDS.contains(&snake.as_str()) {
        format!("{}_", snake)
    } else if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else {
        snake
    }
}
