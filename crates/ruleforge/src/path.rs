//! Property path composition
//!
//! Rules report failures relative to the property they run on. A plain rule
//! reports the empty path, a collection reports `[2]` or `[2].Street`, a
//! child validator reports `Street`. Each enclosing level joins its own name
//! in front exactly once.

/// Join a parent segment with a path relative to it
pub fn join(parent: &str, relative: &str) -> String {
    if parent.is_empty() {
        return relative.to_string();
    }
    if relative.is_empty() {
        parent.to_string()
    } else if relative.starts_with('[') {
        format!("{}{}", parent, relative)
    } else {
        format!("{}.{}", parent, relative)
    }
}

/// Index segment for a collection item
pub fn index(position: usize) -> String {
    format!("[{}]", position)
}

/// Display name of a collection item, e.g. `Tags[0]`
pub fn item_name(property: &str, position: usize) -> String {
    format!("{}{}", property, index(position))
}

/// Whether `path` is a plain member path: identifiers joined by dots
pub fn is_member_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
