//! Identifier and free-text normalization.
//!
//! All functions are total and idempotent.

/// Policy identifier form of a control id: lower-case, `.` and ` ` → `-`.
///
/// `OSPS-AC.01` → `osps-ac-01`
pub fn sanitize_policy_id(id: &str) -> String {
    replace_chars(&id.to_lowercase(), &['.', ' '])
}

/// Filesystem-safe form of an identifier: lower-case, ` `, `/`, `\`, `:` → `-`.
pub fn sanitize_filename(name: &str) -> String {
    replace_chars(&name.to_lowercase(), &[' ', '/', '\\', ':'])
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn replace_chars(input: &str, unsafe_chars: &[char]) -> String {
    input
        .chars()
        .map(|c| if unsafe_chars.contains(&c) { '-' } else { c })
        .collect()
}
