//! HTML-mode text helpers: escaping and user mentions.

use crate::types::User;

/// Escape text for `parse_mode = "HTML"` messages.
///
/// # Examples
///
/// ```
/// use warden_proto::escape_html;
///
/// assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build an HTML mention linking to the user's profile.
///
/// Returns `None` when the user has no displayable name (deleted accounts),
/// in which case callers fall back to [`plain_name`].
pub fn mention_html(user: &User) -> Option<String> {
    let name = user.full_name();
    if name.is_empty() {
        return None;
    }
    Some(format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user.id,
        escape_html(&name)
    ))
}

/// Plain-text display name: full name, else `@username`, else the numeric id.
pub fn plain_name(user: &User) -> String {
    let name = user.full_name();
    if !name.is_empty() {
        return name;
    }
    match user.username.as_deref() {
        Some(username) if !username.is_empty() => format!("@{username}"),
        _ => user.id.to_string(),
    }
}
