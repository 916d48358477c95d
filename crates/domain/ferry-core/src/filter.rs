/// Returns true when `file_name` matches one of the configured ignore
/// patterns. A pattern is either an exact base name (`Thumbs.db`) or a
/// `*`-prefixed suffix match (`*.tmp`).
pub fn is_ignored(file_name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| match p.strip_prefix('*') {
        Some(suffix) => !suffix.is_empty() && file_name.ends_with(suffix),
        None => file_name == p,
    })
}
