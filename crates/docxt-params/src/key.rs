//! Dot-separated key paths.
//!
//! An absolute key keeps list positions (`Users.1.Name`), a compact key drops
//! them (`Users.Name`).

/// Separator between key path segments.
pub const KEY_SEPARATOR: char = '.';

/// Whether a key segment is a list position.
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Drop list positions from a key path.
pub fn compact(key: &str) -> String {
    key.split(KEY_SEPARATOR)
        .filter(|segment| !is_index(segment))
        .collect::<Vec<_>>()
        .join(".")
}

/// Append a segment to a key path.
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_owned()
    } else {
        format!("{parent}{KEY_SEPARATOR}{segment}")
    }
}

/// Whether `key` equals `prefix` or continues it with a further segment.
pub fn has_prefix(key: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || key
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(KEY_SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact() {
        assert_eq!(compact("Users.1.Friends.12.Name"), "Users.Friends.Name");
        assert_eq!(compact("Name"), "Name");
        assert_eq!(compact("Version2.Name"), "Version2.Name");
    }

    #[test]
    fn test_has_prefix() {
        assert!(has_prefix("Users.1.Name", "Users.1"));
        assert!(has_prefix("Users", "Users"));
        assert!(has_prefix("Users", ""));
        assert!(!has_prefix("Users10.Name", "Users1"));
        assert!(!has_prefix("Users.10.Name", "Users.1"));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "Users"), "Users");
        assert_eq!(join("Users", "1"), "Users.1");
    }
}
