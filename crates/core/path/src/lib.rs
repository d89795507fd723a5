//! CCFS Path Module
//!
//! Slash-separated path handling for CCFS volumes. CCFS paths are always
//! absolute, case-sensitive and never normalized: `//a` and `/a/` are looked
//! up exactly as written, one component at a time.

#![no_std]

extern crate alloc;

use alloc::format;
use alloc::string::String;

/// Path separator
pub const SEPARATOR: char = '/';

/// Longest name a directory record can hold
pub const MAX_NAME: usize = 0x15;

/// Split off the first component of an absolute path
///
/// The component runs from index 1 up to the next separator (or the end of
/// the string). The returned remainder starts *at* that separator, so it is
/// itself an absolute path, or empty when no components are left.
///
/// Returns `None` if `path` does not start with a separator.
///
/// ```
/// assert_eq!(ccfs_path::split_first("/dir/x"), Some(("dir", "/x")));
/// assert_eq!(ccfs_path::split_first("/a"), Some(("a", "")));
/// assert_eq!(ccfs_path::split_first("/"), Some(("", "")));
/// ```
pub fn split_first(path: &str) -> Option<(&str, &str)> {
    let rest = path.strip_prefix(SEPARATOR)?;
    let end = rest.find(SEPARATOR).unwrap_or(rest.len());
    Some((&rest[..end], &rest[end..]))
}

/// Iterator over the components of an absolute path, in lookup order
pub struct Components<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Components<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let (component, rest) = split_first(self.rest)?;
        self.rest = rest;
        Some(component)
    }
}

/// Components of an absolute path, empty components included
///
/// `"/a//b"` yields `"a"`, `""`, `"b"`; a relative path yields nothing.
pub fn components(path: &str) -> Components<'_> {
    Components { rest: path }
}

/// Join a directory path and a record name
pub fn join(base: &str, name: &str) -> String {
    if base.ends_with(SEPARATOR) {
        format!("{}{}", base, name)
    } else {
        format!("{}{}{}", base, SEPARATOR, name)
    }
}

/// Check if a name fits in a directory record and can be looked up
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME
        && !name.contains(SEPARATOR)
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn to_vec(path: &str) -> Vec<&str> {
        components(path).collect()
    }

    #[test]
    fn test_split_first() {
        assert_eq!(split_first("/dir/x"), Some(("dir", "/x")));
        assert_eq!(split_first("/x"), Some(("x", "")));
        assert_eq!(split_first("/"), Some(("", "")));
        assert_eq!(split_first("/a/"), Some(("a", "/")));
        assert_eq!(split_first("//a"), Some(("", "/a")));
        assert_eq!(split_first("relative"), None);
        assert_eq!(split_first(""), None);
    }

    #[test]
    fn test_components_keep_empty() {
        assert_eq!(to_vec("/a/b/c"), vec!["a", "b", "c"]);
        assert_eq!(to_vec("/a//b"), vec!["a", "", "b"]);
        assert_eq!(to_vec("/"), vec![""]);
        assert!(to_vec("a/b").is_empty());
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "a"), "/a");
        assert_eq!(join("/dir", "x"), "/dir/x");
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("readme.txt"));
        assert!(is_valid_name("abcdefghijklmnopqrstu"));
        assert!(!is_valid_name("abcdefghijklmnopqrstuv"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name("a\0b"));
    }
}
