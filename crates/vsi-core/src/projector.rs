use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<rest>.*)$").unwrap());

/// Locator of a vision projector resource: a plain filesystem path or a URI.
///
/// Only the shape of the locator is inspected here. Whether it points at a
/// usable projector is for the engine to decide at attach time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectorRef(String);

impl ProjectorRef {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank locators count as empty.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// URI scheme, if the locator has one (`file`, `content`, ...).
    pub fn scheme(&self) -> Option<&str> {
        URI.captures(&self.0)
            .and_then(|c| c.name("scheme"))
            .map(|m| m.as_str())
    }

    /// The part of the locator that names the resource. For URIs any
    /// `?query` or `#fragment` is dropped; plain paths are taken verbatim.
    fn resource_part(&self) -> &str {
        if self.scheme().is_none() {
            return &self.0;
        }
        let end = self.0.find(['?', '#']).unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Case-sensitive suffix check against the projector naming convention.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.resource_part().ends_with(extension)
    }

    /// Local filesystem path for plain paths and `file://` URIs.
    ///
    /// `file://localhost/x` and `file:///x` both map to `/x`. Percent-escapes
    /// are not decoded. Other schemes have no local path.
    pub fn local_path(&self) -> Option<PathBuf> {
        let Some(caps) = URI.captures(&self.0) else {
            return Some(PathBuf::from(&self.0));
        };
        if !caps["scheme"].eq_ignore_ascii_case("file") {
            return None;
        }
        let rest = &caps["rest"];
        let rest = rest.strip_prefix("localhost").unwrap_or(rest);
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        let path = &rest[..end];
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

impl fmt::Display for ProjectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectorRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProjectorRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Path> for ProjectorRef {
    fn from(p: &Path) -> Self {
        Self(p.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PROJECTOR_EXTENSION;
    use proptest::prelude::*;

    #[test]
    fn test_empty_and_blank() {
        assert!(ProjectorRef::new("").is_empty());
        assert!(ProjectorRef::new("   ").is_empty());
        assert!(!ProjectorRef::new("proj.mmproj").is_empty());
    }

    #[test]
    fn test_extension_plain_path() {
        assert!(ProjectorRef::new("/models/llava.mmproj").has_extension(PROJECTOR_EXTENSION));
        assert!(!ProjectorRef::new("/models/llava.gguf").has_extension(PROJECTOR_EXTENSION));
        // matches the naming convention exactly, no case folding
        assert!(!ProjectorRef::new("/models/LLAVA.MMPROJ").has_extension(PROJECTOR_EXTENSION));
    }

    #[test]
    fn test_extension_ignores_uri_query() {
        let r = ProjectorRef::new("https://cdn.example/p.mmproj?sig=abc#frag");
        assert!(r.has_extension(PROJECTOR_EXTENSION));
    }

    #[test]
    fn test_plain_path_keeps_hash() {
        let r = ProjectorRef::new("/tmp/a#b.mmproj");
        assert!(r.has_extension(PROJECTOR_EXTENSION));
        assert_eq!(r.local_path(), Some(PathBuf::from("/tmp/a#b.mmproj")));
    }

    #[test]
    fn test_scheme_detection() {
        assert_eq!(ProjectorRef::new("file:///a/b").scheme(), Some("file"));
        assert_eq!(ProjectorRef::new("content://x/y").scheme(), Some("content"));
        assert_eq!(ProjectorRef::new("/a/b").scheme(), None);
        assert_eq!(ProjectorRef::new(r"C:\models\p.mmproj").scheme(), None);
    }

    #[test]
    fn test_local_path_file_uri() {
        assert_eq!(
            ProjectorRef::new("file:///data/p.mmproj").local_path(),
            Some(PathBuf::from("/data/p.mmproj"))
        );
        assert_eq!(
            ProjectorRef::new("FILE://localhost/data/p.mmproj").local_path(),
            Some(PathBuf::from("/data/p.mmproj"))
        );
        assert_eq!(ProjectorRef::new("file://").local_path(), None);
    }

    #[test]
    fn test_local_path_foreign_scheme() {
        assert_eq!(ProjectorRef::new("content://media/p.mmproj").local_path(), None);
    }

    #[test]
    fn test_serde_transparent() {
        let r = ProjectorRef::new("p.mmproj");
        assert_eq!(serde_json::to_string(&r).unwrap(), "\"p.mmproj\"");
    }

    proptest! {
        #[test]
        fn prop_plain_paths_with_suffix_match(stem in "[a-zA-Z0-9_/]{1,24}") {
            let r = ProjectorRef::new(format!("{stem}{PROJECTOR_EXTENSION}"));
            prop_assert!(r.has_extension(PROJECTOR_EXTENSION));
            prop_assert!(!r.is_empty());
            prop_assert!(r.local_path().is_some());
        }

        #[test]
        fn prop_whitespace_is_empty(ws in "[ \t\n]{0,8}") {
            prop_assert!(ProjectorRef::new(ws).is_empty());
        }
    }
}
