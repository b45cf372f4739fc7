//! Attribute value bytes.
//!
//! LDAP values are octet strings. Most of them happen to be UTF-8 text, but
//! matching rules are free to reject anything they cannot interpret, so the
//! model never assumes a value is valid text.

use std::fmt;
use std::sync::Arc;

/// Immutable byte string holding a single attribute or assertion value.
///
/// Cloning is cheap (reference counted), which lets virtual attributes hand out
/// owned values and real attributes share theirs without copying.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(Arc<[u8]>);

impl ByteString {
    pub fn empty() -> Self {
        Self(Arc::from(&[][..]))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value as text if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Default for ByteString {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for ByteString {
    fn from(value: &str) -> Self {
        Self(Arc::from(value.as_bytes()))
    }
}

impl From<String> for ByteString {
    fn from(value: String) -> Self {
        Self(Arc::from(value.into_bytes()))
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        Self(Arc::from(value))
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        Self(Arc::from(value))
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "{:?}", s),
            None => write!(f, "{:02x?}", &self.0[..]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_bytes_lexicographically() {
        assert!(ByteString::from("abc") < ByteString::from("abd"));
        assert!(ByteString::from("ab") < ByteString::from("abc"));
        assert!(ByteString::from("B") < ByteString::from("a"));
    }

    #[test]
    fn clones_share_the_same_bytes() {
        let value = ByteString::from("shared");
        let copy = value.clone();
        assert_eq!(value.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }

    #[test]
    fn invalid_utf8_has_no_str_view() {
        let value = ByteString::from(vec![0xff, 0xfe]);
        assert_eq!(value.as_str(), None);
        assert_eq!(format!("{:?}", value), "[ff, fe]");
    }

    #[test]
    fn display_renders_text() {
        assert_eq!(ByteString::from("Bob").to_string(), "Bob");
        assert!(ByteString::empty().is_empty());
    }
}
