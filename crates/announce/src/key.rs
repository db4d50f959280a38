use crate::{Error, Result};
use bytes::Bytes;
use core::{fmt, hash::Hash, str::FromStr};

/// Bounds every key travelling through the pipeline must satisfy.
///
/// The pipeline never inspects a key. It only moves it between queues and
/// hands a reference to the router, so any cheaply clonable, hashable value
/// qualifies.
pub trait Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> Key for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// An opaque content address, such as the binary form of a CID or a
/// multihash.
///
/// Backed by [`Bytes`] so that clones share the same allocation. The textual
/// form is lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey(Bytes);

impl ContentKey {
    /// Wraps raw key bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Bytes> for ContentKey {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for ContentKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for ContentKey {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}

impl AsRef<[u8]> for ContentKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentKey({self})")
    }
}

impl FromStr for ContentKey {
    type Err = Error;

    /// Parses a hex-encoded key. Surrounding whitespace is ignored and both
    /// letter cases are accepted.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidKey {
                reason: "key is empty".to_string(),
            });
        }

        let bytes = hex::decode(s).map_err(|e| Error::InvalidKey {
            reason: e.to_string(),
        })?;
        Ok(Self(Bytes::from(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn displays_as_lowercase_hex() {
        let key = ContentKey::from(&[0x01, 0xab, 0xff][..]);
        assert_eq!(key.to_string(), "01abff");
        assert_eq!(format!("{key:?}"), "ContentKey(01abff)");
    }

    #[test]
    fn parses_mixed_case_and_whitespace() {
        let key: ContentKey = "  01AbfF\n".parse().unwrap();
        assert_eq!(key.as_bytes(), &[0x01, 0xab, 0xff]);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(matches!(
            "".parse::<ContentKey>(),
            Err(Error::InvalidKey { .. })
        ));
        assert!(matches!(
            "abc".parse::<ContentKey>(),
            Err(Error::InvalidKey { .. })
        ));
        let err = "00zz".parse::<ContentKey>().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidKey {
                reason: hex::FromHexError::InvalidHexCharacter { c: 'z', index: 2 }.to_string()
            }
        );
    }

    #[test]
    fn equal_bytes_hash_equal() {
        let a = ContentKey::from(vec![1, 2, 3]);
        let b = ContentKey::new(Bytes::from_static(&[1, 2, 3]));
        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert!(!a.is_empty());
    }
}
