// SPDX-License-Identifier: MIT

//! String identities for kernel entities.
//!
//! PIDs are plain integers; everything else the store keys by name
//! (users, orgs, policies, cron jobs, triggers, audit rows, plans)
//! carries a prefixed random string ID such as `usr-V1StGXR8_Z5jdHi6B-m` or
//! `crn-fT9qkLm2wXnAoPzR3uv`. The prefix makes an ID self-describing in
//! logs and audit detail blobs; the random tail comes from nanoid.
//!
//! IDs are short enough to live inline in a fixed buffer, so the types
//! here are `Copy` and hash like plain strings.

/// Inline capacity: a 4-byte type prefix plus [`RANDOM_LEN`] random
/// characters.
pub const ID_MAX_LEN: usize = 23;

/// Length of the generated nanoid tail.
pub const RANDOM_LEN: usize = 19;

/// Truncate a string to at most `n` characters, for log-friendly
/// abbreviations.
pub fn short(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Inline string buffer backing every ID type. `Copy`, at most
/// [`ID_MAX_LEN`] bytes, always valid UTF-8.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IdBuf {
    len: u8,
    bytes: [u8; ID_MAX_LEN],
}

impl IdBuf {
    pub const fn empty() -> Self {
        Self { len: 0, bytes: [0; ID_MAX_LEN] }
    }

    /// Store a string inline. Oversized input is truncated at a char
    /// boundary (and debug-asserts, since well-formed IDs always fit).
    pub fn new(s: &str) -> Self {
        debug_assert!(s.len() <= ID_MAX_LEN, "id {s:?} does not fit in {ID_MAX_LEN} bytes");
        let mut take = s.len().min(ID_MAX_LEN);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        let mut bytes = [0u8; ID_MAX_LEN];
        bytes[..take].copy_from_slice(&s.as_bytes()[..take]);
        Self { len: take as u8, bytes }
    }

    pub fn as_str(&self) -> &str {
        // Construction copies whole chars out of a &str, so the active
        // bytes are always valid UTF-8.
        match std::str::from_utf8(&self.bytes[..self.len as usize]) {
            Ok(s) => s,
            Err(_) => unreachable!("IdBuf holds non-UTF-8 bytes"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Must agree with str::hash so Borrow<str> map lookups work.
        self.as_str().hash(state);
    }
}

impl std::borrow::Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl std::fmt::Display for IdBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for IdBuf {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for IdBuf {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        if s.len() > ID_MAX_LEN {
            return Err(serde::de::Error::custom(format!(
                "id {s:?} longer than {ID_MAX_LEN} bytes"
            )));
        }
        Ok(IdBuf::new(s))
    }
}

/// Define a prefixed ID newtype over [`IdBuf`].
///
/// ```ignore
/// define_id! {
///     /// Unique identifier for a user account.
///     pub struct UserId("usr-");
/// }
/// ```
///
/// `UserId::new()` mints `usr-` plus a random nanoid tail;
/// `from_string` re-wraps an ID read back from the store or the wire.
/// The newtype compares, hashes, borrows, and derefs as its string
/// form, so it can key maps and be matched against `&str` directly.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$attr:meta])*
        pub struct $id:ident($tag:literal);
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $id(pub $crate::id::IdBuf);

        impl $id {
            pub const PREFIX: &'static str = $tag;

            /// Mint a fresh random ID.
            pub fn new() -> Self {
                let mut raw = String::with_capacity($crate::id::ID_MAX_LEN);
                raw.push_str(Self::PREFIX);
                const RANDOM_LEN: usize = $crate::id::RANDOM_LEN;
                raw.push_str(&nanoid::nanoid!(RANDOM_LEN));
                Self($crate::id::IdBuf::new(&raw))
            }

            /// Wrap an ID that already exists (store row, wire field).
            pub fn from_string(id: impl AsRef<str>) -> Self {
                Self($crate::id::IdBuf::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// The random tail without the type prefix.
            pub fn suffix(&self) -> &str {
                self.0.as_str().strip_prefix(Self::PREFIX).unwrap_or(self.0.as_str())
            }

            /// Abbreviated suffix for log lines.
            pub fn short(&self, n: usize) -> &str {
                $crate::id::short(self.suffix(), n)
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $id {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl AsRef<str> for $id {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::borrow::Borrow<str> for $id {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $id {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<&str> for $id {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $id {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl PartialEq<str> for $id {
            fn eq(&self, other: &str) -> bool {
                self.0.as_str() == other
            }
        }

        impl PartialEq<&str> for $id {
            fn eq(&self, other: &&str) -> bool {
                self.0.as_str() == *other
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
