//! Fixed-capacity inline string
//!
//! Entry text lives in these so a pooled entry is one contiguous block
//! with no heap pointers to chase or reallocate. Writes that exceed
//! capacity are truncated at a UTF-8 character boundary; nothing here
//! panics or allocates.

use std::fmt;

/// Inline string with capacity `N` bytes.
#[derive(Clone, Copy)]
pub struct BoundedStr<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> BoundedStr<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Replace the contents. Returns false when the input was truncated.
    pub fn set(&mut self, s: &str) -> bool {
        self.len = 0;
        self.push_str(s)
    }

    /// Append as much of `s` as fits, cutting at a character boundary.
    /// Returns false when anything was dropped.
    pub fn push_str(&mut self, s: &str) -> bool {
        let avail = N - self.len;
        if s.len() <= avail {
            self.buf[self.len..self.len + s.len()].copy_from_slice(s.as_bytes());
            self.len += s.len();
            return true;
        }

        let mut cut = avail;
        while cut > 0 && !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buf[self.len..self.len + cut].copy_from_slice(&s.as_bytes()[..cut]);
        self.len += cut;
        false
    }

    pub fn as_str(&self) -> &str {
        // Only whole characters are ever copied in, so this cannot fail.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl<const N: usize> Default for BoundedStr<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> PartialEq for BoundedStr<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<const N: usize> Eq for BoundedStr<N> {}

impl<const N: usize> PartialEq<str> for BoundedStr<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedStr<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> From<&str> for BoundedStr<N> {
    fn from(s: &str) -> Self {
        let mut out = Self::new();
        out.set(s);
        out
    }
}

#[cfg(test)]
#[path = "bounded_test.rs"]
mod bounded_test;
