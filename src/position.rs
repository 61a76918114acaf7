//! Per-side position of a range copy.

/// Where one side of a copy reads or writes.
///
/// `Explicit` offsets are advanced in place by the number of bytes moved and
/// never touch the file's shared cursor. `Implicit` uses the file's own cursor,
/// which the copy advances exactly like a direct `read`/`write` would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Absolute byte offset owned by the caller.
    Explicit(u64),
    /// The file's current stream position.
    #[default]
    Implicit,
}

impl Position {
    /// Explicit offset, if any.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Explicit(off) => Some(*off),
            Self::Implicit => None,
        }
    }

    /// Whether this side uses the file's own cursor.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::Implicit)
    }

    /// Move an explicit offset forward by `n` bytes. No-op for `Implicit`.
    pub fn advance(&mut self, n: u64) {
        if let Self::Explicit(off) = self {
            *off += n;
        }
    }
}
