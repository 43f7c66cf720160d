//! Nominal error kinds.
//!
//! An [`ErrorKind`] is identified by its address, not its name: every kind
//! lives for the whole process behind a `&'static` reference, and two handles
//! denote the same kind only when they point at the same object. Standard
//! kinds are statics in [`standard`]; every other kind is synthesized by the
//! [`registry`](crate::registry) exactly once per name.
//!
//! Kinds form a single-inheritance tree rooted at [`standard::EXCEPTION`].
//! Synthesized kinds always hang directly off [`standard::ERROR`], so a filter
//! on `ERROR` intercepts anything the registry produces.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

pub mod standard;

/// Where a kind came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Standard,
    Synthesized,
}

/// A distinct, nominally identified error category.
///
/// `ErrorKind` values cannot be constructed or cloned outside this crate;
/// callers only ever hold `&'static ErrorKind` handles obtained from
/// [`standard`] or the registry.
pub struct ErrorKind {
    name: &'static str,
    parent: Option<&'static ErrorKind>,
    origin: Origin,
}

impl ErrorKind {
    pub(crate) const fn standard(name: &'static str, parent: Option<&'static ErrorKind>) -> Self {
        Self {
            name,
            parent,
            origin: Origin::Standard,
        }
    }

    /// Allocate a new kind below [`standard::ERROR`].
    ///
    /// The allocation is intentionally leaked: kinds are never dropped, which
    /// is what lets handles be `&'static` and compared by address.
    pub(crate) fn synthesize(name: &str) -> &'static Self {
        let name: &'static str = Box::leak(name.to_owned().into_boxed_str());
        Box::leak(Box::new(Self {
            name,
            parent: Some(&standard::ERROR),
            origin: Origin::Synthesized,
        }))
    }

    /// The kind's name, e.g. `"ValueError"`.
    #[must_use]
    pub fn name(&self) -> &'static str { self.name }

    /// The kind this one directly descends from; `None` only for the root.
    #[must_use]
    pub fn parent(&self) -> Option<&'static ErrorKind> { self.parent }

    /// True for kinds that exist before any registry use.
    #[must_use]
    pub fn is_standard(&self) -> bool { self.origin == Origin::Standard }

    /// True if `self` is `ancestor` or descends from it.
    ///
    /// ```
    /// use exceptionx::kinds;
    ///
    /// assert!(kinds::KEY_ERROR.is_a(&kinds::LOOKUP_ERROR));
    /// assert!(kinds::KEY_ERROR.is_a(&kinds::EXCEPTION));
    /// assert!(!kinds::KEY_ERROR.is_a(&kinds::VALUE_ERROR));
    /// ```
    #[must_use]
    pub fn is_a(&self, ancestor: &ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent;
        }
        false
    }

    /// Iterate from this kind up to the root, inclusive.
    pub fn lineage(&'static self) -> impl Iterator<Item = &'static ErrorKind> {
        std::iter::successors(Some(self), |kind| kind.parent)
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool { std::ptr::eq(self, other) }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H: Hasher>(&self, state: &mut H) { std::ptr::hash(self, state) }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name) }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorKind")
            .field("name", &self.name)
            .field("parent", &self.parent.map(ErrorKind::name))
            .field("standard", &self.is_standard())
            .finish()
    }
}
