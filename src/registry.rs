//! Process-wide registry of synthesized error kinds.
//!
//! The registry maps names to [`ErrorKind`] handles and only ever grows:
//! entries are inserted by [`Registry::resolve`] and never replaced or removed.
//! Concurrent requests for the same new name race on a single map entry, so
//! exactly one kind is synthesized and every caller observes that winner.
//!
//! Readers get a [`History`] snapshot, which has no mutating operations at all.

use std::{
    collections::BTreeMap,
    sync::{LazyLock, OnceLock},
};

use dashmap::DashMap;
use log::warn;

use crate::{
    error::RegistryError,
    kind::{ErrorKind, standard},
};

/// Suffix every kind name is expected to carry.
pub const CONVENTIONAL_SUFFIX: &str = "Error";

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::default);

/// Concurrent, insert-only map from name to synthesized kind.
#[derive(Default)]
pub struct Registry(DashMap<String, &'static ErrorKind>);

impl Registry {
    /// The registry shared by the whole process.
    #[must_use]
    pub fn global() -> &'static Registry { &GLOBAL }

    /// Return the kind called `name`, creating it on first request.
    ///
    /// Standard kinds are returned as-is and never inserted. A new kind is
    /// synthesized below [`standard::ERROR`]; a warning is logged when its
    /// name does not end in `"Error"`, but the name is honoured.
    pub fn resolve(&self, name: &str) -> &'static ErrorKind {
        if let Some(kind) = self.0.get(name) {
            return *kind;
        }
        if let Some(kind) = standard::find(name) {
            return kind;
        }
        *self.0.entry(name.to_owned()).or_insert_with(|| {
            if !name.ends_with(CONVENTIONAL_SUFFIX) {
                warn!(
                    "strange error kind \"{name}\", error kind names should end with \
                     \"{CONVENTIONAL_SUFFIX}\""
                );
            }
            ErrorKind::synthesize(name)
        })
    }

    /// Like [`resolve`](Self::resolve), but refuses reserved `__name__` forms.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Reserved`] for names of the form `__x__`.
    pub fn try_resolve(&self, name: &str) -> Result<&'static ErrorKind, RegistryError> {
        if is_reserved(name) {
            return Err(RegistryError::Reserved(name.to_owned()));
        }
        Ok(self.resolve(name))
    }

    /// Look up a registered kind without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `name` was never registered.
    /// Standard kinds are not registered and are not found here.
    pub fn lookup(&self, name: &str) -> Result<&'static ErrorKind, RegistryError> {
        self.0
            .get(name)
            .map(|kind| *kind)
            .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
    }

    /// True if `name` has been registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// True if nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Read-only snapshot of every registered kind.
    #[must_use]
    pub fn history(&self) -> History {
        History(
            self.0
                .iter()
                .map(|entry| (entry.value().name(), *entry.value()))
                .collect(),
        )
    }
}

fn is_reserved(name: &str) -> bool {
    name.len() > 4
        && name.starts_with("__")
        && name.ends_with("__")
        && !name[2..].starts_with('_')
        && !name[..name.len() - 2].ends_with('_')
}

/// Immutable snapshot of the registry, ordered by name.
#[derive(Clone, Debug, Default)]
pub struct History(BTreeMap<&'static str, &'static ErrorKind>);

impl History {
    /// The kind registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static ErrorKind> { self.0.get(name).copied() }

    /// True if `name` was registered when the snapshot was taken.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.0.contains_key(name) }

    /// Registered names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ { self.0.keys().copied() }

    /// Registered kinds, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static ErrorKind)> + '_ {
        self.0.iter().map(|(name, kind)| (*name, *kind))
    }

    /// Number of kinds in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// True if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Resolve `name` in the global registry. See [`Registry::resolve`].
pub fn resolve(name: &str) -> &'static ErrorKind { Registry::global().resolve(name) }

/// Fallible resolve in the global registry. See [`Registry::try_resolve`].
///
/// # Errors
///
/// Returns [`RegistryError::Reserved`] for names of the form `__x__`.
pub fn try_resolve(name: &str) -> Result<&'static ErrorKind, RegistryError> {
    Registry::global().try_resolve(name)
}

/// Look up `name` in the global registry. See [`Registry::lookup`].
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if `name` was never registered.
pub fn lookup(name: &str) -> Result<&'static ErrorKind, RegistryError> {
    Registry::global().lookup(name)
}

/// Snapshot of the global registry.
#[must_use]
pub fn history() -> History { Registry::global().history() }

#[doc(hidden)]
#[must_use]
pub fn cached(slot: &OnceLock<&'static ErrorKind>, name: &str) -> &'static ErrorKind {
    slot.get_or_init(|| resolve(name))
}

/// Resolve an error kind by identifier in the global registry.
///
/// The handle is cached per call site after the first resolution.
///
/// ```
/// use exceptionx::{kind, kinds};
///
/// assert_eq!(kind!(ValueError), &kinds::VALUE_ERROR);
/// assert_eq!(kind!(QuotaExceededError), kind!(QuotaExceededError));
/// assert!(kind!(QuotaExceededError).is_a(&kinds::ERROR));
/// ```
#[macro_export]
macro_rules! kind {
    ($name:ident) => {{
        static SLOT: ::std::sync::OnceLock<&'static $crate::ErrorKind> =
            ::std::sync::OnceLock::new();
        $crate::registry::cached(&SLOT, ::core::stringify!($name))
    }};
}
