//! Standard error kinds.
//!
//! These exist before any registry use and are never inserted into it:
//! resolving one of their names returns the static below unchanged.

use super::ErrorKind;

macro_rules! standard_kinds {
    ($($(#[$meta:meta])* $ident:ident = $name:literal $(: $parent:ident)?;)*) => {
        $(
            $(#[$meta])*
            pub static $ident: ErrorKind = ErrorKind::standard($name, standard_kinds!(@parent $($parent)?));
        )*

        /// Every standard kind, in declaration order.
        pub static ALL: &[&ErrorKind] = &[$(&$ident),*];
    };
    (@parent) => { None };
    (@parent $parent:ident) => { Some(&$parent) };
}

standard_kinds! {
    /// Universal ancestor; a filter on it intercepts everything.
    EXCEPTION = "Exception";
    /// Root of every kind synthesized by the registry.
    ERROR = "Error": EXCEPTION;

    ARITHMETIC_ERROR = "ArithmeticError": EXCEPTION;
    ZERO_DIVISION_ERROR = "ZeroDivisionError": ARITHMETIC_ERROR;
    OVERFLOW_ERROR = "OverflowError": ARITHMETIC_ERROR;

    LOOKUP_ERROR = "LookupError": EXCEPTION;
    INDEX_ERROR = "IndexError": LOOKUP_ERROR;
    KEY_ERROR = "KeyError": LOOKUP_ERROR;

    /// Raised for I/O failures; `std::io::Error` converts into it.
    OS_ERROR = "OSError": EXCEPTION;
    FILE_NOT_FOUND_ERROR = "FileNotFoundError": OS_ERROR;
    PERMISSION_ERROR = "PermissionError": OS_ERROR;
    TIMEOUT_ERROR = "TimeoutError": OS_ERROR;
    CONNECTION_ERROR = "ConnectionError": OS_ERROR;
    INTERRUPTED_ERROR = "InterruptedError": OS_ERROR;

    RUNTIME_ERROR = "RuntimeError": EXCEPTION;
    NOT_IMPLEMENTED_ERROR = "NotImplementedError": RUNTIME_ERROR;
    RECURSION_ERROR = "RecursionError": RUNTIME_ERROR;

    /// Raised for malformed values; number parse errors convert into it.
    VALUE_ERROR = "ValueError": EXCEPTION;
    UNICODE_ERROR = "UnicodeError": VALUE_ERROR;

    TYPE_ERROR = "TypeError": EXCEPTION;
    ATTRIBUTE_ERROR = "AttributeError": EXCEPTION;
    ASSERTION_ERROR = "AssertionError": EXCEPTION;
    NAME_ERROR = "NameError": EXCEPTION;
    EOF_ERROR = "EOFError": EXCEPTION;
    MEMORY_ERROR = "MemoryError": EXCEPTION;

    /// A panic captured from a unit of work by a policy with
    /// `catch_panics(true)`.
    PANIC_ERROR = "PanicError": EXCEPTION;
}

/// Find the standard kind called `name`.
#[must_use]
pub fn find(name: &str) -> Option<&'static ErrorKind> {
    ALL.iter().copied().find(|kind| kind.name() == name)
}
