//! Convenience imports for code that raises and guards exceptions.
//!
//! Brings the policy types, both builder traits, the exception type and the
//! standard kinds into scope together with the crate's macros.
//!
//! # Examples
//!
//! ```
//! use exceptionx::prelude::*;
//!
//! let retry = Retry::builder(&kinds::OS_ERROR).max_attempts(2).silent(true).build();
//! assert!(retry.is_ok());
//! ```

pub use crate::{
    DisposeOptions,
    Exception,
    PolicyBuilder,
    ResultExt,
    Retry,
    TryContext,
    TryExcept,
    exception,
    frame,
    guarded,
    kind,
    kinds,
    raise,
};
