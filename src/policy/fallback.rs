//! What guarded execution yields when it suppresses an exception.
//!
//! Without a fallback a guarded call yields `Option<T>`: `Some` on success,
//! `None` once a matched exception has been handled. With a fallback value
//! configured it yields `T` directly and substitutes a clone of that value.

/// Shapes the successful result of guarded execution.
pub trait Fallback<T> {
    /// What the guarded call yields.
    type Output;

    /// Wrap a value returned by the unit of work.
    fn success(&self, value: T) -> Self::Output;

    /// The value yielded in place of a suppressed exception.
    fn substitute(&self) -> Self::Output;
}

/// No fallback configured: suppression yields `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Absent;

impl<T> Fallback<T> for Absent {
    type Output = Option<T>;

    fn success(&self, value: T) -> Option<T> { Some(value) }

    fn substitute(&self) -> Option<T> { None }
}

/// Suppression yields a clone of the held value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitute<T>(pub T);

impl<T: Clone> Fallback<T> for Substitute<T> {
    type Output = T;

    fn success(&self, value: T) -> T { value }

    fn substitute(&self) -> T { self.0.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_wraps_in_option() {
        assert_eq!(Fallback::<u8>::success(&Absent, 3), Some(3));
        assert_eq!(Fallback::<u8>::substitute(&Absent), None);
    }

    #[test]
    fn substitute_clones_value() {
        let fallback = Substitute(String::from("n/a"));
        assert_eq!(fallback.success(String::from("ok")), "ok");
        assert_eq!(fallback.substitute(), "n/a");
        assert_eq!(fallback.substitute(), "n/a");
    }
}
