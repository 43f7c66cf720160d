//! Process termination that a test can observe.

use exceptionx::Terminator;

/// Panics with `terminated with status <code>` instead of exiting.
///
/// Pair with `#[should_panic(expected = "terminated with status 4")]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanickingTerminator;

impl Terminator for PanickingTerminator {
    fn terminate(&self, code: i32) -> ! { panic!("terminated with status {code}") }
}
