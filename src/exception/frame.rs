//! Attribution frames.
//!
//! A [`Frame`] records where an [`Exception`](crate::Exception) was raised or
//! passed through: module path, enclosing function, file and line. Frames are
//! captured with the [`frame!`](crate::frame) macro, which reads the enclosing
//! function's path from the type name of a nested helper function.

use std::panic::Location;

/// Name of the helper function [`frame!`](crate::frame) nests at the call
/// site; stripped again when the qualified name is derived.
#[doc(hidden)]
pub const HELPER: &str = "__exceptionx_frame";

/// One attribution record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    module: Option<&'static str>,
    function: Option<&'static str>,
    file: &'static str,
    line: u32,
}

impl Frame {
    /// Build a frame from its parts. Prefer [`frame!`](crate::frame).
    #[doc(hidden)]
    #[must_use]
    pub const fn new(
        module: &'static str,
        function: &'static str,
        file: &'static str,
        line: u32,
    ) -> Self {
        Self {
            module: Some(module),
            function: Some(function),
            file,
            line,
        }
    }

    /// A frame holding only the caller's source location.
    ///
    /// Used where no module information is available, such as `?`
    /// conversions from foreign error types.
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            module: None,
            function: None,
            file: location.file(),
            line: location.line(),
        }
    }

    /// A frame naming a unit of work by its type path, e.g.
    /// `app::jobs::sync::{{closure}}`. Line information is unknown (zero).
    #[must_use]
    pub fn unit(type_path: &'static str) -> Self {
        let trimmed = strip_closures(type_path);
        let module = trimmed.rsplit_once("::").map_or(trimmed, |(module, _)| module);
        Self {
            module: Some(module),
            function: Some(trimmed),
            file: "<unknown>",
            line: 0,
        }
    }

    /// Module path of the frame, if known.
    #[must_use]
    pub fn module(&self) -> Option<&'static str> { self.module }

    /// Full path of the enclosing function, if known.
    #[must_use]
    pub fn function(&self) -> Option<&'static str> { self.function }

    /// Source file.
    #[must_use]
    pub fn file(&self) -> &'static str { self.file }

    /// Source line; zero when unknown.
    #[must_use]
    pub fn line(&self) -> u32 { self.line }

    /// The function name relative to its module, closures elided and path
    /// segments joined with `.`: `Worker.run` for a method, `main` for a free
    /// function.
    #[must_use]
    pub fn qualname(&self) -> Option<String> {
        let function = self.function?;
        let function = function
            .strip_suffix(HELPER)
            .and_then(|path| path.strip_suffix("::"))
            .unwrap_or(function);
        let relative = self
            .module
            .and_then(|module| function.strip_prefix(module))
            .and_then(|rest| rest.strip_prefix("::"))
            .unwrap_or(function);
        let name = relative
            .split("::")
            .filter(|segment| *segment != "{{closure}}")
            .collect::<Vec<_>>()
            .join(".");
        Some(if name.is_empty() { "<module>".to_owned() } else { name })
    }

    /// True for frames recorded inside this crate.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        let krate = env!("CARGO_CRATE_NAME");
        self.module.is_some_and(|module| {
            module == krate
                || module
                    .strip_prefix(krate)
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

fn strip_closures(path: &'static str) -> &'static str {
    let mut path = path;
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    path
}

#[doc(hidden)]
#[must_use]
pub fn function_path<F>(_: F) -> &'static str { std::any::type_name::<F>() }

/// Capture a [`Frame`] for the current source location.
///
/// ```
/// let frame = exceptionx::frame!();
/// assert_eq!(frame.line(), line!() - 1);
/// assert!(frame.module().is_some());
/// ```
#[macro_export]
macro_rules! frame {
    () => {{
        fn __exceptionx_frame() {}
        $crate::exception::Frame::new(
            ::core::module_path!(),
            $crate::exception::frame::function_path(__exceptionx_frame),
            ::core::file!(),
            ::core::line!(),
        )
    }};
}
