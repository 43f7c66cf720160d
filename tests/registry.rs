//! Tests for the process-wide error kind registry.

use std::{sync::Barrier, thread};

use exceptionx::{
    ErrorKind,
    RegistryError,
    kind,
    kinds,
    registry::{self, Registry},
};
use exceptionx_testing::{LoggerHandle, logger};
use proptest::prelude::*;
use rstest::rstest;
use serial_test::serial;

#[test]
fn resolving_twice_yields_the_same_kind() {
    let first = registry::resolve("InventoryMismatchError");
    let second = registry::resolve("InventoryMismatchError");
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.name(), "InventoryMismatchError");
    assert_eq!(first.parent(), Some(&kinds::ERROR));
    assert!(!first.is_standard());
}

#[test]
fn distinct_names_yield_distinct_kinds() {
    assert_ne!(registry::resolve("LeftHandError"), registry::resolve("RightHandError"));
}

#[rstest]
#[case("Exception", &kinds::EXCEPTION)]
#[case("ValueError", &kinds::VALUE_ERROR)]
#[case("KeyError", &kinds::KEY_ERROR)]
#[case("TimeoutError", &kinds::TIMEOUT_ERROR)]
#[case("PanicError", &kinds::PANIC_ERROR)]
fn standard_names_resolve_to_standard_kinds(#[case] name: &str, #[case] expected: &'static ErrorKind) {
    let registry = Registry::default();
    assert_eq!(registry.resolve(name), expected);
    assert!(registry.is_empty(), "standard kinds are never registered");
}

#[test]
fn macro_resolves_through_the_global_registry() {
    assert_eq!(kind!(LedgerClosedError), registry::resolve("LedgerClosedError"));
    assert_eq!(kind!(IndexError), &kinds::INDEX_ERROR);
}

#[test]
fn lookup_does_not_create() {
    let err = registry::lookup("NeverRequestedError").expect_err("not registered");
    assert_eq!(err, RegistryError::NotFound("NeverRequestedError".into()));
    assert!(!registry::history().contains("NeverRequestedError"));

    let kind = registry::resolve("LaterRequestedError");
    assert_eq!(registry::lookup("LaterRequestedError"), Ok(kind));
}

#[rstest]
#[case("__copy__")]
#[case("__deepcopy__")]
#[case("__reduce_ex__")]
fn reserved_names_are_refused(#[case] name: &str) {
    let registry = Registry::default();
    assert_eq!(registry.try_resolve(name), Err(RegistryError::Reserved(name.into())));
    assert!(registry.is_empty());
}

#[test]
fn history_lists_registered_names_in_order() {
    let registry = Registry::default();
    for name in ["ZetaError", "AlphaError", "MuError"] {
        registry.resolve(name);
    }
    let history = registry.history();
    assert_eq!(
        history.names().collect::<Vec<_>>(),
        ["AlphaError", "MuError", "ZetaError"]
    );
    assert_eq!(history.get("MuError"), Some(registry.resolve("MuError")));
}

#[test]
fn concurrent_first_requests_agree_on_one_kind() {
    const THREADS: usize = 16;
    let registry = Registry::default();
    let barrier = Barrier::new(THREADS);
    let kinds: Vec<&'static ErrorKind> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    registry.resolve("ContendedError")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("resolver thread panicked"))
            .collect()
    });
    assert!(kinds.iter().all(|kind| *kind == kinds[0]));
    assert_eq!(registry.len(), 1);
}

#[rstest]
#[serial(exceptionx_log)]
fn unconventional_names_warn_once(mut logger: LoggerHandle) {
    let registry = Registry::default();
    let kind = registry.resolve("Quota");
    assert_eq!(kind.name(), "Quota");
    assert!(kind.is_a(&kinds::ERROR));

    let warnings: Vec<_> = logger
        .drain()
        .into_iter()
        .filter(|(level, message)| *level == log::Level::Warn && message.contains("\"Quota\""))
        .collect();
    assert_eq!(warnings.len(), 1, "{warnings:?}");

    registry.resolve("Quota");
    assert!(
        logger
            .drain()
            .iter()
            .all(|(_, message)| !message.contains("\"Quota\"")),
        "existing kinds must not warn again"
    );
}

proptest! {
    #[test]
    fn every_name_maps_to_exactly_one_kind(stem in "[A-Z][a-z]{1,12}") {
        let name = format!("{stem}Error");
        let registry = Registry::default();
        let first = registry.resolve(&name);
        prop_assert_eq!(first, registry.resolve(&name));
        prop_assert_eq!(first.name(), name.as_str());
        prop_assert!(first.is_a(&kinds::EXCEPTION));
    }
}
