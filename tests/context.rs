//! Tests for scoped guarded blocks.

use std::{
    fs,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use exceptionx::prelude::*;
use exceptionx_testing::{PanickingTerminator, RecordingSink};
use rstest::{fixture, rstest};

#[fixture]
fn sink() -> RecordingSink { RecordingSink::default() }

fn parse_port(text: &str) -> Result<u16, Exception> { Ok(text.parse()?) }

#[rstest]
fn matching_failure_completes_the_block(sink: RecordingSink) {
    let ctx = TryContext::builder(&kinds::VALUE_ERROR)
        .sink(sink.clone())
        .build()
        .expect("valid context");
    let mut reached_end = false;

    let result = guarded!(ctx, {
        parse_port("http")?;
        reached_end = true;
    });

    assert!(result.is_ok());
    assert!(!reached_end, "the block stops at the failure");
    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with(".ValueError] invalid digit found in string"), "{}", errors[0]);
}

#[rstest]
fn successful_block_reports_nothing(sink: RecordingSink) {
    let ctx = TryContext::builder(&kinds::VALUE_ERROR)
        .sink(sink.clone())
        .build()
        .expect("valid context");
    let mut port = 0;
    guarded!(ctx, {
        port = parse_port("8080")?;
    })
    .expect("no failure");
    assert_eq!(port, 8080);
    assert!(sink.is_empty());
}

#[rstest]
fn other_failures_escape_the_block(sink: RecordingSink) {
    let ctx = TryContext::builder(&kinds::VALUE_ERROR)
        .sink(sink.clone())
        .build()
        .expect("valid context");
    let err = guarded!(ctx, {
        fs::read_to_string("/nonexistent/exceptionx/config.toml")?;
    })
    .expect_err("not a value error");
    assert!(err.is(&kinds::FILE_NOT_FOUND_ERROR));
    assert!(sink.is_empty());
}

#[test]
fn callback_receives_the_exception() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&messages);
    let ctx = TryContext::builder(&kinds::LOOKUP_ERROR)
        .silent(true)
        .callback(move |exception, _| {
            log.lock().expect("lock").push(exception.to_string());
            Ok(())
        })
        .build()
        .expect("valid context");

    ctx.run(|| Err(exception!(&kinds::KEY_ERROR, "session {}", 42)))
        .expect("swallowed");
    assert_eq!(messages.lock().expect("lock").as_slice(), ["session 42"]);
}

#[rstest]
fn exit_follows_the_callback(sink: RecordingSink) {
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    let ctx = TryContext::builder(&kinds::EXCEPTION)
        .sink(sink.clone())
        .callback(move |_, _| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .exit_after(true)
        .terminator(PanickingTerminator)
        .build()
        .expect("valid context");

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        ctx.run(|| Err(Exception::new(&kinds::RUNTIME_ERROR, "fatal")))
    }));
    assert!(outcome.is_err());
    assert!(called.load(Ordering::SeqCst));
    assert_eq!(sink.errors().len(), 1);
}

#[test]
fn panics_in_blocks_are_converted_when_requested() {
    let ctx = TryContext::builder(&kinds::PANIC_ERROR)
        .silent(true)
        .catch_panics(true)
        .build()
        .expect("valid context");
    let values: Vec<u8> = Vec::new();
    let result = guarded!(ctx, {
        assert_eq!(values[3], 0);
    });
    assert!(result.is_ok());
}

#[tokio::test]
async fn async_blocks_are_guarded() {
    let sink = RecordingSink::default();
    let ctx = TryContext::builder(&kinds::TIMEOUT_ERROR)
        .sink(sink.clone())
        .build()
        .expect("valid context");
    ctx.run_async(async {
        tokio::task::yield_now().await;
        Err(Exception::new(&kinds::TIMEOUT_ERROR, "no heartbeat"))
    })
    .await
    .expect("swallowed");
    assert!(sink.errors()[0].ends_with(".TimeoutError] no heartbeat"));
}
