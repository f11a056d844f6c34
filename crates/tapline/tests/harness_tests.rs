// Harness integration tests: whole runs captured as TAP transcripts

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tapline::{
    CaptureSink, ExitMode, Expected, Fault, Harness, RecordingTerminator, RunnerConfig, State,
};

struct Fixture {
    harness: Harness,
    capture: CaptureSink,
    terminator: RecordingTerminator,
}

fn fixture() -> Fixture {
    let capture = CaptureSink::new();
    let terminator = RecordingTerminator::new();
    let harness = Harness::builder()
        .sink(capture.clone())
        .terminator(terminator.clone())
        .capture_stack(false)
        .build();
    Fixture {
        harness,
        capture,
        terminator,
    }
}

// ============================================================================
// Transcripts
// ============================================================================

#[tokio::test]
async fn test_single_passing_test_transcript() {
    let f = fixture();
    f.harness.test("basic", |t| async move {
        t.ok(1, None);
    });

    let summary = f.harness.run().await;

    insta::assert_snapshot!(f.capture.text(), @r"
    TAP version 13
    # basic
    ok 1 — should be truthy

    1..1
    # tests 1
    # pass 1
    ");
    assert_eq!(summary.total(), 1);
    assert_eq!(f.terminator.code(), Some(0));
}

#[tokio::test]
async fn test_skip_then_plain_transcript() {
    let f = fixture();
    let invoked = Rc::new(Cell::new(false));

    let flag = Rc::clone(&invoked);
    f.harness.skip("x", move |_t| async move {
        flag.set(true);
    });
    f.harness.test("y", |t| async move {
        t.pass("y passes");
    });

    f.harness.run().await;

    insta::assert_snapshot!(f.capture.text(), @r"
    TAP version 13
    # skip x
    # y
    ok 1 — y passes

    1..2
    # tests 2
    # pass 1
    # skip 1
    ");
    assert!(!invoked.get());
    assert!(!f.capture.text().contains("# fail"));
}

#[tokio::test]
async fn test_only_excludes_plain_tests_entirely() {
    let f = fixture();
    f.harness.only("a", |t| async move {
        t.pass("a runs");
    });
    f.harness.test("b", |t| async move {
        t.fail("b must not run");
    });

    let summary = f.harness.run().await;

    assert_eq!(
        f.capture.lines(),
        vec![
            "TAP version 13",
            "# a",
            "ok 1 — a runs",
            "",
            "1..1",
            "# tests 1",
            "# pass 1",
        ]
    );
    assert_eq!(summary.total(), 1);
    assert!(!f.capture.text().contains("# b"));
}

#[tokio::test]
async fn test_fault_is_one_failure_and_run_continues() {
    let f = fixture();
    f.harness.test("boom", |_t| async move {
        Err::<(), _>(Fault::msg("boom"))
    });
    f.harness.test("after", |t| async move {
        t.pass("still here");
    });

    let summary = f.harness.run().await;

    let failures: Vec<String> = f
        .capture
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("not ok"))
        .collect();
    assert_eq!(failures, vec!["not ok 1 — Error: boom"]);
    assert!(f.capture.contains_line("  operator: error"));
    assert!(f.capture.contains_line("ok 2 — still here"));
    assert_eq!((summary.passed, summary.failed), (1, 1));
    assert_eq!(f.terminator.code(), Some(1));
}

#[tokio::test]
async fn test_question_mark_converts_std_errors() {
    let f = fixture();
    f.harness.test("parse", |t| async move {
        let n: i32 = "forty".parse()?;
        t.equal(n, 40, None);
        Ok::<(), Fault>(())
    });

    f.harness.run().await;

    assert_eq!(f.capture.lines()[2], "not ok 1 — ParseIntError: invalid digit found in string");
}

#[tokio::test]
async fn test_failed_equal_renders_diagnostic_block() {
    let f = fixture();
    f.harness.test("strings", |t| async move {
        t.equal("a", "b", None);
    });

    f.harness.run().await;

    let lines = f.capture.lines();
    assert_eq!(
        lines[2..9].to_vec(),
        vec![
            "not ok 1 — should be equal",
            "  ---",
            "  operator: equal",
            "  expected: \"b\"",
            "  actual: \"a\"",
            "  stack:",
            "  ...",
        ]
    );
}

#[tokio::test]
async fn test_empty_run_has_empty_plan() {
    let f = fixture();
    let summary = f.harness.run().await;

    assert_eq!(summary.total(), 0);
    assert_eq!(f.capture.lines(), vec!["TAP version 13", "", "1..0", "# tests 0"]);
    assert_eq!(f.terminator.code(), Some(0));
}

// ============================================================================
// Ordinals and scheduling
// ============================================================================

#[tokio::test]
async fn test_ordinals_are_global_across_tests() {
    let f = fixture();
    f.harness.test("first", |t| async move {
        t.pass("one");
        t.fail("two");
    });
    f.harness.test("second", |t| async move {
        t.ok(true, "three");
        t.equal(f64::NAN, f64::NAN, "four");
    });

    let summary = f.harness.run().await;

    let ordinals: Vec<usize> = f
        .capture
        .lines()
        .iter()
        .filter_map(|l| l.strip_prefix("not ok ").or_else(|| l.strip_prefix("ok ")))
        .filter_map(|rest| rest.split(' ').next())
        .filter_map(|n| n.parse().ok())
        .collect();
    assert_eq!(ordinals, vec![1, 2, 3, 4]);
    assert_eq!((summary.passed, summary.failed), (2, 2));
}

#[tokio::test]
async fn test_async_tests_run_strictly_in_order() {
    let f = fixture();
    let events = Rc::new(RefCell::new(Vec::new()));

    for (name, delay) in [("slow", 20_u64), ("fast", 0)] {
        let events = Rc::clone(&events);
        f.harness.test(name, move |t| async move {
            events.borrow_mut().push(format!("{} start", name));
            tokio::time::sleep(Duration::from_millis(delay)).await;
            events.borrow_mut().push(format!("{} end", name));
            t.pass(None);
        });
    }

    f.harness.run().await;

    assert_eq!(
        *events.borrow(),
        vec!["slow start", "slow end", "fast start", "fast end"]
    );
}

#[tokio::test]
async fn test_late_registration_runs_under_existing_policy() {
    let f = fixture();
    let inner = f.harness.clone();

    f.harness.test("outer", move |t| async move {
        inner.test("nested", |t| async move {
            t.pass("nested ran");
        });
        inner.skip("nested skip", |_t| async {});
        t.pass("outer ran");
    });

    let summary = f.harness.run().await;

    assert!(f.capture.contains_line("# nested"));
    assert!(f.capture.contains_line("ok 2 — nested ran"));
    assert!(f.capture.contains_line("# skip nested skip"));
    assert_eq!((summary.passed, summary.skipped), (2, 1));
}

#[tokio::test]
async fn test_same_tick_registration_is_in_policy_snapshot() {
    let f = fixture();
    f.harness.test("plain", |t| async move {
        t.fail("plain must not run");
    });

    let run = f.harness.run();
    f.harness.only("focused", |t| async move {
        t.pass(None);
    });
    let summary = run.await;

    assert_eq!((summary.passed, summary.failed), (1, 0));
}

#[tokio::test]
async fn test_done_resolves_after_summary() {
    let f = fixture();
    f.harness.test("t", |t| async move {
        t.pass(None);
    });

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let runner = f.harness.clone();
            tokio::task::spawn_local(async move { runner.run().await });

            assert!(!f.harness.is_done());
            f.harness.done().await;
            assert!(f.harness.is_done());
            assert_eq!(f.harness.state(), State::Done);
            assert!(f.capture.contains_line("# pass 1"));

            // Awaiting again returns immediately
            f.harness.done().await;
        })
        .await;
}

// ============================================================================
// Faults inside tests
// ============================================================================

#[tokio::test]
async fn test_invalid_throws_pattern_faults_the_test() {
    let f = fixture();
    f.harness.test("bad pattern", |t| async move {
        t.throws(|| Err::<(), _>(Fault::msg("x")), Expected::pattern("("), None);
    });
    f.harness.test("next", |t| async move {
        t.pass(None);
    });

    let summary = f.harness.run().await;

    let fault_line = &f.capture.lines()[2];
    assert!(fault_line.starts_with("not ok 1 — panic: second argument to throws"));
    assert_eq!((summary.passed, summary.failed), (1, 1));
}

#[rstest]
#[case::kind_match(Expected::kind("Error"), true)]
#[case::kind_mismatch(Expected::kind("TypeError"), false)]
#[case::pattern_match(Expected::pattern("^Error: bo+m$"), true)]
#[case::pattern_mismatch(Expected::pattern("fizz"), false)]
#[case::predicate(Expected::predicate(|fault| fault.message() == "boom"), true)]
#[tokio::test]
async fn test_throws_expectations(#[case] expected: Expected, #[case] passes: bool) {
    let f = fixture();
    f.harness.test("throws", move |t| async move {
        t.throws(|| Err::<(), _>(Fault::msg("boom")), expected, None);
    });

    let summary = f.harness.run().await;

    assert_eq!(summary.passed == 1, passes);
    assert_eq!(summary.failed == 1, !passes);
}

// ============================================================================
// Stacks and configuration
// ============================================================================

fn stacked_harness() -> (Harness, CaptureSink) {
    let capture = CaptureSink::new();
    let harness = Harness::builder()
        .sink(capture.clone())
        .terminator(RecordingTerminator::new())
        .strip_cwd(false)
        .build();
    (harness, capture)
}

/// Frames of the first diagnostic block, without their indent
fn first_stack(capture: &CaptureSink) -> Vec<String> {
    let lines = capture.lines();
    let start = lines.iter().position(|l| l == "  stack:").unwrap();
    let end = lines.iter().position(|l| l == "  ...").unwrap();
    lines[start + 1..end]
        .iter()
        .map(|frame| {
            assert!(frame.starts_with("    "), "frame not indented: {frame}");
            frame.trim_start().to_string()
        })
        .collect()
}

fn assert_caller_frames_only(frames: &[String]) {
    let first = frames.first().expect("stack has no frames");
    assert!(first.starts_with("harness_tests::"), "first frame is not the caller: {first}");
    for frame in frames {
        for engine in ["tapline::assert", "tapline::logger", "tapline::registry", "tapline::scheduler"] {
            assert!(!frame.contains(engine), "engine frame kept: {frame}");
        }
    }
}

#[tokio::test]
async fn test_failed_assertion_stack_starts_at_caller() {
    let (harness, capture) = stacked_harness();
    harness.test("fails", |t| async move {
        t.fail("with stack");
    });
    harness.run().await;

    assert_caller_frames_only(&first_stack(&capture));
}

#[tokio::test]
async fn test_panicking_test_reports_panic_site_stack() {
    let (harness, capture) = stacked_harness();
    harness.test::<_, _, ()>("sync panic", |_t| async move {
        panic!("boom");
    });
    harness.run().await;

    assert!(capture.contains_line("not ok 1 — panic: boom"));
    let frames = first_stack(&capture);
    assert_caller_frames_only(&frames);
    assert!(frames.iter().all(|f| !f.contains("std::panicking")));
}

#[tokio::test]
async fn test_question_mark_fault_stack_starts_at_caller() {
    let (harness, capture) = stacked_harness();
    harness.test("parse", |_t| async move {
        let _: u8 = "many".parse()?;
        Ok::<(), Fault>(())
    });
    harness.run().await;

    let frames = first_stack(&capture);
    assert_caller_frames_only(&frames);
    assert!(frames.iter().all(|f| !f.contains("from_residual")));
}

#[tokio::test]
async fn test_builder_applies_runner_config() {
    let config = RunnerConfig {
        output: Some(tapline_config::OutputConfig {
            stack: Some(false),
            strip_cwd: None,
            cwd: None,
        }),
        run: Some(tapline_config::RunConfig {
            exit: Some(ExitMode::Never),
        }),
    };

    let capture = CaptureSink::new();
    let harness = Harness::builder().config(&config).sink(capture.clone()).build();
    harness.test("f", |t| async move {
        t.fail(None);
    });

    let summary = harness.run().await;

    assert_eq!(summary.exit_code(), 1);
    let lines = capture.lines();
    let start = lines.iter().position(|l| l == "  stack:").unwrap();
    assert_eq!(lines[start + 1], "  ...");
}

#[test]
#[should_panic(expected = "already been run")]
fn test_second_run_panics() {
    let f = fixture();
    f.harness.run_blocking().unwrap();
    let _ = f.harness.run_blocking();
}
