//! A small passing suite
//!
//! ```sh
//! cargo run -p tapline --example basic
//! TAPLINE_LOG=tapline=debug cargo run -p tapline --example basic
//! ```

use std::time::Duration;
use tapline::{Expected, Fault, Harness};

fn main() {
    tapline::logging::init("warn");

    let harness = Harness::new();

    harness.test("arithmetic", |t| async move {
        t.equal(2 + 2, 4, None);
        t.ok(7 % 2, "seven is odd");
    });

    harness.test("strings", |t| async move {
        let greeting = format!("{}, {}", "hello", "tap");
        t.equal(greeting.as_str(), "hello, tap", "formats a greeting");
        t.ok(!greeting.is_empty(), None);
    });

    harness.test("parsing", |t| async move {
        t.throws(|| "nine".parse::<u8>(), Expected::kind("ParseIntError"), None);
        t.throws(
            || "300".parse::<u8>(),
            Expected::pattern("too large"),
            "out of range values are rejected",
        );
        let n: u8 = "42".parse()?;
        t.equal(n, 42, None);
        Ok::<(), Fault>(())
    });

    harness.test("async work", |t| async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        t.pass("slept");
    });

    // Exits the process with the run status
    if let Err(error) = harness.run_blocking() {
        eprintln!("failed to start runtime: {}", error);
        std::process::exit(2);
    }
}
