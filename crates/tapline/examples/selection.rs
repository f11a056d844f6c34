//! Skip, only, and faulting tests, with configuration from `tapline.toml`
//!
//! ```sh
//! cargo run -p tapline --example selection
//! ```

use tapline::{Expected, Fault, Harness};
use tapline_config::ConfigLoader;

fn main() {
    tapline::logging::init("info");

    let config = match std::env::current_dir()
        .map_err(Into::into)
        .and_then(|dir| ConfigLoader::new().load_from_directory(&dir))
    {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {}", error);
            std::process::exit(2);
        }
    };

    let harness = Harness::from_config(&config.runner);

    harness.skip("not implemented yet", |t| async move {
        t.fail("never invoked");
    });

    harness.only("focused", |t| async move {
        t.ok(Some("value"), None);
        t.throws(
            || -> Result<(), Fault> { Err(Fault::new("RangeError", "index 9 out of bounds")) },
            Expected::predicate(|fault| fault.message().contains("bounds")),
            None,
        );
    });

    harness.only("focused and failing", |t| async move {
        t.equal(vec![1, 2, 3], vec![1, 2], "lists differ");
        Err::<(), _>(Fault::msg("gave up"))
    });

    harness.test("excluded by only", |t| async move {
        t.fail("never invoked");
    });

    if let Err(error) = harness.run_blocking() {
        eprintln!("failed to start runtime: {}", error);
        std::process::exit(2);
    }
}
