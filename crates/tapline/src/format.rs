//! Value rendering for `expected:` / `actual:` diagnostics

use std::fmt::Debug;

/// Indent applied to continuation lines of a multi-line value
const CONTINUATION_INDENT: &str = "    ";

/// Render any value in its readable, multi-line `Debug` form
pub fn value<T: Debug + ?Sized>(value: &T) -> String {
    format!("{:#?}", value)
}

/// Indent every line after the first so the value nests under its label
pub fn indent_continuation(rendered: &str) -> String {
    rendered.replace('\n', &format!("\n{}", CONTINUATION_INDENT))
}

/// Render a `  <label>: <value>` diagnostic line
pub(crate) fn labelled(label: &str, rendered: &str) -> String {
    format!("  {}: {}", label, indent_continuation(rendered))
}
