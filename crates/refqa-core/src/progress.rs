use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Progress bar on stderr; hidden automatically when stderr is not a terminal.
#[must_use]
pub fn progress_bar(len: u64, prefix: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    ProgressBar::new(len).with_style(style).with_prefix(prefix)
}
