use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("  {msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Show a spinner while `work` runs.
pub async fn with_spinner<T>(message: impl Into<String>, work: impl Future<Output = T>) -> T {
    let spinner = create_spinner(message);
    let result = work.await;
    spinner.finish_and_clear();
    result
}
