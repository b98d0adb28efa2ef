//! Spinner shown while a service call is in flight.

use std::future::Future;
use std::io::{self, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

/// Await `future` behind a spinner on stderr. Hidden when stderr is not a
/// terminal.
pub async fn with_spinner<F: Future>(message: &str, future: F) -> F::Output {
    let bar = if io::stderr().is_terminal() {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(TICK);

    let output = future.await;
    bar.finish_and_clear();
    output
}
