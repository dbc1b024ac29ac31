//! Terminal feedback while waiting on Schoology.

use std::future::Future;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

/// A spinner that clears itself when dropped, so an early return never
/// leaves it on screen. Drawn on stderr to keep stdout clean for feeds.
pub struct Busy(ProgressBar);

impl Busy {
    pub fn start(what: &str) -> Self {
        Self::drawn_on(ProgressDrawTarget::stderr(), what)
    }

    fn drawn_on(target: ProgressDrawTarget, what: &str) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}... {elapsed:.dim}") {
            bar.set_style(style.tick_strings(TICKS));
        }
        bar.set_message(what.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Busy(bar)
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        self.0.finish_and_clear();
    }
}

/// Await `work` with a spinner labelled `what`.
pub async fn busy<F: Future>(what: &str, work: F) -> F::Output {
    let _busy = Busy::start(what);
    work.await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_clears_on_drop() {
        let busy = Busy::drawn_on(ProgressDrawTarget::hidden(), "Fetching feed");
        let bar = busy.0.clone();
        assert_eq!(bar.message(), "Fetching feed");
        assert!(!bar.is_finished());

        drop(busy);
        assert!(bar.is_finished());
    }
}
