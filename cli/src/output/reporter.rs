//! `TerminalReporter`: presentation-layer implementation of `ProgressReporter`.
//!
//! On a TTY each step runs under a spinner that is settled when the next
//! event arrives. Elsewhere every event is a plain line.

use std::sync::Mutex;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"`
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ⚠ {message}"`
///
/// All three are suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: Mutex<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: Mutex::new(None),
        }
    }

    fn arrow(&self) -> String {
        "→".style(self.ctx.styles.step).to_string()
    }

    /// Settle the running spinner, if any, as a completed step line.
    fn settle(&self) {
        let Ok(mut active) = self.active.lock() else {
            return;
        };
        if let Some(pb) = active.take() {
            let message = pb.message();
            progress::finish_with(&pb, &self.arrow(), &message);
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        self.settle();
        if self.ctx.show_progress() {
            if let Ok(mut active) = self.active.lock() {
                *active = Some(progress::spinner(message));
                return;
            }
        }
        println!("  {} {message}", self.arrow());
    }

    fn success(&self, message: &str) {
        self.settle();
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        self.settle();
        self.ctx.warn(message);
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        self.settle();
    }
}
