//! Version command

use crate::output::OutputContext;

/// Run the version command.
pub fn run(ctx: &OutputContext) {
    ctx.value(&format!("bbl {}", env!("CARGO_PKG_VERSION")));
}
