//! Shape-based spacing analysis for Glyphs font sources.
//!
//! Every glyph gets a bubble: its silhouette inside its convex hull inside
//! an expanded hull. Neighbours are set as close as their bubbles allow.

use bubblekern::core;

fn main() {
    let cli_args = core::platform::get_cli_args();
    match core::runner::run_app(cli_args) {
        Ok(()) => {}
        Err(error) => core::platform::handle_error(error),
    }
}
