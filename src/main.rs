//! # photo-triage CLI
//!
//! Command-line interface for photo triage.
//!
//! ## Usage
//! ```bash
//! photo-triage swipe ~/Pictures
//! photo-triage stats --window month
//! photo-triage status --output json
//! ```

mod cli;

use photo_triage::Result;

fn main() -> Result<()> {
    photo_triage::init_tracing();
    cli::run()
}
