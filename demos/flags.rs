//! Configure logging from command line flags.
//!
//! ```text
//! cargo run --example flags -- --log_output_level debug --log_caller --log_as_json
//! ```

use clap::Command;
use scoped_log::{debug, info, Options};

fn main() {
    let mut options = Options::default();
    let matches = options
        .bind_flags(Command::new("flags").about("scoped_log flag binding demo"))
        .get_matches();

    if let Err(e) = options.update_from_matches(&matches).and_then(|_| scoped_log::configure(&options)) {
        eprintln!("invalid logging flags: {}", e);
        std::process::exit(2);
    }

    info!("configured with output level {}", options.output_level);
    debug!("caller logging: {}", options.log_caller);
    scoped_log::warn("plain message through the free functions");

    let http = scoped_log::logger("http");
    http.info("request served");

    // records from the log facade end up in the same output
    log::info!(target: "legacy", "routed through the log facade");

    if let Err(e) = scoped_log::sync() {
        eprintln!("sync failed: {}", e);
    }
}
