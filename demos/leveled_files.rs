//! Leveled file logging example
//!
//! Demonstrates per-severity files, development console output and the
//! process-wide logger.
//!
//! Run with: cargo run --example leveled_files

use rust_leveled_logger::prelude::*;
use rust_leveled_logger::{error, info, warn};

fn main() -> Result<()> {
    println!("=== Rust Leveled Logger - Leveled Files Example ===\n");

    let logger = init_logger(Some(
        Options::new()
            .with_directory("demo_logs")
            .with_app_name("demo")
            .with_level("debug")
            .with_development(true)
            .with_console_colors(true),
    ))?;

    println!("1. One record per level:");
    logger.debug("Loading configuration");
    logger.info("Server started");
    logger.warn("Cache is cold");
    logger.error("Upstream timed out");

    println!("\n2. Formatted records with fields:");
    let port = 8080;
    info!(logger, "Listening on port {}", port; "tls" => false);
    warn!(logger, "Slow request"; "path" => "/search", "ms" => 1840);
    error!(logger, "Payment declined {}", "card_expired"; "order_id" => 99812);

    println!("\n3. Structured context:");
    let context = LogContext::new()
        .with_field("user_id", 42)
        .with_field("role", "admin");
    logger.info_with_context("User signed in", context);

    logger.flush()?;

    println!("\nFiles written under demo_logs/:");
    for level in LogLevel::ALL {
        println!("   {:5} -> {}", level, logger.config().log_path(level).display());
    }
    println!(
        "\nLogged: {}, dropped: {}",
        logger.metrics().total_logged(),
        logger.metrics().dropped_count()
    );

    Ok(())
}
