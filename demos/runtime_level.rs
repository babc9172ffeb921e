//! Runtime log level example
//!
//! Builds a file logger from layered configuration, then changes the level
//! while the program runs.
//!
//! Run with: cargo run --example runtime_level

use monitor_runtime::prelude::*;
use monitor_runtime::{debug, info, warn};
use std::fs;

fn main() -> Result<()> {
    println!("=== Monitor Runtime - Runtime Level Example ===\n");

    let dir = std::env::temp_dir().join("monitor_runtime_demo");
    fs::create_dir_all(&dir)?;
    let config_path = dir.join("monitor.toml");
    let log_path = dir.join("monitor.log");

    fs::write(
        &config_path,
        format!(
            "[logging]\nlevel = \"warn\"\nfilename = {:?}\nmaxsize = 1\nmaxbackups = 3\nuse-compression = true\n",
            log_path.display().to_string()
        ),
    )?;

    // MONITOR_LOGGING__LEVEL=debug would override the file here
    let settings = Settings::load(&config_path)?;
    let (logger, level) = configure_logger(&settings.logging)?;

    println!("1. Level from config: {}", level.level());
    info!(logger, "not written at warn");
    warn!(logger, "disk usage high"; "percent" => 91u64);

    println!("2. Lowering the level to debug through the handle");
    level.set_level_str("debug")?;
    debug!(logger, "now visible, attempt {}", 1);

    println!("3. Raising it back to error");
    level.set_level(LogLevel::Error);
    warn!(logger, "hidden again");

    logger.flush()?;
    println!("\nRecords in {}:", log_path.display());
    for line in fs::read_to_string(&log_path)?.lines() {
        println!("   {}", line);
    }

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
