//! Reference test binary entry point
//!
//! Runs every named setup case against the configurations in `configs/`.
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::Path;

use reference_tests::{cases, TestResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    tracing::info!("Initial-State Reference Test Suite");
    tracing::info!("==================================");

    let config_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "configs".to_string());
    let tests = cases::all_cases(Path::new(&config_dir));
    tracing::info!("Found {} reference tests in {}", tests.len(), config_dir);

    let mut results: Vec<TestResult> = Vec::new();
    let mut passed_count = 0;
    let mut failed_count = 0;

    for test in tests {
        match test.run() {
            Ok(result) => {
                if result.passed {
                    passed_count += 1;
                } else {
                    failed_count += 1;
                }
                result.print_summary();
                results.push(result);
            }
            Err(e) => {
                eprintln!("\nERROR running test {}: {}", test.name, e);
                failed_count += 1;
            }
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("OVERALL SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Total tests: {}", results.len());
    println!("Passed: {}", passed_count);
    println!("Failed: {}", failed_count);
    println!("{}", "=".repeat(80));

    if failed_count > 0 {
        std::process::exit(1);
    }
}
