//! Terminal output for command results
//!
//! Documents and query values go to stdout; summaries and diagnostics go
//! to stderr so stdout stays machine-readable.

use colored::*;
use oru_core::{DecodeError, DecodeReport};
use oru_pipeline::{PipelineStats, ProduceStats};
use std::path::Path;

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

pub fn print_pipeline_summary(stats: &PipelineStats) {
    let status = if stats.dropped() == 0 {
        "✓".green().bold()
    } else {
        "!".yellow().bold()
    };
    eprintln!("{} {}", status, "Ingestion summary".bold());
    eprintln!("  Received: {}", stats.received);
    eprintln!("  Stored:   {}", stats.stored.to_string().green());
    if stats.malformed > 0 {
        eprintln!("  Malformed: {}", stats.malformed.to_string().yellow());
    }
    if stats.store_failures > 0 {
        eprintln!("  Store failures: {}", stats.store_failures.to_string().red());
    }
    if stats.skipped_occurrences > 0 {
        eprintln!(
            "  Observations skipped: {}",
            stats.skipped_occurrences.to_string().yellow()
        );
    }
    if stats.source_errors > 0 {
        eprintln!("  Source errors: {}", stats.source_errors.to_string().red());
    }
}

pub fn print_produce_summary(stats: &ProduceStats) {
    let status = if stats.is_success() {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    eprintln!("{} {}", status, stats);
}

pub fn print_decode_report(path: &Path, report: &DecodeReport) {
    eprintln!("{} {}: {}", "warning:".yellow().bold(), path.display(), report);
    for skipped in &report.skipped {
        eprintln!(
            "  {} {} #{} (segment {}): {}",
            "skipped".yellow(),
            skipped.tag,
            skipped.ordinal,
            skipped.position,
            skipped.error
        );
    }
}

pub fn print_decode_failure(path: &Path, error: &DecodeError) {
    eprintln!("{} {}: {}", "error:".red().bold(), path.display(), error);
}
