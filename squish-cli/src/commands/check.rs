// ============================================================================
// squish-cli/src/commands/check.rs
// ============================================================================
//
// CHECK COMMAND: Upload Pre-Check Without Compressing
//
// Runs the same checks a caller would run before handing a file to the
// engine. A file already under the target is reported, not treated as an
// error; anything else that fails the pre-check exits non-zero.

use crate::cli::CheckArgs;
use crate::output::{print_info, print_json, print_success, print_warning};

use anyhow::{Context, Result};
use serde::Serialize;
use squish_core::{CompressOptions, CoreConfig, CoreError, SourceMedia, format_bytes, precheck};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    pub input: &'a Path,
    pub mime_type: &'a str,
    pub size_bytes: u64,
    pub target_bytes: u64,
    pub needs_compression: bool,
}

pub fn run_check(args: CheckArgs, json: bool) -> Result<()> {
    let config = CoreConfig::from_env();
    let options = CompressOptions::new(args.target_mb);
    let source = SourceMedia::from_path(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let needs_compression = match precheck(&source, &options, config.max_source_bytes) {
        Ok(()) => true,
        Err(CoreError::AlreadyUnderTarget { .. }) => false,
        Err(e) => {
            return Err(e).with_context(|| format!("{} failed the pre-check", args.input.display()));
        }
    };

    if json {
        return print_json(&CheckReport {
            input: &args.input,
            mime_type: source.mime_type(),
            size_bytes: source.size(),
            target_bytes: options.target_size_bytes(),
            needs_compression,
        });
    }

    print_info("Type", source.mime_type());
    print_info("Size", format_bytes(source.size()));
    print_info("Target", format_bytes(options.target_size_bytes()));
    if needs_compression {
        print_warning("Over the target size; compression needed");
    } else {
        print_success("Already under the target size; no compression needed");
    }
    Ok(())
}
