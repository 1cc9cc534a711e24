//! `validate` command handler.

use crate::cli::args::ValidateArgs;
use crate::config::{ConfigLoader, LoaderOptions};
use crate::error::RouletteError;

/// Validate configuration files without serving.
///
/// Stops at the first file that fails.
///
/// # Errors
///
/// Returns a config error if a file is missing or fails validation.
pub fn run(args: &ValidateArgs) -> Result<(), RouletteError> {
    let loader = ConfigLoader::new(LoaderOptions {
        strict: args.strict,
        ..LoaderOptions::default()
    });

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let load_result = loader.load(path)?;

        for warning in &load_result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }

        tracing::info!(file = %path.display(), "configuration valid");
    }

    Ok(())
}
