//! Tracing subscriber initialization.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initialize the global tracing subscriber.
///
/// The default directive comes from the CLI verbosity counter; `RUST_LOG`
/// still overrides it. Set `ANAGRAFE_LOG_FORMAT=json` for JSON output.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init(verbosity_level: Option<tracing::Level>) -> Result<()> {
    let default_level = verbosity_level.unwrap_or(tracing::Level::ERROR);

    // RUST_LOG=
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    if json_output() {
        let subscriber = Registry::default().with(fmt_layer.json()).with(env_filter);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(fmt_layer).with(env_filter);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

fn json_output() -> bool {
    std::env::var("ANAGRAFE_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::json_output;

    #[test]
    fn json_output_follows_env() {
        temp_env::with_var("ANAGRAFE_LOG_FORMAT", Some("json"), || {
            assert!(json_output());
        });
        temp_env::with_var("ANAGRAFE_LOG_FORMAT", Some("JSON"), || {
            assert!(json_output());
        });
        temp_env::with_var("ANAGRAFE_LOG_FORMAT", Some("plain"), || {
            assert!(!json_output());
        });
        temp_env::with_var("ANAGRAFE_LOG_FORMAT", None::<&str>, || {
            assert!(!json_output());
        });
    }
}
