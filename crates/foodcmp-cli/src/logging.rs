use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use foodcmp_core::AppConfig;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

type FileLayer<S> = fmt::Layer<S, DefaultFields, Format, Mutex<File>>;

/// Installs the global subscriber: human-readable logs on stderr, plus an
/// appending plain-text copy in `log_file` when one is set.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or the log file cannot
/// be opened.
pub(crate) fn init(verbose: bool, config: &AppConfig, log_file: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = if verbose {
        EnvFilter::try_new("debug")?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?
    };
    let file = log_file.map(file_layer).transpose()?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file)
        .init();
    Ok(())
}

/// A `fmt` layer appending to `path`, creating parent directories as needed.
pub(crate) fn file_layer<S>(path: &Path) -> anyhow::Result<FileLayer<S>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let file = open_append(path)?;
    Ok(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}
