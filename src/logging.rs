//! Tracing subscriber setup
//!
//! Logs go to stderr so that stdout stays free for command output. An optional
//! log file receives the same events through a non-blocking writer.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions<'a> {
    pub log_file: Option<&'a Path>,
    pub json: bool,
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the program.
pub fn init(options: LoggingOptions<'_>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let mut layers = vec![format_layer(
        fmt::layer().with_writer(std::io::stderr),
        options.json,
    )];

    let guard = match options.log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(directory) = directory {
                std::fs::create_dir_all(directory)?;
            }
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let appender =
                tracing_appender::rolling::never(directory.unwrap_or(Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(format_layer(
                fmt::layer().with_writer(writer).with_ansi(false),
                options.json,
            ));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(guard)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn format_layer<W>(
    layer: fmt::Layer<Registry, fmt::format::DefaultFields, fmt::format::Format, W>,
    json: bool,
) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        layer.json().boxed()
    } else {
        layer.with_target(false).boxed()
    }
}
