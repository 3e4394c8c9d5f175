//! Logging setup for bundlegen

use std::fmt::Write as _;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    filter::{Directive, LevelFilter},
    fmt::{
        FmtContext, FormatEvent, FormatFields,
        format::{self, Format, Writer},
    },
    prelude::*,
    registry::LookupSpan,
};

/// Prints plain messages for the info events of bundlegen itself and the
/// default tracing format for everything else.
pub struct TracingFormatter;

impl<S, N> FormatEvent<S, N> for TracingFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        if *metadata.level() == tracing_core::metadata::Level::INFO
            && metadata.target().starts_with("bundlegen")
        {
            let mut buffer = String::new();
            ctx.format_fields(Writer::new(&mut buffer), event)?;
            writeln!(buffer)?;
            writer.write_str(&buffer)
        } else {
            Format::default()
                .with_ansi(writer.has_ansi_escapes())
                .format_event(ctx, writer, event)
        }
    }
}

/// Map a verbosity count (`-v`, `-vv`, ...) to the level of bundlegen's own
/// logs.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Constructs a default [`EnvFilter`] that is used when the user did not
/// specify a custom `RUST_LOG`.
pub fn get_default_env_filter(level: LevelFilter) -> EnvFilter {
    let mut result = EnvFilter::new("warn");
    for target in ["bundlegen", "bundlegen_package"] {
        if let Ok(directive) = format!("{target}={level}").parse::<Directive>() {
            result = result.add_directive(directive);
        }
    }
    result
}

/// Install the global tracing subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity. Returns `false` when a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_logging(verbosity: u8) -> bool {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => get_default_env_filter(level_for_verbosity(verbosity)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(TracingFormatter),
        )
        .try_init()
        .is_ok()
}
