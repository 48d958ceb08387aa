//! Structured logging (§4.13), adapted from the teacher's `tracing` +
//! `tracing-subscriber` setup. The `SIGUSR1` progress line (`progress.rs`)
//! is NOT routed through this layer — it's a fixed-format protocol line on
//! stderr that tooling may parse, written with a raw `eprintln!` exactly
//! as `original_source/loco.c` does with `fprintf(stderr, ...)`.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

/// A minimal event formatter: `[LEVEL] message` with no timestamps or
/// span metadata, mirroring the teacher's `ColorizedFormatter` shape but
/// without color, since this engine's stderr is shared with the
/// uncolored progress-line protocol.
pub struct PlainFormatter;

impl<S, N> FormatEvent<S, N> for PlainFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "[{}] ", event.metadata().level())?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Initializes the global subscriber. Safe to call once at process start;
/// a second call is a no-op error that's deliberately ignored (tests may
/// call this more than once across threads).
pub fn init(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .event_format(PlainFormatter)
        .with_env_filter(filter)
        .try_init();
}
