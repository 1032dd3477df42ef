//! Logger initialization for the CLI

use std::{fmt::Write, io::IsTerminal, str::FromStr};

use jiff::{Zoned, tz::TimeZone};
use logforth::{append::Stderr, filter::EnvFilter, layout::Layout};

/// One line per record: UTC timestamp, level and the crate that logged it.
#[derive(Debug)]
struct UtcLayout {
    no_color: bool,
}

impl UtcLayout {
    fn new() -> Self {
        Self { no_color: false }
    }

    fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }
}

impl Layout for UtcLayout {
    fn format(
        &self,
        record: &log::Record<'_>,
        _diagnostics: &[Box<dyn logforth::diagnostic::Diagnostic>],
    ) -> anyhow::Result<Vec<u8>> {
        let mut output = String::new();

        let now = Zoned::now().with_time_zone(TimeZone::UTC);
        write!(output, "{} ", now.strftime("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        let level = if self.no_color {
            format!("{:>5}", record.level())
        } else {
            match record.level() {
                log::Level::Error => format!("\x1b[31m{:>5}\x1b[0m", record.level()),
                log::Level::Warn => format!("\x1b[33m{:>5}\x1b[0m", record.level()),
                log::Level::Info => format!("\x1b[32m{:>5}\x1b[0m", record.level()),
                log::Level::Debug => format!("\x1b[34m{:>5}\x1b[0m", record.level()),
                log::Level::Trace => format!("\x1b[35m{:>5}\x1b[0m", record.level()),
            }
        };

        // Keep only the crate name: `groups`, `transport`, `groupctl`.
        let target = record.target().split("::").next().unwrap_or_default();

        write!(output, "{level} {target:<9} {}", record.args())?;

        Ok(output.into_bytes())
    }
}

/// Install the stderr logger. The filter is a string like "info" or
/// "groups=debug,transport=debug".
pub(crate) fn init(log_filter: &str) {
    let filter = EnvFilter::from_str(log_filter).unwrap_or_else(|_| {
        eprintln!("Invalid log filter '{log_filter}', falling back to 'info'");
        EnvFilter::from_str("info").expect("default filter should be valid")
    });

    let layout = if std::io::stderr().is_terminal() {
        UtcLayout::new()
    } else {
        UtcLayout::new().no_color()
    };

    logforth::builder()
        .dispatch(move |d| d.filter(filter).append(Stderr::default().with_layout(layout)))
        .apply();
}
