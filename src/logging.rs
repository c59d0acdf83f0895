//! Logger setup: a level-colored `fern::Dispatch` to stdout, verbosity
//! gated by a single boolean an embedder passes in (this crate has no
//! CLI of its own to parse `-v` from).

use owo_colors::{OwoColorize, Stream::Stdout};

/// Install a process-wide logger. `verbose` raises the default level
/// from `Info` to `Debug`; the `NAT64_CORE_TRACE` environment variable
/// (checked first) forces `Trace` regardless of `verbose`.
pub fn init_logger(verbose: bool) {
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}{}: {}",
                match record.level() {
                    log::Level::Error => "ERROR"
                        .if_supports_color(Stdout, |text| text.red())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Warn => "WARN "
                        .if_supports_color(Stdout, |text| text.yellow())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Info => "INFO "
                        .if_supports_color(Stdout, |text| text.green())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Debug => "DEBUG"
                        .if_supports_color(Stdout, |text| text.bright_blue())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Trace => "TRACE"
                        .if_supports_color(Stdout, |text| text.bright_white())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                },
                match verbose {
                    true => format!(" [{}]", record.target().split("::").next().unwrap()),
                    false => String::new(),
                }
                .if_supports_color(Stdout, |text| text.bright_black()),
                message
            ))
        })
        .level(match std::env::var("NAT64_CORE_TRACE") {
            Ok(_) => log::LevelFilter::Trace,
            Err(_) => match verbose {
                true => log::LevelFilter::Debug,
                false => log::LevelFilter::Info,
            },
        })
        .chain(std::io::stdout())
        .apply()
        .unwrap();
}
