//! log4rs setup: from a YAML file, programmatically, or from `OBJQUERY_LOG_*` variables.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

use crate::utils::wire::WIRE_TARGET;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Initializes logging from `log4rs.yaml` in the working directory.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    init_path(Path::new("log4rs.yaml"))
}

/// Initializes logging from a specific config file.
pub fn init_path(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    log4rs::init_file(path, log4rs::config::Deserializers::default())?;
    Ok(())
}

#[must_use]
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Build a log4rs config.
///
/// - `dir`: write rolling `objquery.log` there; stderr when `None`.
/// - `level`: error|warn|info|debug|trace (default info).
/// - `retention`: rolled files to keep (default 7).
/// - `wire`: route `objquery::wire` request traces to `wire.log` (or stderr).
pub fn build_config(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    wire: bool,
) -> Result<Config, Box<dyn std::error::Error>> {
    let lvl = parse_level(level.unwrap_or("info"));
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(7);

    let mut builder = Config::builder();
    match dir {
        Some(base) => {
            std::fs::create_dir_all(base)?;
            builder = builder
                .appender(Appender::builder().build("app", Box::new(rolling(base, "objquery", keep)?)));
            if wire {
                builder = builder
                    .appender(Appender::builder().build("wire", Box::new(rolling(base, "wire", keep)?)));
            }
        }
        None => {
            let console = ConsoleAppender::builder()
                .target(Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(PATTERN)))
                .build();
            builder = builder.appender(Appender::builder().build("app", Box::new(console)));
        }
    }

    let wire_logger = if wire {
        let appender = if dir.is_some() { "wire" } else { "app" };
        Logger::builder().appender(appender).additive(false).build(WIRE_TARGET, LevelFilter::Trace)
    } else {
        Logger::builder().additive(false).build(WIRE_TARGET, LevelFilter::Off)
    };
    builder = builder.logger(wire_logger);

    Ok(builder.build(Root::builder().appender("app").build(lvl))?)
}

/// Configure logging globally. Fails if a logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    wire: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(dir, level, retention, wire)?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - OBJQUERY_LOG_DIR
/// - OBJQUERY_LOG_LEVEL
/// - OBJQUERY_LOG_RETENTION
/// - OBJQUERY_WIRE_TRACE (1/true/yes)
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::var("OBJQUERY_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("OBJQUERY_LOG_LEVEL").ok();
    let retention =
        std::env::var("OBJQUERY_LOG_RETENTION").ok().and_then(|s| s.parse::<usize>().ok());
    let wire = std::env::var("OBJQUERY_WIRE_TRACE")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging(dir.as_deref(), level.as_deref(), retention, wire)
}
