use chrono::Local;
use log::{max_level, Level, LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: StdLogger = StdLogger;

/// Timestamped line logger. Warnings and errors go to stderr so they stay
/// visible when a command's output is piped.
pub struct StdLogger;

impl log::Log for StdLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= max_level()
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let time_str = Local::now().format("%Y-%m-%dT%H:%M:%S");
      let line = format!("{0} {1:<8}: {2}", time_str, record.level(), record.args());

      if record.level() <= Level::Warn {
        eprintln!("{}", line);
      } else {
        println!("{}", line);
      }
    }
  }

  fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER)?;
  log::set_max_level(level);
  Ok(())
}
