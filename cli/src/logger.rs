use colored::*;
use dimmer_core::paths;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Console logger with per-module colors that mirrors every line into the log file.
///
/// Console output goes to stderr so frame output on stdout stays machine readable.
pub struct DimmerLogger {
    max_level: Level,
    log_file: Mutex<Option<File>>,
    target_colors: Mutex<HashMap<String, usize>>,
    next_color_index: AtomicUsize,
}

const TARGET_COLOR_COUNT: usize = 5;

fn target_color(index: usize, target: &str) -> ColoredString {
    match index % TARGET_COLOR_COUNT {
        0 => target.green(),
        1 => target.yellow(),
        2 => target.blue(),
        3 => target.magenta(),
        _ => target.cyan(),
    }
}

impl DimmerLogger {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let max_level = if quiet {
            Level::Info
        } else if verbose {
            Level::Trace
        } else {
            Level::Debug
        };

        Self {
            max_level,
            log_file: Mutex::new(Self::open_log_file()),
            target_colors: Mutex::new(HashMap::new()),
            next_color_index: AtomicUsize::new(0),
        }
    }

    fn open_log_file() -> Option<File> {
        let path = paths::ensure_data_dir().and_then(|_| paths::log_file_path())?;
        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
        {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("Warning: Failed to open log file at {}: {e}", path.display());
                None
            }
        }
    }

    fn color_for_target(&self, target: &str) -> ColoredString {
        let index = match self.target_colors.lock() {
            Ok(mut colors) => *colors.entry(target.to_string()).or_insert_with(|| {
                self.next_color_index.fetch_add(1, Ordering::SeqCst) % TARGET_COLOR_COUNT
            }),
            Err(_) => 0,
        };
        target_color(index, target)
    }

    fn level_tag(level: Level) -> &'static str {
        match level {
            Level::Error => "[E]",
            Level::Warn => "[W]",
            Level::Info => "[I]",
            Level::Debug => "[D]",
            Level::Trace => "[T]",
        }
    }

    fn short_target<'a>(record: &'a Record) -> &'a str {
        record.target().rsplit("::").next().unwrap_or(record.target())
    }

    fn format_colored(&self, record: &Record) -> String {
        let tag = Self::level_tag(record.level());
        let target = format!("[{}]", self.color_for_target(Self::short_target(record)).dimmed());

        match record.level() {
            Level::Error => format!("{tag} {target} {}", record.args()).red().bold().to_string(),
            Level::Warn => format!("{tag} {target} {}", record.args())
                .yellow()
                .bold()
                .to_string(),
            Level::Info => format!("{} {target} {}", tag.green().bold(), record.args()),
            Level::Debug => format!("{} {target} {}", tag.blue().bold(), record.args()),
            Level::Trace => format!("{} {target} {}", tag.white().bold(), record.args()),
        }
    }

    fn format_plain(record: &Record) -> String {
        format!(
            "{} [{}] {}",
            Self::level_tag(record.level()),
            Self::short_target(record),
            record.args()
        )
    }
}

impl Log for DimmerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!("{}", self.format_colored(record));

        if let Ok(mut file) = self.log_file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = writeln!(file, "{}", Self::format_plain(record));
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.log_file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

pub fn init_logger(quiet: bool, verbose: bool) -> Result<(), log::SetLoggerError> {
    let logger = DimmerLogger::new(quiet, verbose);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}
