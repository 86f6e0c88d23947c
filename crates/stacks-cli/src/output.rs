//! Output management and formatting.
//!
//! Status lines (`success`, `info`, ...) honour `--quiet`. Command results go
//! through [`OutputManager::records`], [`OutputManager::json`] or
//! [`OutputManager::line`] and are always written. Records are rendered from [`Record::visible`] or their
//! `Serialize` impl, so hidden columns never reach stdout.

use std::io::{self, IsTerminal};

use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use stacks_core::domain::{Paging, Record};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;
use crate::error::CliResult;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    ///
    /// An explicit `--output-format` wins over `output.format` from config.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => OutputFormat::from_config(&config.output.format),
            explicit => explicit,
        };

        // Resolve Auto → Human (TTY) or Plain (piped/redirected).
        let resolved_format = if requested == OutputFormat::Auto {
            if io::stdout().is_terminal() {
                OutputFormat::Human
            } else {
                OutputFormat::Plain
            }
        } else {
            requested
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    // ── Status lines ──────────────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet || self.is_json() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}")
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet || self.is_json() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}")
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet || self.is_json() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}")
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.quiet || self.is_json() {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    // ── Results ───────────────────────────────────────────────────────────

    /// One line of command result; written even in quiet mode.
    pub fn line(&self, text: &str) -> io::Result<()> {
        self.term.write_line(text)
    }

    /// Pretty JSON of `value` on stdout.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> CliResult<()> {
        let encoded = serde_json::to_string_pretty(value)?;
        self.term.write_line(&encoded)?;
        Ok(())
    }

    /// A list of records: a JSON array, or one block per record.
    pub fn records(&self, records: &[&Record]) -> CliResult<()> {
        if self.is_json() {
            return self.json(records);
        }
        for record in records {
            self.record_block(record)?;
        }
        Ok(())
    }

    /// A single record, or `null` in JSON mode when there is none.
    pub fn record(&self, record: Option<&Record>) -> CliResult<()> {
        if self.is_json() {
            return self.json(&record);
        }
        match record {
            Some(record) => self.record_block(record),
            None => Ok(()),
        }
    }

    /// Paging footer for `buddy all`.
    pub fn paging(&self, paging: &Paging, next_cursor: Option<i64>) -> io::Result<()> {
        let cursor = next_cursor.map_or_else(|| "none".to_string(), |id| id.to_string());
        self.print(&format!(
            "page {} of {} ({} records, next cursor: {})",
            paging.page, paging.total_pages, paging.total_records, cursor
        ))
    }

    fn record_block(&self, record: &Record) -> CliResult<()> {
        let title = match record.id() {
            Some(id) => format!("{} #{}", record.schema().model(), id),
            None => record.schema().model().to_string(),
        };

        match self.resolved_format {
            OutputFormat::Human => {
                let title = if self.no_color {
                    title
                } else {
                    title.cyan().bold().to_string()
                };
                self.term.write_line(&title)?;
                for (column, value) in record.visible() {
                    let column = if self.no_color {
                        column.to_string()
                    } else {
                        column.dimmed().to_string()
                    };
                    self.term.write_line(&format!("  {column}: {value}"))?;
                }
            }
            _ => {
                let fields: Vec<String> = record
                    .visible()
                    .map(|(column, value)| format!("{column}={value}"))
                    .collect();
                self.term.write_line(&fields.join("\t"))?;
            }
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// `true` if ANSI colours are enabled.
    pub fn supports_color(&self) -> bool {
        !self.no_color
    }

    /// `true` if quiet mode suppresses most output.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn is_json(&self) -> bool {
        self.resolved_format == OutputFormat::Json
    }

    /// The resolved (non-Auto) output format.
    pub fn format(&self) -> OutputFormat {
        self.resolved_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_manager(format: OutputFormat, quiet: bool, no_color: bool) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            output_format: format,
            model: "User".into(),
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(OutputFormat::Plain, true, true);
        assert!(out.is_quiet());
        assert!(out.print("hello").is_ok());
    }

    #[test]
    fn color_only_for_human_output() {
        assert!(make_manager(OutputFormat::Human, false, false).supports_color());
        assert!(!make_manager(OutputFormat::Human, false, true).supports_color());
        assert!(!make_manager(OutputFormat::Plain, false, false).supports_color());
    }

    #[test]
    fn explicit_format_wins_over_config() {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: true,
            config: None,
            output_format: OutputFormat::Plain,
            model: "User".into(),
        };
        let mut config = AppConfig::default();
        config.output.format = "json".into();

        assert_eq!(OutputManager::new(&args, &config).format(), OutputFormat::Plain);
    }

    #[test]
    fn config_format_applies_when_auto() {
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: true,
            config: None,
            output_format: OutputFormat::Auto,
            model: "User".into(),
        };
        let mut config = AppConfig::default();
        config.output.format = "json".into();

        assert!(OutputManager::new(&args, &config).is_json());
    }
}
