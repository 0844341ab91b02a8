//! Console reporter
//!
//! Prints pipeline progress to stderr so stdout stays clean for command
//! output (`resolve --json`, `hash`, `caveats`). Colors and the in-place
//! download counter are only used when stderr is a terminal.

use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use pour_core::Reporter;
use pour_schema::{PackageName, Version};

use super::Theme;

/// Redraw the download counter at most once per this many bytes when the
/// total size is unknown.
const REDRAW_STEP: u64 = 256 * 1024;

#[derive(Debug)]
pub struct ConsoleReporter {
    theme: Theme,
    quiet: bool,
    interactive: bool,
    /// Last drawn progress (percent, or bytes when the size is unknown).
    last_drawn: Mutex<Option<u64>>,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
            interactive: io::stderr().is_terminal(),
            last_drawn: Mutex::new(None),
        }
    }

    fn color(&self, out: &mut impl Write, color: Color) {
        if self.interactive {
            let _ = out.queue(SetForegroundColor(color));
        }
    }

    fn reset(&self, out: &mut impl Write) {
        if self.interactive {
            let _ = out.queue(ResetColor);
        }
    }

    fn clear_line(&self, out: &mut impl Write) {
        if self.interactive {
            let _ = out.queue(MoveToColumn(0));
            let _ = out.queue(Clear(ClearType::CurrentLine));
        }
    }

    fn line(&self, icon: &str, color: Color, text: &str) {
        let mut out = io::stderr().lock();
        self.clear_line(&mut out);
        self.color(&mut out, color);
        let _ = write!(out, "{icon} ");
        self.reset(&mut out);
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }

    fn package_line(&self, icon: &str, color: Color, name: &PackageName, version: &Version, state: &str) {
        let mut out = io::stderr().lock();
        self.clear_line(&mut out);
        self.color(&mut out, color);
        let _ = write!(out, "{icon} ");
        self.color(&mut out, self.theme.colors.package_name);
        let _ = write!(out, "{name} ");
        self.color(&mut out, self.theme.colors.version);
        let _ = write!(out, "{version} ");
        self.color(&mut out, self.theme.colors.secondary);
        let _ = writeln!(out, "{state}");
        self.reset(&mut out);
        let _ = out.flush();
    }

    fn step(&self, name: &PackageName, version: &Version, state: &str) {
        if !self.quiet {
            self.package_line(self.theme.icons.active, self.theme.colors.active, name, version, state);
        }
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        let mut out = io::stderr().lock();
        self.color(&mut out, self.theme.colors.header);
        let _ = writeln!(out, "{title}");
        self.reset(&mut out);
        let _ = out.flush();
    }

    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>) {
        if self.quiet || !self.interactive {
            return;
        }

        let mark = match total {
            Some(t) if t > 0 => current.saturating_mul(100) / t,
            _ => current / REDRAW_STEP,
        };
        if let Ok(mut last) = self.last_drawn.lock() {
            if *last == Some(mark) {
                return;
            }
            *last = Some(mark);
        }

        let progress = match total {
            Some(t) if t > 0 => format!("{}% of {}", mark.min(100), human_bytes(t)),
            _ => human_bytes(current),
        };

        let mut out = io::stderr().lock();
        self.clear_line(&mut out);
        self.color(&mut out, self.theme.colors.active);
        let _ = write!(out, "{} ", self.theme.icons.active);
        self.color(&mut out, self.theme.colors.package_name);
        let _ = write!(out, "{name} ");
        self.color(&mut out, self.theme.colors.version);
        let _ = write!(out, "{version} ");
        self.color(&mut out, self.theme.colors.secondary);
        let _ = write!(out, "downloading {progress}");
        self.reset(&mut out);
        let _ = out.flush();
    }

    fn verifying(&self, name: &PackageName, version: &Version) {
        if let Ok(mut last) = self.last_drawn.lock() {
            *last = None;
        }
        self.step(name, version, "verifying checksum");
    }

    fn extracting(&self, name: &PackageName, version: &Version) {
        self.step(name, version, "extracting");
    }

    fn installing(&self, name: &PackageName, version: &Version) {
        self.step(name, version, "installing");
    }

    fn testing(&self, name: &PackageName, version: &Version) {
        self.step(name, version, "running smoke test");
    }

    fn done(&self, name: &PackageName, version: &Version, detail: &str) {
        if !self.quiet {
            self.package_line(self.theme.icons.success, self.theme.colors.success, name, version, detail);
        }
    }

    fn failed(&self, name: &PackageName, version: &Version, reason: &str) {
        self.package_line(
            self.theme.icons.error,
            self.theme.colors.error,
            name,
            version,
            &format!("failed ({reason})"),
        );
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.info, self.theme.colors.secondary, msg);
        }
    }

    fn success(&self, msg: &str) {
        if !self.quiet {
            self.line(self.theme.icons.success, self.theme.colors.success, msg);
        }
    }

    fn warning(&self, msg: &str) {
        self.line(self.theme.icons.warning, self.theme.colors.warning, msg);
    }

    fn error(&self, msg: &str) {
        self.line(self.theme.icons.error, self.theme.colors.error, msg);
    }
}
