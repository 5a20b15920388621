//! Colored, severity-tagged console output for the setup steps.
//!
//! Diagnostics go through `log`; these helpers are the operator-facing lines.

use std::io::{IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Color only when the stream being written is itself a terminal.
fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(std::io::stdout().is_terminal()))
}

fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice(std::io::stderr().is_terminal()))
}

fn tagged(stream: &mut StandardStream, color: Color, tag: &str, msg: &str) {
    let _ = stream.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = write!(stream, "[{tag}]");
    let _ = stream.reset();
    let _ = writeln!(stream, " {msg}");
}

pub fn header(msg: &str) {
    let mut out = stdout();
    let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(out, "\n==> {msg}");
    let _ = out.reset();
}

pub fn info(msg: &str) {
    tagged(&mut stdout(), Color::Blue, "INFO", msg);
}

pub fn success(msg: &str) {
    tagged(&mut stdout(), Color::Green, "OK", msg);
}

pub fn warning(msg: &str) {
    tagged(&mut stdout(), Color::Yellow, "WARN", msg);
}

pub fn error(msg: &str) {
    tagged(&mut stderr(), Color::Red, "ERROR", msg);
}

/// Plain indented detail line under a step.
pub fn detail(msg: &str) {
    let _ = writeln!(stdout(), "   {msg}");
}
