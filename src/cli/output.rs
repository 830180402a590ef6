//! Styled status lines for the harness commands.
//!
//! Status goes to stdout, problems to stderr, so addresses, blobs, and
//! signatures stay cleanly pipeable.

use console::style;

pub fn success(msg: &str) {
    println!("{} {msg}", style("ok").green().bold());
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", style("error:").red().bold());
}

pub fn warning(msg: &str) {
    eprintln!("{} {msg}", style("warning:").yellow().bold());
}

pub fn info(msg: &str) {
    println!("{} {msg}", style("::").cyan().bold());
}

/// Dimmed follow-up hint printed after a command's main output.
pub fn tip(msg: &str) {
    println!("{}", style(format!("hint: {msg}")).dim());
}
