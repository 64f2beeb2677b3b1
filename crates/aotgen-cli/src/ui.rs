//! Terminal output for the aotgen CLI.
//!
//! Everything user-facing goes through here. Diagnostics for developers go
//! through `tracing` instead.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub mod colors {
    use console::Color;

    pub const ACCENT: Color = Color::Color256(39); // Azure
    pub const ALERT: Color = Color::Color256(203); // Coral
    pub const OK: Color = Color::Color256(78); // Sea green
    pub const KIND: Color = Color::Color256(141); // Lavender
    pub const DIM: Color = Color::Color256(244);
}

pub mod symbols {
    pub const FILLED: &str = "\u{25CF}"; // ●
    pub const HOLLOW: &str = "\u{25CB}"; // ○
    pub const CROSS: &str = "\u{2716}"; // ✖
    pub const POINTER: &str = "\u{203A}"; // ›
    pub const ARROW: &str = "\u{2192}"; // →
}

const BOX_WIDTH: usize = 60;

/// Compact `aotgen <version>` header.
pub fn header(version: &str) {
    println!(
        "  {} {} {}",
        style(symbols::FILLED).fg(colors::ACCENT),
        style("aotgen").fg(colors::ACCENT).bold(),
        style(version).dim()
    );
    println!();
}

pub fn success(msg: &str) {
    println!("  {} {}", style(symbols::FILLED).fg(colors::OK), msg);
}

pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::CROSS).fg(colors::ALERT),
        style(msg).fg(colors::ALERT)
    );
}

pub fn info(msg: &str) {
    println!("  {} {}", style(symbols::HOLLOW).fg(colors::ACCENT), msg);
}

pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

/// Steady-ticking spinner. Call `finish_and_clear` before printing results.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("\u{25D0}\u{25D3}\u{25D1}\u{25D2} ") // ◐◓◑◒
        .template("  {spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn box_header(title: &str) {
    let title = format!(" {} ", title);
    let rule = BOX_WIDTH.saturating_sub(title.chars().count() + 4);
    println!(
        "  {}{}{}{}",
        style("\u{250C}\u{2500}").fg(colors::ACCENT), // ┌─
        style(title).fg(colors::ACCENT).bold(),
        style("\u{2500}".repeat(rule)).fg(colors::ACCENT),
        style("\u{2510}").fg(colors::ACCENT) // ┐
    );
}

/// One row inside a box. `content` may carry ANSI styling; padding is
/// computed on the visible width.
pub fn box_line(content: &str) {
    let visible = console::measure_text_width(content);
    let padding = (BOX_WIDTH - 2).saturating_sub(visible + 1);
    println!(
        "  {} {}{}{}",
        style("\u{2502}").fg(colors::ACCENT),
        content,
        " ".repeat(padding),
        style("\u{2502}").fg(colors::ACCENT)
    );
}

pub fn box_footer() {
    println!(
        "  {}{}{}",
        style("\u{2514}").fg(colors::ACCENT), // └
        style("\u{2500}".repeat(BOX_WIDTH - 2)).fg(colors::ACCENT),
        style("\u{2518}").fg(colors::ACCENT) // ┘
    );
}

/// `name  kind` row of a declaration listing.
pub fn declaration_line(name: &str, kind: &str) {
    println!(
        "    {} {:32} {}",
        style(symbols::POINTER).fg(colors::DIM),
        style(name).bold(),
        style(kind).fg(colors::KIND)
    );
}

/// File heading of a declaration listing.
pub fn file_line(path: &str) {
    println!("  {} {}", style(symbols::HOLLOW).fg(colors::ACCENT), style(path).underlined());
}

pub fn mapping(from: &str, to: &str) {
    println!(
        "  {} {} {}",
        style(from).fg(colors::DIM),
        style(symbols::ARROW).fg(colors::ACCENT),
        style(to).bold()
    );
}

pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::HOLLOW).fg(colors::ACCENT),
        label,
        duration_ms
    );
}

pub fn failure_header() {
    println!();
    println!(
        "  {} {}",
        style(symbols::CROSS).fg(colors::ALERT).bold(),
        style("Compilation failed.").fg(colors::ALERT).bold()
    );
    println!();
}

pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
