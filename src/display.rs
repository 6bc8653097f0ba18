use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use owo_colors::{OwoColorize, Style};
use serde::Serialize;

/// JSON on stdout in `json_mode`, otherwise whatever `render_table` prints.
pub fn output<T: Serialize>(json_mode: bool, data: &T, render_table: impl FnOnce(&T)) {
    if !json_mode {
        render_table(data);
        return;
    }
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{json}"),
        Err(e) => error(&format!("Failed to serialize JSON: {e}")),
    }
}

pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

pub fn section_header(title: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "─".repeat(title.chars().count()).cyan());
}

fn mark(symbol: &str, style: Style) -> String {
    symbol.style(style).to_string()
}

// Per-subject progress goes to stdout; problems go to stderr.

pub fn info(msg: &str) {
    println!("{} {msg}", mark("•", Style::new().cyan()));
}

pub fn planned(msg: &str) {
    println!("{} {msg}", mark("~", Style::new().yellow().bold()));
}

pub fn success(msg: &str) {
    println!("{} {msg}", mark("✓", Style::new().green().bold()));
}

pub fn warn(msg: &str) {
    eprintln!("{} {msg}", mark("warning:", Style::new().yellow().bold()));
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", mark("error:", Style::new().red().bold()));
}
