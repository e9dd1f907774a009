//! Styled terminal output utilities.

use owo_colors::OwoColorize;

/// Print a header/title
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.len()).dimmed());
    println!();
}

/// Print the graphguard logo
pub fn logo() {
    let logo = r#"
     __ _ _ __ __ _ _ __ | |__   __ _ _   _  __ _ _ __ __| |
    / _` | '__/ _` | '_ \| '_ \ / _` | | | |/ _` | '__/ _` |
   | (_| | | | (_| | |_) | | | | (_| | |_| | (_| | | | (_| |
    \__, |_|  \__,_| .__/|_| |_|\__, |\__,_|\__,_|_|  \__,_|
    |___/          |_|          |___/
    "#;
    println!("{}", logo.bright_cyan().bold());
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a success message
pub fn success(text: &str) {
    println!("{} {}", "✔".green().bold(), text.green());
}

/// Print an info message
pub fn info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Print a warning message
pub fn warn(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a list header
pub fn list(text: &str) {
    println!("{}", text);
}

/// Print a list item
pub fn list_item(text: &str) {
    println!("  {} {}", "•".dimmed(), text);
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

/// Print a fenced code/query block
pub fn code(code: &str) {
    println!();
    for line in code.lines() {
        println!("  {}", line.bright_white());
    }
    println!();
}
