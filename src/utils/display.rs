use crate::core::diff::{Diff, DiffLineKind};
use colored::*;
use std::io::Write;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

pub fn print_prompt(text: &str) {
    print!("{}", text.yellow().bold());
    let _ = std::io::stdout().flush();
}

/// Render a line diff: green additions, red removals. Unchanged lines are
/// shown dimmed only when `show_unchanged` is set.
pub fn print_diff(diff: &Diff, show_unchanged: bool) {
    for line in &diff.lines {
        match line.kind {
            DiffLineKind::Added => println!("{}", format!("+ {}", line.text).green()),
            DiffLineKind::Removed => println!("{}", format!("- {}", line.text).red()),
            DiffLineKind::Unchanged => {
                if show_unchanged {
                    println!("{}", format!("  {}", line.text).dimmed());
                }
            }
        }
    }
}

pub fn print_diff_summary(diff: &Diff) {
    println!(
        "{} {}",
        format!("+{}", diff.added()).green().bold(),
        format!("-{}", diff.removed()).red().bold()
    );
}
