/// Utility functions for user interaction.
use crate::error::Result;
use std::io::{self, IsTerminal, Write};

/// Show what is about to be transferred and ask for confirmation.
pub fn confirm_transfer(summary: &[(&str, String)], assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    let width = summary.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    println!("Does this look right?\n");
    for (label, value) in summary {
        println!("  {label:>width$}: {value}");
    }
    println!();

    print!("Continue? (y/N): ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_affirmative(&input))
}

/// Ask for a missing value on an interactive terminal.
///
/// Returns `None` when stdin is not a terminal or the answer is blank.
pub fn prompt_line(question: &str) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }

    print!("{question}: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
