//! Interactive terminal prompts for `componentry add`

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Parse a picker answer into component names
///
/// Accepts 1-based indices and names separated by commas or whitespace, or
/// `all` / `*` for everything.
pub fn parse_selection(input: &str, available: &[String]) -> Result<Vec<String>> {
    let mut selected: Vec<String> = Vec::new();

    for token in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        if token == "all" || token == "*" {
            return Ok(available.to_vec());
        }

        let name = match token.parse::<usize>() {
            Ok(index) => available
                .get(index.wrapping_sub(1))
                .with_context(|| format!("no component numbered {}", index))?,
            Err(_) => available
                .iter()
                .find(|name| name.as_str() == token)
                .with_context(|| format!("unknown component '{}'", token))?,
        };

        if !selected.contains(name) {
            selected.push(name.clone());
        }
    }

    Ok(selected)
}

/// Whether an answer to a yes/no question means yes
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Show every available component and read a selection from `input`
pub fn pick_components<R: BufRead, W: Write>(
    available: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<Vec<String>> {
    writeln!(output, "Available components:")?;
    for (i, name) in available.iter().enumerate() {
        writeln!(output, "  {:>3}. {}", i + 1, name)?;
    }
    write!(output, "Select components (numbers or names, 'all'): ")?;
    output.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read selection")?;
    parse_selection(&line, available)
}

/// Ask a yes/no question, defaulting to no
pub fn confirm<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read answer")?;
    Ok(is_yes(&line))
}
