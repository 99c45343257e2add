use anyhow::Context;
use std::io::{self, BufRead, IsTerminal, Write};

fn read_answer(question: &str) -> anyhow::Result<Option<String>> {
    print!("{question} ");
    io::stdout().flush()?;
    let mut line = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask a yes/no question. `assume_yes` answers yes without asking; a closed
/// stdin answers no.
pub fn confirm(question: &str, assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    match read_answer(&format!("{question} [y/N]")) {
        Ok(Some(answer)) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
        _ => false,
    }
}

/// Ask for a line of free text, re-asking until it is non-empty.
pub fn ask(question: &str) -> anyhow::Result<String> {
    loop {
        match read_answer(question)? {
            Some(answer) if !answer.is_empty() => return Ok(answer),
            Some(_) => continue,
            None => anyhow::bail!("no answer given for: {question}"),
        }
    }
}

/// Present numbered candidates and return the chosen one-based index.
pub fn choose(header: &str, candidates: &[String]) -> anyhow::Result<usize> {
    if !io::stdin().is_terminal() {
        anyhow::bail!(
            "ambiguous project ({}); pass --project or --select",
            candidates.join(", ")
        );
    }
    println!("{header}");
    for (i, candidate) in candidates.iter().enumerate() {
        println!("  {}) {candidate}", i + 1);
    }
    let answer = ask("Select a project:")?;
    answer
        .parse::<usize>()
        .with_context(|| format!("'{answer}' is not a number"))
}
