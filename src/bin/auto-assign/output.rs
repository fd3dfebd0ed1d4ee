use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use anyhow::{Context, Result};
use auto_assign::{Outcome, to_mentions};

/// Writes the `reviewers` and `assignees` step outputs as `key=value` lines.
pub fn write_outputs<W: Write>(outcome: &Outcome, writer: &mut W) -> Result<()> {
    let (reviewers, assignees) = match outcome {
        Outcome::Applied(assignment) => (
            to_mentions(&assignment.reviewers),
            to_mentions(&assignment.assignees),
        ),
        Outcome::Skipped(_) => (String::new(), String::new()),
    };

    writeln!(writer, "reviewers={reviewers}")?;
    writeln!(writer, "assignees={assignees}")?;
    Ok(())
}

/// Appends outputs to the file named by `GITHUB_OUTPUT`, or prints them.
pub fn publish_outputs(outcome: &Outcome, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open output file '{}'", path.display()))?;
            write_outputs(outcome, &mut file)
        }
        None => write_outputs(outcome, &mut io::stdout()),
    }
}
