//! Lines command
//!
//! Classifies every line of a scene file, the way an editor would while the
//! author types. With `--against`, headings are also checked for clashes
//! with link targets the rest of the story already uses.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::check::load_input;
use super::output::Output;
use crate::domain::{
    assemble_story, check_heading, classify_all, ContentLine, HeadingCheck, TargetUniverse,
};
use crate::storage::parse_scene_markdown;

#[derive(Serialize)]
struct LineReport {
    #[serde(flatten)]
    line: ContentLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<HeadingCheck>,
}

/// Prints the classification of each line in a scene file
pub fn run(output: &Output, file: &Path, against: Option<&Path>) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read scene file: {}", file.display()))?;

    let body = if content.trim_start_matches('\u{feff}').starts_with("---") {
        parse_scene_markdown(file, &content)?.1
    } else {
        content
    };

    let universe = match against {
        Some(story_path) => {
            let input = load_input(story_path)?;
            let assembled = assemble_story(&input.story)?;
            Some(TargetUniverse::of(&assembled.scenes))
        }
        None => None,
    };

    let reports: Vec<_> = classify_all(&body)
        .map(|line| {
            let check = universe
                .as_ref()
                .map(|universe| check_heading(universe, &line))
                .filter(|check| !matches!(check, HeadingCheck::NotAHeading));
            LineReport { line, check }
        })
        .collect();

    if output.is_json() {
        output.data(&reports);
        return Ok(());
    }

    for report in &reports {
        println!(
            "{:>4}  {:<10} {}",
            report.line.line_number(),
            report.line.kind(),
            describe(&report.line)
        );

        if let Some(message) = report.check.as_ref().and_then(HeadingCheck::message) {
            println!("{:>4}  {:<10} {}", "", "", message);
        }
    }

    Ok(())
}

fn describe(line: &ContentLine) -> String {
    match line {
        ContentLine::EmptyLine { .. } => String::new(),
        ContentLine::HeaderNamed { text, name, .. } => format!("{} | {}", text, name),
        ContentLine::HeaderAnonymous { text, .. } => text.clone(),
        ContentLine::Link { text, link, .. } => format!("[{}] -> {}", text, link),
        ContentLine::Plaintext { text, .. } => text.clone(),
        ContentLine::Error { code, message, .. } => match code {
            Some(code) => format!("{}: {}", code, message),
            None => message.clone(),
        },
    }
}
