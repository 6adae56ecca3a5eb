//! Check and publish commands
//!
//! Both run the full publishing pipeline. `check` only reports, `publish`
//! also writes the result.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::debug;

use super::output::Output;
use crate::domain::{parse_story, ParseStoryResult, PublishedStory, Story};
use crate::storage::{
    check_scene_sizes, load_story, write_published, Config, PROJECT_CONFIG_FILE, PUBLISHED_FILE,
};

/// A loaded story together with the configuration that applies to it
pub(super) struct StoryInput {
    pub story: Story,
    pub config: Config,

    /// Directory the story lives in (the directory itself, or a JSON file's parent)
    pub root: PathBuf,
}

/// Loads a story and enforces the configured scene size limit
pub(super) fn load_input(path: &Path) -> Result<StoryInput> {
    let config = if path.join(PROJECT_CONFIG_FILE).is_file() {
        Config::for_project(path)?
    } else {
        Config::load()?
    };

    let story = load_story(path)?;
    check_scene_sizes(&story, config.project.max_scene_bytes)?;

    let root = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    };

    debug!(
        story = %story.id,
        scenes = story.scenes.len(),
        in_project = config.is_in_project(),
        "loaded story input"
    );

    Ok(StoryInput {
        story,
        config,
        root,
    })
}

/// Turns a failed pipeline run into a command error
fn into_published(result: ParseStoryResult) -> Result<PublishedStory> {
    match result {
        ParseStoryResult::StoryParsed { story } => Ok(story),
        ParseStoryResult::StoryFailedToParse {
            error_code, reason, ..
        } => bail!("{}: {}", error_code, reason),
    }
}

/// Checks that a story would publish
pub fn check(output: &Output, path: &Path) -> Result<()> {
    let input = load_input(path)?;
    let result = parse_story(input.story);

    if output.is_json() {
        output.data(&result);
    }

    let published = into_published(result)?;

    if published.opening_scene().is_none() {
        output.warning("no opening scene is marked; readers have nowhere to start");
    }

    if !output.is_json() {
        println!(
            "✓ {}: {} scenes, {} pages",
            published.title,
            published.scenes.len(),
            published.page_count()
        );

        if output.is_verbose() {
            for scene in &published.scenes {
                let anchor = scene.anchor().map(|a| a.as_str()).unwrap_or("-");
                println!("  {:<24} {:<24} {} pages", scene.title, anchor, scene.pages.len());
            }
        }
    }

    Ok(())
}

/// Publishes a story to a JSON file
pub fn publish(output: &Output, path: &Path, destination: Option<&Path>) -> Result<()> {
    let input = load_input(path)?;
    let destination = destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.root.join(PUBLISHED_FILE));

    let published = into_published(parse_story(input.story))?;

    write_published(&destination, &published)?;
    debug!(path = %destination.display(), "wrote published story");

    if output.is_json() {
        output.data(&serde_json::json!({
            "success": true,
            "path": destination.display().to_string(),
            "scenes": published.scenes.len(),
            "pages": published.page_count(),
        }));
    } else {
        output.success(&format!(
            "Published '{}' to {}",
            published.title,
            destination.display()
        ));
    }

    Ok(())
}
