//! Story projects
//!
//! Handles scaffolding a story directory and writing published output.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use super::config::{default_project_config, Config, PROJECT_CONFIG_FILE};
use super::source::{
    load_story, render_scene_markdown, SceneFrontmatter, StoryManifest, MANIFEST_FILE, SCENES_DIR,
};
use crate::domain::{PublishedStory, Story};

/// Default file written by `storyline publish`
pub const PUBLISHED_FILE: &str = "published.json";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Story already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not a story directory: {0}. Run 'storyline init' first.")]
    NotAStory(PathBuf),
}

/// A story directory with its configuration
#[derive(Debug)]
pub struct StoryProject {
    root: PathBuf,
    config: Config,
}

impl StoryProject {
    /// Opens an existing story directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(MANIFEST_FILE).is_file() {
            return Err(ProjectError::NotAStory(root).into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Scaffolds a new story with a single opening scene
    pub fn init(root: impl Into<PathBuf>, title: &str, author: &str) -> Result<Self> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_FILE);

        if manifest_path.exists() {
            return Err(ProjectError::AlreadyExists(root).into());
        }

        let scenes_dir = root.join(SCENES_DIR);
        fs::create_dir_all(&scenes_dir).with_context(|| {
            format!("Failed to create scenes directory: {}", scenes_dir.display())
        })?;

        let id = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "story".to_string());

        let manifest = StoryManifest {
            id: Some(id),
            title: title.to_string(),
            author: author.to_string(),
            published_on: None,
        };
        let manifest_toml =
            toml::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_toml)
            .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;

        let opening_path = scenes_dir.join("01-opening.md");
        let frontmatter = SceneFrontmatter {
            title: "Opening".to_string(),
            image: Some("https://placehold.co/800x600.png".to_string()),
            opening: true,
            link: Some("opening".to_string()),
            order: Some(1),
            ..Default::default()
        };
        let body = "# The Beginning | start\n\
                    Your story starts here.\n\
                    [Read it again] -> start\n";
        fs::write(&opening_path, render_scene_markdown(&frontmatter, body)?)
            .with_context(|| format!("Failed to write scene: {}", opening_path.display()))?;

        let config_path = root.join(PROJECT_CONFIG_FILE);
        if !config_path.exists() {
            fs::write(&config_path, default_project_config())
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        debug!(root = %root.display(), "initialized story");

        Self::open(root)
    }

    /// Returns the story directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the story from this directory
    pub fn load_story(&self) -> Result<Story> {
        load_story(&self.root)
    }
}

/// Writes a published story as JSON atomically (temp file + rename)
pub fn write_published(path: &Path, story: &PublishedStory) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let content = serde_json::to_string_pretty(story).context("Failed to serialize story")?;
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}
