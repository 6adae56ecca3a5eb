//! # Storage Layer
//!
//! File I/O around the pure pipeline in [`crate::domain`].
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Story manifest | TOML | `story.toml` |
//! | Scenes | Markdown + YAML frontmatter | `scenes/*.md` |
//! | Whole story | JSON (camelCase) | any `*.json` file |
//! | Config | TOML | `storyline.toml`, `~/.config/storyline/config.toml` |
//! | Published story | JSON | `published.json` |
//!
//! Published output is written atomically (temp file + rename).
//!
//! ## Key Types
//!
//! - [`StoryProject`] - Entry point for a story directory
//! - [`load_story`] - Reads a story from a JSON file or directory
//! - [`Config`] - Project and global configuration

mod config;
mod project;
mod source;

pub use config::{
    default_project_config, Config, ConfigError, GlobalConfig, GraphConfig, OutputFormat,
    ProjectConfig, PROJECT_CONFIG_FILE,
};
pub use project::{write_published, ProjectError, StoryProject, PUBLISHED_FILE};
pub use source::{
    check_scene_sizes, load_story, parse_scene_markdown, render_scene_markdown, SceneFrontmatter,
    SourceError, StoryManifest, MANIFEST_FILE, SCENES_DIR,
};
