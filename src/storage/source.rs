//! Story sources
//!
//! A story is read either from a single JSON file in the input contract
//! (camelCase keys), or from a story directory:
//!
//! ```text
//! the-cave/
//! ├── story.toml          # id, title, author, published_on
//! ├── images/             # media referenced from scenes
//! └── scenes/
//!     ├── 01-opening.md   # YAML frontmatter + scene content
//!     └── 02-tunnel.md
//! ```
//!
//! Scene files carry YAML frontmatter for metadata and the raw marked-up
//! content as body. Media references are resolved here: a local path only
//! counts once the file exists, so the pipeline sees it as unresolved
//! otherwise.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{MediaRef, Scene, SceneId, Story, StoryId};

/// Manifest file inside a story directory
pub const MANIFEST_FILE: &str = "story.toml";

/// Directory holding scene files
pub const SCENES_DIR: &str = "scenes";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Story not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a story directory (missing {MANIFEST_FILE}): {0}")]
    MissingManifest(PathBuf),

    #[error("Missing frontmatter in {0} (must start with ---)")]
    MissingFrontmatter(PathBuf),

    #[error("Missing frontmatter end delimiter (---) in {0}")]
    UnterminatedFrontmatter(PathBuf),

    #[error("Scene \"{scene}\" is {bytes} bytes, the limit is {max}")]
    SceneTooLarge {
        scene: String,
        bytes: usize,
        max: usize,
    },
}

/// Contents of `story.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryManifest {
    /// Defaults to the directory name
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_on: Option<DateTime<Utc>>,
}

/// Frontmatter of a scene file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFrontmatter {
    /// Defaults to the file stem
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default)]
    pub opening: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Loads a story from a JSON file or a story directory
pub fn load_story(path: &Path) -> Result<Story> {
    if path.is_dir() {
        load_story_dir(path)
    } else if path.is_file() {
        load_story_json(path)
    } else {
        Err(SourceError::NotFound(path.to_path_buf()).into())
    }
}

fn load_story_json(path: &Path) -> Result<Story> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read story file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse story file: {}", path.display()))
}

fn load_story_dir(dir: &Path) -> Result<Story> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(SourceError::MissingManifest(dir.to_path_buf()).into());
    }

    let content = fs::read_to_string(&manifest_path)
        .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
    let manifest: StoryManifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", manifest_path.display()))?;

    let mut scenes = Vec::new();
    let scenes_dir = dir.join(SCENES_DIR);

    if scenes_dir.is_dir() {
        for entry in fs::read_dir(&scenes_dir)
            .with_context(|| format!("Failed to read directory: {}", scenes_dir.display()))?
        {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.extension().is_some_and(|e| e == "md") {
                scenes.push(read_scene_file(dir, &path)?);
            }
        }
    }

    // Frontmatter `order` first, file name as tiebreaker
    scenes.sort_by(|(a_order, a_path, _), (b_order, b_path, _)| {
        a_order
            .unwrap_or(i64::MAX)
            .cmp(&b_order.unwrap_or(i64::MAX))
            .then_with(|| a_path.cmp(b_path))
    });

    debug!(dir = %dir.display(), scenes = scenes.len(), "loaded story directory");

    let id = manifest.id.unwrap_or_else(|| {
        dir.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "story".to_string())
    });

    Ok(Story {
        id: StoryId(id),
        title: manifest.title,
        author: manifest.author,
        published_on: manifest.published_on.unwrap_or_else(Utc::now),
        scenes: scenes.into_iter().map(|(_, _, scene)| scene).collect(),
    })
}

fn read_scene_file(story_dir: &Path, path: &Path) -> Result<(Option<i64>, PathBuf, Scene)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;

    let (frontmatter, body) = parse_scene_markdown(path, &content)?;

    let id = frontmatter.id.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let scene = Scene {
        id: SceneId(id),
        image: resolve_media(story_dir, frontmatter.image.as_deref()),
        audio: resolve_media(story_dir, frontmatter.audio.as_deref()),
        is_opening_scene: frontmatter.opening,
        link: frontmatter.link,
        title: frontmatter.title,
        content: body,
    };

    Ok((frontmatter.order, path.to_path_buf(), scene))
}

/// Splits a scene file into frontmatter and body
///
/// The body keeps its own line structure so line numbers in errors match
/// what the author sees below the frontmatter.
pub fn parse_scene_markdown(path: &Path, content: &str) -> Result<(SceneFrontmatter, String)> {
    let content = content.trim_start_matches('\u{feff}');

    let rest = content
        .strip_prefix("---")
        .ok_or_else(|| SourceError::MissingFrontmatter(path.to_path_buf()))?;

    let end_pos = rest
        .find("\n---")
        .ok_or_else(|| SourceError::UnterminatedFrontmatter(path.to_path_buf()))?;

    let yaml_content = rest[..end_pos].trim();
    let after = &rest[end_pos + "\n---".len()..];

    // Drop the remainder of the delimiter line
    let body = match after.find('\n') {
        Some(newline) => &after[newline + 1..],
        None => "",
    };

    let frontmatter: SceneFrontmatter = serde_yaml::from_str(yaml_content)
        .with_context(|| format!("Failed to parse frontmatter in {}", path.display()))?;

    Ok((frontmatter, body.to_string()))
}

/// Renders a scene file from frontmatter and body
pub fn render_scene_markdown(frontmatter: &SceneFrontmatter, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter).context("Failed to serialize frontmatter")?;

    let mut content = String::new();
    content.push_str("---\n");
    content.push_str(&yaml);
    content.push_str("---\n");
    content.push_str(body);

    if !content.ends_with('\n') {
        content.push('\n');
    }

    Ok(content)
}

/// Resolves a media reference against the story directory
fn resolve_media(story_dir: &Path, reference: Option<&str>) -> Option<MediaRef> {
    let reference = reference?.trim();
    if reference.is_empty() {
        return None;
    }

    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Some(MediaRef::new(reference, reference));
    }

    let path = story_dir.join(reference);
    if path.is_file() {
        Some(MediaRef::new(reference, path.to_string_lossy()))
    } else {
        warn!(path = %path.display(), "media file not found");
        None
    }
}

/// Rejects scenes over the configured size before they reach the pipeline
pub fn check_scene_sizes(story: &Story, max_bytes: usize) -> Result<(), SourceError> {
    for scene in &story.scenes {
        if scene.content.len() > max_bytes {
            return Err(SourceError::SceneTooLarge {
                scene: scene.title.clone(),
                bytes: scene.content.len(),
                max: max_bytes,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_story_dir(dir: &Path) {
        fs::write(
            dir.join(MANIFEST_FILE),
            "id = \"cave\"\ntitle = \"The Cave\"\nauthor = \"Ada\"\npublished_on = \"2024-05-01T10:00:00Z\"\n",
        )
        .unwrap();
        fs::create_dir_all(dir.join(SCENES_DIR)).unwrap();
        fs::create_dir_all(dir.join("images")).unwrap();
        fs::write(dir.join("images/cave.png"), b"png").unwrap();
    }

    #[test]
    fn parses_frontmatter_and_keeps_body_lines() {
        let content = "---\ntitle: Opening\nopening: true\nlink: start\n---\n#Intro\n\nHello\n";
        let (fm, body) = parse_scene_markdown(Path::new("a.md"), content).unwrap();

        assert_eq!(fm.title, "Opening");
        assert!(fm.opening);
        assert_eq!(fm.link.as_deref(), Some("start"));
        assert_eq!(body, "#Intro\n\nHello\n");
    }

    #[test]
    fn rejects_missing_frontmatter() {
        let err = parse_scene_markdown(Path::new("a.md"), "#Intro").unwrap_err();
        assert!(err.to_string().contains("Missing frontmatter"));

        let err = parse_scene_markdown(Path::new("a.md"), "---\ntitle: x\n#Intro").unwrap_err();
        assert!(err.to_string().contains("end delimiter"));
    }

    #[test]
    fn render_then_parse() {
        let fm = SceneFrontmatter {
            title: "Tunnel".to_string(),
            image: Some("images/cave.png".to_string()),
            order: Some(2),
            ..Default::default()
        };
        let rendered = render_scene_markdown(&fm, "#Tunnel\nDark.").unwrap();
        let (parsed, body) = parse_scene_markdown(Path::new("t.md"), &rendered).unwrap();

        assert_eq!(parsed.title, "Tunnel");
        assert_eq!(parsed.order, Some(2));
        assert_eq!(body, "#Tunnel\nDark.\n");
    }

    #[test]
    fn loads_story_directory_in_order() {
        let dir = TempDir::new().unwrap();
        write_story_dir(dir.path());

        fs::write(
            dir.path().join("scenes/b.md"),
            "---\ntitle: Second\nimage: images/cave.png\norder: 2\n---\n#Second\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("scenes/a.md"),
            "---\ntitle: First\nimage: images/missing.png\nopening: true\norder: 1\n---\n#First\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("scenes/c.md"),
            "---\ntitle: Third\nimage: https://cdn.example/x.png\n---\n#Third\n",
        )
        .unwrap();
        fs::write(dir.path().join("scenes/notes.txt"), "ignored").unwrap();

        let story = load_story(dir.path()).unwrap();
        assert_eq!(story.id.0, "cave");
        assert_eq!(story.author, "Ada");

        let titles: Vec<_> = story.scenes.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);

        assert_eq!(story.scenes[0].id.0, "a");
        assert!(story.scenes[0].is_opening_scene);
        assert!(story.scenes[0].image.is_none());
        assert!(story.scenes[1].image.is_some());
        assert_eq!(
            story.scenes[2].image.as_ref().map(|i| i.url.as_str()),
            Some("https://cdn.example/x.png")
        );
    }

    #[test]
    fn directory_without_manifest_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = load_story(dir.path()).unwrap_err();
        assert!(err.to_string().contains("missing story.toml"));
    }

    #[test]
    fn loads_json_story() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.json");
        fs::write(
            &path,
            r##"{"id":"s","title":"T","author":"A","publishedOn":"2024-05-01T10:00:00Z",
                "scenes":[{"id":"one","title":"One","content":"#One","image":{"id":"i","url":"i.png"}}]}"##,
        )
        .unwrap();

        let story = load_story(&path).unwrap();
        assert_eq!(story.scenes.len(), 1);
        assert!(story.scenes[0].resolved_image().is_some());
    }

    #[test]
    fn missing_path_is_not_found() {
        let err = load_story(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().starts_with("Story not found"));
    }

    #[test]
    fn oversize_scene_is_rejected() {
        let story = Story {
            id: StoryId::from("s"),
            title: "T".to_string(),
            author: "A".to_string(),
            published_on: Utc::now(),
            scenes: vec![Scene::new("one", "Big", "x".repeat(100))],
        };

        assert!(check_scene_sizes(&story, 100).is_ok());
        assert!(matches!(
            check_scene_sizes(&story, 99),
            Err(SourceError::SceneTooLarge { bytes: 100, max: 99, .. })
        ));
    }
}
