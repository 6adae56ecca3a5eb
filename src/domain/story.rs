//! Story domain model
//!
//! A [`Story`] is what authors write: scenes of raw marked-up text. A
//! [`PublishedStory`] is what readers navigate: scenes split into [`Page`]s
//! of [`Block`]s, every link checked against every anchor in the story.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

use super::link::LinkTarget;

/// Identifier of a story, assigned by whoever stores it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub String);

/// Identifier of a scene, assigned by whoever stores it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for StoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Reference to an image or audio file that has already been stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: String,
    pub url: String,
}

impl MediaRef {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// A reference counts as resolved once it points somewhere
    pub fn is_resolved(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// A scene as written by the author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub title: String,

    /// Raw marked-up text
    pub content: String,

    #[serde(default)]
    pub image: Option<MediaRef>,

    #[serde(default)]
    pub audio: Option<MediaRef>,

    #[serde(default)]
    pub is_opening_scene: bool,

    /// Explicit anchor for the scene itself
    #[serde(default)]
    pub link: Option<String>,
}

impl Scene {
    /// Creates a scene with the given content and no media
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: SceneId(id.into()),
            title: title.into(),
            content: content.into(),
            image: None,
            audio: None,
            is_opening_scene: false,
            link: None,
        }
    }

    /// Returns the image only when it is resolved
    pub fn resolved_image(&self) -> Option<&MediaRef> {
        self.image.as_ref().filter(|image| image.is_resolved())
    }

    /// Returns the audio only when it is resolved
    pub fn resolved_audio(&self) -> Option<&MediaRef> {
        self.audio.as_ref().filter(|audio| audio.is_resolved())
    }
}

/// A story as written by the author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub author: String,
    pub published_on: DateTime<Utc>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
}

/// One unit of page content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Block {
    BlockHeading { link: LinkTarget, text: String },
    BlockPlaintext { text: String },
    BlockLink { text: String, link: LinkTarget },
}

/// A run of content inside a scene, always opened by a heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 0-based position within the scene
    pub number: usize,
    pub link: LinkTarget,
    pub within_scene: SceneId,
    pub content: Vec<Block>,
}

impl Page {
    /// Opens a page with its heading block
    pub fn new(number: usize, link: LinkTarget, within_scene: SceneId, heading: String) -> Self {
        Self {
            number,
            content: vec![Block::BlockHeading {
                link: link.clone(),
                text: heading,
            }],
            link,
            within_scene,
        }
    }

    /// Returns the heading text
    pub fn heading(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            Block::BlockHeading { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Iterates over the page's links as `(display text, target)`
    pub fn links(&self) -> impl Iterator<Item = (&str, &LinkTarget)> {
        self.content.iter().filter_map(|block| match block {
            Block::BlockLink { text, link } => Some((text.as_str(), link)),
            _ => None,
        })
    }
}

/// A scene's pages, ordered by number and indexed by link
///
/// A repeated link keeps both pages (lookup returns the first) so the
/// uniqueness check can still see the duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<LinkTarget, Page>")]
pub struct Pages {
    ordered: Vec<Page>,
    index: HashMap<LinkTarget, usize>,
}

impl Pages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page
    pub fn push(&mut self, page: Page) {
        let position = self.ordered.len();
        self.index.entry(page.link.clone()).or_insert(position);
        self.ordered.push(page);
    }

    /// Looks up a page by its link
    pub fn get(&self, link: &str) -> Option<&Page> {
        self.index.get(link).and_then(|&i| self.ordered.get(i))
    }

    /// Iterates pages in page-number order
    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.ordered.iter()
    }

    pub fn first(&self) -> Option<&Page> {
        self.ordered.first()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl From<HashMap<LinkTarget, Page>> for Pages {
    fn from(map: HashMap<LinkTarget, Page>) -> Self {
        let mut pages: Vec<Page> = map.into_values().collect();
        pages.sort_by_key(|page| page.number);

        let mut result = Pages::new();
        for page in pages {
            result.push(page);
        }
        result
    }
}

impl Serialize for Pages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.ordered.len()))?;
        for page in &self.ordered {
            map.serialize_entry(&page.link, page)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Pages {
    type Item = &'a Page;
    type IntoIter = std::slice::Iter<'a, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A scene after its content has been split into pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedScene {
    pub id: SceneId,
    pub title: String,
    pub image: MediaRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaRef>,
    #[serde(default)]
    pub link: Option<LinkTarget>,
    pub is_opening_scene: bool,
    pub pages: Pages,
}

impl PublishedScene {
    /// The scene's own anchor, falling back to its first page
    pub fn anchor(&self) -> Option<&LinkTarget> {
        self.link.as_ref().or_else(|| self.pages.first().map(|page| &page.link))
    }

    /// Iterates every anchor this scene introduces (its own, then its pages')
    pub fn targets(&self) -> impl Iterator<Item = &LinkTarget> {
        self.link.iter().chain(self.pages.iter().map(|page| &page.link))
    }
}

/// A story whose scenes assembled cleanly but whose links are unchecked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledStory {
    pub id: StoryId,
    pub title: String,
    pub author: String,
    pub published_on: DateTime<Utc>,
    pub scenes: Vec<PublishedScene>,
}

/// A story that passed every check and can be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedStory {
    pub id: StoryId,
    pub title: String,
    pub author: String,
    pub published_on: DateTime<Utc>,
    pub scenes: Vec<PublishedScene>,
}

impl PublishedStory {
    /// Returns the scene readers start with
    pub fn opening_scene(&self) -> Option<&PublishedScene> {
        self.scenes.iter().find(|scene| scene.is_opening_scene)
    }

    /// Total number of pages across all scenes
    pub fn page_count(&self) -> usize {
        self.scenes.iter().map(|scene| scene.pages.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::link::parse_link_target;

    fn page(number: usize, link: &str) -> Page {
        Page::new(
            number,
            parse_link_target(link).unwrap(),
            SceneId::from("s1"),
            link.to_uppercase(),
        )
    }

    #[test]
    fn new_page_starts_with_heading() {
        let page = page(0, "intro");
        assert_eq!(page.heading(), Some("INTRO"));
        assert!(matches!(page.content[0], Block::BlockHeading { .. }));
    }

    #[test]
    fn pages_keep_order_and_index() {
        let mut pages = Pages::new();
        pages.push(page(0, "zeta"));
        pages.push(page(1, "alpha"));

        let links: Vec<_> = pages.iter().map(|p| p.link.as_str()).collect();
        assert_eq!(links, vec!["zeta", "alpha"]);
        assert_eq!(pages.get("alpha").map(|p| p.number), Some(1));
        assert!(pages.get("missing").is_none());
    }

    #[test]
    fn duplicate_page_links_are_kept() {
        let mut pages = Pages::new();
        pages.push(page(0, "same"));
        pages.push(page(1, "same"));

        assert_eq!(pages.len(), 2);
        assert_eq!(pages.get("same").map(|p| p.number), Some(0));
    }

    #[test]
    fn pages_serialize_as_map_in_page_order() {
        let mut pages = Pages::new();
        pages.push(page(0, "zeta"));
        pages.push(page(1, "alpha"));

        let json = serde_json::to_string(&pages).unwrap();
        assert!(json.find("\"zeta\"").unwrap() < json.find("\"alpha\"").unwrap());

        let back: Pages = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pages);
    }

    #[test]
    fn unresolved_media_is_ignored() {
        let mut scene = Scene::new("s1", "Start", "#Start");
        assert!(scene.resolved_image().is_none());

        scene.image = Some(MediaRef::new("img-1", "  "));
        assert!(scene.resolved_image().is_none());

        scene.image = Some(MediaRef::new("img-1", "https://cdn.example/img-1.png"));
        assert!(scene.resolved_image().is_some());
    }

    #[test]
    fn scene_anchor_falls_back_to_first_page() {
        let mut pages = Pages::new();
        pages.push(page(0, "first"));

        let mut scene = PublishedScene {
            id: SceneId::from("s1"),
            title: "Start".to_string(),
            image: MediaRef::new("img", "img.png"),
            audio: None,
            link: None,
            is_opening_scene: true,
            pages,
        };
        assert_eq!(scene.anchor().map(|t| t.as_str()), Some("first"));

        scene.link = Some(parse_link_target("start").unwrap());
        assert_eq!(scene.anchor().map(|t| t.as_str()), Some("start"));
        assert_eq!(scene.targets().count(), 2);
    }

    #[test]
    fn story_input_uses_camel_case() {
        let json = r##"{
            "id": "story-1",
            "title": "The Cave",
            "author": "Ada",
            "publishedOn": "2024-05-01T10:00:00Z",
            "scenes": [{
                "id": "s1",
                "title": "Start",
                "content": "#Start",
                "image": {"id": "img", "url": "img.png"},
                "isOpeningScene": true
            }]
        }"##;

        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.scenes.len(), 1);
        assert!(story.scenes[0].is_opening_scene);
        assert!(story.scenes[0].link.is_none());
        assert!(story.scenes[0].audio.is_none());
    }
}
