//! Link graph validation
//!
//! Scene anchors and page links share one namespace across the whole story.
//! Publishing requires that namespace to be free of duplicates and every
//! link block to point into it. Either violation rejects the whole story.

use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::error::{ErrorCode, StoryFailure};
use super::line::ContentLine;
use super::link::{link_target_for_heading, LinkTarget};
use super::story::{AssembledStory, PublishedScene, PublishedStory};

/// Where a link target lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetOwner {
    /// Index of the scene in story order
    pub scene: usize,

    /// Position of the page within the scene, `None` for the scene's own anchor
    pub page: Option<usize>,
}

/// Every target a story defines, with the first owner of each
#[derive(Debug, Clone, Default)]
pub struct TargetUniverse {
    owners: HashMap<LinkTarget, TargetOwner>,
    duplicates: Vec<LinkTarget>,
}

impl TargetUniverse {
    /// Collects scene anchors and page links, in story order
    pub fn of(scenes: &[PublishedScene]) -> Self {
        let mut universe = Self::default();

        for (scene_index, scene) in scenes.iter().enumerate() {
            if let Some(link) = &scene.link {
                universe.insert(link, TargetOwner { scene: scene_index, page: None });
            }

            for (page_index, page) in scene.pages.iter().enumerate() {
                universe.insert(
                    &page.link,
                    TargetOwner {
                        scene: scene_index,
                        page: Some(page_index),
                    },
                );
            }
        }

        universe
    }

    fn insert(&mut self, target: &LinkTarget, owner: TargetOwner) {
        match self.owners.entry(target.clone()) {
            Entry::Occupied(_) => {
                if !self.duplicates.contains(target) {
                    self.duplicates.push(target.clone());
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(owner);
            }
        }
    }

    /// Returns the first owner of a target
    pub fn resolve(&self, target: &str) -> Option<TargetOwner> {
        self.owners.get(target).copied()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.owners.contains_key(target)
    }

    /// Targets defined more than once, in first-repeat order
    pub fn duplicates(&self) -> &[LinkTarget] {
        &self.duplicates
    }

    /// Number of distinct targets
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Distinct link targets that resolve to nothing, in first-seen order
pub fn unresolved_links<'a>(
    scenes: &'a [PublishedScene],
    universe: &TargetUniverse,
) -> Vec<&'a LinkTarget> {
    let mut seen = HashSet::new();

    scenes
        .iter()
        .flat_map(|scene| scene.pages.iter())
        .flat_map(|page| page.links())
        .map(|(_, target)| target)
        .filter(|target| !universe.contains(target.as_str()))
        .filter(|target| seen.insert(*target))
        .collect()
}

/// The publish gate: unique anchors and fully resolved links, or nothing
pub fn validate_links(story: AssembledStory) -> Result<PublishedStory, StoryFailure> {
    let universe = TargetUniverse::of(&story.scenes);

    if !universe.duplicates().is_empty() {
        return Err(StoryFailure::story(
            ErrorCode::LinkNamesMustBeUnique,
            format!("Link names must be unique: {}", join(universe.duplicates())),
        ));
    }

    let unresolved = unresolved_links(&story.scenes, &universe);
    if !unresolved.is_empty() {
        return Err(StoryFailure::story(
            ErrorCode::MalformedLink,
            format!(
                "One or more of the links in the story don't link to a known target: {}",
                join(unresolved)
            ),
        ));
    }

    debug!(story = %story.id, targets = universe.len(), "links validated");

    Ok(PublishedStory {
        id: story.id,
        title: story.title,
        author: story.author,
        published_on: story.published_on,
        scenes: story.scenes,
    })
}

fn join<'a>(targets: impl IntoIterator<Item = &'a LinkTarget>) -> String {
    targets
        .into_iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of checking one heading against an existing story
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HeadingCheck {
    NotAHeading,
    Available { target: LinkTarget },
    Taken { target: LinkTarget },
    Malformed { reason: String },
}

impl HeadingCheck {
    /// Returns the error code this check would fail publishing with
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            HeadingCheck::NotAHeading | HeadingCheck::Available { .. } => None,
            HeadingCheck::Taken { .. } => Some(ErrorCode::LinkNamesMustBeUnique),
            HeadingCheck::Malformed { .. } => Some(ErrorCode::MalformedLink),
        }
    }

    /// Author-facing message for a failed check
    pub fn message(&self) -> Option<String> {
        match self {
            HeadingCheck::NotAHeading | HeadingCheck::Available { .. } => None,
            HeadingCheck::Taken { target } => {
                Some(format!("Link names must be unique ('{}' is already used)", target))
            }
            HeadingCheck::Malformed { reason } => Some(reason.clone()),
        }
    }
}

/// Checks a single heading line against the targets a story already has
///
/// This is the per-line approximation an editor can run while typing;
/// [`validate_links`] still has the final say before publishing.
pub fn check_heading(universe: &TargetUniverse, line: &ContentLine) -> HeadingCheck {
    let derived = match line {
        ContentLine::HeaderNamed { text, name, .. } => {
            link_target_for_heading(text, Some(name.as_str()))
        }
        ContentLine::HeaderAnonymous { text, .. } => link_target_for_heading(text, None),
        ContentLine::EmptyLine { .. }
        | ContentLine::Link { .. }
        | ContentLine::Plaintext { .. }
        | ContentLine::Error { .. } => return HeadingCheck::NotAHeading,
    };

    match derived {
        Ok(target) if universe.contains(target.as_str()) => HeadingCheck::Taken { target },
        Ok(target) => HeadingCheck::Available { target },
        Err(e) => HeadingCheck::Malformed {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assemble::assemble_story;
    use crate::domain::line::classify;
    use crate::domain::story::{MediaRef, Scene, Story, StoryId};
    use chrono::{TimeZone, Utc};

    fn scene(id: &str, content: &str) -> Scene {
        let mut scene = Scene::new(id, id.to_uppercase(), content);
        scene.image = Some(MediaRef::new("img", "img.png"));
        scene
    }

    fn assembled(scenes: Vec<Scene>) -> AssembledStory {
        let story = Story {
            id: StoryId::from("story"),
            title: "A Story".to_string(),
            author: "Ada".to_string(),
            published_on: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            scenes,
        };
        assemble_story(&story).unwrap()
    }

    #[test]
    fn universe_covers_scene_anchors_and_pages() {
        let mut first = scene("one", "#Intro\n#Second Page");
        first.link = Some("chapter-one".to_string());
        let story = assembled(vec![first, scene("two", "#Outro")]);

        let universe = TargetUniverse::of(&story.scenes);
        assert_eq!(universe.len(), 4);
        assert_eq!(
            universe.resolve("chapter-one"),
            Some(TargetOwner { scene: 0, page: None })
        );
        assert_eq!(
            universe.resolve("second-page"),
            Some(TargetOwner { scene: 0, page: Some(1) })
        );
        assert_eq!(
            universe.resolve("outro"),
            Some(TargetOwner { scene: 1, page: Some(0) })
        );
        assert!(universe.duplicates().is_empty());
    }

    #[test]
    fn valid_story_publishes() {
        let story = assembled(vec![
            scene("one", "#Intro\n[Onwards] -> outro"),
            scene("two", "#Outro\n[Again] -> intro"),
        ]);

        let published = validate_links(story).unwrap();
        assert_eq!(published.scenes.len(), 2);
        assert_eq!(published.page_count(), 2);
    }

    #[test]
    fn duplicate_names_across_scenes_fail_in_either_order() {
        for (a, b) in [("#Intro", "#intro"), ("#intro", "#Intro")] {
            let story = assembled(vec![scene("one", a), scene("two", b)]);
            let err = validate_links(story).unwrap_err();
            assert_eq!(err.code, ErrorCode::LinkNamesMustBeUnique);
            assert!(err.reason.contains("intro"));
        }
    }

    #[test]
    fn duplicate_pages_within_a_scene_fail() {
        let story = assembled(vec![scene("one", "#Intro\n#Intro|intro")]);
        let err = validate_links(story).unwrap_err();
        assert_eq!(err.code, ErrorCode::LinkNamesMustBeUnique);
    }

    #[test]
    fn scene_anchor_naming_its_own_first_page_fails() {
        let mut first = scene("one", "#Intro\n[Again] -> intro");
        first.link = Some("intro".to_string());
        let story = assembled(vec![first]);

        let universe = TargetUniverse::of(&story.scenes);
        let duplicates: Vec<_> = universe.duplicates().iter().map(|t| t.as_str()).collect();
        assert_eq!(duplicates, vec!["intro"]);

        let err = validate_links(story).unwrap_err();
        assert_eq!(err.code, ErrorCode::LinkNamesMustBeUnique);
    }

    #[test]
    fn scene_anchor_clashing_with_other_page_fails() {
        let mut first = scene("one", "#Intro\n#Later");
        first.link = Some("later".to_string());
        let err = validate_links(assembled(vec![first])).unwrap_err();
        assert_eq!(err.code, ErrorCode::LinkNamesMustBeUnique);

        let mut second = scene("two", "#Outro");
        second.link = Some("intro".to_string());
        let err = validate_links(assembled(vec![scene("one", "#Intro"), second])).unwrap_err();
        assert_eq!(err.code, ErrorCode::LinkNamesMustBeUnique);
    }

    #[test]
    fn unresolved_link_fails_whole_story() {
        let story = assembled(vec![scene("one", "#Intro\n[Go] -> nowhere\n[Again] -> nowhere")]);
        let err = validate_links(story).unwrap_err();

        assert_eq!(err.code, ErrorCode::MalformedLink);
        assert!(err.reason.ends_with(": nowhere"));
    }

    #[test]
    fn links_may_target_scene_anchors() {
        let mut second = scene("two", "#Outro");
        second.link = Some("the-end".to_string());
        let story = assembled(vec![scene("one", "#Intro\n[Finish] -> the-end"), second]);

        assert!(validate_links(story).is_ok());
    }

    #[test]
    fn heading_check_reports_availability() {
        let story = assembled(vec![scene("one", "#Intro")]);
        let universe = TargetUniverse::of(&story.scenes);

        let taken = check_heading(&universe, &classify("# INTRO", 1));
        assert!(matches!(taken, HeadingCheck::Taken { ref target } if target.as_str() == "intro"));
        assert_eq!(taken.error_code(), Some(ErrorCode::LinkNamesMustBeUnique));

        let free = check_heading(&universe, &classify("#Next|next-one", 1));
        assert!(matches!(free, HeadingCheck::Available { .. }));
        assert_eq!(free.error_code(), None);

        let bad = check_heading(&universe, &classify("#Next|next!", 1));
        assert_eq!(bad.error_code(), Some(ErrorCode::MalformedLink));

        assert_eq!(check_heading(&universe, &classify("plain", 1)), HeadingCheck::NotAHeading);
    }
}
