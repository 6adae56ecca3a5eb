//! Story publishing pipeline
//!
//! `Story -> assemble -> validate links -> PublishedStory`, or the first
//! failure along the way. On failure the original story comes back with the
//! error so the author can be pointed at what to fix.

use serde::Serialize;
use tracing::debug;

use super::assemble::assemble_story;
use super::error::{ErrorCode, StoryFailure};
use super::story::{PublishedStory, Story};
use super::validate::validate_links;

/// Result of parsing a story for publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParseStoryResult {
    StoryParsed {
        story: PublishedStory,
    },
    #[serde(rename_all = "camelCase")]
    StoryFailedToParse {
        story: Story,
        error_code: ErrorCode,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        scene: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
    },
}

impl ParseStoryResult {
    fn failed(story: Story, failure: StoryFailure) -> Self {
        ParseStoryResult::StoryFailedToParse {
            story,
            error_code: failure.code,
            reason: failure.reason,
            scene: failure.scene,
            line: failure.line,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseStoryResult::StoryParsed { .. })
    }

    /// Returns the published story on success
    pub fn published(&self) -> Option<&PublishedStory> {
        match self {
            ParseStoryResult::StoryParsed { story } => Some(story),
            ParseStoryResult::StoryFailedToParse { .. } => None,
        }
    }

    /// Returns the error code on failure
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            ParseStoryResult::StoryParsed { .. } => None,
            ParseStoryResult::StoryFailedToParse { error_code, .. } => Some(*error_code),
        }
    }
}

/// Runs the whole pipeline over a story
pub fn parse_story(story: Story) -> ParseStoryResult {
    match assemble_story(&story).and_then(validate_links) {
        Ok(published) => ParseStoryResult::StoryParsed { story: published },
        Err(failure) => {
            debug!(story = %story.id, code = %failure.code, "story failed to parse");
            ParseStoryResult::failed(story, failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{MediaRef, Scene, StoryId};
    use chrono::{TimeZone, Utc};

    fn story(contents: &[&str]) -> Story {
        Story {
            id: StoryId::from("story"),
            title: "A Story".to_string(),
            author: "Ada".to_string(),
            published_on: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            scenes: contents
                .iter()
                .enumerate()
                .map(|(i, content)| {
                    let mut scene = Scene::new(format!("s{}", i), format!("Scene {}", i), *content);
                    scene.image = Some(MediaRef::new("img", "img.png"));
                    scene.is_opening_scene = i == 0;
                    scene
                })
                .collect(),
        }
    }

    #[test]
    fn parses_a_complete_story() {
        let result = parse_story(story(&[
            "#Intro\nYou wake up.\n[Get up] -> hallway",
            "#Hallway\n[Go back] -> intro",
        ]));

        assert!(result.is_parsed());
        let published = result.published().unwrap();
        assert_eq!(published.opening_scene().map(|s| s.id.0.as_str()), Some("s0"));
        assert_eq!(published.published_on, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn unresolved_link_fails_with_original_story_echoed() {
        let input = story(&["#Intro\n[Leave] -> nowhere"]);
        let result = parse_story(input.clone());

        match result {
            ParseStoryResult::StoryFailedToParse {
                story, error_code, ..
            } => {
                assert_eq!(story, input);
                assert_eq!(error_code, ErrorCode::MalformedLink);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn structural_failure_carries_scene_and_line() {
        let result = parse_story(story(&["#Intro", "\n\nstray paragraph"]));

        match result {
            ParseStoryResult::StoryFailedToParse { scene, line, .. } => {
                assert_eq!(scene.as_deref(), Some("Scene 1"));
                assert_eq!(line, Some(3));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn uniqueness_is_checked_before_resolution() {
        let result = parse_story(story(&["#Intro\n[x] -> nowhere", "#intro"]));
        assert_eq!(result.error_code(), Some(ErrorCode::LinkNamesMustBeUnique));
    }

    #[test]
    fn serializes_discriminated_result() {
        let ok = serde_json::to_value(parse_story(story(&["#Intro"]))).unwrap();
        assert_eq!(ok["kind"], "storyParsed");
        assert_eq!(ok["story"]["scenes"][0]["pages"]["intro"]["number"], 0);

        let failed = serde_json::to_value(parse_story(story(&[]))).unwrap();
        assert_eq!(failed["kind"], "storyFailedToParse");
        assert_eq!(failed["errorCode"], "MustHaveAtLeastOneScene");
        assert_eq!(failed["reason"], "No scenes");
        assert!(failed.get("line").is_none());
    }
}
