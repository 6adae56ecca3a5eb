//! Page and story assembly
//!
//! Turns each scene's classified lines into pages. A page opens at every
//! heading and is sealed when the next heading arrives or the scene ends.
//! Paragraphs and links before the first heading are errors.
//!
//! Assembly checks structure only. Whether links resolve and whether anchor
//! names are unique is decided afterwards by [`super::validate`].

use tracing::debug;

use super::error::{ErrorCode, StoryFailure};
use super::line::{classify_all, ContentLine};
use super::link::{derive_link_target_leniently, link_target_for_heading, parse_link_target};
use super::story::{AssembledStory, Block, Page, Pages, PublishedScene, Scene, Story};

#[derive(Debug)]
enum State {
    NoPageOpen,
    PageOpen(Page),
}

/// Groups one scene's lines into pages
#[derive(Debug)]
pub struct SceneAssembler<'a> {
    scene: &'a Scene,
    pages: Pages,
    state: State,
}

impl<'a> SceneAssembler<'a> {
    pub fn new(scene: &'a Scene) -> Self {
        Self {
            scene,
            pages: Pages::new(),
            state: State::NoPageOpen,
        }
    }

    /// Consumes the next line in source order
    pub fn feed(&mut self, line: ContentLine) -> Result<(), StoryFailure> {
        match line {
            ContentLine::EmptyLine { .. } => Ok(()),

            ContentLine::HeaderNamed { line, text, name } => {
                self.open_page(line, text, Some(name.as_str()))
            }

            ContentLine::HeaderAnonymous { line, text } => self.open_page(line, text, None),

            ContentLine::Plaintext { line, text } => match &mut self.state {
                State::PageOpen(page) => {
                    page.content.push(Block::BlockPlaintext { text });
                    Ok(())
                }
                State::NoPageOpen => Err(StoryFailure::at_line(
                    ErrorCode::MustAddHeadingBeforeAddingAParagraph,
                    &self.scene.title,
                    line,
                    "you must create a heading before adding a paragraph",
                )),
            },

            ContentLine::Link { line, text, link } => match &mut self.state {
                State::PageOpen(page) => {
                    page.content.push(Block::BlockLink { text, link });
                    Ok(())
                }
                State::NoPageOpen => Err(StoryFailure::at_line(
                    ErrorCode::MustAddHeadingBeforeAddingALink,
                    &self.scene.title,
                    line,
                    "you must create a heading before adding a link",
                )),
            },

            ContentLine::Error {
                line,
                code,
                message,
            } => Err(StoryFailure::at_line(
                code.unwrap_or(ErrorCode::UnableToParseStory),
                &self.scene.title,
                line,
                format!("\"{}\"", message),
            )),
        }
    }

    /// Seals the last page and returns the scene's pages
    pub fn finish(mut self) -> Result<Pages, StoryFailure> {
        self.seal();

        if self.pages.is_empty() {
            return Err(StoryFailure::scene(
                ErrorCode::AllScenesMustHaveContent,
                &self.scene.title,
                "you must create enough content in the scene for at least one page",
            ));
        }

        Ok(self.pages)
    }

    fn seal(&mut self) {
        if let State::PageOpen(page) = std::mem::replace(&mut self.state, State::NoPageOpen) {
            self.pages.push(page);
        }
    }

    fn open_page(&mut self, line: usize, text: String, name: Option<&str>) -> Result<(), StoryFailure> {
        self.seal();

        let link = link_target_for_heading(&text, name).map_err(|e| {
            StoryFailure::at_line(ErrorCode::MalformedLink, &self.scene.title, line, e)
        })?;

        self.state = State::PageOpen(Page::new(
            self.pages.len(),
            link,
            self.scene.id.clone(),
            text,
        ));

        Ok(())
    }
}

/// Assembles one scene into its published form
pub fn assemble_scene(scene: &Scene) -> Result<PublishedScene, StoryFailure> {
    let image = scene.resolved_image().cloned().ok_or_else(|| {
        StoryFailure::scene(ErrorCode::AllScenesMustHaveAnImage, &scene.title, "image is missing")
    })?;

    let link = scene
        .link
        .as_deref()
        .filter(|link| !link.trim().is_empty())
        .map(|link| parse_link_target(&derive_link_target_leniently(link)))
        .transpose()
        .map_err(|e| {
            StoryFailure::scene(
                ErrorCode::MalformedLink,
                &scene.title,
                format!("unable to use the scene's link because {}", e),
            )
        })?;

    let mut assembler = SceneAssembler::new(scene);
    for line in classify_all(&scene.content) {
        assembler.feed(line)?;
    }
    let pages = assembler.finish()?;

    debug!(scene = %scene.id, pages = pages.len(), "assembled scene");

    Ok(PublishedScene {
        id: scene.id.clone(),
        title: scene.title.clone(),
        image,
        audio: scene.resolved_audio().cloned(),
        link,
        is_opening_scene: scene.is_opening_scene,
        pages,
    })
}

/// Assembles every scene in order, stopping at the first failure
pub fn assemble_story(story: &Story) -> Result<AssembledStory, StoryFailure> {
    let scenes = story
        .scenes
        .iter()
        .map(assemble_scene)
        .collect::<Result<Vec<_>, _>>()?;

    if scenes.is_empty() {
        return Err(StoryFailure::story(ErrorCode::MustHaveAtLeastOneScene, "No scenes"));
    }

    debug!(story = %story.id, scenes = scenes.len(), "assembled story");

    Ok(AssembledStory {
        id: story.id.clone(),
        title: story.title.clone(),
        author: story.author.clone(),
        published_on: story.published_on,
        scenes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{MediaRef, StoryId};
    use chrono::{TimeZone, Utc};

    fn scene(title: &str, content: &str) -> Scene {
        let mut scene = Scene::new(title.to_lowercase(), title, content);
        scene.image = Some(MediaRef::new("img", "img.png"));
        scene
    }

    fn story(scenes: Vec<Scene>) -> Story {
        Story {
            id: StoryId::from("story"),
            title: "A Story".to_string(),
            author: "Ada".to_string(),
            published_on: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            scenes,
        }
    }

    #[test]
    fn groups_lines_into_pages() {
        let scene = scene(
            "Start",
            "#The Beginning\nIt was dark.\n[Go on] -> the-end\n\n#The End|the-end\nFin.",
        );

        let published = assemble_scene(&scene).unwrap();
        let pages: Vec<_> = published.pages.iter().collect();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].number, 0);
        assert_eq!(pages[0].link.as_str(), "the-beginning");
        assert_eq!(pages[0].content.len(), 3);
        assert_eq!(pages[1].number, 1);
        assert_eq!(pages[1].link.as_str(), "the-end");
        assert_eq!(pages[1].heading(), Some("The End"));
        assert!(pages.iter().all(|p| p.within_scene == scene.id));
    }

    #[test]
    fn paragraph_before_heading_fails() {
        let err = assemble_scene(&scene("Start", "Once upon a time")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MustAddHeadingBeforeAddingAParagraph);
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn link_before_heading_fails() {
        let err = assemble_scene(&scene("Start", "\n[Go] -> somewhere")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MustAddHeadingBeforeAddingALink);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn blank_scene_has_no_content() {
        let err = assemble_scene(&scene("Start", "\n   \n\n")).unwrap_err();
        assert_eq!(err.code, ErrorCode::AllScenesMustHaveContent);
        assert_eq!(err.line, None);
    }

    #[test]
    fn missing_image_is_checked_before_content() {
        let mut scene = scene("Start", "no heading here");
        scene.image = None;

        let err = assemble_scene(&scene).unwrap_err();
        assert_eq!(err.code, ErrorCode::AllScenesMustHaveAnImage);
    }

    #[test]
    fn malformed_link_line_propagates() {
        let err = assemble_scene(&scene("Start", "#Start\n[Go] -> no where")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedLink);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn uncoded_classifier_error_is_unable_to_parse() {
        let err = assemble_scene(&scene("Start", "#Start\n#")).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnableToParseStory);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn heading_that_derives_nothing_is_malformed() {
        let err = assemble_scene(&scene("Start", "#!!!")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedLink);
        assert!(err.reason.contains("empty"));
    }

    #[test]
    fn explicit_names_are_normalized() {
        let published = assemble_scene(&scene("Start", "#Intro | My Chapter")).unwrap();
        assert!(published.pages.get("my-chapter").is_some());
    }

    #[test]
    fn scene_link_is_normalized_and_validated() {
        let mut with_link = scene("Start", "#Intro");
        with_link.link = Some("Opening Scene".to_string());
        let published = assemble_scene(&with_link).unwrap();
        assert_eq!(published.link.map(|l| l.to_string()), Some("opening-scene".to_string()));

        with_link.link = Some("bad!".to_string());
        let err = assemble_scene(&with_link).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedLink);
    }

    #[test]
    fn story_stops_at_first_failing_scene() {
        let story = story(vec![
            scene("One", "#One"),
            scene("Two", "orphan paragraph"),
            scene("Three", ""),
        ]);

        let err = assemble_story(&story).unwrap_err();
        assert_eq!(err.code, ErrorCode::MustAddHeadingBeforeAddingAParagraph);
        assert_eq!(err.scene.as_deref(), Some("Two"));
    }

    #[test]
    fn story_needs_a_scene() {
        let err = assemble_story(&story(vec![])).unwrap_err();
        assert_eq!(err.code, ErrorCode::MustHaveAtLeastOneScene);
    }

    #[test]
    fn assembly_does_not_check_links() {
        let assembled = assemble_story(&story(vec![scene("One", "#One\n[Go] -> nowhere")])).unwrap();
        assert_eq!(assembled.scenes.len(), 1);
    }
}
