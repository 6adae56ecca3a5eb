//! Error codes for the story pipeline
//!
//! Every failure the pipeline can report carries one of these codes plus a
//! message that is shown to the author as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of failure, independent of where it was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    MalformedLink,
    AllScenesMustHaveAnImage,
    MustAddHeadingBeforeAddingAParagraph,
    MustAddHeadingBeforeAddingALink,
    AllScenesMustHaveContent,
    MustHaveAtLeastOneScene,
    LinkNamesMustBeUnique,
    /// Catch-all for classifier errors without a more specific code
    UnableToParseStory,
}

impl ErrorCode {
    /// Returns the code as it appears in serialized results
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MalformedLink => "MalformedLink",
            ErrorCode::AllScenesMustHaveAnImage => "AllScenesMustHaveAnImage",
            ErrorCode::MustAddHeadingBeforeAddingAParagraph => {
                "MustAddHeadingBeforeAddingAParagraph"
            }
            ErrorCode::MustAddHeadingBeforeAddingALink => "MustAddHeadingBeforeAddingALink",
            ErrorCode::AllScenesMustHaveContent => "AllScenesMustHaveContent",
            ErrorCode::MustHaveAtLeastOneScene => "MustHaveAtLeastOneScene",
            ErrorCode::LinkNamesMustBeUnique => "LinkNamesMustBeUnique",
            ErrorCode::UnableToParseStory => "UnableToParseStory",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural or semantic failure that stops the pipeline
///
/// The first failure wins: nothing after it is assembled or validated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {reason}")]
pub struct StoryFailure {
    pub code: ErrorCode,

    /// Author-facing explanation
    pub reason: String,

    /// Title of the scene being assembled, if any
    pub scene: Option<String>,

    /// 1-based source line inside that scene, if any
    pub line: Option<usize>,
}

impl StoryFailure {
    /// A failure that concerns the story as a whole
    pub fn story(code: ErrorCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            scene: None,
            line: None,
        }
    }

    /// A failure inside a scene but not tied to a line
    pub fn scene(code: ErrorCode, scene: &str, detail: impl std::fmt::Display) -> Self {
        Self {
            code,
            reason: format!("Error parsing scene \"{}\": {}", scene, detail),
            scene: Some(scene.to_string()),
            line: None,
        }
    }

    /// A failure at a specific line of a scene
    pub fn at_line(
        code: ErrorCode,
        scene: &str,
        line: usize,
        detail: impl std::fmt::Display,
    ) -> Self {
        Self {
            code,
            reason: format!("Error parsing scene \"{}\" at line #{}: {}", scene, line, detail),
            scene: Some(scene.to_string()),
            line: Some(line),
        }
    }
}
