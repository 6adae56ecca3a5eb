//! Domain models for Storyline
//!
//! Contains the parsing and link-graph logic without any I/O concerns.
//! Every function here is a pure function of its input.

mod error;
mod link;
mod line;
mod story;
mod assemble;
mod validate;
mod topology;
mod parse;

pub use error::{ErrorCode, StoryFailure};
pub use link::{
    derive_link_target, derive_link_target_leniently, link_target_for_heading, parse_link_target,
    LinkTarget, LinkTargetError, MAX_LINK_TARGET_LEN, MIN_LINK_TARGET_LEN,
};
pub use line::{classify, classify_all, ContentLine};
pub use story::{
    AssembledStory, Block, MediaRef, Page, Pages, PublishedScene, PublishedStory, Scene, SceneId,
    Story, StoryId,
};
pub use assemble::{assemble_scene, assemble_story, SceneAssembler};
pub use validate::{
    check_heading, unresolved_links, validate_links, HeadingCheck, TargetOwner, TargetUniverse,
};
pub use topology::{
    build_topology, StoryTopology, TopologyEdge, TopologyLevel, TopologyNode, TopologyView,
};
pub use parse::{parse_story, ParseStoryResult};
