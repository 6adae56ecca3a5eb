//! Storyline - a parser and publisher for branching stories
//!
//! A story is a set of scenes written in a small markup: `#` headings open
//! pages, `[text] -> target` lines link to other pages or scenes, and
//! everything else is prose. Publishing turns the scenes into pages and
//! checks that every link lands somewhere. The link graph, including links
//! to targets not written yet, can be built at any time.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    build_topology, classify, parse_story, ContentLine, LinkTarget, ParseStoryResult,
    PublishedStory, Story, StoryTopology,
};
