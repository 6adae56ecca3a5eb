//! Graph command
//!
//! Shows the link topology of a story. Unlike `check`, missing targets do
//! not stop the command: they show up as ghost nodes so the author can see
//! what is still to be written.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use super::check::load_input;
use super::output::Output;
use crate::domain::{assemble_story, build_topology, TopologyLevel, TopologyNode, TopologyView};

#[derive(Serialize)]
struct GraphReport {
    #[serde(flatten)]
    view: TopologyView,
    unreachable: Vec<usize>,
}

/// Prints the topology of a story
pub fn run(output: &Output, path: &Path, level: Option<TopologyLevel>) -> Result<()> {
    let input = load_input(path)?;
    let level = level.unwrap_or(input.config.project.graph.level);

    let assembled = assemble_story(&input.story)?;
    let topology = build_topology(&assembled.scenes, level);
    let unreachable = topology.unreachable();

    debug!(
        %level,
        nodes = topology.node_count(),
        edges = topology.edges().len(),
        "built topology"
    );

    if output.is_json() {
        output.data(&GraphReport {
            view: topology.view(),
            unreachable,
        });
        return Ok(());
    }

    let label = |index: usize| {
        topology
            .node(index)
            .map(|node| node.id.as_str())
            .unwrap_or("?")
    };

    println!("{} ({} level)", assembled.title, level);
    println!();
    println!("{:<4} {:<28} {:<24} PAGES", "#", "ID", "TITLE");
    println!("{}", "-".repeat(64));
    for (index, node) in topology.nodes().enumerate() {
        println!(
            "{:<4} {:<28} {:<24} {}{}",
            index,
            node.id,
            node.title,
            node.page_count,
            marker(node)
        );
    }

    println!();
    if topology.edges().is_empty() {
        println!("No links.");
    } else {
        println!("Links ({}):", topology.edges().len());
        for edge in topology.edges() {
            println!(
                "  {} -> {}{}",
                label(edge.source_index),
                label(edge.target_index),
                if edge.is_ghost { "  (missing)" } else { "" }
            );
        }
    }

    let ghosts: Vec<_> = topology.ghosts().collect();
    if !ghosts.is_empty() {
        println!();
        println!("Missing targets ({}):", ghosts.len());
        for ghost in ghosts {
            match &ghost.ghost_label {
                Some(text) => println!("  {} (\"{}\")", ghost.title, text),
                None => println!("  {}", ghost.title),
            }
        }
    }

    if !unreachable.is_empty() {
        println!();
        println!("Unreachable from the opening scene ({}):", unreachable.len());
        for index in unreachable {
            println!("  {}", label(index));
        }
    }

    Ok(())
}

fn marker(node: &TopologyNode) -> &'static str {
    if node.is_opening {
        "  [opening]"
    } else if node.is_ghost {
        "  [missing]"
    } else {
        ""
    }
}
