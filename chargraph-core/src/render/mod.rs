//! Force-directed rendering of a finished snapshot.
//!
//! A pure pipeline with all state in plain values: the snapshot becomes a
//! [`Scene`] of nodes and links, a seeded spring layout assigns positions,
//! and the laid-out scene prints as an SVG document. Two runs over the
//! same snapshot produce identical bytes.

mod layout;
mod scene;
mod svg;

pub use scene::{Scene, SceneLink, SceneNode};

use crate::graph::GraphSnapshot;

/// Render a snapshot to a standalone SVG document.
pub fn render_svg(snapshot: &GraphSnapshot) -> String {
    let mut scene = Scene::from_snapshot(snapshot);
    layout::run(&mut scene);
    svg::document(&scene)
}
