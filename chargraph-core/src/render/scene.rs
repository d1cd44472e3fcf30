//! Scene construction: snapshot to drawable nodes and links.

use crate::graph::{GraphSnapshot, LinkTone};
use std::collections::HashMap;

/// Side length of the square scene, in scene units.
pub const VIEWPORT: f64 = 1200.0;

/// Node fill colors.
pub const MAIN_FILL: &str = "#FF6B6B";
pub const SUPPORT_FILL: &str = "#4ECDC4";

/// Collision radii. Main characters get more breathing room.
pub const MAIN_RADIUS: f64 = 28.0;
pub const SUPPORT_RADIUS: f64 = 16.0;

/// Scene distance a weight-1 link aims for; stronger links pull closer.
pub const LINK_DISTANCE_BASE: f64 = 360.0;

/// Widest link stroke, used for the maximum-weight relation.
pub const MAX_STROKE: f64 = 20.0;

/// A drawable character.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub label: String,
    pub main: bool,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
}

/// A drawable relation between two nodes, by index into `Scene::nodes`.
#[derive(Debug, Clone)]
pub struct SceneLink {
    pub from: usize,
    pub to: usize,
    pub tone: LinkTone,
    pub weight: f64,
    /// Rest length the layout pulls this link toward.
    pub distance: f64,
}

/// Everything the renderer knows, in one explicit value.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub links: Vec<SceneLink>,
    pub max_weight: f64,
}

impl Scene {
    /// Build a scene from a snapshot.
    ///
    /// Relations whose endpoints are missing from the character list are
    /// dropped rather than failing the render; a partially refined graph
    /// still draws.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let indices: HashMap<_, _> = snapshot
            .characters
            .iter()
            .enumerate()
            .map(|(index, character)| (character.id, index))
            .collect();

        let nodes = snapshot
            .characters
            .iter()
            .map(|character| SceneNode {
                label: character.common_name.clone(),
                main: character.main_character,
                radius: collision_radius(character.main_character),
                x: 0.0,
                y: 0.0,
            })
            .collect();

        let links: Vec<SceneLink> = snapshot
            .relations
            .iter()
            .filter_map(|relation| {
                let from = *indices.get(&relation.id1)?;
                let to = *indices.get(&relation.id2)?;
                Some(SceneLink {
                    from,
                    to,
                    tone: relation.tone(),
                    weight: relation.weight,
                    distance: link_distance(relation.weight),
                })
            })
            .collect();

        let max_weight = links.iter().map(|link| link.weight).fold(0.0, f64::max);

        Self {
            nodes,
            links,
            max_weight,
        }
    }

    /// Stroke width for a link, scaled against the strongest relation.
    pub fn stroke_width(&self, link: &SceneLink) -> f64 {
        if self.max_weight > 0.0 {
            MAX_STROKE * link.weight / self.max_weight
        } else {
            1.0
        }
    }
}

/// Rest length for a link: inverse to weight, so strong relationships sit
/// close together.
pub fn link_distance(weight: f64) -> f64 {
    LINK_DISTANCE_BASE / weight.max(1.0)
}

pub fn collision_radius(main: bool) -> f64 {
    if main {
        MAIN_RADIUS
    } else {
        SUPPORT_RADIUS
    }
}

/// Edge color by valence: red for hostile, grey for neutral, green for
/// friendly.
pub fn stroke_color(tone: LinkTone) -> &'static str {
    match tone {
        LinkTone::Negative => "red",
        LinkTone::Neutral => "grey",
        LinkTone::Positive => "green",
    }
}
