//! Seeded spring layout.
//!
//! Fruchterman-Reingold with two amendments: links pull toward their own
//! rest length instead of a global one, and overlapping collision radii
//! push extra hard. The RNG is seeded so the same scene always lands in
//! the same positions.

use crate::render::scene::{Scene, VIEWPORT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const LAYOUT_SEED: u64 = 42;
const ROUNDS: usize = 50;
const MARGIN: f64 = 60.0;

/// Assign positions to every node in the scene.
pub fn run(scene: &mut Scene) {
    let count = scene.nodes.len();
    if count == 0 {
        return;
    }

    let mut rng = StdRng::seed_from_u64(LAYOUT_SEED);
    for node in &mut scene.nodes {
        node.x = rng.gen_range(MARGIN..VIEWPORT - MARGIN);
        node.y = rng.gen_range(MARGIN..VIEWPORT - MARGIN);
    }
    if count == 1 {
        scene.nodes[0].x = VIEWPORT / 2.0;
        scene.nodes[0].y = VIEWPORT / 2.0;
        return;
    }

    let k = (VIEWPORT * VIEWPORT / count as f64).sqrt();
    let mut temperature = VIEWPORT / 10.0;
    let cooling = temperature / (ROUNDS as f64 + 1.0);

    for _ in 0..ROUNDS {
        let mut shift = vec![(0.0f64, 0.0f64); count];

        // Repulsion between every pair, with a stronger shove when the
        // collision radii overlap.
        for i in 0..count {
            for j in (i + 1)..count {
                let dx = scene.nodes[i].x - scene.nodes[j].x;
                let dy = scene.nodes[i].y - scene.nodes[j].y;
                let distance = (dx * dx + dy * dy).sqrt().max(0.01);

                let mut force = k * k / distance / count as f64;
                let clearance = scene.nodes[i].radius + scene.nodes[j].radius;
                if distance < clearance {
                    force += (clearance - distance) * 2.0;
                }

                let (ux, uy) = (dx / distance, dy / distance);
                shift[i].0 += ux * force;
                shift[i].1 += uy * force;
                shift[j].0 -= ux * force;
                shift[j].1 -= uy * force;
            }
        }

        // Springs pull each link toward its rest length.
        for link in &scene.links {
            let dx = scene.nodes[link.from].x - scene.nodes[link.to].x;
            let dy = scene.nodes[link.from].y - scene.nodes[link.to].y;
            let distance = (dx * dx + dy * dy).sqrt().max(0.01);

            let force = (distance - link.distance) / 3.0;
            let (ux, uy) = (dx / distance, dy / distance);
            shift[link.from].0 -= ux * force;
            shift[link.from].1 -= uy * force;
            shift[link.to].0 += ux * force;
            shift[link.to].1 += uy * force;
        }

        // Apply, capped by the cooling temperature, with a slight pull
        // toward the center so disconnected components stay on canvas.
        for (node, (dx, dy)) in scene.nodes.iter_mut().zip(&shift) {
            let length = (dx * dx + dy * dy).sqrt().max(0.01);
            let capped = length.min(temperature);
            node.x += dx / length * capped;
            node.y += dy / length * capped;
            node.x += (VIEWPORT / 2.0 - node.x) * 0.02;
            node.y += (VIEWPORT / 2.0 - node.y) * 0.02;
        }

        temperature = (temperature - cooling).max(1.0);
    }

    for node in &mut scene.nodes {
        node.x = node.x.clamp(MARGIN, VIEWPORT - MARGIN);
        node.y = node.y.clamp(MARGIN, VIEWPORT - MARGIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Character, CharacterId, GraphSnapshot, Relation};

    fn id(raw: u64) -> CharacterId {
        CharacterId::new(raw)
    }

    fn laid_out(snapshot: &GraphSnapshot) -> Scene {
        let mut scene = Scene::from_snapshot(snapshot);
        run(&mut scene);
        scene
    }

    fn sample() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![
                Character::new(id(1), "Alice").main(),
                Character::new(id(2), "Bob"),
                Character::new(id(3), "Carol"),
                Character::new(id(4), "Dan"),
            ],
            vec![
                Relation::new(id(1), id(2), "friend", 9.0, 0.8),
                Relation::new(id(3), id(4), "acquaintance", 1.0, 0.0),
            ],
        )
    }

    #[test]
    fn layout_is_deterministic() {
        let snapshot = sample();
        let first = laid_out(&snapshot);
        let second = laid_out(&snapshot);
        for (a, b) in first.nodes.iter().zip(&second.nodes) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }
    }

    #[test]
    fn nodes_stay_inside_the_viewport() {
        let scene = laid_out(&sample());
        for node in &scene.nodes {
            assert!(node.x >= MARGIN && node.x <= VIEWPORT - MARGIN);
            assert!(node.y >= MARGIN && node.y <= VIEWPORT - MARGIN);
        }
    }

    #[test]
    fn strong_links_end_up_shorter_than_weak_ones() {
        let scene = laid_out(&sample());
        let length = |index: usize| {
            let link: &crate::render::SceneLink = &scene.links[index];
            let dx = scene.nodes[link.from].x - scene.nodes[link.to].x;
            let dy = scene.nodes[link.from].y - scene.nodes[link.to].y;
            (dx * dx + dy * dy).sqrt()
        };
        // Link 0 has weight 9, link 1 weight 1.
        assert!(length(0) < length(1));
    }

    #[test]
    fn single_node_sits_in_the_center() {
        let snapshot = GraphSnapshot::new(vec![Character::new(id(1), "Alone")], vec![]);
        let scene = laid_out(&snapshot);
        assert_eq!(scene.nodes[0].x, VIEWPORT / 2.0);
        assert_eq!(scene.nodes[0].y, VIEWPORT / 2.0);
    }

    #[test]
    fn empty_scene_is_a_no_op() {
        let mut scene = Scene::from_snapshot(&GraphSnapshot::default());
        run(&mut scene);
        assert!(scene.nodes.is_empty());
    }
}
