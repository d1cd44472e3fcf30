//! Minimal SVG writer for a laid-out scene.

use crate::render::scene::{stroke_color, Scene, MAIN_FILL, SUPPORT_FILL, VIEWPORT};
use std::fmt::Write;

const FONT_SIZE: f64 = 13.0;

/// Print a laid-out scene as a standalone SVG document.
pub fn document(scene: &Scene) -> String {
    let mut out = String::new();
    let side = VIEWPORT as u32;

    // String's fmt::Write never fails; the results are ignored wholesale.
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{side}\" height=\"{side}\" viewBox=\"0 0 {side} {side}\">"
    );
    let _ = writeln!(out, "  <rect width=\"{side}\" height=\"{side}\" fill=\"white\"/>");

    // Links underneath, then nodes, then labels on top.
    for link in &scene.links {
        let from = &scene.nodes[link.from];
        let to = &scene.nodes[link.to];
        let _ = writeln!(
            out,
            "  <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"{:.1}\" stroke-opacity=\"0.35\"/>",
            from.x,
            from.y,
            to.x,
            to.y,
            stroke_color(link.tone),
            scene.stroke_width(link),
        );
    }

    for node in &scene.nodes {
        let fill = if node.main { MAIN_FILL } else { SUPPORT_FILL };
        let _ = writeln!(
            out,
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\" stroke=\"black\" stroke-width=\"1\"/>",
            node.x, node.y, node.radius, fill,
        );
    }

    for node in &scene.nodes {
        let _ = writeln!(
            out,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"{FONT_SIZE}\" text-anchor=\"middle\" stroke=\"white\" stroke-width=\"3\" paint-order=\"stroke\">{}</text>",
            node.x,
            node.y - node.radius - 4.0,
            escape(&node.label),
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Escape the five XML-special characters in a label.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
