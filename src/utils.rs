//! Shared geometry and markup helpers.

use cgmath::{Point2, Vector2};

///////////////////////
// ROUNDED RECTANGLE //
///////////////////////

/// An axis-aligned rounded rectangle in element space
// Invariant: size.x >= 0 && size.y >= 0 (parameter resolution clamps geometry to 0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    min: Point2<f32>,
    size: Vector2<f32>,
    corner_radius: f32,
}

impl RoundedRect {
    /// Creates a `RoundedRect` with a given size and where the minimum corner is the origin
    /// (i.e. `(0, 0)`)
    pub fn from_origin(width: f32, height: f32, corner_radius: f32) -> Self {
        Self::from_min_size(
            Point2::new(0.0, 0.0),
            Vector2::new(width, height),
            corner_radius,
        )
    }

    pub fn from_min_size(min: Point2<f32>, size: Vector2<f32>, corner_radius: f32) -> Self {
        Self {
            min,
            size,
            corner_radius,
        }
    }

    /// The centered rectangle occupying the middle half of a `width x height` element.  Every
    /// shape in every layer asset is placed on this rectangle.
    pub fn inset_of(width: f32, height: f32, corner_radius: f32) -> Self {
        Self::from_min_size(
            Point2::new(width / 4.0, height / 4.0),
            Vector2::new(width / 2.0, height / 2.0),
            corner_radius,
        )
    }

    pub fn x(self) -> f32 {
        self.min.x
    }

    pub fn y(self) -> f32 {
        self.min.y
    }

    pub fn width(self) -> f32 {
        self.size.x
    }

    pub fn height(self) -> f32 {
        self.size.y
    }

    pub fn corner_radius(self) -> f32 {
        self.corner_radius
    }
}

//////////////
// ESCAPING //
//////////////

/// Percent-escapes vector markup for embedding in a `data:` URI.
///
/// Escapes the characters that are unsafe inside a URI but can appear in the generated markup;
/// everything else (letters, digits, `'`, `=`, `:`, `;`, `,`) passes through unchanged, so the
/// result is reversible by ordinary percent-decoding.
pub fn percent_escape(markup: &str) -> String {
    let mut escaped = String::with_capacity(markup.len());
    for c in markup.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '<' => escaped.push_str("%3C"),
            '>' => escaped.push_str("%3E"),
            '#' => escaped.push_str("%23"),
            '"' => escaped.push_str("%22"),
            '(' => escaped.push_str("%28"),
            ')' => escaped.push_str("%29"),
            '/' => escaped.push_str("%2F"),
            ' ' => escaped.push_str("%20"),
            _ => escaped.push(c),
        }
    }
    escaped
}
