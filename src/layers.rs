//! Procedural generation of the four vector layer assets.
//!
//! Each asset is a small self-contained SVG image built from rounded rectangles on the shared
//! inset geometry.  The assets are pure functions of [`EffectParameters`]: they carry no state
//! and no identity beyond their content, and all four are regenerated together whenever any
//! parameter changes.

use cgmath::Vector2;
use log::trace;

use crate::{
    params::EffectParameters,
    utils::{percent_escape, RoundedRect},
};

/// The blur radius of the displacement map's final softening rectangle is derived as
/// `GLASS_BLUR_CEILING - glass_blur` (clamped to 0 when `glass_blur` exceeds the ceiling).
const GLASS_BLUR_CEILING: f32 = 20.0;

/// Identifies one of the four generated layer assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Shadow,
    Highlight,
    ClipMask,
    DisplacementMap,
}

impl LayerKind {
    pub const ALL: [LayerKind; 4] = [
        LayerKind::Shadow,
        LayerKind::Highlight,
        LayerKind::ClipMask,
        LayerKind::DisplacementMap,
    ];

    /// The `result` label under which the asset enters the filter pipeline.
    pub fn result_label(self) -> &'static str {
        match self {
            LayerKind::Shadow => "shadowLayer",
            LayerKind::Highlight => "highlightLayer",
            LayerKind::ClipMask => "clipMaskLayer",
            LayerKind::DisplacementMap => "displacementMapLayer",
        }
    }
}

/// One self-contained vector image, ready to be bound to an image stage of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerAsset {
    kind: LayerKind,
    size: Vector2<f32>,
    markup: String,
}

impl LayerAsset {
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    /// The asset's SVG markup, unescaped.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The `data:image/svg+xml` URI form consumed by the host's image primitive.
    pub fn to_data_uri(&self) -> String {
        format!("data:image/svg+xml,{}", percent_escape(&self.markup))
    }
}

/// The four assets regenerated together on every parameter change.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet {
    pub shadow: LayerAsset,
    pub highlight: LayerAsset,
    pub clip_mask: LayerAsset,
    pub displacement_map: LayerAsset,
}

impl LayerSet {
    pub fn get(&self, kind: LayerKind) -> &LayerAsset {
        match kind {
            LayerKind::Shadow => &self.shadow,
            LayerKind::Highlight => &self.highlight,
            LayerKind::ClipMask => &self.clip_mask,
            LayerKind::DisplacementMap => &self.displacement_map,
        }
    }
}

/// Builds all four layer assets for `params`.
///
/// Pure and deterministic: identical parameters produce byte-identical markup.  Every
/// rectangle shares the same inset geometry and corner radius; degenerate (zero) geometry
/// yields zero-area shapes but still well-formed markup.
pub fn build(params: &EffectParameters) -> LayerSet {
    let size = params.size();
    let inset = RoundedRect::inset_of(params.width, params.height, params.corner_radius);
    trace!(
        "regenerating layer assets for {}x{} element",
        params.width,
        params.height
    );

    let asset = |kind: LayerKind, markup: String| LayerAsset { kind, size, markup };
    LayerSet {
        shadow: asset(LayerKind::Shadow, shadow_markup(params, inset)),
        highlight: asset(LayerKind::Highlight, highlight_markup(params, inset)),
        clip_mask: asset(LayerKind::ClipMask, clip_mask_markup(params, inset)),
        displacement_map: asset(LayerKind::DisplacementMap, displacement_map_markup(params, inset)),
    }
}

/// A black shape at the shadow opacity under a separately blurred white copy; the multiply
/// blend against this darkens the glass rim.
fn shadow_markup(params: &EffectParameters, inset: RoundedRect) -> String {
    let mut markup = svg_open(params.size());
    markup += &rect(
        inset,
        &format!("rgb(0 0 0 / {}%)", percent_of_255(params.shadow_opacity)),
        None,
    );
    markup += &rect(
        inset,
        "#FFF",
        Some(&format!("filter:blur({}px)", params.shadow_blur)),
    );
    markup += "</svg>";
    markup
}

/// A blurred white shape; the screen blend against this lightens the glass body.
fn highlight_markup(params: &EffectParameters, inset: RoundedRect) -> String {
    let mut markup = svg_open(params.size());
    markup += &rect(
        inset,
        &format!("rgb(255 255 255 / {}%)", percent_of_255(params.highlight_opacity)),
        Some(&format!("filter:blur({}px)", params.highlight_blur)),
    );
    markup += "</svg>";
    markup
}

/// A solid opaque shape defining the final visible silhouette.
fn clip_mask_markup(params: &EffectParameters, inset: RoundedRect) -> String {
    let mut markup = svg_open(params.size());
    markup += &rect(inset, "#000", None);
    markup += "</svg>";
    markup
}

/// The compound gradient image whose channel values encode the per-pixel displacement vector:
/// a horizontal blue ramp and a vertical green ramp, screen-blended over an inset black shape
/// on a mid-gray field, softened by a final translucent gray rectangle.
fn displacement_map_markup(params: &EffectParameters, inset: RoundedRect) -> String {
    let full = RoundedRect::from_origin(params.width, params.height, params.corner_radius);
    let soften_blur = (GLASS_BLUR_CEILING - params.glass_blur).max(0.0);

    let mut markup = svg_open(params.size());
    markup += "<defs>";
    markup += "<linearGradient id='gradient1' x1='0%' y1='0%' x2='100%' y2='0%'>\
               <stop offset='0%' stop-color='#000'/><stop offset='100%' stop-color='#00F'/>\
               </linearGradient>";
    markup += "<linearGradient id='gradient2' x1='0%' y1='0%' x2='0%' y2='100%'>\
               <stop offset='0%' stop-color='#000'/><stop offset='100%' stop-color='#0F0'/>\
               </linearGradient>";
    markup += "</defs>";
    markup += &rect(full, "#7F7F7F", None);
    markup += &rect(inset, "#000", None);
    markup += &rect(inset, "url(#gradient1)", Some("mix-blend-mode: screen"));
    markup += &rect(inset, "url(#gradient2)", Some("mix-blend-mode: screen"));
    markup += &rect(
        inset,
        &format!("rgb(127 127 127 / {}%)", percent_of_255(255.0 - params.glass_opacity)),
        Some(&format!("filter:blur({}px)", soften_blur)),
    );
    markup += "</svg>";
    markup
}

fn svg_open(size: Vector2<f32>) -> String {
    format!(
        "<svg width='{w}' height='{h}' viewBox='0 0 {w} {h}' xmlns='http://www.w3.org/2000/svg'>",
        w = size.x,
        h = size.y,
    )
}

fn rect(r: RoundedRect, fill: &str, style: Option<&str>) -> String {
    let style_attr = match style {
        Some(style) => format!(" style='{}'", style),
        None => String::new(),
    };
    format!(
        "<rect x='{}' y='{}' width='{}' height='{}' rx='{}' fill='{}'{} />",
        r.x(),
        r.y(),
        r.width(),
        r.height(),
        r.corner_radius(),
        fill,
        style_attr,
    )
}

/// Opacities arrive in the 0-255 range but the markup expresses them as percentages.
fn percent_of_255(value: f32) -> f32 {
    value / 2.55
}
