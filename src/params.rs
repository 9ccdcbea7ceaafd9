//! The typed appearance-parameter set and its resolver.

use std::collections::HashMap;

use cgmath::Vector2;

/// The attribute keys recognized by [`resolve`], in the order a host wrapper should observe
/// them.  Each key is independently optional.
pub const OBSERVED_ATTRIBUTES: [&str; 12] = [
    "width",
    "height",
    "radius",
    "shadow-opacity",
    "shadow-blur",
    "highlight-opacity",
    "highlight-blur",
    "glass-opacity",
    "glass-blur",
    "pre-blur",
    "post-blur",
    "chromatic-aberration",
];

/// The complete, defaulted appearance-parameter set for one glass element.
///
/// This is a pure value: [`resolve`] produces one from the wrapper's raw attribute map, and
/// every derived artifact (layer assets, displacement plan, pipeline attributes) is a function
/// of it.  No field is ever `NaN` or negative after resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParameters {
    /// The element extent, in px
    pub width: f32,
    pub height: f32,
    /// Corner rounding shared by every rectangle in every generated asset
    pub corner_radius: f32,

    /// Opacity (0-255) of the dark shadow layer
    pub shadow_opacity: f32,
    /// Blur radius of the shadow layer
    pub shadow_blur: f32,

    /// Opacity (0-255) of the light highlight layer
    pub highlight_opacity: f32,
    /// Blur radius of the highlight layer
    pub highlight_blur: f32,

    /// Opacity (0-255) of the main glass body
    pub glass_opacity: f32,
    /// Blur radius of the glass body
    pub glass_blur: f32,

    /// Blur applied to the backdrop before distortion
    pub pre_blur: f32,
    /// Blur applied after distortion
    pub post_blur: f32,

    /// Amount of RGB channel separation (color fringing)
    pub chromatic_aberration: f32,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            corner_radius: 25.0,

            shadow_opacity: 17.0,
            shadow_blur: 5.0,

            highlight_opacity: 17.0,
            highlight_blur: 15.0,

            glass_opacity: 68.0,
            glass_blur: 15.0,

            pre_blur: 7.0,
            post_blur: 0.0,

            chromatic_aberration: 20.0,
        }
    }
}

impl EffectParameters {
    pub fn size(&self) -> Vector2<f32> {
        Vector2::new(self.width, self.height)
    }

    /// A reduced-parameter preset: a fully-rounded blurred disc with no color fringing and no
    /// lighting layers.  Circular glass is a degenerate case of the one generator, not a
    /// separate pipeline shape.
    pub fn circular(diameter: f32, blur: f32) -> Self {
        let diameter = diameter.max(0.0);
        let blur = blur.max(0.0);
        Self {
            width: diameter,
            height: diameter,
            corner_radius: diameter / 2.0,

            shadow_opacity: 0.0,
            shadow_blur: 0.0,

            highlight_opacity: 0.0,
            highlight_blur: 0.0,

            glass_blur: blur,
            pre_blur: blur,
            post_blur: 0.0,

            chromatic_aberration: 0.0,

            ..Self::default()
        }
    }
}

/// Resolves a raw attribute map into a complete [`EffectParameters`].
///
/// Total: missing, empty, or unparsable values (including non-finite ones) fall back to the
/// field's documented default, and negative values clamp to 0, so any map (including an empty
/// one) yields a usable parameter set.  No error is ever raised; this is the required lenient
/// behavior for live-edited attributes.
pub fn resolve(attrs: &HashMap<String, String>) -> EffectParameters {
    let defaults = EffectParameters::default();
    let field = |key: &str, default: f32| -> f32 {
        match attrs.get(key).and_then(|raw| raw.trim().parse::<f32>().ok()) {
            Some(value) if value.is_finite() => value.max(0.0),
            _ => default,
        }
    };
    EffectParameters {
        width: field("width", defaults.width),
        height: field("height", defaults.height),
        corner_radius: field("radius", defaults.corner_radius),

        shadow_opacity: field("shadow-opacity", defaults.shadow_opacity),
        shadow_blur: field("shadow-blur", defaults.shadow_blur),

        highlight_opacity: field("highlight-opacity", defaults.highlight_opacity),
        highlight_blur: field("highlight-blur", defaults.highlight_blur),

        glass_opacity: field("glass-opacity", defaults.glass_opacity),
        glass_blur: field("glass-blur", defaults.glass_blur),

        pre_blur: field("pre-blur", defaults.pre_blur),
        post_blur: field("post-blur", defaults.post_blur),

        chromatic_aberration: field("chromatic-aberration", defaults.chromatic_aberration),
    }
}
