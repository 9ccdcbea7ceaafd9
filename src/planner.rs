//! Converts scalar appearance parameters into the numeric attributes of the distortion stages.

use crate::params::EffectParameters;

/// The displacement baseline shared by all three color channels.  The green channel always sits
/// exactly here; red and blue diverge symmetrically as chromatic aberration increases.
pub const BASE_SCALE: f32 = -150.0;

/// Per-channel displacement scales and blur magnitudes for one update cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementPlan {
    pub scale_r: f32,
    pub scale_g: f32,
    pub scale_b: f32,
    pub pre_blur_std: f32,
    pub post_blur_std: f32,
}

/// Computes the [`DisplacementPlan`] for a parameter set.
///
/// Chromatic aberration is simulated by displacing each color channel a different distance
/// along the same vector field: red and blue diverge symmetrically around [`BASE_SCALE`] while
/// green stays put, so fringing grows linearly with the parameter and vanishes at 0.
pub fn plan(params: &EffectParameters) -> DisplacementPlan {
    let fringe = params.chromatic_aberration / 10.0;
    DisplacementPlan {
        scale_r: BASE_SCALE + fringe,
        scale_g: BASE_SCALE,
        scale_b: BASE_SCALE - fringe,
        pre_blur_std: params.pre_blur / 10.0,
        post_blur_std: params.post_blur / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_produce_reference_values() {
        let plan = plan(&EffectParameters::default());
        assert_eq!(plan.scale_r, -148.0);
        assert_eq!(plan.scale_g, -150.0);
        assert_eq!(plan.scale_b, -152.0);
        assert_eq!(plan.pre_blur_std, 0.7);
        assert_eq!(plan.post_blur_std, 0.0);
    }

    #[test]
    fn green_channel_never_moves() {
        for aberration in [0.0, 1.0, 20.0, 40.0, 1000.0] {
            let params = EffectParameters {
                chromatic_aberration: aberration,
                ..EffectParameters::default()
            };
            assert_eq!(plan(&params).scale_g, BASE_SCALE);
        }
    }

    #[test]
    fn red_and_blue_diverge_symmetrically() {
        for aberration in [0.0, 5.0, 17.5, 40.0] {
            let params = EffectParameters {
                chromatic_aberration: aberration,
                ..EffectParameters::default()
            };
            let plan = plan(&params);
            assert_eq!(plan.scale_r - plan.scale_g, -(plan.scale_b - plan.scale_g));
        }
    }

    #[test]
    fn fringing_grows_strictly_with_aberration() {
        let mut last_separation = -1.0;
        for aberration in [0.0, 10.0, 20.0, 30.0, 40.0] {
            let params = EffectParameters {
                chromatic_aberration: aberration,
                ..EffectParameters::default()
            };
            let plan = plan(&params);
            let separation = (plan.scale_r - plan.scale_b).abs();
            assert!(separation > last_separation);
            last_separation = separation;
        }
    }

    #[test]
    fn zero_aberration_collapses_all_channels() {
        let params = EffectParameters {
            chromatic_aberration: 0.0,
            ..EffectParameters::default()
        };
        let plan = plan(&params);
        assert_eq!(plan.scale_r, BASE_SCALE);
        assert_eq!(plan.scale_g, BASE_SCALE);
        assert_eq!(plan.scale_b, BASE_SCALE);
    }
}
