//! The fixed-topology filter pipeline.
//!
//! The pipeline is an ordered list of stages forming a DAG: four image stages binding the
//! generated layer assets, a pre-distortion blur, three per-channel displacement/isolation
//! pairs, screen recombination, a post-distortion blur, lighting blends, the silhouette
//! composite and a final offset.  The shape of this list never changes at runtime:
//! [`FilterPipeline::update`] only rebinds numeric attributes and regenerated assets onto it.

use cgmath::Vector2;
use index_vec::IndexVec;
use itertools::Itertools;
use log::debug;

use crate::{
    layers::{LayerKind, LayerSet},
    planner::DisplacementPlan,
};

/// The id under which the host document publishes the filter.
pub const FILTER_ID: &str = "liquidGlassFilter";

/// Translation applied by the final stage, compensating for the asymmetric inset the
/// distortion introduces.  Not parametrized.
const FINAL_OFFSET: f32 = 43.0;

index_vec::define_index_type! {
    /// Unique identifier for a stage of the fixed pipeline
    pub struct StageId = usize;
}
pub type StageVec<T> = IndexVec<StageId, T>;

/// Identifies the image bound to a stage input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// The backdrop content behind the element
    SourceGraphic,
    /// The output of an earlier stage
    Stage(StageId),
}

/// A color channel of the displacement map selecting one displacement axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSelector {
    R,
    G,
    B,
    A,
}

impl ChannelSelector {
    fn as_str(self) -> &'static str {
        match self {
            ChannelSelector::R => "R",
            ChannelSelector::G => "G",
            ChannelSelector::B => "B",
            ChannelSelector::A => "A",
        }
    }
}

/// A color channel preserved by a channel-isolation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    R,
    G,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Screen,
    Multiply,
}

impl BlendMode {
    fn as_str(self) -> &'static str {
        match self {
            BlendMode::Screen => "screen",
            BlendMode::Multiply => "multiply",
        }
    }
}

/// The only composite operator the pipeline uses: intersection with the clip silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOperator {
    In,
}

impl CompositeOperator {
    fn as_str(self) -> &'static str {
        match self {
            CompositeOperator::In => "in",
        }
    }
}

/// A single filter primitive together with its numeric attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// Binds one generated layer asset into the graph
    Image { layer: LayerKind },
    GaussianBlur {
        input: Input,
        std_deviation: f32,
    },
    /// Distorts `input` by the vector field sampled from `map`
    DisplacementMap {
        input: Input,
        map: Input,
        scale: f32,
        x_channel: ChannelSelector,
        y_channel: ChannelSelector,
    },
    /// A 5x4 color matrix.  The pipeline only constructs these through
    /// [`Kind::isolate_channel`].
    ColorMatrix {
        input: Input,
        matrix: [f32; 20],
    },
    Blend {
        input1: Input,
        input2: Input,
        mode: BlendMode,
    },
    Composite {
        input1: Input,
        input2: Input,
        operator: CompositeOperator,
    },
    Offset {
        input: Input,
        dx: f32,
        dy: f32,
    },
}

impl Kind {
    /// The matrix stage which zeroes every color channel of `input` except `channel`,
    /// preserving alpha.
    fn isolate_channel(input: Input, channel: Channel) -> Self {
        let row = match channel {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
        };
        let mut matrix = [0.0; 20];
        matrix[row * 5 + row] = 1.0;
        matrix[18] = 1.0; // alpha passes through
        Self::ColorMatrix { input, matrix }
    }

    /// Every input this stage reads, in declaration order.
    pub fn inputs(&self) -> Vec<Input> {
        match *self {
            Kind::Image { .. } => vec![],
            Kind::GaussianBlur { input, .. }
            | Kind::ColorMatrix { input, .. }
            | Kind::Offset { input, .. } => vec![input],
            Kind::DisplacementMap { input, map, .. } => vec![input, map],
            Kind::Blend { input1, input2, .. } | Kind::Composite { input1, input2, .. } => {
                vec![input1, input2]
            }
        }
    }
}

/// One stage of the pipeline: a primitive and the label its output is published under.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    /// The `result` label other stages and the host reference this stage by
    pub result: &'static str,
    pub kind: Kind,
}

//////////////
// PIPELINE //
//////////////

/// The liquid-glass filter graph.
///
/// Constructed once per element and mutated in place thereafter: [`FilterPipeline::update`]
/// rebinds the regenerated assets and recomputed numeric attributes but never restructures the
/// stage list.  The pipeline holds direct [`StageId`]s to every stage it mutates, so no stage
/// is ever re-resolved by name after construction.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    stages: StageVec<Stage>,
    layers: LayerSet,
    size: Vector2<f32>,

    /* direct indices to the stages `update` mutates */
    pre_blur: StageId,
    disp_r: StageId,
    disp_g: StageId,
    disp_b: StageId,
    post_blur: StageId,
}

impl FilterPipeline {
    /// Assembles the fixed topology, binding `layers` and the numeric attributes from `plan`.
    pub fn new(size: Vector2<f32>, layers: LayerSet, plan: &DisplacementPlan) -> Self {
        let mut stages = StageVec::new();
        let mut stage = |result: &'static str, kind: Kind| stages.push(Stage { result, kind });

        // Layer assets enter the graph through image stages at the head of the list, each
        // published under its kind's result label.
        let shadow = stage(
            LayerKind::Shadow.result_label(),
            Kind::Image { layer: LayerKind::Shadow },
        );
        let highlight = stage(
            LayerKind::Highlight.result_label(),
            Kind::Image { layer: LayerKind::Highlight },
        );
        let clip_mask = stage(
            LayerKind::ClipMask.result_label(),
            Kind::Image { layer: LayerKind::ClipMask },
        );
        let map = stage(
            LayerKind::DisplacementMap.result_label(),
            Kind::Image { layer: LayerKind::DisplacementMap },
        );

        // Soften the backdrop before distorting it.
        let pre_blur = stage(
            "preblurred",
            Kind::GaussianBlur {
                input: Input::SourceGraphic,
                std_deviation: plan.pre_blur_std,
            },
        );

        // Displace each color channel by its own magnitude along the shared vector field
        // (blue channel = x axis, green channel = y axis), then isolate that channel.
        let displace = |scale: f32| Kind::DisplacementMap {
            input: Input::Stage(pre_blur),
            map: Input::Stage(map),
            scale,
            x_channel: ChannelSelector::B,
            y_channel: ChannelSelector::G,
        };
        let disp_r = stage("dispR", displace(plan.scale_r));
        let iso_r = stage("isoR", Kind::isolate_channel(Input::Stage(disp_r), Channel::R));
        let disp_g = stage("dispG", displace(plan.scale_g));
        let iso_g = stage("isoG", Kind::isolate_channel(Input::Stage(disp_g), Channel::G));
        let disp_b = stage("dispB", displace(plan.scale_b));
        let iso_b = stage("isoB", Kind::isolate_channel(Input::Stage(disp_b), Channel::B));

        // Screen the isolated channels back together (order fixed: G over R, then over B).
        let recombined_rg = stage(
            "recombinedRG",
            Kind::Blend {
                input1: Input::Stage(iso_g),
                input2: Input::Stage(iso_r),
                mode: BlendMode::Screen,
            },
        );
        let recombined = stage(
            "recombined",
            Kind::Blend {
                input1: Input::Stage(recombined_rg),
                input2: Input::Stage(iso_b),
                mode: BlendMode::Screen,
            },
        );

        let post_blur = stage(
            "postblurred",
            Kind::GaussianBlur {
                input: Input::Stage(recombined),
                std_deviation: plan.post_blur_std,
            },
        );

        // Light the glass: screen the highlight over it, multiply the shadow onto that.
        let highlighted = stage(
            "highlighted",
            Kind::Blend {
                input1: Input::Stage(post_blur),
                input2: Input::Stage(highlight),
                mode: BlendMode::Screen,
            },
        );
        let lit = stage(
            "lit",
            Kind::Blend {
                input1: Input::Stage(highlighted),
                input2: Input::Stage(shadow),
                mode: BlendMode::Multiply,
            },
        );

        // Restrict the output to the silhouette and apply the fixed translation.
        let clipped = stage(
            "clipped",
            Kind::Composite {
                input1: Input::Stage(lit),
                input2: Input::Stage(clip_mask),
                operator: CompositeOperator::In,
            },
        );
        let _final = stage(
            "final",
            Kind::Offset {
                input: Input::Stage(clipped),
                dx: FINAL_OFFSET,
                dy: FINAL_OFFSET,
            },
        );

        let pipeline = Self {
            stages,
            layers,
            size,
            pre_blur,
            disp_r,
            disp_g,
            disp_b,
            post_blur,
        };
        pipeline.assert_acyclic();
        pipeline
    }

    /// Rebinds the regenerated assets and recomputed numeric attributes onto the fixed
    /// topology.
    ///
    /// Safe to call at arbitrary frequency: the stage list is never restructured, and all
    /// bindings for one cycle are written in a single synchronous pass, so a renderer driven
    /// from the same thread can never observe a partially-updated pipeline.
    pub fn update(&mut self, size: Vector2<f32>, layers: LayerSet, plan: &DisplacementPlan) {
        self.size = size;
        self.layers = layers;
        Self::rebind_blur(&mut self.stages[self.pre_blur], plan.pre_blur_std);
        Self::rebind_blur(&mut self.stages[self.post_blur], plan.post_blur_std);
        Self::rebind_scale(&mut self.stages[self.disp_r], plan.scale_r);
        Self::rebind_scale(&mut self.stages[self.disp_g], plan.scale_g);
        Self::rebind_scale(&mut self.stages[self.disp_b], plan.scale_b);
    }

    fn rebind_blur(stage: &mut Stage, value: f32) {
        match &mut stage.kind {
            Kind::GaussianBlur { std_deviation, .. } => *std_deviation = value,
            _ => unreachable!("'{}' is not a gaussian blur stage", stage.result),
        }
    }

    fn rebind_scale(stage: &mut Stage, value: f32) {
        match &mut stage.kind {
            Kind::DisplacementMap { scale, .. } => *scale = value,
            _ => unreachable!("'{}' is not a displacement stage", stage.result),
        }
    }

    /// Stage inputs may only reference earlier stages.  The topology is fixed and never
    /// user-influenced, so a violation is a programming error, not a runtime condition.
    fn assert_acyclic(&self) {
        for (id, stage) in self.stages.iter_enumerated() {
            for input in stage.kind.inputs() {
                if let Input::Stage(dep) = input {
                    assert!(dep < id, "stage '{}' depends on a later stage", stage.result);
                }
            }
        }
    }

    pub fn stages(&self) -> &StageVec<Stage> {
        &self.stages
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn size(&self) -> Vector2<f32> {
        self.size
    }
}

///////////////////
// SERIALIZATION //
///////////////////

impl FilterPipeline {
    /// The complete `<filter>` element: one primitive per stage, in stage order.
    pub fn filter_markup(&self) -> String {
        debug!("serializing {} pipeline stages", self.stages.len());
        let primitives = self
            .stages
            .iter()
            .map(|stage| self.stage_markup(stage))
            .join("");
        format!("<filter id='{}'>{}</filter>", FILTER_ID, primitives)
    }

    /// The hidden SVG document the wrapper installs next to the styled element.  Its
    /// `width`/`height`/`viewBox` track the resolved geometry.
    pub fn document_markup(&self) -> String {
        format!(
            "<svg width='{w}' height='{h}' viewBox='0 0 {w} {h}' \
             xmlns='http://www.w3.org/2000/svg' xmlns:xlink='http://www.w3.org/1999/xlink'>\
             {filter}</svg>",
            w = self.size.x,
            h = self.size.y,
            filter = self.filter_markup(),
        )
    }

    fn stage_markup(&self, stage: &Stage) -> String {
        let result = stage.result;
        match &stage.kind {
            Kind::Image { layer } => format!(
                "<feImage xlink:href='{}' result='{}' />",
                self.layers.get(*layer).to_data_uri(),
                result,
            ),
            Kind::GaussianBlur {
                input,
                std_deviation,
            } => format!(
                "<feGaussianBlur in='{}' stdDeviation='{}' result='{}' />",
                self.input_label(*input),
                std_deviation,
                result,
            ),
            Kind::DisplacementMap {
                input,
                map,
                scale,
                x_channel,
                y_channel,
            } => format!(
                "<feDisplacementMap in='{}' in2='{}' scale='{}' \
                 xChannelSelector='{}' yChannelSelector='{}' result='{}' />",
                self.input_label(*input),
                self.input_label(*map),
                scale,
                x_channel.as_str(),
                y_channel.as_str(),
                result,
            ),
            Kind::ColorMatrix { input, matrix } => format!(
                "<feColorMatrix in='{}' type='matrix' values='{}' result='{}' />",
                self.input_label(*input),
                matrix.iter().join(" "),
                result,
            ),
            Kind::Blend {
                input1,
                input2,
                mode,
            } => format!(
                "<feBlend in='{}' in2='{}' mode='{}' result='{}' />",
                self.input_label(*input1),
                self.input_label(*input2),
                mode.as_str(),
                result,
            ),
            Kind::Composite {
                input1,
                input2,
                operator,
            } => format!(
                "<feComposite in='{}' in2='{}' operator='{}' result='{}' />",
                self.input_label(*input1),
                self.input_label(*input2),
                operator.as_str(),
                result,
            ),
            Kind::Offset { input, dx, dy } => format!(
                "<feOffset in='{}' dx='{}' dy='{}' result='{}' />",
                self.input_label(*input),
                dx,
                dy,
                result,
            ),
        }
    }

    fn input_label(&self, input: Input) -> &str {
        match input {
            Input::SourceGraphic => "SourceGraphic",
            Input::Stage(id) => self.stages[id].result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use itertools::Itertools;

    use crate::{layers, params::EffectParameters, planner};

    use super::*;

    fn default_pipeline() -> FilterPipeline {
        let params = EffectParameters::default();
        FilterPipeline::new(
            params.size(),
            layers::build(&params),
            &planner::plan(&params),
        )
    }

    #[test]
    fn topology_matches_the_declared_stage_list() {
        let pipeline = default_pipeline();
        let labels = pipeline.stages().iter().map(|s| s.result).collect_vec();
        assert_eq!(
            labels,
            [
                "shadowLayer",
                "highlightLayer",
                "clipMaskLayer",
                "displacementMapLayer",
                "preblurred",
                "dispR",
                "isoR",
                "dispG",
                "isoG",
                "dispB",
                "isoB",
                "recombinedRG",
                "recombined",
                "postblurred",
                "highlighted",
                "lit",
                "clipped",
                "final",
            ]
        );
    }

    #[test]
    fn result_labels_are_unique() {
        let pipeline = default_pipeline();
        let unique: HashSet<_> = pipeline.stages().iter().map(|s| s.result).collect();
        assert_eq!(unique.len(), pipeline.stages().len());
    }

    #[test]
    fn stage_inputs_only_reference_earlier_stages() {
        let pipeline = default_pipeline();
        for (id, stage) in pipeline.stages().iter_enumerated() {
            for input in stage.kind.inputs() {
                if let Input::Stage(dep) = input {
                    assert!(dep < id);
                }
            }
        }
    }

    #[test]
    fn default_pipeline_binds_the_reference_attributes() {
        let pipeline = default_pipeline();
        let scales = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage.kind {
                Kind::DisplacementMap { scale, .. } => Some(scale),
                _ => None,
            })
            .collect_vec();
        assert_eq!(scales, [-148.0, -150.0, -152.0]);

        let blurs = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage.kind {
                Kind::GaussianBlur { std_deviation, .. } => Some(std_deviation),
                _ => None,
            })
            .collect_vec();
        assert_eq!(blurs, [0.7, 0.0]);
    }

    #[test]
    fn isolation_matrices_preserve_alpha_and_one_channel() {
        let pipeline = default_pipeline();
        let matrices = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage.kind {
                Kind::ColorMatrix { matrix, .. } => Some(matrix),
                _ => None,
            })
            .collect_vec();
        assert_eq!(matrices.len(), 3);
        for (channel, matrix) in matrices.iter().enumerate() {
            assert_eq!(matrix.iter().sum::<f32>(), 2.0);
            assert_eq!(matrix[channel * 5 + channel], 1.0);
            assert_eq!(matrix[18], 1.0);
        }
    }

    #[test]
    fn update_rebinds_attributes_without_restructuring() {
        let mut pipeline = default_pipeline();
        let before = pipeline
            .stages()
            .iter()
            .map(|s| s.result)
            .collect_vec();

        let params = EffectParameters {
            chromatic_aberration: 40.0,
            pre_blur: 12.0,
            post_blur: 3.0,
            ..EffectParameters::default()
        };
        pipeline.update(
            params.size(),
            layers::build(&params),
            &planner::plan(&params),
        );

        let after = pipeline.stages().iter().map(|s| s.result).collect_vec();
        assert_eq!(before, after);

        let scales = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage.kind {
                Kind::DisplacementMap { scale, .. } => Some(scale),
                _ => None,
            })
            .collect_vec();
        assert_eq!(scales, [-146.0, -150.0, -154.0]);

        let blurs = pipeline
            .stages()
            .iter()
            .filter_map(|stage| match stage.kind {
                Kind::GaussianBlur { std_deviation, .. } => Some(std_deviation),
                _ => None,
            })
            .collect_vec();
        assert_eq!(blurs, [1.2, 0.3]);
    }

    #[test]
    fn serialized_filter_has_one_primitive_per_stage() {
        let pipeline = default_pipeline();
        let markup = pipeline.filter_markup();
        assert_eq!(markup.matches("result='").count(), pipeline.stages().len());
        assert_eq!(markup.matches("<feImage").count(), 4);
        assert_eq!(markup.matches("<feGaussianBlur").count(), 2);
        assert_eq!(markup.matches("<feDisplacementMap").count(), 3);
        assert_eq!(markup.matches("<feColorMatrix").count(), 3);
        assert_eq!(markup.matches("<feBlend").count(), 4);
        assert_eq!(markup.matches("<feComposite").count(), 1);
        assert_eq!(markup.matches("<feOffset").count(), 1);
    }

    #[test]
    fn serialized_filter_references_only_published_labels() {
        let pipeline = default_pipeline();
        let markup = pipeline.filter_markup();
        let published: HashSet<_> = pipeline.stages().iter().map(|s| s.result).collect();
        for reference in markup
            .split("in='")
            .skip(1)
            .chain(markup.split("in2='").skip(1))
            .map(|rest| rest.split('\'').next().unwrap())
        {
            assert!(
                reference == "SourceGraphic" || published.contains(reference),
                "unpublished input label '{}'",
                reference
            );
        }
    }

    #[test]
    fn serialized_filter_carries_reference_numeric_attributes() {
        let markup = default_pipeline().filter_markup();
        assert!(markup.contains("stdDeviation='0.7'"));
        assert!(markup.contains("scale='-148'"));
        assert!(markup.contains("scale='-150'"));
        assert!(markup.contains("scale='-152'"));
        assert!(markup.contains("xChannelSelector='B' yChannelSelector='G'"));
        assert!(markup.contains("operator='in'"));
        assert!(markup.contains("dx='43' dy='43'"));
        assert!(markup.contains(
            "values='1 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 0 1 0'"
        ));
    }

    #[test]
    fn document_markup_tracks_geometry() {
        let params = EffectParameters {
            width: 320.0,
            height: 240.0,
            ..EffectParameters::default()
        };
        let pipeline = FilterPipeline::new(
            params.size(),
            layers::build(&params),
            &planner::plan(&params),
        );
        let document = pipeline.document_markup();
        assert!(document.starts_with("<svg width='320' height='240' viewBox='0 0 320 240'"));
        assert!(document.contains("<filter id='liquidGlassFilter'>"));
        assert!(document.ends_with("</filter></svg>"));
    }

    #[test]
    fn zero_geometry_still_serializes_every_stage() {
        let params = EffectParameters {
            width: 0.0,
            height: 0.0,
            ..EffectParameters::default()
        };
        let pipeline = FilterPipeline::new(
            params.size(),
            layers::build(&params),
            &planner::plan(&params),
        );
        assert_eq!(
            pipeline.filter_markup().matches("result='").count(),
            pipeline.stages().len()
        );
    }
}
