//! Drives the resolve → build → plan → update chain.

use std::collections::HashMap;

use log::debug;

use crate::{
    filter::FilterPipeline,
    layers,
    params::{self, EffectParameters},
    planner,
};

/// Owns one element's [`FilterPipeline`] and keeps it synchronized with the host wrapper's
/// attribute notifications.
///
/// The controller is the only writer of its pipeline; nothing in the chain retains state
/// between invocations beyond the pipeline and the last-applied parameters, so re-running with
/// identical input yields identical output and rapid-fire notifications are safe to coalesce.
#[derive(Debug)]
pub struct EffectController {
    params: EffectParameters,
    pipeline: FilterPipeline,
}

impl EffectController {
    /// Builds a ready pipeline against the defaults, before the host becomes visible.
    pub fn new() -> Self {
        let params = EffectParameters::default();
        let pipeline = FilterPipeline::new(
            params.size(),
            layers::build(&params),
            &planner::plan(&params),
        );
        Self { params, pipeline }
    }

    /// Entry point for the wrapper's mutation callback: re-resolves the full current attribute
    /// map (not just the changed key) and reapplies it.
    pub fn notify(&mut self, attrs: &HashMap<String, String>) {
        self.apply(params::resolve(attrs));
    }

    /// Regenerates the layer assets, recomputes the displacement plan and rebinds the pipeline.
    ///
    /// Idempotent: applying the same parameters twice rebinds bit-identical values.
    pub fn apply(&mut self, params: EffectParameters) {
        debug!("applying {:?}", params);
        let layers = layers::build(&params);
        let plan = planner::plan(&params);
        self.pipeline.update(params.size(), layers, &plan);
        self.params = params;
    }

    pub fn params(&self) -> &EffectParameters {
        &self.params
    }

    pub fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    /// The hidden-SVG wire form for the host to install, regenerated from current pipeline
    /// state.
    pub fn filter_document(&self) -> String {
        self.pipeline.document_markup()
    }
}

impl Default for EffectController {
    fn default() -> Self {
        Self::new()
    }
}
