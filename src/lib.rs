//! Procedural generator for a "liquid glass" backdrop-distortion filter.
//!
//! The crate maps a small set of scalar appearance parameters to the four vector layer assets
//! and the numeric attributes of a fixed-topology SVG filter pipeline, and keeps the pipeline
//! synchronized as parameters change.  Executing the filter against real pixels is the host
//! compositor's job; nothing here rasterizes.
//!
//! The flow is: raw attribute map → [`resolve`] → [`EffectParameters`] →
//! {[`layers::build`], [`planner::plan`]} → [`FilterPipeline::update`].  The
//! [`EffectController`] runs that chain once at creation and once per attribute notification.

pub mod controller;
pub mod filter;
pub mod layers;
pub mod params;
pub mod planner;
pub mod utils;

pub use controller::EffectController;
pub use filter::{FilterPipeline, StageId};
pub use layers::{LayerAsset, LayerKind, LayerSet};
pub use params::{resolve, EffectParameters, OBSERVED_ATTRIBUTES};
pub use planner::{plan, DisplacementPlan};
