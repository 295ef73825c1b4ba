//! Cascade model, compiler and packed layout.
//!
//! A cascade is compiled once per detector. [`CompiledCascade::compile`]
//! validates the generic parsed tree, builds the strongly-typed
//! [`CascadeModel`], and packs it into the flat record tables read by every
//! evaluation phase. Both halves are immutable and safe to share across
//! in-flight frames behind an `Arc`.

mod compiler;
mod model;
mod packed;

pub use compiler::compile_model;
pub use model::{CascadeModel, Classifier, FeatureRect, Stage};
pub use packed::{ClassifierRecord, PackedCascade, RectRecord, StageRecord};

use crate::error::Result;
use log::info;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct CompiledCascade {
    model: CascadeModel,
    packed: PackedCascade,
}

impl CompiledCascade {
    /// Validates `tree` and packs it. Fails without producing a partial
    /// cascade.
    pub fn compile(tree: &Value) -> Result<Self> {
        let model = compile_model(tree)?;
        let packed = PackedCascade::from_model(&model)?;
        info!(
            "CompiledCascade::compile window={}x{} stages={} classifiers={} rects={}",
            model.window_width(),
            model.window_height(),
            packed.stage_count(),
            packed.classifier_count(),
            packed.rect_count()
        );
        Ok(Self { model, packed })
    }

    #[inline]
    pub fn model(&self) -> &CascadeModel {
        &self.model
    }

    #[inline]
    pub fn packed(&self) -> &PackedCascade {
        &self.packed
    }

    #[inline]
    pub fn window_width(&self) -> u32 {
        self.model.window_width()
    }

    #[inline]
    pub fn window_height(&self) -> u32 {
        self.model.window_height()
    }

    #[inline]
    pub fn stage_count(&self) -> usize {
        self.packed.stage_count()
    }
}
