//! Dense phase: one work item per grid anchor.

use super::super::evaluate::WindowEvaluator;
use super::super::scales::ScaleLevel;
use super::super::survivors::AppendBuffer;
use rayon::prelude::*;
use std::ops::Range;

/// Evaluates `stages` at every anchor of `level` and appends the anchor
/// indices that pass to `out`.
pub(super) fn run(
    eval: &WindowEvaluator<'_>,
    level: &ScaleLevel,
    stages: Range<usize>,
    out: &AppendBuffer<u32>,
    group_width: usize,
) {
    (0..level.anchor_count())
        .into_par_iter()
        .with_min_len(group_width.max(1))
        .for_each(|anchor| {
            let (x, y) = level.anchor_origin(anchor);
            if !eval.fits(x, y) {
                return;
            }
            let window = eval.window(x, y);
            if eval.passes(&window, stages.clone()) {
                out.push(anchor as u32);
            }
        });
}
