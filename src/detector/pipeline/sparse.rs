//! Sparse phase: one work item per dense-phase survivor.

use super::super::evaluate::WindowEvaluator;
use super::super::scales::ScaleLevel;
use super::super::survivors::{AppendBuffer, Dispatch};
use rayon::prelude::*;
use std::ops::Range;

pub(super) fn run(
    eval: &WindowEvaluator<'_>,
    level: &ScaleLevel,
    stages: Range<usize>,
    dispatch: Dispatch,
    input: &AppendBuffer<u32>,
    out: &AppendBuffer<u32>,
) {
    (0..dispatch.work_items).into_par_iter().for_each(|item| {
        let anchor = input.get(item);
        let (x, y) = level.anchor_origin(anchor as usize);
        let window = eval.window(x, y);
        if eval.passes(&window, stages.clone()) {
            out.push(anchor);
        }
    });
}
