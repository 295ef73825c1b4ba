//! Flat, index-addressed cascade layout consumed by the evaluation phases.
//!
//! Three record tables are filled in a single linear pass over the model.
//! Offsets are cumulative: stage `k` starts at the sum of the classifier
//! counts of stages `0..k`, and likewise for the rect offset of each
//! classifier.
//!
//! Word layouts (little end first):
//!
//! | record             | word 0                                   | words 1.. (f32 bits)      |
//! |--------------------|------------------------------------------|---------------------------|
//! | `StageRecord`      | `count \| offset << 16`                  | `threshold`               |
//! | `ClassifierRecord` | `rect_offset \| rect_count << 24`        | `threshold, left, right`  |
//! | `RectRecord`       | `x \| y << 8 \| width << 16 \| height << 24` | `weight`              |
//!
//! Records are stored as `u32` words. Backends that only accept float-typed
//! channels go through `to_float_channel` / `from_float_channel`, which
//! reinterpret the bits without conversion.

use super::model::CascadeModel;
use crate::error::{try_alloc, ResourceError};

const STAGE_COUNT_BITS: u32 = 16;
const STAGE_COUNT_MAX: usize = (1 << STAGE_COUNT_BITS) - 1;
const STAGE_OFFSET_MAX: usize = (1 << (32 - STAGE_COUNT_BITS)) - 1;
const RECT_OFFSET_BITS: u32 = 24;
const RECT_OFFSET_MAX: usize = (1 << RECT_OFFSET_BITS) - 1;
const RECT_COUNT_MAX: usize = (1 << (32 - RECT_OFFSET_BITS)) - 1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageRecord {
    pub classifier_count: u16,
    pub classifier_offset: u16,
    pub threshold: f32,
}

impl StageRecord {
    pub fn encode(&self) -> [u32; 2] {
        [
            self.classifier_count as u32 | (self.classifier_offset as u32) << STAGE_COUNT_BITS,
            self.threshold.to_bits(),
        ]
    }

    pub fn decode(words: [u32; 2]) -> Self {
        Self {
            classifier_count: (words[0] & STAGE_COUNT_MAX as u32) as u16,
            classifier_offset: (words[0] >> STAGE_COUNT_BITS) as u16,
            threshold: f32::from_bits(words[1]),
        }
    }

    pub fn to_float_channel(&self) -> [f32; 2] {
        self.encode().map(f32::from_bits)
    }

    pub fn from_float_channel(channel: [f32; 2]) -> Self {
        Self::decode(channel.map(f32::to_bits))
    }

    #[inline]
    pub fn classifiers(&self) -> std::ops::Range<usize> {
        let start = self.classifier_offset as usize;
        start..start + self.classifier_count as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifierRecord {
    /// Fits in 24 bits.
    pub rect_offset: u32,
    pub rect_count: u8,
    pub threshold: f32,
    pub left: f32,
    pub right: f32,
}

impl ClassifierRecord {
    pub fn encode(&self) -> [u32; 4] {
        [
            (self.rect_offset & RECT_OFFSET_MAX as u32) | (self.rect_count as u32) << RECT_OFFSET_BITS,
            self.threshold.to_bits(),
            self.left.to_bits(),
            self.right.to_bits(),
        ]
    }

    pub fn decode(words: [u32; 4]) -> Self {
        Self {
            rect_offset: words[0] & RECT_OFFSET_MAX as u32,
            rect_count: (words[0] >> RECT_OFFSET_BITS) as u8,
            threshold: f32::from_bits(words[1]),
            left: f32::from_bits(words[2]),
            right: f32::from_bits(words[3]),
        }
    }

    pub fn to_float_channel(&self) -> [f32; 4] {
        self.encode().map(f32::from_bits)
    }

    pub fn from_float_channel(channel: [f32; 4]) -> Self {
        Self::decode(channel.map(f32::to_bits))
    }

    #[inline]
    pub fn rects(&self) -> std::ops::Range<usize> {
        let start = self.rect_offset as usize;
        start..start + self.rect_count as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectRecord {
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
    pub weight: f32,
}

impl RectRecord {
    pub fn encode(&self) -> [u32; 2] {
        [
            u32::from_le_bytes([self.x, self.y, self.width, self.height]),
            self.weight.to_bits(),
        ]
    }

    pub fn decode(words: [u32; 2]) -> Self {
        let [x, y, width, height] = words[0].to_le_bytes();
        Self {
            x,
            y,
            width,
            height,
            weight: f32::from_bits(words[1]),
        }
    }

    pub fn to_float_channel(&self) -> [f32; 2] {
        self.encode().map(f32::from_bits)
    }

    pub fn from_float_channel(channel: [f32; 2]) -> Self {
        Self::decode(channel.map(f32::to_bits))
    }
}

/// Packed record tables for one cascade. Never mutated after construction.
#[derive(Clone, Debug)]
pub struct PackedCascade {
    stages: Vec<[u32; 2]>,
    classifiers: Vec<[u32; 4]>,
    rects: Vec<[u32; 2]>,
}

impl PackedCascade {
    pub fn from_model(model: &CascadeModel) -> Result<Self, ResourceError> {
        let mut stages = try_alloc(model.stages().len(), "packed stages")?;
        let mut classifiers = try_alloc(model.classifier_count(), "packed classifiers")?;
        let mut rects = try_alloc(model.rect_count(), "packed rects")?;

        for stage in model.stages() {
            let record = StageRecord {
                classifier_count: narrow(
                    stage.classifiers.len(),
                    STAGE_COUNT_MAX,
                    "stage classifier count",
                )?,
                classifier_offset: narrow(
                    classifiers.len(),
                    STAGE_OFFSET_MAX,
                    "stage classifier offset",
                )?,
                threshold: stage.threshold,
            };
            stages.push(record.encode());

            for classifier in &stage.classifiers {
                let record = ClassifierRecord {
                    rect_offset: narrow(rects.len(), RECT_OFFSET_MAX, "classifier rect offset")?,
                    rect_count: narrow(
                        classifier.rects.len(),
                        RECT_COUNT_MAX,
                        "classifier rect count",
                    )?,
                    threshold: classifier.threshold,
                    left: classifier.left,
                    right: classifier.right,
                };
                classifiers.push(record.encode());

                for rect in &classifier.rects {
                    let record = RectRecord {
                        x: rect.x,
                        y: rect.y,
                        width: rect.width,
                        height: rect.height,
                        weight: rect.weight,
                    };
                    rects.push(record.encode());
                }
            }
        }

        Ok(Self {
            stages,
            classifiers,
            rects,
        })
    }

    #[inline]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    pub fn classifier_count(&self) -> usize {
        self.classifiers.len()
    }

    #[inline]
    pub fn rect_count(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    pub fn stage(&self, idx: usize) -> StageRecord {
        StageRecord::decode(self.stages[idx])
    }

    #[inline]
    pub fn classifier(&self, idx: usize) -> ClassifierRecord {
        ClassifierRecord::decode(self.classifiers[idx])
    }

    #[inline]
    pub fn rect(&self, idx: usize) -> RectRecord {
        RectRecord::decode(self.rects[idx])
    }

    pub fn stage_words(&self) -> &[[u32; 2]] {
        &self.stages
    }

    pub fn classifier_words(&self) -> &[[u32; 4]] {
        &self.classifiers
    }

    pub fn rect_words(&self) -> &[[u32; 2]] {
        &self.rects
    }
}

fn narrow<T: TryFrom<usize>>(
    value: usize,
    max: usize,
    field: &'static str,
) -> Result<T, ResourceError> {
    let overflow = ResourceError::PackedLayoutOverflow { field, value, max };
    if value > max {
        return Err(overflow);
    }
    T::try_from(value).map_err(|_| overflow)
}
