use serde_json::{json, Value};

/// Classifier for an 8x8 window responding to a bright 4x4 block centred at
/// (2, 2): inner block weighted +1, whole window -0.25.
fn block_classifier() -> Value {
    json!({"_": {
        "threshold": 0.4,
        "left_val": 0.0,
        "right_val": 1.0,
        "feature": {"rects": {"_": ["2 2 4 4 1.", "0 0 8 8 -0.25"]}}
    }})
}

/// Stages holding `counts[i]` copies of the block classifier. A window
/// passes stage `i` only when every copy fires.
pub fn block_cascade(counts: &[usize]) -> Value {
    let stages: Vec<Value> = counts
        .iter()
        .map(|&n| {
            json!({
                "stage_threshold": n as f64 - 0.5,
                "trees": {"_": vec![block_classifier(); n]}
            })
        })
        .collect();
    json!({"opencv_storage": {"block": {
        "size": "8 8",
        "stages": {"_": stages}
    }}})
}
