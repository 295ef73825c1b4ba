use crate::context::ContextOptions;
use crate::detector::DetectorParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Where to write the JSON frame report; printed summary only when unset.
    pub json_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DetectConfig {
    /// OpenCV JSON cascade description.
    pub cascade_path: PathBuf,
    pub input_path: PathBuf,
    /// Workspaces in the frame driver's pool.
    #[serde(default = "default_frame_slots")]
    pub frame_slots: usize,
    #[serde(default)]
    pub detector: DetectorParams,
    #[serde(default)]
    pub context: ContextOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_frame_slots() -> usize {
    3
}

pub fn load_config(path: &Path) -> Result<DetectConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: DetectConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}
