use cascade_detector::config::detect;
use cascade_detector::diagnostics::FrameReport;
use cascade_detector::image::io::{load_grayscale_image, load_json_file, write_json_file};
use cascade_detector::image::IntegralImages;
use cascade_detector::{CascadeDetector, CompiledCascade, ComputeContext, FrameDriver};
use std::env;
use std::path::Path;
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = detect::load_config(Path::new(&config_path))?;

    let tree = load_json_file(&config.cascade_path)?;
    let cascade = CompiledCascade::compile(&tree).map_err(|e| e.to_string())?;
    let context = ComputeContext::new(config.context.clone()).map_err(|e| e.to_string())?;

    let gray = load_grayscale_image(&config.input_path)?;
    let scanned = gray.downscale(config.detector.initial_scale)?;
    let integral = IntegralImages::from_gray(&scanned.as_view()).map_err(|e| e.to_string())?;

    let detector = CascadeDetector::new(
        Arc::new(context),
        Arc::new(cascade),
        config.detector.clone(),
        gray.width(),
        gray.height(),
    )
    .map_err(|e| e.to_string())?;
    let driver =
        FrameDriver::new(Arc::new(detector), config.frame_slots).map_err(|e| e.to_string())?;
    let report = driver.process(&integral).map_err(|e| e.to_string())?;

    print_summary(&report);
    if let Some(path) = &config.output.json_out {
        write_json_file(path, &report)?;
        println!("\nJSON report written to {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: haar_detect <config.json>".to_string()
}

fn print_summary(report: &FrameReport) {
    let trace = &report.trace;
    println!("Detection summary");
    println!(
        "  scanned: {}x{}  scales: {}  stages: {} (dense {}, sparse {}, cascade-parallel {})",
        trace.input.width,
        trace.input.height,
        trace.input.scales,
        trace.input.stages,
        trace.input.dense_stages,
        trace.input.sparse_stages,
        trace.input.cascade_parallel_stages
    );
    for scale in &trace.scales {
        println!(
            "  scale {:>7.3}  window {:>4}  anchors {:>8}  dense {:>7}  sparse {:>6}  accepted {:>5}",
            scale.descriptor.scale,
            scale.descriptor.scaled_window_width,
            scale.anchors,
            scale.dense_survivors,
            scale.sparse_survivors,
            scale.accepted
        );
    }
    println!(
        "  survivors: {} (dropped {})  clusters: {}  detections: {}",
        trace.survivors, trace.dropped_survivors, trace.grouping.clusters, trace.grouping.detections
    );
    for det in &report.detections {
        println!(
            "    [{:.1}, {:.1}, {:.1}, {:.1}] neighbors={}",
            det.x, det.y, det.width, det.height, det.neighbors
        );
    }
    for stage in &trace.timings.stages {
        println!("  {}: {:.3} ms", stage.label, stage.elapsed_ms);
    }
    println!("  total: {:.3} ms", trace.timings.total_ms);
}
