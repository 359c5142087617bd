#![warn(unused_extern_crates)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use facedetect::annotate::annotate;
use facedetect::source::{self, STDIN};
use facedetect::{
    CascadeClassifier, DetectionError, DetectorConfig, ErrorEnvelope, FaceDetection, Pipeline,
    Preset,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Images to search, PNG or JPEG. `-` reads standard input
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<String>,

    /// Search density preset
    #[arg(long, value_enum, default_value_t = Preset::Fast)]
    preset: Preset,

    /// Window shift between positions, relative to window size
    #[arg(long)]
    step_ratio: Option<f32>,

    /// Window growth between passes
    #[arg(long)]
    scale_ratio: Option<f32>,

    /// Candidates must score above this
    #[arg(long)]
    score_threshold: Option<f32>,

    /// Smallest face searched for, in pixels
    #[arg(long)]
    min_size: Option<u32>,

    /// IoU above which detections are merged
    #[arg(long)]
    cluster_overlap: Option<f32>,

    /// Refinement passes per pupil
    #[arg(long)]
    pupil_perturbations: Option<u32>,

    /// Refinement passes per mouth corner
    #[arg(long)]
    landmark_perturbations: Option<u32>,

    /// Directory holding the face and landmark models
    #[arg(long, value_name = "DIR", default_value = "./models")]
    models_dir: PathBuf,

    /// Threads used by the landmark model
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Write `<stem>.faces.png` with the detections drawn into this directory
    #[arg(long, value_name = "DIR")]
    annotate: Option<PathBuf>,
}

impl CmdArgs {
    fn detector_config(&self) -> DetectorConfig {
        let mut config = DetectorConfig::from_preset(self.preset);

        if let Some(v) = self.step_ratio {
            config.step_ratio = v;
        }
        if let Some(v) = self.scale_ratio {
            config.scale_ratio = v;
        }
        if let Some(v) = self.score_threshold {
            config.score_threshold = v;
        }
        if let Some(v) = self.min_size {
            config.min_size = v;
        }
        if let Some(v) = self.cluster_overlap {
            config.cluster_overlap = v;
        }
        if let Some(v) = self.pupil_perturbations {
            config.pupil_perturbations = v;
        }
        if let Some(v) = self.landmark_perturbations {
            config.landmark_perturbations = v;
        }

        config
    }

    /// Standard input can only be consumed once.
    fn validate(&self) -> Result<(), clap::Error> {
        if self.inputs.iter().filter(|i| *i == STDIN).count() > 1 {
            return Err(CmdArgs::command().error(
                ErrorKind::ArgumentConflict,
                format!("`{STDIN}` may only be given once"),
            ));
        }
        Ok(())
    }
}

/// What a single input produced: the detection and the bytes it came from,
/// or the error to report.
type Outcome = Result<(FaceDetection, Vec<u8>), DetectionError>;

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CmdArgs::parse();
    if let Err(e) = args.validate() {
        e.exit();
    }

    let classifier = CascadeClassifier::load(&args.models_dir, args.threads)?;
    let pipeline = Pipeline::new(Arc::new(classifier), args.detector_config());
    debug!("Detector config: {:?}", pipeline.config());

    if let Some(dir) = &args.annotate {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating annotation directory {dir:?}"))?;
    }

    let start = Instant::now();
    let outcomes: Vec<Outcome> = thread::scope(|s| {
        let handles: Vec<_> = args
            .inputs
            .iter()
            .map(|input| {
                let pipeline = pipeline.clone();
                s.spawn(move || process_input(&pipeline, input))
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    error!("Detection thread panicked");
                    Err(DetectionError::Internal(anyhow::Error::msg(
                        "detection thread panicked",
                    )))
                })
            })
            .collect()
    });
    info!(
        "Processed {} inputs in {}ms",
        outcomes.len(),
        start.elapsed().as_millis()
    );

    let (lines, all_ok) = report(&outcomes)?;
    for line in &lines {
        println!("{line}");
    }

    if let Some(dir) = &args.annotate {
        for (input, outcome) in args.inputs.iter().zip(&outcomes) {
            if let Ok((detection, bytes)) = outcome {
                if let Err(e) = write_annotated(dir, input, bytes, detection) {
                    warn!("Could not annotate {input}: {e:?}");
                }
            }
        }
    }

    if !all_ok {
        std::process::exit(1);
    }

    Ok(())
}

/// One JSON line per outcome, in order, and whether every outcome counts as
/// a success for the exit code.
fn report(outcomes: &[Outcome]) -> Result<(Vec<String>, bool)> {
    let mut lines = Vec::with_capacity(outcomes.len());
    let mut all_ok = true;

    for outcome in outcomes {
        let line = match outcome {
            Ok((detection, _)) => serde_json::to_string(detection)?,
            Err(e) => {
                all_ok &= e.is_success();
                serde_json::to_string(&ErrorEnvelope::from(e))?
            }
        };
        lines.push(line);
    }

    Ok((lines, all_ok))
}

fn process_input(pipeline: &Pipeline<CascadeClassifier>, input: &str) -> Outcome {
    let bytes = source::read_image(Some(input))?;
    let detection = pipeline.detect(Cursor::new(&bytes))?;
    debug!("{input}: {} faces", detection.len());

    Ok((detection, bytes))
}

fn write_annotated(dir: &Path, input: &str, bytes: &[u8], detection: &FaceDetection) -> Result<()> {
    let mut img = image::load_from_memory(bytes)?.to_rgb8();
    annotate(&mut img, detection);

    let out = dir.join(format!("{}.faces.png", output_stem(input)));
    img.save(&out)
        .with_context(|| format!("saving annotated image {out:?}"))?;
    info!("Wrote {out:?}");

    Ok(())
}

fn output_stem(input: &str) -> String {
    if input == STDIN {
        return "stdin".to_string();
    }

    Path::new(input)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stem() {
        assert_eq!(output_stem("photos/group.jpg"), "group");
        assert_eq!(output_stem("-"), "stdin");
        assert_eq!(output_stem("/"), "image");
    }

    #[test]
    fn test_detector_config_overrides() {
        let args = CmdArgs::parse_from([
            "facedetect",
            "--preset",
            "fine",
            "--min-size",
            "80",
            "--score-threshold",
            "2.5",
            "a.png",
            "b.jpg",
        ]);
        assert_eq!(args.inputs, vec!["a.png", "b.jpg"]);

        let config = args.detector_config();
        assert_eq!(config.step_ratio, Preset::Fine.step_ratio());
        assert_eq!(config.scale_ratio, Preset::Fine.scale_ratio());
        assert_eq!(config.min_size, 80);
        assert_eq!(config.score_threshold, 2.5);
        assert_eq!(
            config.pupil_perturbations,
            DetectorConfig::default().pupil_perturbations
        );
    }

    fn detection(x: i32) -> FaceDetection {
        let json = format!(
            r#"{{"faces":[{{"bounds":{{"x":{x},"y":5,"height":40,"width":40}},
            "mouth":{{"x":12,"y":30,"height":2,"width":16}},
            "left_eye":{{"x":12,"y":15,"scale":3}},
            "right_eye":{{"x":28,"y":15,"scale":3}}}}]}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_report_lines_in_input_order() -> Result<()> {
        let outcomes: Vec<Outcome> = vec![
            Ok((detection(1), Vec::new())),
            Err(DetectionError::NoFacesFound),
            Ok((detection(2), Vec::new())),
        ];

        let (lines, all_ok) = report(&outcomes)?;
        assert!(all_ok);
        assert_eq!(lines.len(), 3);

        let first: FaceDetection = serde_json::from_str(&lines[0])?;
        assert_eq!(first, detection(1));
        assert_eq!(
            lines[1],
            r#"{"error":{"message":"no faces found","code":200}}"#
        );
        let third: FaceDetection = serde_json::from_str(&lines[2])?;
        assert_eq!(third, detection(2));
        Ok(())
    }

    #[test]
    fn test_report_fails_on_errors() -> Result<()> {
        let outcomes: Vec<Outcome> = vec![
            Err(DetectionError::CantReadImage),
            Ok((detection(1), Vec::new())),
            Err(DetectionError::NoFacesFound),
        ];

        let (lines, all_ok) = report(&outcomes)?;
        assert!(!all_ok);
        assert_eq!(
            lines[0],
            r#"{"error":{"message":"can't read image","code":400}}"#
        );
        assert_eq!(
            lines[2],
            r#"{"error":{"message":"no faces found","code":200}}"#
        );
        Ok(())
    }

    #[test]
    fn test_report_internal_error_fails() -> Result<()> {
        let outcomes: Vec<Outcome> = vec![Err(DetectionError::Internal(anyhow::Error::msg(
            "model exploded",
        )))];

        let (lines, all_ok) = report(&outcomes)?;
        assert!(!all_ok);
        assert_eq!(lines, vec![r#"{"error":{"message":"internal error","code":500}}"#]);
        Ok(())
    }

    #[test]
    fn test_stdin_only_once() {
        let once = CmdArgs::parse_from(["facedetect", "-", "a.png"]);
        assert!(once.validate().is_ok());

        let twice = CmdArgs::parse_from(["facedetect", "-", "a.png", "-"]);
        let err = twice.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_requires_input() {
        assert!(CmdArgs::try_parse_from(["facedetect"]).is_err());
    }
}
