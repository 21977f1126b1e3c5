//! Quadrant composition through an external composer.

use std::ffi::OsString;
use std::path::PathBuf;

use async_trait::async_trait;

use quadcam_clip_model::{CameraRole, Quadrant};
use quadcam_common::config::{EncoderConfig, MergeConfig};
use quadcam_common::error::{QuadcamError, QuadcamResult};

use crate::process::run_tool;

/// Output canvas in pixels. Each input is scaled to a quarter of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Canvas {
    pub fn from_config(config: &MergeConfig) -> QuadcamResult<Self> {
        if config.canvas_width < 2 || config.canvas_height < 2 {
            return Err(QuadcamError::config(format!(
                "canvas {}x{} is too small for a 2x2 grid",
                config.canvas_width, config.canvas_height
            )));
        }
        Ok(Self {
            width: config.canvas_width,
            height: config.canvas_height,
        })
    }

    /// Size of one quadrant.
    pub fn cell(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }
}

/// One input of the composite and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeInput {
    pub quadrant: Quadrant,
    pub role: CameraRole,
    pub path: PathBuf,
}

/// Everything the composer needs for one merge.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    /// Timestamp key of the group being merged.
    pub timestamp: String,

    /// Inputs in composition order; input `i` is the composer's `i`-th stream.
    pub inputs: Vec<CompositeInput>,

    /// Value of the `creation_time` metadata tag.
    pub creation_time: String,

    pub output: PathBuf,
}

/// External collaborator that renders the quadrant composite.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Render `request.output`. Any failure, including a non-zero exit, is an error.
    async fn compose(&self, request: &ComposeRequest) -> QuadcamResult<()>;

    fn name(&self) -> &str;
}

/// `ffmpeg`-backed composer.
#[derive(Debug, Clone)]
pub struct FfmpegComposer {
    binary: String,
    canvas: Canvas,
    encoder: EncoderConfig,
}

impl FfmpegComposer {
    pub fn new(binary: impl Into<String>, canvas: Canvas, encoder: EncoderConfig) -> Self {
        Self {
            binary: binary.into(),
            canvas,
            encoder,
        }
    }

    /// Full argument list for one merge.
    ///
    /// Paths are passed through as `OsString`s so names that are not valid
    /// UTF-8 reach ffmpeg unchanged.
    pub fn build_args(&self, request: &ComposeRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();
        for input in &request.inputs {
            args.push("-i".into());
            args.push(input.path.clone().into_os_string());
        }
        args.push("-filter_complex".into());
        args.push(build_filter_graph(&request.inputs, self.canvas).into());
        args.push("-metadata".into());
        args.push(format!("creation_time={}", request.creation_time).into());
        args.extend(codec_args(&self.encoder).into_iter().map(OsString::from));
        args.push("-y".into());
        args.push(request.output.clone().into_os_string());
        args
    }
}

#[async_trait]
impl Composer for FfmpegComposer {
    async fn compose(&self, request: &ComposeRequest) -> QuadcamResult<()> {
        let args = self.build_args(request);
        tracing::debug!(timestamp = %request.timestamp, args = ?args, "Running ffmpeg");

        let started = std::time::Instant::now();
        let output = run_tool(&self.binary, &args).await?;
        if !output.success() {
            return Err(QuadcamError::external_tool(
                "ffmpeg",
                output.status,
                output.stderr_tail(),
            ));
        }

        tracing::debug!(
            timestamp = %request.timestamp,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "ffmpeg finished"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Build the composition graph for `inputs` on `canvas`.
///
/// Each input is re-timed to start at zero, scaled to a quarter of the
/// canvas and overlaid onto a blank canvas at its quadrant's offset. The
/// composite ends with the shortest input.
pub fn build_filter_graph(inputs: &[CompositeInput], canvas: Canvas) -> String {
    let (cell_w, cell_h) = canvas.cell();
    let mut parts = vec![format!(
        "nullsrc=size={}x{} [base]",
        canvas.width, canvas.height
    )];

    for (index, _) in inputs.iter().enumerate() {
        parts.push(format!(
            "[{index}:v] setpts=PTS-STARTPTS, scale={cell_w}x{cell_h} [q{index}]"
        ));
    }

    let mut previous = "base".to_string();
    for (index, input) in inputs.iter().enumerate() {
        let (x, y) = input.quadrant.offset(canvas.width, canvas.height);
        let mut step = format!("[{previous}][q{index}] overlay=shortest=1:x={x}:y={y}");
        if index + 1 < inputs.len() {
            previous = format!("tmp{}", index + 1);
            step.push_str(&format!(" [{previous}]"));
        }
        parts.push(step);
    }

    parts.join(";")
}

fn codec_args(encoder: &EncoderConfig) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        encoder.video_codec.clone(),
        "-preset".to_string(),
        encoder.preset.clone(),
        "-crf".to_string(),
        encoder.crf.to_string(),
        "-pix_fmt".to_string(),
        encoder.pixel_format.clone(),
    ]
}
