use anyhow::{Result, anyhow, Context};
use log::{error, warn, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::file_utils::{FileManager, STDIN_PATH};
use crate::synthesis::{PipelineOutput, SpeechService};

// @module: Application controller for text-to-speech jobs

// @const: Folder summary log written next to the inputs
const FOLDER_LOG_FILE: &str = "speechsub.log";

/// Paths of the artifacts written for one input
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub audio: PathBuf,
    pub subtitle: PathBuf,
    pub envelope: Option<PathBuf>,
}

/// What happened to one input
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Artifacts were synthesized and written
    Written(OutputPaths),
    /// Outputs already existed and overwriting was not requested
    Skipped,
}

/// Counts reported after a folder run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub cancelled: bool,
}

/// Main application controller for speech synthesis jobs
pub struct Controller {
    // @field: Synthesis service, owning the configuration
    service: SpeechService,

    // @field: Fired to stop the current job between segments
    cancel: CancellationToken,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let service = SpeechService::new(config)?;
        Ok(Self::with_service(service))
    }

    /// Create a controller around an existing service
    pub fn with_service(service: SpeechService) -> Self {
        Self {
            service,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops every job started by this controller
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.service.config
    }

    /// Run the main workflow for one text input (a file or `-` for stdin)
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<RunOutcome> {
        let start_time = Instant::now();
        let is_stdin = input_file == Path::new(STDIN_PATH);

        if !is_stdin && !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(&output_dir)?;

        let paths = self.output_paths(&input_file, &output_dir);
        if !force_overwrite && FileManager::file_exists(&paths.subtitle) {
            warn!("Skipping {:?}, subtitles already exist (use -f to force overwrite)", input_file);
            return Ok(RunOutcome::Skipped);
        }

        let text = FileManager::read_input(&input_file)?;

        info!(
            "Synthesizing {} with {} ({})",
            if is_stdin { "standard input".to_string() } else { input_file.display().to_string() },
            self.service.engine_name(),
            self.service.config.voice.voice
        );

        let output = self.synthesize_with_progress(&text).await?;
        let written = self.save_outputs(&output, paths)?;

        info!(
            "Success: {} ({} captions) in {}",
            written.subtitle.display(),
            output.metadata.captions,
            Self::format_duration(start_time.elapsed())
        );

        Ok(RunOutcome::Written(written))
    }

    /// Run the workflow in folder mode, processing every text file in a directory.
    /// Inputs that already have subtitles are skipped.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = Instant::now();

        if !input_dir.exists() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let text_files = FileManager::find_files(&input_dir, "txt")?;
        if text_files.is_empty() {
            return Err(anyhow!("No text files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(text_files.len() as u64);
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for text_file in text_files.iter() {
            let file_name = text_file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = match text_file.parent() {
                Some(parent) => parent.to_path_buf(),
                None => input_dir.clone(),
            };

            match self.run(text_file.clone(), output_dir, force_overwrite).await {
                Ok(RunOutcome::Written(_)) => summary.processed += 1,
                Ok(RunOutcome::Skipped) => summary.skipped += 1,
                Err(e) if Self::is_cancellation(&e) => {
                    warn!("Cancelled while processing {}", file_name);
                    summary.cancelled = true;
                    break;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.errors += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();

        let summary_message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors{}",
            summary.processed,
            summary.skipped,
            summary.errors,
            if summary.cancelled { " (cancelled)" } else { "" }
        );
        info!("{}", summary_message);

        let log_file_path = input_dir.join(FOLDER_LOG_FILE);
        let entry = format!("{} ({}) - Duration: {}",
            summary_message,
            input_dir.display(),
            Self::format_duration(start_time.elapsed()));
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &entry) {
            warn!("Failed to write folder log: {}", e);
        }

        Ok(summary)
    }

    /// Run the pipeline with a segment progress bar
    async fn synthesize_with_progress(&self, text: &str) -> Result<PipelineOutput> {
        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(Self::bar_style("segments"));
        progress_bar.set_message("Synthesizing");

        let pb = progress_bar.clone();
        let result = self.service
            .synthesize(text, &self.cancel, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;

        progress_bar.finish_and_clear();

        let output = result?;
        if output.metadata.fallback_segments > 0 {
            warn!(
                "{} of {} segments use estimated word timing",
                output.metadata.fallback_segments, output.metadata.segments
            );
        }
        Ok(output)
    }

    /// Write audio, subtitles and optionally the JSON envelope
    fn save_outputs(&self, output: &PipelineOutput, paths: OutputPaths) -> Result<OutputPaths> {
        FileManager::write_bytes(&paths.audio, &output.audio)?;
        FileManager::write_to_file(&paths.subtitle, &output.subtitle_text)?;

        if let Some(envelope_path) = &paths.envelope {
            let json = serde_json::to_string_pretty(&output.envelope())
                .context("Failed to serialize response envelope")?;
            FileManager::write_to_file(envelope_path, &json)?;
        }

        Ok(paths)
    }

    fn output_paths(&self, input_file: &Path, output_dir: &Path) -> OutputPaths {
        let envelope = self.service.config.output.write_json_envelope
            .then(|| FileManager::generate_output_path(input_file, output_dir, "json"));

        OutputPaths {
            audio: FileManager::generate_output_path(input_file, output_dir, "mp3"),
            subtitle: FileManager::generate_output_path(input_file, output_dir, "srt"),
            envelope,
        }
    }

    fn is_cancellation(error: &anyhow::Error) -> bool {
        matches!(error.downcast_ref::<PipelineError>(), Some(PipelineError::Cancelled { .. }))
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
