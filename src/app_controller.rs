use anyhow::{anyhow, Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::pipeline::{PipelineOutput, TimelinePipeline};
use crate::script::ScriptDocument;
use crate::synthesis::{create_synthesizer, Synthesizer};

// @module: Application controller for timeline runs

// @const: Log appended to in folder mode
const FOLDER_LOG_NAME: &str = "voxline.runs.log";

/// Files written for one script
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub timeline: PathBuf,
    pub subtitles: PathBuf,
    pub sync_log: PathBuf,
    pub audio_dir: PathBuf,
}

impl OutputPaths {
    /// Output locations for `input_file`, e.g. `news.json` gives `news.timeline.json`,
    /// `news.srt`, `news.sync.log` and the `news_audio/` directory
    pub fn for_script(input_file: &Path, output_dir: &Path) -> Self {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "script".to_string());

        Self {
            timeline: FileManager::generate_output_path(input_file, output_dir, "timeline.json"),
            subtitles: FileManager::generate_output_path(input_file, output_dir, "srt"),
            sync_log: FileManager::generate_output_path(input_file, output_dir, "sync.log"),
            audio_dir: output_dir.join(format!("{}_audio", stem)),
        }
    }

    /// True when the timeline, subtitles and sync log are all on disk
    pub fn all_exist(&self) -> bool {
        [&self.timeline, &self.subtitles, &self.sync_log]
            .iter()
            .all(|path| FileManager::file_exists(path))
    }
}

/// Summary of one completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub outputs: OutputPaths,
    pub total_seconds: f64,
    pub chunk_count: usize,
    pub estimated_count: usize,
}

/// What happened to one script
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// Outputs already existed and overwriting was not requested
    Skipped,
}

/// Counts from a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Synthesizer used instead of the configured one
    synthesizer: Option<Arc<dyn Synthesizer>>,
    // @field: Config file the settings came from, never treated as a script
    config_path: Option<PathBuf>,
}

impl Controller {
    /// Create a new controller for test purposes: default configuration, dry-run synthesis
    pub fn new_for_test() -> Result<Self> {
        let mut config = Config::default();
        config.synthesis.provider = crate::app_config::SynthesisProvider::DryRun;
        Self::with_config(config)
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            synthesizer: None,
            config_path: None,
        })
    }

    /// Remember where the configuration was loaded from so folder runs skip it
    pub fn with_config_path<P: Into<PathBuf>>(mut self, config_path: P) -> Self {
        self.config_path = Some(config_path.into());
        self
    }

    /// Use `synthesizer` for every run instead of building one from the configuration
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the timeline for one script and write its outputs into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<RunOutcome> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<RunOutcome> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(output_dir)?;

        let outputs = OutputPaths::for_script(input_file, output_dir);
        if outputs.all_exist() && !force_overwrite {
            warn!(
                "Skipping {}, outputs already exist (use -f to force overwrite)",
                input_file.display()
            );
            return Ok(RunOutcome::Skipped);
        }

        let run_id = Uuid::new_v4().to_string();
        let script = ScriptDocument::load(input_file, &self.config.script)?;
        FileManager::clear_dir(&outputs.audio_dir)?;
        let synthesizer = match &self.synthesizer {
            Some(synthesizer) => Arc::clone(synthesizer),
            None => create_synthesizer(&self.config.synthesis, &outputs.audio_dir)?,
        };

        synthesizer.test_connection().await.with_context(|| {
            format!(
                "{} is not reachable at {}",
                synthesizer.name(),
                self.config.synthesis.endpoint
            )
        })?;

        info!(
            "{}: {} parts, synthesizer: {}",
            script.title.as_deref().unwrap_or("untitled"),
            script.parts.len(),
            synthesizer.name()
        );

        let pipeline = TimelinePipeline::new(&self.config, Arc::clone(&synthesizer));

        // Length is set from the chunk total reported by the pipeline
        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Synthesizing");

        let pb = progress_bar.clone();
        let result = pipeline
            .run(&script, move |completed, total| {
                pb.set_length(total as u64);
                pb.set_position(completed as u64);
            })
            .await;
        progress_bar.finish_and_clear();

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                error!("Run {} for {} abandoned: {}", run_id, input_file.display(), e);
                return Err(e.into());
            }
        };

        self.write_outputs(&output, &outputs, input_file, &run_id, synthesizer.name())?;

        let diagnostics = output.timeline.diagnostics();
        info!(
            "Timeline: {} chunks, {} ({} estimated) in {}",
            output.timeline.len(),
            Self::format_duration(std::time::Duration::from_millis(output.timeline.total_ms())),
            diagnostics.estimated_count,
            Self::format_duration(start_time.elapsed())
        );
        info!("Success: {}", outputs.timeline.display());

        Ok(RunOutcome::Completed(RunSummary {
            run_id,
            total_seconds: output.timeline.total_seconds(),
            chunk_count: output.timeline.len(),
            estimated_count: diagnostics.estimated_count,
            outputs,
        }))
    }

    /// Write the timeline JSON, the subtitles and the sync log
    fn write_outputs(
        &self,
        output: &PipelineOutput,
        outputs: &OutputPaths,
        input_file: &Path,
        run_id: &str,
        synthesizer_name: &str,
    ) -> Result<()> {
        let json = output
            .timeline
            .to_json(Some(&output.chunked))
            .context("Failed to serialize timeline")?;
        FileManager::write_to_file(&outputs.timeline, &json)?;

        let srt = output.timeline.to_srt(&output.chunked)?;
        FileManager::write_to_file(&outputs.subtitles, &srt)?;

        let context = format!("{} - {} ({})", input_file.display(), synthesizer_name, run_id);
        self.write_sync_log(&output.timeline.diagnostics_report(), &outputs.sync_log, &context)
    }

    /// Write the sync diagnostics report to a log file
    fn write_sync_log(&self, report: &str, file_path: &Path, run_context: &str) -> Result<()> {
        let mut log_content = String::new();

        log_content.push_str(&format!("Sync Log - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        log_content.push_str(&format!("Context: {}\n\n", run_context));
        log_content.push_str(report);

        FileManager::write_to_file(file_path, &log_content)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
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

    /// Run every script JSON in a directory (recursive). Outputs go next to each script.
    /// Scripts whose timeline already exists are skipped.
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let config_path = self.config_path.as_ref().and_then(|p| p.canonicalize().ok());
        let scripts: Vec<PathBuf> = FileManager::find_files(&input_dir, "json")?
            .into_iter()
            .filter(|path| !path.to_string_lossy().ends_with(".timeline.json"))
            .filter(|path| config_path.is_none() || path.canonicalize().ok() != config_path)
            .collect();
        if scripts.is_empty() {
            return Err(anyhow!("No script files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(scripts.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing scripts");

        let mut summary = FolderSummary::default();

        for script in &scripts {
            let file_name = script
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = script
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| input_dir.clone());

            match self
                .run_with_progress(script, &output_dir, &multi_progress, force_overwrite)
                .await
            {
                Ok(RunOutcome::Completed(_)) => summary.processed += 1,
                Ok(RunOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let summary_message = format!(
            "Folder processing completed: {} processed, {} skipped, {} errors",
            summary.processed, summary.skipped, summary.failed
        );
        info!("{}", summary_message);

        let log_file_path = input_dir.join(FOLDER_LOG_NAME);
        let entry = format!(
            "{} - {} - Duration: {}",
            input_dir.display(),
            summary_message,
            Self::format_duration(start_time.elapsed())
        );
        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &entry) {
            warn!("Failed to write folder log: {}", e);
        }

        Ok(summary)
    }
}
