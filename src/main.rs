// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use speechsub::app_config::{self, Config, EngineProvider};
use speechsub::app_controller::{Controller, RunOutcome};
use speechsub::file_utils::STDIN_PATH;

/// CLI Wrapper for EngineProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEngineProvider {
    Http,
    Mock,
}

impl From<CliEngineProvider> for EngineProvider {
    fn from(cli_provider: CliEngineProvider) -> Self {
        match cli_provider {
            CliEngineProvider::Http => EngineProvider::Http,
            CliEngineProvider::Mock => EngineProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize narrated audio and subtitles from text (default command)
    #[command(alias = "synth")]
    Synthesize(SynthesizeArgs),

    /// Generate shell completions for speechsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SynthesizeArgs {
    /// Input text file, directory of .txt files, or '-' for standard input
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: SynthesizeOptions,
}

#[derive(clap::Args, Debug, Clone)]
struct SynthesizeOptions {
    /// Directory for the generated files (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Speech engine to use
    #[arg(short, long, value_enum)]
    provider: Option<CliEngineProvider>,

    /// Engine voice identifier (e.g., 'pt-BR-FranciscaNeural')
    #[arg(long)]
    voice: Option<String>,

    /// Speaking rate adjustment (e.g., '+10%')
    #[arg(long, allow_hyphen_values = true)]
    rate: Option<String>,

    /// Pitch adjustment (e.g., '-5Hz')
    #[arg(long, allow_hyphen_values = true)]
    pitch: Option<String>,

    /// Also write the base64 JSON response envelope
    #[arg(long)]
    json: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// speechsub - Speech synthesis with word-timed subtitles
///
/// Turns text into narrated audio and SRT captions whose timing follows
/// the words the speech engine actually spoke.
#[derive(Parser, Debug)]
#[command(name = "speechsub")]
#[command(version)]
#[command(about = "Text-to-speech with word-timed SRT captions")]
#[command(long_about = "speechsub sends text to a streaming speech engine and writes the audio together with SRT captions timed from the engine's word boundaries.

EXAMPLES:
    speechsub story.txt                          # Synthesize using default config
    speechsub -f story.txt                       # Force overwrite existing files
    speechsub --voice en-US-AriaNeural story.txt # Use a specific voice
    speechsub --rate +15% --pitch -2Hz story.txt # Adjust speaking rate and pitch
    echo 'Hello world.' | speechsub - -o out/    # Read text from standard input
    speechsub --json story.txt                   # Also write the JSON envelope
    speechsub -p mock --log-level debug texts/   # Process a directory offline
    speechsub completions bash > speechsub.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUTS:
    <name>.mp3   - Concatenated audio of every segment
    <name>.srt   - Captions grouped from word timing
    <name>.json  - Base64 envelope of both (with --json)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input text file, directory of .txt files, or '-' for standard input
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: SynthesizeOptions,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Short tag for log level
    fn tag_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "ERR",
            Level::Warn => "WRN",
            Level::Info => "",
            Level::Debug => "DBG",
            Level::Trace => "TRC",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:>3} {}\x1B[0m",
                Self::color_for_level(level),
                now,
                Self::tag_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set after the
    // config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "speechsub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Synthesize(args)) => run_synthesize(args).await,
        None => {
            // Default behavior - top-level args act as the synthesize command
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            run_synthesize(SynthesizeArgs {
                input_path,
                options: cli.options,
            }).await
        }
    }
}

async fn run_synthesize(args: SynthesizeArgs) -> Result<()> {
    let options = &args.options;

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, options);

    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    // Ctrl+C stops the job between segments instead of killing the process
    let cancel = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });

    let input_path = args.input_path;
    if input_path == Path::new(STDIN_PATH) {
        let output_dir = options.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        report(controller.run(input_path, output_dir, options.force_overwrite).await?);
    } else if input_path.is_file() {
        let output_dir = options.output_dir.clone().unwrap_or_else(|| {
            input_path.parent().unwrap_or(Path::new(".")).to_path_buf()
        });
        report(controller.run(input_path, output_dir, options.force_overwrite).await?);
    } else if input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored for directories; outputs are written next to each input");
        }
        let summary = controller.run_folder(input_path, options.force_overwrite).await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} file(s) failed", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

// Override config with CLI options if provided
fn apply_overrides(config: &mut Config, options: &SynthesizeOptions) {
    if let Some(provider) = &options.provider {
        config.engine.provider = provider.clone().into();
    }

    if let Some(voice) = &options.voice {
        config.voice.voice = voice.clone();
    }

    if let Some(rate) = &options.rate {
        config.voice.rate = rate.clone();
    }

    if let Some(pitch) = &options.pitch {
        config.voice.pitch = pitch.clone();
    }

    if options.json {
        config.output.write_json_envelope = true;
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

fn report(outcome: RunOutcome) {
    if let RunOutcome::Written(paths) = outcome {
        info!("Audio: {}", paths.audio.display());
        if let Some(envelope) = paths.envelope {
            info!("Envelope: {}", envelope.display());
        }
    }
}
