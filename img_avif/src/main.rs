use clap::{ArgAction, CommandFactory, Parser};
use img_avif::{run_batch, ConfigError, ConvertConfig, EncoderKind, Quality, Speed};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::report_error;
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::info;

const AFTER_HELP: &str = "\
Supported formats:
  .png, .bmp, .jpg, .jpeg, .webp, .gif

Each input is written next to itself as <name>.avif.

Exit status:
  0  every input was converted
  1  any input failed or was skipped (missing, unsupported, output exists)
  2  invalid options

Examples:
  img-avif image.jpg
  img-avif -q 90 photo.png
  img-avif '*.png' '*.jpg'";

#[derive(Parser, Debug)]
#[command(name = "img-avif")]
#[command(
    version,
    about = "Convert images to AVIF",
    long_about = None,
    disable_version_flag = true,
    after_help = AFTER_HELP
)]
struct Cli {
    /// Files or wildcard patterns to convert
    #[arg(value_name = "INPUT")]
    inputs: Vec<OsString>,

    /// AVIF quality (1-100)
    #[arg(short, long, default_value_t = 80, allow_negative_numbers = true)]
    quality: i64,

    /// Overwrite existing AVIF files
    #[arg(short, long)]
    force: bool,

    /// Maximum concurrent conversions (0 = number of CPUs)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Encoder speed (1 = slowest/smallest, 10 = fastest)
    #[arg(short, long, default_value_t = 4, allow_negative_numbers = true)]
    speed: i64,

    /// AVIF encoder backend
    #[arg(long, value_enum, default_value_t = EncoderKind::Ravif)]
    encoder: EncoderKind,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Show debug logs on stderr
    #[arg(long)]
    verbose: bool,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

impl Cli {
    fn to_config(&self) -> Result<ConvertConfig, ConfigError> {
        Ok(ConvertConfig::default()
            .with_quality(Quality::new(self.quality)?)
            .with_speed(Speed::new(self.speed)?)
            .with_force(self.force)
            .with_jobs(self.jobs)
            .with_encoder(self.encoder)
            .with_json(self.json)
            .with_progress(console::Term::stderr().is_term()))
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.to_config()?;
    let registry = config.codec_registry()?;
    info!(?config, "Configuration");

    let report = run_batch(&cli.inputs, &config, &registry)?;
    report.print(config.json)?;
    Ok(ExitCode::from(report.exit_code() as u8))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.inputs.is_empty() {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    let _ = init_logging("img_avif", LogConfig::default().with_verbose(cli.verbose));

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let err: &(dyn std::error::Error + 'static) = e.as_ref();
            report_error(err);
            if e.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
