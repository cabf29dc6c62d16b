use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use dxfkml_config::{AppConfig, ConfigError};
use dxfkml_frontend::{ConvertOptions, EpsgOptions, FrontendError, PreviewOptions};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "dxfkml",
    version,
    about = "Convert DXF drawings to KML with EPSG reprojection"
)]
struct Cli {
    /// 配置文件路径，缺省时读取 DXFKML_CONFIG 或 ./config/default.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a DXF file (or `-` for stdin) to KML
    Convert(ConvertArgs),
    /// Render an existing KML file as an HTML map
    Preview(PreviewArgs),
    /// List known EPSG codes
    Epsg(EpsgArgs),
}

#[derive(Debug, Args)]
struct ConvertArgs {
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// EPSG code or catalog label of the drawing's coordinate system
    #[arg(long, value_name = "CODE")]
    epsg: Option<String>,
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Write an HTML preview map next to the KML
    #[arg(long)]
    preview: bool,
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct PreviewArgs {
    #[arg(value_name = "KML")]
    kml: PathBuf,
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct EpsgArgs {
    #[arg(long, value_name = "TEXT")]
    filter: Option<String>,
    #[arg(long, value_name = "PATH")]
    table: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_configuration(cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);
    info!("启动 dxfkml");

    match dispatch(&config, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "命令执行失败");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(config: &AppConfig, command: Command) -> Result<(), FrontendError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Convert(args) => {
            let options = ConvertOptions {
                input: args.input,
                epsg: args.epsg,
                output: args.output,
                preview: args.preview,
                map: args.map,
                json: args.json,
            };
            dxfkml_frontend::run_convert(config, &options, &mut out).map(|_| ())
        }
        Command::Preview(args) => {
            let options = PreviewOptions {
                kml: args.kml,
                map: args.map,
            };
            dxfkml_frontend::run_preview(config, &options, &mut out).map(|_| ())
        }
        Command::Epsg(args) => {
            let options = EpsgOptions {
                filter: args.filter,
                table: args.table,
            };
            dxfkml_frontend::run_epsg(config, &options, &mut out).map(|_| ())
        }
    }
}

/// 显式指定的配置必须可用；自动发现失败时退回默认值。
fn load_configuration(override_path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    match override_path {
        Some(path) => AppConfig::from_file(&path),
        None => match AppConfig::discover() {
            Ok(cfg) => Ok(cfg),
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } | ConfigError::Catalog(_) => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                Ok(AppConfig::default())
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
