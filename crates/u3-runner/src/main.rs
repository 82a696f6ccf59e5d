// u3ctl -- command-line control of a LabJack U3.
//
// Usage:
//   u3ctl flash
//   u3ctl --config u3.yaml get-config
//   u3ctl configure --field fioAD0=2 --field fioIO5=2
//   u3ctl --json measure
//   u3ctl set-digital --field eioDO1=2
//   u3ctl exec port-dir-read
//   u3ctl --transport tcp --address 192.168.1.40:5000 exec ain 0x44
//   u3ctl --metrics-output json measure

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use u3_metrics::InMemoryRecorder;
use u3_protocol::CommandId;
use u3_runner::{parse_fields, render_text, App, AppConfig, AppResult, TransportKind};

/// Command-line control of a LabJack U3.
#[derive(Parser)]
#[command(name = "u3ctl", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured transport.
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// Override the configured bridge address (host:port).
    #[arg(long)]
    address: Option<String>,

    /// Print the device state as JSON.
    #[arg(long)]
    json: bool,

    /// Print transaction metrics after the command finishes.
    #[arg(long, value_enum)]
    metrics_output: Option<MetricsOutput>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MetricsOutput {
    /// One line per counter and histogram.
    Text,
    /// The full snapshot as JSON.
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Read identity and configuration from flash.
    Flash,

    /// Read the volatile analog/digital and direction configuration.
    GetConfig,

    /// Write analog/digital and direction settings.
    Configure {
        /// Form field, e.g. fioAD0=2 (analog) or eioIO3=2 (output).
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Read digital levels and every analog line.
    Measure,

    /// Write digital output levels.
    SetDigital {
        /// Form field, e.g. cioDO1=2 (high).
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },

    /// Run one raw command.
    Exec {
        /// Command name (config-u3, config-io, port-dir-read, port-dir-write,
        /// port-state-read, port-state-write, ain).
        command: CommandId,

        /// Builder parameter, decimal or 0x-prefixed hex.
        #[arg(default_value = "0", value_parser = parse_byte)]
        param: u8,
    },
}

/// Parse "12" or "0x0C" into a u8.
fn parse_byte(s: &str) -> Result<u8, String> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).map_err(|e| format!("invalid hex byte: {e}")),
        None => s.parse().map_err(|e| format!("invalid byte: {e}")),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> AppResult<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(kind) = cli.transport {
        config.transport.kind = kind;
    }
    if let Some(address) = cli.address {
        config.transport.address = address;
    }
    config.validate()?;

    let recorder = cli.metrics_output.map(|_| Arc::new(InMemoryRecorder::new()));
    if let Some(recorder) = &recorder {
        if let Err(e) = u3_metrics::metrics::set_global_recorder(Arc::clone(recorder)) {
            warn!("Failed to install metrics recorder: {}", e);
        }
    }
    u3_metrics::describe_metrics();
    let app = App::from_config(&config);

    let result = match cli.command {
        Command::Flash => app.flash(),
        Command::GetConfig => app.get_config(),
        Command::Configure { fields } => {
            let form = parse_fields(&fields)?;
            // Lines without a field keep what the device reports.
            app.get_config().and_then(|()| app.configure(&form))
        }
        Command::Measure => app.get_config().and_then(|()| app.measure()),
        Command::SetDigital { fields } => {
            let form = parse_fields(&fields)?;
            app.update_digital(&form)
        }
        Command::Exec { command, param } => app.exec(command, param),
    };

    let state = app.state();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", render_text(&state));
    }

    if let (Some(format), Some(recorder)) = (cli.metrics_output, &recorder) {
        let snapshot = recorder.snapshot();
        match format {
            MetricsOutput::Text => print!("{}", snapshot.to_text()),
            MetricsOutput::Json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        }
    }
    Ok(result?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
