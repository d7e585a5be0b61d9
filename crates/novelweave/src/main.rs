//! Novelweave CLI binary.
//!
//! This binary provides command-line access to Novelweave's functionality:
//! - Convert novel text into a galgame script
//! - Preview how a text will be segmented
//! - Check and repair saved scripts

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    use cli::{run_convert, run_segment, run_validate, Cli, Commands, ConvertOptions};

    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "info,novelweave=debug,novelweave_pipeline=debug"
    } else {
        "warn,novelweave=info,novelweave_pipeline=info"
    };

    if cli.telemetry {
        if let Err(e) = novelweave::init_telemetry("novelweave", default_filter) {
            eprintln!("Failed to initialize telemetry: {}", e);
            return ExitCode::FAILURE;
        }
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let config = match novelweave::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            stream,
            no_stream,
            assets,
            tier,
        } => {
            let mode = match (stream, no_stream) {
                (true, _) => novelweave::ConversionMode::Streaming,
                (_, true) => novelweave::ConversionMode::SingleShot,
                _ => novelweave::ConversionMode::Auto,
            };
            let options = ConvertOptions {
                input,
                output,
                mode,
                assets,
                tier,
            };
            run_convert(options, config).await
        }

        Commands::Segment { input } => run_segment(&input),

        Commands::Validate { script, output } => run_validate(&script, output.as_deref(), &config),
    };

    if cli.telemetry {
        novelweave::shutdown_telemetry();
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::cli::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_convert_arguments() {
        let cli = Cli::try_parse_from([
            "novelweave", "convert", "novel.txt", "-o", "script.json", "--stream", "--assets", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Convert {
                input,
                output,
                stream,
                no_stream,
                assets,
                tier,
            } => {
                assert_eq!(input.to_str(), Some("novel.txt"));
                assert_eq!(output.unwrap().to_str(), Some("script.json"));
                assert!(stream && !no_stream && assets);
                assert!(tier.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_stream_flags_conflict() {
        assert!(Cli::try_parse_from(["novelweave", "convert", "a.txt", "--stream", "--no-stream"]).is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["novelweave", "validate", "s.json", "--config", "nw.toml"]).unwrap();
        assert_eq!(cli.config.unwrap().to_str(), Some("nw.toml"));
    }
}
