//! pour CLI

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pour_cli::ui::ConsoleReporter;
use pour_cli::{Cli, Commands, cmd};
use pour_core::Reporter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reporter = ConsoleReporter::new(cli.quiet);

    let result = match cli.command {
        Commands::Install {
            descriptor,
            platform,
            prefix,
            no_test,
        } => cmd::install::install(&descriptor, platform, prefix, !no_test, &reporter).await,
        Commands::Test { descriptor, prefix } => {
            cmd::test::test(&descriptor, prefix, &reporter).await
        }
        Commands::Resolve {
            descriptor,
            platform,
            json,
        } => cmd::resolve::resolve(&descriptor, platform, json),
        Commands::Check { descriptor } => cmd::check::check(&descriptor, &reporter),
        Commands::Caveats { descriptor, prefix } => {
            cmd::caveats::caveats(&descriptor, prefix, &reporter)
        }
        Commands::Bump {
            descriptor,
            version,
            checksums,
        } => cmd::bump::bump(&descriptor, &version, &checksums, &reporter).await,
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            reporter.error(&format!("{err:#}"));
            ExitCode::from(pour_cli::exit_code(&err))
        }
    }
}
