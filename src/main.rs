//! sql-kernel - an interactive SQL kernel for SQLite and PostgreSQL.

use std::process::ExitCode;

use anyhow::{Context, Result};
use sql_kernel::cli::{Cli, Mode};
use sql_kernel::config::Config;
use sql_kernel::kernel::Kernel;
use sql_kernel::logging::{init_file_logging, init_stderr_logging};
use sql_kernel::protocol::{serve, ConsolePublisher};
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Before argument parsing so SQL_KERNEL_URL can come from .env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    if cli.log_file {
        init_file_logging();
    } else {
        init_stderr_logging();
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_overrides(&mut config);

    let mut kernel = Kernel::from_config(&config);
    if let Some(conn_str) = &config.kernel.startup_connection {
        if let Err(e) = kernel.connect(conn_str).await {
            warn!("Start-up connection failed, starting disconnected: {e}");
        }
    }

    match cli.mode() {
        Mode::Serve => {
            info!("Serving requests on stdin");
            serve(
                &mut kernel,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
            Ok(ExitCode::SUCCESS)
        }
        Mode::Script(path) => {
            let code = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            run_script(&mut kernel, &code).await
        }
        Mode::Stdin => {
            let mut code = String::new();
            tokio::io::stdin()
                .read_to_string(&mut code)
                .await
                .context("Failed to read script from stdin")?;
            run_script(&mut kernel, &code).await
        }
    }
}

/// Executes a whole script as one cell, printing output as plain text.
async fn run_script(kernel: &mut Kernel, code: &str) -> Result<ExitCode> {
    let mut publisher = ConsolePublisher::new(tokio::io::stdout(), tokio::io::stderr());
    let reply = kernel.execute(code, false, &mut publisher).await;
    kernel.shutdown().await;

    Ok(if reply.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
