// file: src/main.rs
// version: 1.0.1
// guid: f6bbf35e-3600-49f5-ba5b-a11097d58766

//! Android certificate installer - main entry point

use android_cert_installer::{
    cli::{
        args::{Cli, Commands},
        commands::*,
        menu::Menu,
    },
    logging::logger,
    AgentConfig, Result,
};
use clap::Parser;
use tokio::signal;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = if cli.log_json {
        logger::init_json_logger(cli.verbose, cli.quiet)
    } else {
        logger::init_logger(cli.verbose, cli.quiet)
    };
    if let Err(e) = logging {
        eprintln!("{}", e);
    }

    let shutdown_signal = async {
        if signal::ctrl_c().await.is_err() {
            // Without a handler the default SIGINT behaviour applies
            std::future::pending::<()>().await;
        }
    };

    // The signal branch is polled first so the handler is installed before any prompt
    tokio::select! {
        biased;
        _ = shutdown_signal => {
            warn!("Operation cancelled by user");
            std::process::exit(130);
        }
        result = run(cli) => {
            if let Err(e) = result {
                error!("✗ {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let verbose = cli.verbose;
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(serial) = cli.serial {
        config.adb.serial = Some(serial);
    }

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Convert { file, dir, out_dir } => {
            convert_command(&config, file, &dir, out_dir).await?;
        }
        Commands::Install {
            file,
            dir,
            dest_dir,
            mode,
            elevation,
            local,
            yes,
            reboot,
            json,
        } => {
            let options = InstallOptions {
                file,
                dir,
                dest_dir,
                mode,
                elevation,
                local,
                yes,
                reboot,
                json,
                verbose,
            };
            install_command(&config, options).await?;
        }
        Commands::Devices { json } => devices_command(&config, json).await?,
        Commands::Config => config_command(&config).await?,
        Commands::Menu => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut menu = Menu::new(&config, ".", stdin, std::io::stdout());
            menu.run().await?;
        }
    }

    Ok(())
}
