use anyhow::Result;
use clap::{Parser, Subcommand};
use species_identifier::models::{Config, IdentificationRequest, RequesterConfig};
use species_identifier::requester::{user_message, SpeciesRequester};
use species_identifier::{render, server, upload};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "species-identifier")]
#[command(about = "Identify species from a name or a photo")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the identify-species HTTP function.
    Serve {
        /// Address to listen on; overrides BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Identify a species through a running identify-species function.
    Identify {
        /// Species name to look up.
        #[arg(long)]
        name: Option<String>,
        /// Photo to identify (at most 10 MB).
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Base URL of the function; overrides IDENTIFY_URL.
        #[arg(long)]
        url: Option<String>,
        /// Print the raw JSON record instead of the rendered panels.
        #[arg(long)]
        json: bool,
        /// Skip the analysis stage animation.
        #[arg(long)]
        no_progress: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "species_identifier=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    match args.command {
        Command::Serve { bind } => {
            let mut config = Config::from_env()?;
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            if let Err(e) = server::serve(config).await {
                error!("Server stopped: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Identify {
            name,
            image,
            url,
            json,
            no_progress,
        } => {
            let mut config = RequesterConfig::from_env();
            if let Some(url) = url {
                config.base_url = url;
            }

            let image = match image {
                Some(path) => match upload::image_data_url(&path).await {
                    Ok(data_url) => {
                        info!("Image loaded from {}", path.display());
                        Some(data_url)
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(1);
                    }
                },
                None => None,
            };

            let mut requester = SpeciesRequester::new(config);
            if no_progress {
                requester = requester.with_stage_delay(Duration::ZERO);
            }

            let request = IdentificationRequest {
                image,
                species_name: name,
            };
            let result = requester
                .identify_with_progress(&request, |stage| {
                    if !no_progress {
                        eprintln!("{}", stage);
                    }
                })
                .await;

            match result {
                Ok(record) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&record)?);
                    } else {
                        print!("{}", render::render_record(&record));
                    }
                    Ok(())
                }
                Err(e) => {
                    error!("Identification failed: {}", e);
                    eprintln!("{}", user_message(&e));
                    std::process::exit(1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identify_args() {
        let args = CliArgs::try_parse_from([
            "species-identifier",
            "identify",
            "--name",
            "Bengal Tiger",
            "--json",
        ])
        .unwrap();

        match args.command {
            Command::Identify {
                name, json, image, ..
            } => {
                assert_eq!(name.as_deref(), Some("Bengal Tiger"));
                assert!(json);
                assert!(image.is_none());
            }
            Command::Serve { .. } => panic!("expected identify"),
        }
    }

    #[test]
    fn test_parse_serve_args() {
        let args =
            CliArgs::try_parse_from(["species-identifier", "serve", "--bind", "127.0.0.1:9000"])
                .unwrap();
        assert!(matches!(args.command, Command::Serve { bind: Some(ref b) } if b == "127.0.0.1:9000"));
    }
}
