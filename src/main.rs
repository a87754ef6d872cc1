use clap::Parser;
use maize_scan::{cli, commands, config, error};
use cli::{Cli, Commands, FarmAction};
use commands::App;
use config::Config;
use error::{MaizeScanError, Result};
use maize_scan_common::BoundaryShape;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Detect { image, lat, lon, no_location, json } => {
            if !json {
                println!("🌽 maize-scan - 病害判定\n");
            }
            let app = App::connect(config, cli.api_base_url)?;
            let explicit = Commands::explicit_location(lat, lon);
            commands::run_detect(&app, &image, explicit, no_location, json).await?;
        }

        Commands::History { search, filter, sort, limit } => {
            println!("📋 maize-scan - スキャン履歴\n");
            let app = App::connect(config, cli.api_base_url)?;
            print!("{}", app.history(&search, filter, sort, limit).await?);
        }

        Commands::Map => {
            println!("🗺  maize-scan - 地図\n");
            let app = App::connect(config, cli.api_base_url)?;
            print!("{}", app.map().await?);
        }

        Commands::Farms { action } => {
            let app = App::connect(config, cli.api_base_url)?;
            match action {
                FarmAction::List => print!("{}", app.farms().await?),
                FarmAction::Add { geojson, name } => {
                    let shape = commands::load_farm_shape(&geojson)?;
                    print!("{}", app.add_farm(&shape, name).await?);
                }
                FarmAction::AddRect { from, to, name } => {
                    let shape = BoundaryShape::Rectangle(from, to);
                    print!("{}", app.add_farm(&shape, name).await?);
                }
            }
        }

        Commands::Weather { at, days } => {
            let at = at.or(config.default_location).ok_or_else(|| {
                MaizeScanError::Config(
                    "位置が指定されていません。--at LAT,LON か `maize-scan config --set-default-location` で設定してください".into(),
                )
            })?;
            let app = App::connect(config, cli.api_base_url)?;
            print!("{}", app.weather(at, days).await);
        }

        Commands::Config {
            set_api_base_url,
            set_farmer_id,
            set_default_location,
            set_weather_widget,
            show,
        } => {
            commands::run_config(
                config,
                set_api_base_url,
                set_farmer_id,
                set_default_location,
                set_weather_widget,
                show,
            )?;
        }
    }

    Ok(())
}
