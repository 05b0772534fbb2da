// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use clap::{CommandFactory, Parser};
use common::{options::PositionOptions, position::Coordinate};
use display::Display;
use geolocation::{LocationPlatform, constant_source::ConstantSource, gpsd_source::GpsdSource};
use live_position::LivePosition;
use module_core::{EventBus, EventKind, Module};
use rest::{Rest, RestConfig};
use std::{
    io::{self, ErrorKind},
    str::FromStr,
    sync::Arc,
    time::Duration,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Replay the coordinates of --gps-source-file instead of a real receiver.
    #[arg(short, long)]
    gps_fake: bool,
    /// CSV file with "longitude,latitude" rows.
    #[arg(short = 'f', long)]
    gps_source_file: Option<String>,
    /// Address of the gpsd daemon.
    #[arg(short = 'd', long, num_args = 0..=1, default_missing_value = "127.0.0.1:2947")]
    gpsd: Option<String>,
    /// Replay interval of the fake source.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    #[arg(long)]
    no_high_accuracy: bool,
    /// Give up waiting for a position after this time.
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Accept cached positions up to this age.
    #[arg(long, default_value_t = 0)]
    maximum_age_ms: u64,
    #[arg(long, default_value_t = 27015)]
    rest_port: u16,
    /// Don't serve the live position over HTTP.
    #[arg(long)]
    no_rest: bool,
}

impl Cli {
    fn position_options(&self) -> PositionOptions {
        let options = PositionOptions::default()
            .with_high_accuracy(!self.no_high_accuracy)
            .with_maximum_age(Duration::from_millis(self.maximum_age_ms));
        match self.timeout_ms {
            Some(timeout) => options.with_timeout(Duration::from_millis(timeout)),
            None => options,
        }
    }
}

fn read_coordinates<R: io::Read>(reader: R) -> Result<Vec<Coordinate>, io::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut coordinates = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
        let field = |index: usize| -> Result<f64, io::Error> {
            let value = record.get(index).ok_or_else(|| {
                io::Error::new(
                    ErrorKind::InvalidData,
                    format!("Row {:?} has no column {}", record, index),
                )
            })?;
            f64::from_str(value.trim()).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
        };
        let longitude = field(0)?;
        let latitude = field(1)?;
        coordinates.push(Coordinate::new(latitude, longitude));
    }
    debug!("length of coordinates: {}", coordinates.len());
    Ok(coordinates)
}

fn create_fake_source(cli: &Cli) -> Result<Arc<dyn LocationPlatform>, ()> {
    let Some(source_file) = &cli.gps_source_file else {
        error!("Failed to create ConstantSource. Error: gps_source_file not set");
        let _ = Cli::command().print_help();
        return Err(());
    };
    let file = std::fs::File::open(source_file).map_err(|e| {
        error!("Failed to open {}. Error: {}", source_file, e);
    })?;
    let coordinates = read_coordinates(file).map_err(|e| {
        error!("Failed to read coordinates from {}. Error: {}", source_file, e);
    })?;
    let source = ConstantSource::new(&coordinates, Duration::from_millis(cli.interval_ms))
        .map_err(|e| {
            error!("Failed to create ConstantSource. Error: {}", e);
        })?;
    Ok(Arc::new(source))
}

async fn create_gpsd_source(address: &str) -> Result<Arc<dyn LocationPlatform>, ()> {
    match GpsdSource::new(address).await {
        Ok(gpsd) => Ok(Arc::new(gpsd)),
        Err(e) => {
            error!("Failed to connect to gpsd!. Error: {}", e);
            Err(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let platform = if let Some(address) = &cli.gpsd {
        Some(create_gpsd_source(address).await?)
    } else if cli.gps_fake {
        Some(create_fake_source(&cli)?)
    } else {
        info!("No location source specified, running without location capability");
        None
    };

    let eb = EventBus::default();
    let quit_sender = eb.context().sender;
    ctrlc::set_handler(move || {
        let _ = quit_sender.send(module_core::Event {
            kind: EventKind::QuitEvent,
        });
    })
    .map_err(|e| error!("Failed to install the ctrl-c handler. Error: {}", e))?;

    let mut modules: Vec<Box<dyn Module>> = vec![
        Box::new(LivePosition::new(
            eb.context(),
            platform,
            cli.position_options(),
        )),
        Box::new(Display::new(eb.context())),
    ];
    if !cli.no_rest {
        modules.push(Box::new(Rest::new(
            eb.context(),
            RestConfig {
                port: cli.rest_port,
                ..RestConfig::default()
            },
        )));
    }

    info!("Starting modules...");
    futures::future::join_all(modules.iter_mut().map(|module| module.run()))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map(|_| ())
}
