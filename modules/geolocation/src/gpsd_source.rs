// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::{LocationPlatform, PositionUpdate, WatchId, feed::PositionFeed};
use async_trait::async_trait;
use common::{location_error::LocationError, options::PositionOptions, position::Position};
use futures::StreamExt;
use gpsd_proto::{self, Mode, Tpv};
use std::{
    io::{self, Error, ErrorKind},
    net::SocketAddr,
    str::FromStr,
    sync::Arc,
};
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::mpsc::UnboundedSender};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, error, info, warn};

pub(crate) const NO_FIX_MESSAGE: &str = "GNSS receiver has no fix";
pub(crate) const CONNECTION_LOST_MESSAGE: &str = "Connection to gpsd lost";

/// GPSD daemon based location source
///
/// Every TPV report with a 2D or 3D fix is delivered as position, reports
/// without fix are delivered as [`LocationError::PositionUnavailable`].
pub struct GpsdSource {
    feed: Arc<PositionFeed>,
    reader: tokio::task::JoinHandle<()>,
}

impl GpsdSource {
    /// Creates a new instance of the GPSD source.
    ///
    /// Every new instance creates a new connection to the GPSD daemon.
    ///
    /// # Arguments
    ///
    /// * `address` - The address of the GPSD daemon to try to connect to.
    ///
    /// # Returns
    ///
    /// * `Err(io::Error)` - If the address is invalid or the GPSD socket connection fails.
    pub async fn new(address: &str) -> Result<Self, Error> {
        let address: SocketAddr = match address.parse() {
            Ok(addr) => addr,
            Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e)),
        };
        let stream = TcpStream::connect(address).await?;
        info!("Connected to gpsd at {}", address);
        let feed = Arc::new(PositionFeed::new());
        let reader_feed = feed.clone();
        let reader = tokio::spawn(async move { gpsd_reader(stream, reader_feed).await });
        Ok(GpsdSource { feed, reader })
    }
}

pub(crate) fn convert_tpv(tpv: &Tpv) -> Option<PositionUpdate> {
    if let Mode::NoFix = tpv.mode {
        return Some(Err(LocationError::position_unavailable(NO_FIX_MESSAGE)));
    }
    let lat = tpv.lat?;
    let lon = tpv.lon?;
    let timestamp = match tpv.time {
        Some(ref time) => chrono::DateTime::<chrono::Utc>::from_str(time).ok()?,
        None => chrono::Utc::now(),
    };
    Some(Ok(Position::new(lat, lon, timestamp)))
}

async fn gpsd_reader(mut stream: TcpStream, feed: Arc<PositionFeed>) {
    if let Err(e) = stream
        .write_all(gpsd_proto::ENABLE_WATCH_CMD.as_bytes())
        .await
    {
        error!("Failed to enable gpsd watch mode. Error: {}", e);
        feed.close(LocationError::position_unavailable(CONNECTION_LOST_MESSAGE));
        return;
    }
    let mut framed = Framed::new(stream, LinesCodec::new());
    while let Some(result) = framed.next().await {
        match result {
            Ok(ref line) => {
                let Ok(tpv) = serde_json::from_str::<Tpv>(line) else {
                    continue;
                };
                match convert_tpv(&tpv) {
                    Some(update) => {
                        debug!("gpsd delivered {:?}", update);
                        feed.publish(update);
                    }
                    None => debug!("Ignoring incomplete TPV report"),
                }
            }
            Err(e) => {
                warn!("GPSD receive error {e:?}");
            }
        }
    }
    error!("{}", CONNECTION_LOST_MESSAGE);
    feed.close(LocationError::position_unavailable(CONNECTION_LOST_MESSAGE));
}

#[async_trait]
impl LocationPlatform for GpsdSource {
    async fn current_position(&self, options: &PositionOptions) -> PositionUpdate {
        self.feed.next_position(options).await
    }

    async fn watch_position(
        &self,
        options: &PositionOptions,
        consumer: UnboundedSender<PositionUpdate>,
    ) -> Result<WatchId, LocationError> {
        if !options.enable_high_accuracy {
            debug!("gpsd always reports the receiver accuracy");
        }
        let id = self.feed.watch(consumer)?;
        debug!("Registered watch {:?}", id);
        Ok(id)
    }

    async fn clear_watch(&self, id: WatchId) {
        if self.feed.clear(id) {
            debug!("Cleared watch {:?}", id);
        }
    }
}

impl Drop for GpsdSource {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
