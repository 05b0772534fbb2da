// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use chrono::DateTime;
use common::{location_error::LocationError, options::PositionOptions, position::Position};
use geolocation::{LocationPlatform, gpsd_source::GpsdSource};
use std::{io::Error, str::FromStr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    time::timeout,
};

struct GpsdServer {
    socket: TcpListener,
    client: Option<TcpStream>,
}

impl GpsdServer {
    pub async fn new(addr: &str) -> GpsdServer {
        let listener = TcpListener::bind(addr).await;
        GpsdServer {
            socket: listener.unwrap_or_else(|e| panic!("Failed to bind gpsd test server on {addr}. Error: {e}")),
            client: None,
        }
    }

    pub async fn accept_client(&mut self) {
        match self.socket.accept().await {
            Ok((client, _)) => self.client = Some(client),
            Err(e) => panic!("Client connection failed. Error: {:?}", e),
        }
    }

    pub async fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        match self.client {
            Some(ref mut client) => client.write_all(buf).await,
            None => panic!("GPSD server no client is connected"),
        }
    }

    pub async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        match self.client {
            Some(ref mut client) => client.read(buf).await,
            None => panic!("GPSD server no client is connected"),
        }
    }

    pub fn disconnect(&mut self) {
        self.client = None;
    }
}

const TIMEOUT_MS: u64 = 100;

async fn test_setup(addr: &str) -> (GpsdSource, GpsdServer) {
    let mut server = GpsdServer::new(addr).await;
    let source = GpsdSource::new(addr)
        .await
        .expect("Failed to initialze GPSD source.");
    timeout(Duration::from_millis(TIMEOUT_MS), server.accept_client())
        .await
        .unwrap_or_else(|_| panic!("No client connected within timeout of 100ms"));
    (source, server)
}

const TPV_MSG: &str = " \
{ \
    \"class\": \"TPV\", \
    \"time\": \"2005-06-08T10:34:48.283Z\", \
    \"lat\": 1.0, \
    \"lon\": 1.0, \
    \"speed\": 22.0, \
    \"mode\": 3 \
}\n\r";

const NO_FIX_MSG: &str = "{\"class\": \"TPV\", \"mode\": 1}\n";

fn expected_position() -> Position {
    Position::new(
        1.0,
        1.0,
        DateTime::<chrono::Utc>::from_str("2005-06-08T10:34:48.283Z").unwrap(),
    )
}

#[tokio::test]
async fn reject_invalid_address() {
    assert!(GpsdSource::new("not an address").await.is_err());
}

#[tokio::test]
async fn enable_gpsd_notifications() {
    let (_source, mut server) = test_setup("127.0.0.1:35500").await;
    let enable_cmd: &str = r#"?WATCH={"enable":true,"json":true}"#;
    let mut buf: Vec<u8> = vec![0; enable_cmd.len()];
    let _ = timeout(Duration::from_millis(TIMEOUT_MS), server.receive(&mut buf))
        .await
        .unwrap_or_else(|_| panic!("Enable command not received in {:?} ms", TIMEOUT_MS));
    let received_cmd =
        std::str::from_utf8(&buf).expect("Received enable command is not a valid string");
    assert_eq!(received_cmd, enable_cmd);
}

#[tokio::test]
async fn notify_watch_consumer() {
    let (source, mut server) = test_setup("127.0.0.1:35501").await;
    let (sender, mut receiver) = mpsc::unbounded_channel();
    source
        .watch_position(&PositionOptions::default(), sender)
        .await
        .unwrap();
    server
        .send(TPV_MSG.as_bytes())
        .await
        .expect("Failed to send TPV msg");
    let pos = timeout(Duration::from_millis(TIMEOUT_MS), receiver.recv())
        .await
        .expect("Failed to receive position in required time")
        .unwrap();
    assert_eq!(pos, Ok(expected_position()));
}

#[tokio::test]
async fn current_position_skips_reports_without_fix() {
    let (source, mut server) = test_setup("127.0.0.1:35502").await;
    let query = tokio::spawn(async move {
        source
            .current_position(&PositionOptions::default())
            .await
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    server.send(NO_FIX_MSG.as_bytes()).await.unwrap();
    server.send(TPV_MSG.as_bytes()).await.unwrap();
    let pos = timeout(Duration::from_millis(TIMEOUT_MS), query)
        .await
        .expect("Failed to receive position in required time")
        .unwrap();
    assert_eq!(pos, Ok(expected_position()));
}

#[tokio::test]
async fn current_position_times_out() {
    let (source, _server) = test_setup("127.0.0.1:35503").await;
    let options = PositionOptions::default().with_timeout(Duration::from_millis(20));
    assert_eq!(
        source.current_position(&options).await,
        Err(LocationError::timeout("Timeout expired"))
    );
}

#[tokio::test]
async fn report_lost_connection_to_watch() {
    let (source, mut server) = test_setup("127.0.0.1:35504").await;
    let (sender, mut receiver) = mpsc::unbounded_channel();
    source
        .watch_position(&PositionOptions::default(), sender)
        .await
        .unwrap();
    server.disconnect();
    let update = timeout(Duration::from_millis(TIMEOUT_MS), receiver.recv())
        .await
        .expect("Failed to receive update in required time")
        .unwrap();
    assert_eq!(
        update,
        Err(LocationError::position_unavailable("Connection to gpsd lost"))
    );
    assert!(receiver.recv().await.is_none());
}

#[tokio::test]
async fn refuse_watch_after_lost_connection() {
    let (source, mut server) = test_setup("127.0.0.1:35505").await;
    let (sender, mut receiver) = mpsc::unbounded_channel();
    source
        .watch_position(&PositionOptions::default(), sender)
        .await
        .unwrap();
    server
        .send(TPV_MSG.as_bytes())
        .await
        .expect("Failed to send TPV msg");
    let pos = timeout(Duration::from_millis(TIMEOUT_MS), receiver.recv())
        .await
        .expect("Failed to receive position in required time")
        .unwrap();
    assert_eq!(pos, Ok(expected_position()));
    server.disconnect();
    timeout(Duration::from_millis(TIMEOUT_MS), async {
        while receiver.recv().await.is_some() {}
    })
    .await
    .expect("Watch not closed after disconnect");

    let (sender, _receiver) = mpsc::unbounded_channel();
    assert_eq!(
        source
            .watch_position(&PositionOptions::default(), sender)
            .await,
        Err(LocationError::position_unavailable("Connection to gpsd lost"))
    );
    let cached = PositionOptions::default().with_maximum_age(Duration::MAX);
    assert_eq!(
        source.current_position(&cached).await,
        Err(LocationError::position_unavailable("Connection to gpsd lost"))
    );
}
