// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host simulator for the peripheral.
//!
//! Stands in for the radio: each stdin line is one transport callback, and
//! notifications and output changes are printed to stdout.
//!
//! ```text
//! connect
//! auth <secret>
//! data <payload>
//! write <characteristic-uuid> <value>
//! disconnect
//! quit
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ledlink::error::LinkError;
use ledlink::gatt::{AUTH_CHARACTERISTIC, RX_CHARACTERISTIC};
use ledlink::port::{Actuator, JsonFileStore, PeerLink};
use ledlink::{LinkEvent, PowerLevel, Runtime, ServiceConfig};

#[derive(Parser)]
#[command(name = "ledlink-sim")]
#[command(about = "Drive the peripheral engine from stdin")]
struct Cli {
    /// JSON service configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shared secret, overrides the configuration
    #[arg(short, long)]
    secret: Option<String>,

    /// JSON file holding the persisted device state
    #[arg(long, default_value = "ledlink-state.json")]
    state: PathBuf,
}

struct ConsoleOutput;

impl Actuator for ConsoleOutput {
    fn set_digital_output(&mut self, active: bool) {
        println!("output: {}", if active { "on" } else { "off" });
    }

    fn set_pwm_level(&mut self, level: PowerLevel) {
        println!("output: pwm {level}");
    }
}

struct ConsoleLink {
    events: mpsc::Sender<LinkEvent>,
}

impl PeerLink for ConsoleLink {
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        println!("notify: {}", String::from_utf8_lossy(payload));
        Ok(())
    }

    fn disconnect_peer(&mut self) {
        println!("link: dropping peer");
        // A real stack reports the drop through its disconnect callback.
        if self.events.try_send(LinkEvent::Disconnected).is_err() {
            tracing::warn!("Event channel full, disconnect not delivered");
        }
    }

    fn start_advertising(&mut self) {
        println!("link: advertising");
    }
}

fn parse_line(line: &str) -> Result<Option<LinkEvent>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next().unwrap_or_default();

    let event = match verb {
        "connect" => LinkEvent::Connected,
        "disconnect" => LinkEvent::Disconnected,
        "auth" => write_event(&AUTH_CHARACTERISTIC, arg)?,
        "data" => write_event(&RX_CHARACTERISTIC, arg)?,
        "write" => {
            let uuid: Uuid = arg.parse().map_err(|e| format!("bad uuid: {e}"))?;
            write_event(&uuid, parts.next().unwrap_or_default())?
        }
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(event))
}

fn write_event(characteristic: &Uuid, value: &str) -> Result<LinkEvent, String> {
    LinkEvent::from_write(characteristic, value.as_bytes())
        .ok_or_else(|| format!("{characteristic} is not writable"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)?,
        None => ServiceConfig::new("secret"),
    };
    if let Some(secret) = cli.secret {
        config = config.with_shared_secret(secret);
    }

    let store = JsonFileStore::open(&cli.state)?;
    let (tx, rx) = mpsc::channel(32);
    let link = ConsoleLink { events: tx.clone() };

    let runtime = Runtime::new(config, store, ConsoleOutput, link)?;
    let session = runtime.session();
    let poll = tokio::spawn(runtime.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "quit" {
            break;
        }
        match parse_line(line) {
            Ok(Some(event)) => tx.send(event).await?,
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }

    // The link keeps a sender alive, so the loop is stopped rather than drained.
    poll.abort();
    session.with(|s| {
        println!("state: {:?}, connected: {}", s.state(), s.is_connected());
    });
    Ok(())
}
