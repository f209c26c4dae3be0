// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll loop tests on a paused tokio clock.

mod common;

use std::time::Duration;

use common::{Drive, RecordingActuator, RecordingLink};
use ledlink::port::{MemoryStore, PersistentStateStore};
use ledlink::{ConfigError, LinkEvent, Runtime, ServiceConfig, SessionEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

const SECRET: &str = "secret";

type TestRuntime = Runtime<MemoryStore, RecordingActuator, RecordingLink>;

struct Running {
    tx: mpsc::Sender<LinkEvent>,
    handle: JoinHandle<()>,
    session: ledlink::SharedSession<MemoryStore, RecordingActuator, RecordingLink>,
    actuator: RecordingActuator,
    link: RecordingLink,
}

impl Running {
    fn start(store: MemoryStore) -> Self {
        let actuator = RecordingActuator::default();
        let link = RecordingLink::default();
        let runtime: TestRuntime = Runtime::new(
            ServiceConfig::new(SECRET),
            store,
            actuator.clone(),
            link.clone(),
        )
        .unwrap();
        let session = runtime.session();
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(runtime.run(rx));
        Self {
            tx,
            handle,
            session,
            actuator,
            link,
        }
    }

    async fn send(&self, event: LinkEvent) {
        self.tx.send(event).await.unwrap();
    }

    async fn authenticate(&self) {
        self.send(LinkEvent::Connected).await;
        self.send(LinkEvent::AuthWrite(SECRET.as_bytes().to_vec()))
            .await;
    }

    async fn data(&self, payload: &str) {
        self.send(LinkEvent::DataWrite(payload.as_bytes().to_vec()))
            .await;
    }
}

#[tokio::test(start_paused = true)]
async fn unauthenticated_peer_is_dropped_after_timeout() {
    let rt = Running::start(MemoryStore::new());
    rt.send(LinkEvent::Connected).await;

    sleep(Duration::from_millis(1900)).await;
    assert_eq!(rt.link.disconnects(), 0);
    assert!(rt.session.with(|s| s.is_connected()));

    sleep(Duration::from_millis(300)).await;
    assert_eq!(rt.link.disconnects(), 1);
    assert!(!rt.session.with(|s| s.is_connected()));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(rt.link.disconnects(), 1);
}

#[tokio::test(start_paused = true)]
async fn authenticated_peer_stays_connected() {
    let rt = Running::start(MemoryStore::new());
    rt.authenticate().await;

    sleep(Duration::from_secs(10)).await;

    assert_eq!(rt.link.disconnects(), 0);
    assert!(rt.session.with(|s| s.is_authenticated()));
}

#[tokio::test(start_paused = true)]
async fn commands_are_echoed() {
    let rt = Running::start(MemoryStore::new());
    rt.authenticate().await;
    rt.data("1001").await;

    sleep(Duration::from_millis(10)).await;

    assert_eq!(rt.link.sent(), vec!["01001"]);
    assert_eq!(rt.actuator.last(), Some(Drive::Pwm(255)));
}

#[tokio::test(start_paused = true)]
async fn resync_is_paced_by_the_poll_loop() {
    let rt = Running::start(MemoryStore::new());
    rt.authenticate().await;
    rt.data("99002").await;

    sleep(Duration::from_millis(5)).await;
    assert_eq!(rt.link.sent().len(), 1);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(rt.link.sent(), vec!["01000", "02255", "03000", "99999"]);
}

#[tokio::test(start_paused = true)]
async fn blinking_runs_from_the_poll_loop() {
    let rt = Running::start(MemoryStore::new());
    rt.authenticate().await;
    rt.data("3001").await;
    rt.data("1001").await;
    sleep(Duration::from_millis(10)).await;
    rt.actuator.clear();

    sleep(Duration::from_millis(2000)).await;

    let writes = rt.actuator.writes();
    assert!(writes.len() >= 3, "{writes:?}");
    assert!(writes.contains(&Drive::Pwm(0)));
    assert!(writes.contains(&Drive::Pwm(255)));
}

#[tokio::test(start_paused = true)]
async fn persisted_state_is_restored_at_start() {
    let mut store = MemoryStore::new();
    store.put("ledState", 1).unwrap();
    store.put("ledPower", 33).unwrap();

    let rt = Running::start(store);

    assert_eq!(rt.actuator.writes(), vec![Drive::Pwm(33)]);
    assert_eq!(rt.link.advertising(), 1);
}

#[tokio::test(start_paused = true)]
async fn events_reach_subscribers() {
    let rt = Running::start(MemoryStore::new());
    let mut events = rt.session.subscribe();
    rt.authenticate().await;

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();

    assert!(matches!(first, SessionEvent::Connected { .. }));
    assert!(matches!(second, SessionEvent::Authenticated { .. }));
}

#[tokio::test(start_paused = true)]
async fn loop_stops_when_channel_closes() {
    let rt = Running::start(MemoryStore::new());
    drop(rt.tx);

    tokio::time::timeout(Duration::from_secs(1), rt.handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn transport_thread_and_poll_loop_share_the_session() {
    const TOGGLES: usize = 200;

    let rt = Running::start(MemoryStore::new());
    let session = rt.session.clone();

    let transport = std::thread::spawn(move || {
        session.handle_event(LinkEvent::Connected).unwrap();
        session
            .handle_event(LinkEvent::AuthWrite(SECRET.as_bytes().to_vec()))
            .unwrap();
        for i in 0..TOGGLES {
            let payload = if i % 2 == 0 { "1001" } else { "1000" };
            session
                .handle_event(LinkEvent::DataWrite(payload.as_bytes().to_vec()))
                .unwrap();
        }
    });
    tokio::task::spawn_blocking(move || transport.join())
        .await
        .unwrap()
        .unwrap();
    sleep(Duration::from_millis(100)).await;

    let sent = rt.link.sent();
    assert_eq!(sent.len(), TOGGLES);
    for (i, message) in sent.iter().enumerate() {
        let expected = if i % 2 == 0 { "01001" } else { "01000" };
        assert_eq!(message, expected);
    }
    assert!(rt.session.with(|s| s.is_authenticated()));
    assert_eq!(rt.link.disconnects(), 0);
    assert!(!rt.handle.is_finished());
}

#[test]
fn invalid_config_is_rejected() {
    let result = Runtime::new(
        ServiceConfig::default(),
        MemoryStore::new(),
        RecordingActuator::default(),
        RecordingLink::default(),
    );
    assert!(matches!(result, Err(ConfigError::EmptySecret)));
}
