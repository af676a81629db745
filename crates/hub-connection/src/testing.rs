//! In-memory host, session and connector used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use harmony_bridge_protocol::constants::POWER_OFF_KIND;
use harmony_bridge_protocol::{Activity, ActivityId, ActivityKind, EndpointStatus, Hub, StateDigest};
use tokio::sync::{Notify, mpsc};

use crate::endpoint::EndpointCommands;
use crate::host::{ControlHost, EndpointConfig, EndpointHandle};
use crate::session::{HubConnector, HubLink, HubSession, SessionError, SessionEvent};

pub(crate) fn activity(id: i64, label: &str) -> Activity {
    Activity::new(id, label, ActivityKind::Other("VirtualTelevisionN".into()))
}

pub(crate) fn power_off() -> Activity {
    Activity::new(-1, "PowerOff", ActivityKind::from(POWER_OFF_KIND.to_string()))
}

/// Polls `check` until it holds, panicking after five seconds.
pub(crate) async fn eventually(what: &str, check: impl Fn() -> bool) {
    for _ in 0..500 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

#[derive(Default)]
struct HostLog {
    next_handle: u64,
    registered: Vec<(ActivityId, String, EndpointStatus)>,
    commands: Vec<EndpointCommands>,
    updates: Vec<(EndpointHandle, EndpointStatus)>,
    statuses: Vec<(String, bool)>,
}

/// Host that records every call.
#[derive(Default)]
pub(crate) struct RecordingHost {
    log: Mutex<HostLog>,
}

impl RecordingHost {
    pub(crate) fn registered(&self) -> Vec<(ActivityId, String, EndpointStatus)> {
        self.log.lock().unwrap().registered.clone()
    }

    pub(crate) fn updates(&self) -> Vec<(EndpointHandle, EndpointStatus)> {
        self.log.lock().unwrap().updates.clone()
    }

    pub(crate) fn last_update(&self, handle: &EndpointHandle) -> Option<EndpointStatus> {
        self.log
            .lock()
            .unwrap()
            .updates
            .iter()
            .rev()
            .find(|(h, _)| h == handle)
            .map(|(_, status)| *status)
    }

    pub(crate) fn last_status(&self) -> Option<(String, bool)> {
        self.log.lock().unwrap().statuses.last().cloned()
    }

    /// Command handles of the most recent registration for `id`.
    pub(crate) fn commands_for(&self, id: &ActivityId) -> Option<EndpointCommands> {
        self.log
            .lock()
            .unwrap()
            .commands
            .iter()
            .rev()
            .find(|c| c.activity_id() == id)
            .cloned()
    }
}

impl ControlHost for RecordingHost {
    fn register_endpoint(&self, config: EndpointConfig) -> EndpointHandle {
        let mut log = self.log.lock().unwrap();
        log.next_handle += 1;
        let handle = EndpointHandle(log.next_handle);
        log.registered
            .push((config.activity_id, config.display_name, config.status));
        log.commands.push(config.commands);
        handle
    }

    fn update_endpoint_state(&self, handle: &EndpointHandle, status: EndpointStatus) {
        self.log.lock().unwrap().updates.push((*handle, status));
    }

    fn set_status(&self, message: &str, is_error: bool) {
        self.log
            .lock()
            .unwrap()
            .statuses
            .push((message.to_string(), is_error));
    }
}

/// Scripted hub session.
pub(crate) struct MockSession {
    address: String,
    current: ActivityId,
    activities: Vec<Activity>,
    fail_queries: AtomicBool,
    fail_commands: AtomicBool,
    started: Mutex<Vec<ActivityId>>,
    turn_offs: AtomicUsize,
    polls: AtomicUsize,
    ended: AtomicBool,
    events_tx: Mutex<Option<mpsc::Sender<SessionEvent>>>,
    enumeration_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockSession {
    pub(crate) fn new(
        address: &str,
        current: ActivityId,
        activities: Vec<Activity>,
    ) -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let session = Arc::new(Self {
            address: address.to_string(),
            current,
            activities,
            fail_queries: AtomicBool::new(false),
            fail_commands: AtomicBool::new(false),
            started: Mutex::new(Vec::new()),
            turn_offs: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            ended: AtomicBool::new(false),
            events_tx: Mutex::new(Some(tx)),
            enumeration_gate: Mutex::new(None),
        });
        (session, rx)
    }

    /// A session not created through a connector.
    pub(crate) fn detached() -> (Arc<Self>, mpsc::Receiver<SessionEvent>) {
        Self::new("127.0.0.1", ActivityId::from(-1), Vec::new())
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Holds `activities` until `gate` is notified.
    pub(crate) fn set_enumeration_gate(&self, gate: Option<Arc<Notify>>) {
        *self.enumeration_gate.lock().unwrap() = gate;
    }

    pub(crate) fn set_fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn started(&self) -> Vec<ActivityId> {
        self.started.lock().unwrap().clone()
    }

    pub(crate) fn turn_offs(&self) -> usize {
        self.turn_offs.load(Ordering::SeqCst)
    }

    /// Number of current-activity queries, enumeration included.
    pub(crate) fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub(crate) fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    pub(crate) async fn push_digest(&self, digest: StateDigest) {
        self.send(SessionEvent::StateDigest(digest)).await;
    }

    pub(crate) async fn go_offline(&self) {
        self.send(SessionEvent::Offline).await;
    }

    /// Drops the event sender so the stream ends.
    pub(crate) fn close_events(&self) {
        self.events_tx.lock().unwrap().take();
    }

    async fn send(&self, event: SessionEvent) {
        let tx = self.events_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.send(event).await;
        }
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), SessionError> {
        if self.is_ended() {
            return Err(SessionError::Closed);
        }
        if flag.load(Ordering::SeqCst) {
            return Err(SessionError::Rejected("scripted failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl HubSession for MockSession {
    async fn current_activity_id(&self) -> Result<ActivityId, SessionError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_queries)?;
        Ok(self.current.clone())
    }

    async fn activities(&self) -> Result<Vec<Activity>, SessionError> {
        let gate = self.enumeration_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check(&self.fail_queries)?;
        Ok(self.activities.clone())
    }

    async fn start_activity(&self, id: &ActivityId) -> Result<(), SessionError> {
        self.check(&self.fail_commands)?;
        self.started.lock().unwrap().push(id.clone());
        Ok(())
    }

    async fn turn_off(&self) -> Result<(), SessionError> {
        self.check(&self.fail_commands)?;
        self.turn_offs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }
}

/// How a scripted hub behaves on connect.
#[derive(Clone)]
pub(crate) struct HubScript {
    current: ActivityId,
    activities: Vec<Activity>,
    failing_connects: usize,
    failing_enumerations: usize,
    fail_commands: bool,
    connect_gate: Option<Arc<Notify>>,
    enumeration_gate: Option<Arc<Notify>>,
}

impl HubScript {
    pub(crate) fn new(current: i64, activities: Vec<Activity>) -> Self {
        Self {
            current: ActivityId::from(current),
            activities,
            failing_connects: 0,
            failing_enumerations: 0,
            fail_commands: false,
            connect_gate: None,
            enumeration_gate: None,
        }
    }

    /// The first `n` connects time out.
    pub(crate) fn failing_connects(mut self, n: usize) -> Self {
        self.failing_connects = n;
        self
    }

    /// The first `n` sessions fail to enumerate activities.
    pub(crate) fn failing_enumerations(mut self, n: usize) -> Self {
        self.failing_enumerations = n;
        self
    }

    pub(crate) fn failing_commands(mut self) -> Self {
        self.fail_commands = true;
        self
    }

    /// Connects stay pending until `gate` is notified.
    pub(crate) fn gated_connect(mut self, gate: Arc<Notify>) -> Self {
        self.connect_gate = Some(gate);
        self
    }

    /// Activity enumeration stays pending until `gate` is notified.
    pub(crate) fn gated_enumeration(mut self, gate: Arc<Notify>) -> Self {
        self.enumeration_gate = Some(gate);
        self
    }
}

/// Connector serving scripted hubs keyed by address.
#[derive(Default)]
pub(crate) struct MockConnector {
    hubs: Mutex<HashMap<String, HubScript>>,
    sessions: Mutex<Vec<Arc<MockSession>>>,
    attempts: AtomicUsize,
}

impl MockConnector {
    pub(crate) fn add_hub(&self, address: &str, script: HubScript) {
        self.hubs
            .lock()
            .unwrap()
            .insert(address.to_string(), script);
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn latest_session(&self) -> Option<Arc<MockSession>> {
        self.sessions.lock().unwrap().last().cloned()
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Sessions that were created and not yet ended.
    pub(crate) fn live_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_ended())
            .count()
    }

    fn open(&self, hub: &Hub) -> Result<HubLink, SessionError> {
        let mut hubs = self.hubs.lock().unwrap();
        let Some(script) = hubs.get_mut(&hub.address) else {
            return Err(SessionError::Unreachable(hub.address.clone()));
        };
        if script.failing_connects > 0 {
            script.failing_connects -= 1;
            return Err(SessionError::Timeout);
        }
        let fail_queries = script.failing_enumerations > 0;
        if fail_queries {
            script.failing_enumerations -= 1;
        }

        let (session, events) =
            MockSession::new(&hub.address, script.current.clone(), script.activities.clone());
        session.set_fail_queries(fail_queries);
        session.set_fail_commands(script.fail_commands);
        session.set_enumeration_gate(script.enumeration_gate.clone());
        self.sessions.lock().unwrap().push(session.clone());
        Ok(HubLink { session, events })
    }
}

#[async_trait]
impl HubConnector for MockConnector {
    async fn connect(&self, hub: &Hub) -> Result<HubLink, SessionError> {
        tokio::task::yield_now().await;
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .hubs
            .lock()
            .unwrap()
            .get(&hub.address)
            .and_then(|script| script.connect_gate.clone());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.open(hub)
    }
}
