//! Shared helpers for bridge integration tests.

#![allow(dead_code)]

use figma_scene::{Bridge, BridgeBuilder, BridgeConfig};
use figma_scene_common::transport::MemoryChannel;
use figma_scene_sandbox::{HostApi, HostEvents};
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

/// Events the recording host knows how to fire.
pub const EVENTS: &[&str] = &["selectionchange", "currentpagechange"];

/// In-memory document host that records every forwarded call.
pub struct RecordingHost {
    calls: Mutex<Vec<(String, Vec<JsonValue>)>>,
    user: Mutex<JsonValue>,
    storage: Mutex<BTreeMap<String, JsonValue>>,
    listeners: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<JsonValue>>>>,
    listener_added: Notify,
    video_supported: AtomicBool,
    pass_through: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Self::with_pass_through(&["createRectangle", "closePlugin"])
    }

    pub fn with_pass_through(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            user: Mutex::new(json!({
                "id": "361", "name": "Ada", "photoUrl": null, "color": "#18a0fb", "sessionId": 7
            })),
            storage: Mutex::new(BTreeMap::new()),
            listeners: Mutex::new(HashMap::new()),
            listener_added: Notify::new(),
            video_supported: AtomicBool::new(true),
            pass_through: names.iter().map(|n| n.to_string()).collect(),
        })
    }

    pub fn calls(&self) -> Vec<(String, Vec<JsonValue>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, function: &str) -> Vec<Vec<JsonValue>> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == function)
            .map(|(_, args)| args)
            .collect()
    }

    pub fn set_user(&self, user: JsonValue) {
        *self.user.lock().unwrap() = user;
    }

    pub fn set_video_supported(&self, supported: bool) {
        self.video_supported.store(supported, Ordering::SeqCst);
    }

    /// Waits until some subscription has registered a listener.
    pub async fn wait_for_listener(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.listener_added.notified())
            .await
            .expect("no listener registered");
    }

    /// Fires `event` once for every registered listener.
    pub fn fire(&self, event: &str, payload: JsonValue) {
        if let Some(senders) = self.listeners.lock().unwrap().get(event) {
            for sender in senders {
                let _ = sender.send(payload.clone());
            }
        }
    }
}

impl HostApi for RecordingHost {
    fn invoke(&self, function: &str, args: Vec<JsonValue>) -> Result<JsonValue, String> {
        self.calls
            .lock()
            .unwrap()
            .push((function.to_string(), args.clone()));

        let key = || args.first().and_then(|k| k.as_str()).unwrap_or_default().to_string();

        match function {
            "notify" | "ui.resize" | "closePlugin" => Ok(JsonValue::Null),
            "currentUser" => Ok(self.user.lock().unwrap().clone()),
            "clientStorage.getAsync" => Ok(self
                .storage
                .lock()
                .unwrap()
                .get(&key())
                .cloned()
                .unwrap_or(JsonValue::Null)),
            "clientStorage.setAsync" => {
                let value = args.get(1).cloned().unwrap_or(JsonValue::Null);
                self.storage.lock().unwrap().insert(key(), value);
                Ok(JsonValue::Null)
            }
            "clientStorage.deleteAsync" => {
                self.storage.lock().unwrap().remove(&key());
                Ok(JsonValue::Null)
            }
            "clientStorage.keysAsync" => {
                Ok(json!(self.storage.lock().unwrap().keys().collect::<Vec<_>>()))
            }
            "base64Decode" => Ok(json!([26, 69, 223, 163])),
            "createVideoAsync" => {
                if self.video_supported.load(Ordering::SeqCst) {
                    Ok(json!({"hash": "video"}))
                } else {
                    Err("Unsupported video format".to_string())
                }
            }
            "createRectangle" => Ok(json!({"type": "RECTANGLE", "id": "1:2", "args": args})),
            other => Err(format!("figma.{} is not a function", other)),
        }
    }

    fn pass_through_functions(&self) -> Vec<String> {
        self.pass_through.clone()
    }

    fn listen(&self, event: &str) -> Result<HostEvents, String> {
        if !EVENTS.contains(&event) {
            return Err(format!("Unknown event: {}", event));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap()
            .entry(event.to_string())
            .or_default()
            .push(tx);
        self.listener_added.notify_one();
        Ok(rx)
    }
}

pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// Log sink that keeps everything written to it.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Routes events at `level` and above on this thread into the sink until
    /// the guard drops.
    pub fn install(&self, level: tracing::Level) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Builds a connected UI/sandbox pair. The sandbox is initialized, the UI
/// initializes lazily on first use.
pub fn bridge_pair(host: Arc<RecordingHost>, config: BridgeConfig) -> (Bridge, Bridge) {
    init_tracing();
    let (ui_channel, sandbox_channel) = MemoryChannel::pair();

    let sandbox = BridgeBuilder::new(sandbox_channel)
        .host(host)
        .config(config)
        .build()
        .unwrap();
    sandbox.init();

    let ui = BridgeBuilder::new(ui_channel).build().unwrap();
    (ui, sandbox)
}

/// Waits until the UI has processed the sandbox's handshake.
pub async fn wait_for_handshake(ui: &Bridge) {
    ui.init();
    tokio::time::timeout(Duration::from_secs(5), async {
        while ui.advertised_host_functions().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("handshake never arrived");
}
