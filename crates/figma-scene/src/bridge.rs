//! The bridge facade
//!
//! A [`Bridge`] is the single entry point each context uses to talk to its
//! peer. The hosting application builds one per context with
//! [`BridgeBuilder`] and passes clones wherever `run` or `on` is needed.
//!
//! # Initialization
//!
//! Building a bridge registers the inbound listener. The dispatcher starts
//! and the handshake is sent on the first call to [`Bridge::init`], which
//! `run`, `on` and every convenience method call for you. Later calls to
//! `init` do nothing.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use figma_scene_common::protocol::error::{BridgeError, Result};
use figma_scene_common::transport::{Channel, Envelopes, TransportAdapter};
use figma_scene_common::{CallId, Envelope, Role};
use figma_scene_sandbox::HostApi;
use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::runtime::Handle;

use crate::config::BridgeConfig;
use crate::dispatcher::{AdvertisedFunctions, Dispatcher};
use crate::host_functions::HostFunction;
use crate::registry::{Callback, PendingCall, Registry};
use crate::sandbox::SandboxExecutor;
use crate::scripts;

/// The user running the plugin, as reported by `figma.currentUser`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
}

/// Options for [`Bridge::notify`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOptions {
    /// How long the toast stays visible, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    /// Render as an error toast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<bool>,
}

/// Builder for a [`Bridge`].
///
/// The role is detected from the presence of a host API: a bridge given one
/// is the sandbox, a bridge without one is the UI. [`role`](Self::role)
/// overrides the probe.
pub struct BridgeBuilder {
    channel: Arc<dyn Channel>,
    role: Option<Role>,
    host: Option<Arc<dyn HostApi>>,
    config: BridgeConfig,
}

impl BridgeBuilder {
    pub fn new(channel: impl Channel + 'static) -> Self {
        Self::from_arc(Arc::new(channel))
    }

    pub fn from_arc(channel: Arc<dyn Channel>) -> Self {
        Self {
            channel,
            role: None,
            host: None,
            config: BridgeConfig::default(),
        }
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Supplies the document API the sandbox forwards to.
    pub fn host(mut self, host: Arc<dyn HostApi>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the bridge and registers its inbound listener.
    ///
    /// # Errors
    ///
    /// - `BridgeError::InvalidConfig` if the configuration does not validate,
    ///   or a sandbox bridge has no host API
    /// - `BridgeError::NoRuntime` outside a tokio runtime
    /// - `BridgeError::ListenerTaken` if the channel already has a listener
    pub fn build(self) -> Result<Bridge> {
        self.config.validate().map_err(BridgeError::InvalidConfig)?;

        let role = self
            .role
            .unwrap_or_else(|| Role::detect(self.host.is_none()));
        let executor = match (role, self.host) {
            (Role::Sandbox, Some(host)) => Some(SandboxExecutor::new(host, &self.config)),
            (Role::Sandbox, None) => {
                return Err(BridgeError::InvalidConfig(
                    "a sandbox bridge requires a host API".to_string(),
                ))
            }
            (Role::Ui, _) => None,
        };

        let handle = Handle::try_current().map_err(|e| BridgeError::NoRuntime(e.to_string()))?;
        let transport = TransportAdapter::new(role, self.channel);
        let envelopes = transport.receive()?;

        Ok(Bridge {
            inner: Arc::new(BridgeInner {
                transport,
                registry: Registry::new(),
                advertised: Arc::new(AdvertisedFunctions::default()),
                handle,
                initialized: OnceLock::new(),
                startup: Mutex::new(Some(Startup { envelopes, executor })),
            }),
        })
    }
}

struct Startup {
    envelopes: Envelopes,
    executor: Option<SandboxExecutor>,
}

struct BridgeInner {
    transport: TransportAdapter,
    registry: Arc<Registry>,
    advertised: Arc<AdvertisedFunctions>,
    handle: Handle,
    initialized: OnceLock<()>,
    startup: Mutex<Option<Startup>>,
}

/// One context's end of the bridge. Cheap to clone.
///
/// # Example
///
/// ```no_run
/// use figma_scene::BridgeBuilder;
/// use figma_scene_common::transport::MemoryChannel;
/// use serde_json::json;
///
/// # async fn demo() -> figma_scene_common::Result<()> {
/// let (ui_channel, _sandbox_channel) = MemoryChannel::pair();
/// let ui = BridgeBuilder::new(ui_channel).build()?;
///
/// let six: i64 = ui.run("(x) => x + 1", json!(5)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    pub fn builder(channel: impl Channel + 'static) -> BridgeBuilder {
        BridgeBuilder::new(channel)
    }

    pub fn role(&self) -> Role {
        self.inner.transport.role()
    }

    /// Starts the dispatcher and sends the handshake. Idempotent.
    pub fn init(&self) {
        self.inner.initialized.get_or_init(|| self.start());
    }

    fn start(&self) {
        let startup = self
            .inner
            .startup
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Startup { envelopes, executor }) = startup else {
            return;
        };

        let handshake = match &executor {
            Some(executor) => Envelope::advertise(executor.pass_through_functions()),
            None => Envelope::init(),
        };

        let dispatcher = Dispatcher::new(
            self.inner.transport.clone(),
            Arc::clone(&self.inner.registry),
            executor,
            Arc::clone(&self.inner.advertised),
            self.inner.handle.clone(),
        );
        self.inner.handle.spawn(dispatcher.run(envelopes));

        tracing::info!("Bridge initialized as {:?}", self.role());
        if let Err(e) = self.inner.transport.send(&handshake) {
            tracing::error!("Failed to send handshake: {}", e);
        }
    }

    /// Sends a call and returns the future that settles with its result.
    ///
    /// The untyped primitive behind [`run`](Self::run). The envelope is sent
    /// before this returns; the caller owns any timeout.
    pub fn call(&self, function: &str, args: JsonValue) -> Result<PendingCall> {
        self.init();

        let id = self.inner.registry.allocate();
        let pending = self.inner.registry.register_pending(id.clone())?;
        self.inner
            .transport
            .send(&Envelope::run(id, function, args))?;
        Ok(pending)
    }

    /// Executes `function` in the peer context with `args` and returns its
    /// result.
    ///
    /// `function` is source text for a callable taking one argument. It must
    /// be self-contained: anything it needs travels in `args`.
    ///
    /// # Errors
    ///
    /// - `BridgeError::Remote` carrying the thrown message if the callable
    ///   fails in the peer
    /// - `BridgeError::JsonSerialization` if `args` or the result do not
    ///   convert
    pub async fn run<A, T>(&self, function: &str, args: A) -> Result<T>
    where
        A: Serialize,
        T: DeserializeOwned,
    {
        let args = serde_json::to_value(args)?;
        let value = self.call(function, args)?.await?;
        Ok(serde_json::from_value(value)?)
    }

    /// [`run`](Self::run) with an empty object as the arguments.
    pub async fn run_default<T: DeserializeOwned>(&self, function: &str) -> Result<T> {
        self.run(function, json!({})).await
    }

    /// Subscribes to a host event in the sandbox.
    ///
    /// On every firing the sandbox runs `function` with no arguments and
    /// `callback` receives the result. Returns once the subscription has been
    /// sent, without waiting for a firing. Firings whose result does not
    /// deserialize into `T` are logged and skipped.
    pub fn on<T, F, Fut>(&self, event: &str, function: &str, callback: F) -> Result<Subscription>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.init();

        let event_name: Arc<str> = Arc::from(event);
        let callback = Arc::new(callback);
        // User code only runs once the dispatcher's callback worker polls the future.
        let callback: Callback = Arc::new(move |value: JsonValue| {
            let callback = Arc::clone(&callback);
            let event_name = Arc::clone(&event_name);
            async move {
                match serde_json::from_value::<T>(value) {
                    Ok(value) => callback(value).await,
                    Err(e) => tracing::warn!("Dropping {} firing: {}", event_name, e),
                }
            }
            .boxed()
        });

        let id = self.inner.registry.allocate();
        self.inner.registry.register_callback(id.clone(), callback)?;
        if let Err(e) = self
            .inner
            .transport
            .send(&Envelope::on(id.clone(), event, function))
        {
            self.inner.registry.forget(&id);
            return Err(e);
        }

        Ok(Subscription {
            id,
            registry: Arc::downgrade(&self.inner.registry),
        })
    }

    /// Shows a toast in the editor.
    pub async fn notify(&self, message: &str, options: Option<NotifyOptions>) -> Result<()> {
        self.run(scripts::NOTIFY, json!({ "message": message, "options": options }))
            .await
    }

    /// Resizes the plugin panel. Dimensions are floored in the sandbox.
    pub async fn resize_ui(&self, width: f64, height: f64) -> Result<()> {
        self.run(scripts::RESIZE_UI, json!({ "width": width, "height": height }))
            .await
    }

    pub async fn current_user(&self) -> Result<Option<User>> {
        self.run_default(scripts::GET_CURRENT_USER).await
    }

    /// Whether the host can decode video. Any failure in the probe reads as
    /// `false`.
    pub async fn supports_video(&self) -> Result<bool> {
        self.run_default(scripts::SUPPORTS_VIDEO).await
    }

    /// Reads a client storage value. A missing key reads as `None`.
    pub async fn get_client_storage<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let value: JsonValue = self.run(scripts::GET_CLIENT_STORAGE, key).await?;
        match value {
            JsonValue::Null => Ok(None),
            value => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    pub async fn set_client_storage<V: Serialize>(&self, key: &str, value: V) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.run(scripts::SET_CLIENT_STORAGE, json!({ "key": key, "value": value }))
            .await
    }

    pub async fn delete_client_storage(&self, key: &str) -> Result<()> {
        self.run(scripts::DELETE_CLIENT_STORAGE, key).await
    }

    pub async fn keys_client_storage(&self) -> Result<Vec<String>> {
        self.run_default(scripts::KEYS_CLIENT_STORAGE).await
    }

    /// Forwards a call to `figma.<function>(...args)` in the sandbox.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::UnsupportedHostFunction` when the sandbox's
    /// handshake has arrived and did not advertise `function`. Before the
    /// handshake every catalog function is forwarded.
    pub async fn call_host(&self, function: HostFunction, args: Vec<JsonValue>) -> Result<JsonValue> {
        self.init();

        if !self.inner.advertised.permits(function.name()) {
            return Err(BridgeError::UnsupportedHostFunction(function.name().to_string()));
        }

        self.run(scripts::PASS_THROUGH, json!({ "name": function.name(), "args": args }))
            .await
    }

    /// Catalog functions the sandbox advertised, or `None` before its
    /// handshake arrives. Advertised names outside the catalog are skipped.
    pub fn advertised_host_functions(&self) -> Option<Vec<HostFunction>> {
        let names: HashSet<String> = self.inner.advertised.snapshot()?;
        Some(
            HostFunction::ALL
                .iter()
                .copied()
                .filter(|f| names.contains(f.name()))
                .collect(),
        )
    }

    /// Number of calls still waiting on the peer.
    pub fn pending_calls(&self) -> usize {
        self.inner.registry.pending_count()
    }

    /// Number of live subscriptions.
    pub fn subscriptions(&self) -> usize {
        self.inner.registry.callback_count()
    }
}

/// Handle to a subscription made with [`Bridge::on`].
///
/// Dropping the handle leaves the subscription running; call
/// [`unsubscribe`](Self::unsubscribe) to stop delivering firings. The sandbox
/// keeps firing, since the protocol has no way to cancel a subscription, and
/// later firings are ignored.
#[derive(Debug)]
pub struct Subscription {
    id: CallId,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> &CallId {
        &self.id
    }

    /// Stops delivering firings to the callback. Returns `false` if the
    /// bridge is gone or the subscription was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.forget(&self.id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figma_scene_common::transport::MemoryChannel;

    #[test]
    fn test_user_deserializes_camel_case() {
        let user: User = serde_json::from_value(json!({
            "id": "1",
            "name": "Ada",
            "photoUrl": "https://example.com/a.png",
            "color": "#ff0000",
            "sessionId": 42
        }))
        .unwrap();

        assert_eq!(user.photo_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(user.session_id, Some(42));
    }

    #[test]
    fn test_notify_options_skip_unset_fields() {
        let options = NotifyOptions {
            timeout: Some(1500.0),
            error: None,
        };
        assert_eq!(serde_json::to_value(options).unwrap(), json!({"timeout": 1500.0}));
    }

    #[test]
    fn test_build_requires_runtime() {
        let (ui, _sandbox) = MemoryChannel::pair();
        assert!(matches!(
            BridgeBuilder::new(ui).build(),
            Err(BridgeError::NoRuntime(_))
        ));
    }

    #[tokio::test]
    async fn test_role_follows_host_presence() {
        let (ui, sandbox) = MemoryChannel::pair();
        let ui = BridgeBuilder::new(ui).build().unwrap();
        assert_eq!(ui.role(), Role::Ui);

        let err = BridgeBuilder::new(sandbox).role(Role::Sandbox).build();
        assert!(matches!(err, Err(BridgeError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_second_listener_is_refused() {
        let (ui, _sandbox) = MemoryChannel::pair();
        let channel: Arc<dyn Channel> = Arc::new(ui);
        let _first = BridgeBuilder::from_arc(Arc::clone(&channel)).build().unwrap();

        assert!(matches!(
            BridgeBuilder::from_arc(channel).build(),
            Err(BridgeError::ListenerTaken)
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let (ui, _sandbox) = MemoryChannel::pair();
        let config = BridgeConfig::new().with_limits(
            figma_scene_sandbox::ScriptLimits::new().with_recursion_limit(0),
        );
        assert!(matches!(
            BridgeBuilder::new(ui).config(config).build(),
            Err(BridgeError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_callback() {
        let (ui, _sandbox) = MemoryChannel::pair();
        let bridge = BridgeBuilder::new(ui).build().unwrap();

        let subscription = bridge
            .on("selectionchange", "() => 1", |_: JsonValue| async {})
            .unwrap();
        assert_eq!(bridge.subscriptions(), 1);

        assert!(subscription.unsubscribe());
        assert_eq!(bridge.subscriptions(), 0);
    }
}
