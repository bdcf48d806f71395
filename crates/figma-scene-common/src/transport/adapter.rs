use std::sync::Arc;

use super::channel::{Channel, Inbound};
use crate::protocol::error::Result;
use crate::protocol::{Envelope, Role};

/// Role-aware view of a [`Channel`] that speaks envelopes.
///
/// Sending renders the envelope the way its role hands messages to the host
/// (wrapped and addressed to any listener from the UI, bare from the
/// sandbox). Receiving filters the inbound queue down to recognisable
/// envelopes.
#[derive(Clone)]
pub struct TransportAdapter {
    role: Role,
    channel: Arc<dyn Channel>,
}

impl TransportAdapter {
    pub fn new(role: Role, channel: Arc<dyn Channel>) -> Self {
        Self { role, channel }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Hands an envelope to the host. Fire-and-forget.
    pub fn send(&self, envelope: &Envelope) -> Result<()> {
        let message = envelope.to_message(self.role)?;
        tracing::debug!(
            "Sending {} (id: {:?})",
            envelope.action.as_str(),
            envelope.id.as_ref().map(|id| id.as_str())
        );
        self.channel.post(message);
        Ok(())
    }

    /// Registers the single inbound listener.
    pub fn receive(&self) -> Result<Envelopes> {
        Ok(Envelopes {
            inbound: self.channel.take_inbound()?,
        })
    }
}

/// Lazy sequence of inbound envelopes, in arrival order.
pub struct Envelopes {
    inbound: Inbound,
}

impl Envelopes {
    /// Waits for the next recognisable envelope.
    ///
    /// Messages without the envelope marker are skipped silently. Returns
    /// `None` once the channel has closed.
    pub async fn next(&mut self) -> Option<Envelope> {
        loop {
            let message = self.inbound.recv().await?;
            match Envelope::from_message(&message) {
                Some(envelope) => return Some(envelope),
                None => tracing::trace!("Ignoring non-envelope message"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Action, CallId};
    use crate::transport::MemoryChannel;
    use serde_json::json;

    #[tokio::test]
    async fn test_adapters_exchange_envelopes() {
        let (ui, sandbox) = MemoryChannel::pair();
        let ui = TransportAdapter::new(Role::Ui, Arc::new(ui));
        let sandbox = TransportAdapter::new(Role::Sandbox, Arc::new(sandbox));
        let mut sandbox_inbound = sandbox.receive().unwrap();
        let mut ui_inbound = ui.receive().unwrap();

        let call = Envelope::run(CallId::from("abc"), "(x)=>x+1", json!(5));
        ui.send(&call).unwrap();
        assert_eq!(sandbox_inbound.next().await.unwrap(), call);

        let reply = Envelope::ret(CallId::from("abc"), json!(6));
        sandbox.send(&reply).unwrap();
        assert_eq!(ui_inbound.next().await.unwrap(), reply);
    }

    #[tokio::test]
    async fn test_receive_skips_foreign_messages() {
        let (ui, sandbox) = MemoryChannel::pair();
        let ui = TransportAdapter::new(Role::Ui, Arc::new(ui));
        let mut inbound = ui.receive().unwrap();

        sandbox.post(json!({"type": "selection", "count": 2}));
        sandbox.post(json!({"id": "abc", "return": 6}));
        sandbox.post(json!({"action": "figma-scene-error", "id": "abc", "error": "boom"}));

        let envelope = inbound.next().await.unwrap();
        assert_eq!(envelope.action, Action::Error);
        assert_eq!(envelope.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_receive_ends_when_channel_closes() {
        let (ui, sandbox) = MemoryChannel::pair();
        let ui = TransportAdapter::new(Role::Ui, Arc::new(ui));
        let mut inbound = ui.receive().unwrap();
        drop(sandbox);

        assert!(inbound.next().await.is_none());
    }
}
