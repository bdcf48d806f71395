//! Tests for the protocol module
//!
//! These tests pin down the wire format shared with the JavaScript side of the
//! bridge, identifier generation, and the inbound marker filter.

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_call_id_uniqueness() {
        let ids: HashSet<_> = (0..1000).map(|_| CallId::generate()).collect();
        assert_eq!(ids.len(), 1000, "All call IDs should be unique");
    }

    #[test]
    fn test_call_id_is_uuid_text() {
        let id = CallId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_run_envelope_wire_shape() {
        let envelope = Envelope::run(CallId::from("abc"), "(x)=>x+1", json!(5));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "figma-scene-run",
                "id": "abc",
                "function": "(x)=>x+1",
                "args": 5
            })
        );
    }

    #[test]
    fn test_return_envelope_uses_return_field() {
        let envelope = Envelope::ret(CallId::from("abc"), json!(6));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, json!({"action": "figma-scene-return", "id": "abc", "return": 6}));
    }

    #[test]
    fn test_ui_handshake_has_no_id() {
        let value = serde_json::to_value(Envelope::init()).unwrap();
        assert_eq!(value, json!({"action": "figma-scene-init"}));
    }

    #[test]
    fn test_advertise_carries_function_names() {
        let envelope = Envelope::advertise(vec!["createRectangle".into(), "getNodeById".into()]);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["functions"], json!(["createRectangle", "getNodeById"]));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_ui_message_is_wrapped_for_any_listener() {
        let message = Envelope::init().to_message(Role::Ui).unwrap();
        assert_eq!(
            message,
            json!({"pluginMessage": {"action": "figma-scene-init"}, "pluginId": "*"})
        );
    }

    #[test]
    fn test_sandbox_message_is_bare() {
        let envelope = Envelope::error(Some(CallId::from("abc")), "boom");
        let message = envelope.to_message(Role::Sandbox).unwrap();
        assert_eq!(message, json!({"action": "figma-scene-error", "id": "abc", "error": "boom"}));
    }

    #[test]
    fn test_from_message_unwraps_plugin_message() {
        let message = json!({
            "pluginMessage": {"action": "figma-scene-return", "id": "abc", "return": 6},
            "pluginId": "123"
        });
        let envelope = Envelope::from_message(&message).unwrap();
        assert_eq!(envelope.action, Action::Return);
        assert_eq!(envelope.id, Some(CallId::from("abc")));
        assert_eq!(envelope.return_value, Some(json!(6)));
    }

    #[test]
    fn test_from_message_ignores_missing_action() {
        assert!(Envelope::from_message(&json!({"id": "abc", "return": 6})).is_none());
        assert!(Envelope::from_message(&json!({"pluginMessage": {"type": "resize"}})).is_none());
        assert!(Envelope::from_message(&json!({"pluginMessage": null})).is_none());
        assert!(Envelope::from_message(&json!("hello")).is_none());
    }

    #[test]
    fn test_from_message_ignores_foreign_actions() {
        assert!(Envelope::from_message(&json!({"action": "other-plugin-run", "id": "x"})).is_none());
        assert!(Envelope::from_message(&json!({"action": 42})).is_none());
    }

    #[test]
    fn test_null_return_reads_as_absent() {
        let envelope =
            Envelope::from_message(&json!({"action": "figma-scene-return", "id": "a", "return": null}))
                .unwrap();
        assert_eq!(envelope.return_value, None);
    }

    #[test]
    fn test_role_detection() {
        assert_eq!(Role::detect(true), Role::Ui);
        assert_eq!(Role::detect(false), Role::Sandbox);
    }

    #[test]
    fn test_action_names_match_serde() {
        for action in [Action::Init, Action::Run, Action::On, Action::Return, Action::Error] {
            assert_eq!(serde_json::to_value(action).unwrap(), json!(action.as_str()));
        }
    }
}
