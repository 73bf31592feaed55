//! Progress WebSocket control protocol.
//!
//! Control frames are tagged JSON objects. Progress events themselves travel
//! as bare [`ProgressEvent`] objects with no envelope, so the two are told
//! apart on the client by [`InboundFrame`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::ProgressEvent;

/// Control frame from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe this session to a tenant's progress stream
    JoinTenant { tenant_id: String },
    /// Unsubscribe this session from a tenant's progress stream
    LeaveTenant { tenant_id: String },
    /// Keep-alive
    Ping,
}

/// Control frame from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { session_id: Uuid },
    /// Join acknowledged; the session is now a subscriber
    Joined { tenant_id: String },
    /// Leave acknowledged
    Left { tenant_id: String },
    /// Keep-alive response
    Pong,
    /// Protocol error; fatal for this session
    Error {
        message: String,
        code: Option<String>,
    },
}

/// Anything the client can receive on the stream.
///
/// Control frames carry a `type` tag and win the untagged race; a bare
/// progress object has `tenantId`/`step` instead and falls through.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    /// Tagged control frame
    Control(ServerMessage),
    /// Bare progress event
    Progress(ProgressEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::ProvisioningStep;

    #[test]
    fn test_client_message_tags() {
        let join = ClientMessage::JoinTenant {
            tenant_id: "acme".to_string(),
        };
        let json = serde_json::to_string(&join).unwrap();
        assert!(json.contains("\"type\":\"join_tenant\""));
        assert!(json.contains("\"tenant_id\":\"acme\""));
    }

    #[test]
    fn test_inbound_frame_distinguishes_control_from_progress() {
        let control: InboundFrame =
            serde_json::from_str(r#"{"type":"joined","tenant_id":"acme"}"#).unwrap();
        assert!(matches!(
            control,
            InboundFrame::Control(ServerMessage::Joined { .. })
        ));

        let event = ProgressEvent::step("acme", ProvisioningStep::Activating, "almost there");
        let json = serde_json::to_string(&event).unwrap();
        let progress: InboundFrame = serde_json::from_str(&json).unwrap();
        match progress {
            InboundFrame::Progress(event) => {
                assert_eq!(event.decoded_step(), ProvisioningStep::Activating);
            }
            InboundFrame::Control(_) => panic!("expected progress frame"),
        }
    }

    #[test]
    fn test_pong_round_trip() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        let frame: InboundFrame = serde_json::from_str(&json).unwrap();
        assert!(matches!(frame, InboundFrame::Control(ServerMessage::Pong)));
    }
}
