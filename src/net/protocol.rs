//! Wire protocol message definitions
//! These are the frame types exchanged with the relay; messages are JSON
//! with a `type` tag, field order insensitive.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// View orientation carried alongside position updates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

/// Room descriptor returned on join
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: String,
}

/// Peer roster entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: Uuid,
    pub name: String,
    pub position: Vec3,
    pub health: u32,
    pub alive: bool,
    pub score: u32,
}

/// Messages sent from client to relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Request to join a room
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        player_name: String,
    },

    /// Periodic position/orientation update
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        position: Vec3,
        orientation: Orientation,
    },

    /// Announce a fired shot (peers replay it cosmetically)
    #[serde(rename_all = "camelCase")]
    PlayerShoot {
        origin: Vec3,
        direction: Vec3,
        timestamp: u64,
    },

    /// Report a locally detected hit for authoritative resolution
    #[serde(rename_all = "camelCase")]
    PlayerHit { target_id: Uuid, damage: u32 },
}

/// Messages sent from relay to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Connect-time identity assignment
    #[serde(rename_all = "camelCase")]
    Welcome { player_id: Uuid, server_time: u64 },

    /// Join confirmation with the initial peer roster
    #[serde(rename_all = "camelCase")]
    JoinedRoom {
        room: RoomInfo,
        players: Vec<PeerInfo>,
    },

    /// Join failure; a callback channel, not a protocol teardown
    #[serde(rename_all = "camelCase")]
    JoinRoomError { message: String },

    #[serde(rename_all = "camelCase")]
    PlayerJoined { player: PeerInfo },

    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: Uuid },

    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        player_id: Uuid,
        position: Vec3,
        orientation: Orientation,
    },

    /// Cosmetic shot replay from a peer
    #[serde(rename_all = "camelCase")]
    PlayerShoot {
        shooter_id: Uuid,
        origin: Vec3,
        direction: Vec3,
    },

    /// Authoritative hit outcome; payload carries post-hit values
    #[serde(rename_all = "camelCase")]
    PlayerHit {
        shooter_id: Uuid,
        shooter_score: u32,
        target_id: Uuid,
        target_health: u32,
        target_score: u32,
        is_kill: bool,
    },

    #[serde(rename_all = "camelCase")]
    PlayerRespawn {
        player_id: Uuid,
        position: Vec3,
        health: u32,
    },
}

/// Frame codec errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode_client(msg: &ClientMsg) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

pub fn decode_client(frame: &str) -> Result<ClientMsg, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Decode)
}

pub fn encode_server(msg: &ServerMsg) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(ProtocolError::Encode)
}

pub fn decode_server(frame: &str) -> Result<ServerMsg, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_tags_are_camel_case() {
        let frame = encode_client(&ClientMsg::JoinRoom {
            room_id: "default".to_string(),
            player_name: "tester".to_string(),
        })
        .unwrap();

        assert!(frame.contains("\"type\":\"joinRoom\""));
        assert!(frame.contains("\"roomId\""));
        assert!(frame.contains("\"playerName\""));
    }

    #[test]
    fn hit_payload_carries_authoritative_fields() {
        let frame = encode_server(&ServerMsg::PlayerHit {
            shooter_id: Uuid::nil(),
            shooter_score: 3,
            target_id: Uuid::nil(),
            target_health: 0,
            target_score: 1,
            is_kill: true,
        })
        .unwrap();

        for field in [
            "shooterId",
            "shooterScore",
            "targetId",
            "targetHealth",
            "targetScore",
            "isKill",
        ] {
            assert!(frame.contains(field), "missing field {field}");
        }
    }

    #[test]
    fn decode_is_field_order_insensitive() {
        let frame = r#"{"playerName":"ace","type":"joinRoom","roomId":"alpha"}"#;
        match decode_client(frame).unwrap() {
            ClientMsg::JoinRoom {
                room_id,
                player_name,
            } => {
                assert_eq!(room_id, "alpha");
                assert_eq!(player_name, "ace");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn malformed_frame_is_a_decode_error() {
        assert!(matches!(
            decode_server("{\"type\":\"noSuchThing\"}"),
            Err(ProtocolError::Decode(_))
        ));
    }
}
