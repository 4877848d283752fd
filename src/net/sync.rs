//! Peer state synchronization
//!
//! Owns the roster of remote-player mirrors: inbound events mutate it here
//! and nowhere else, and other components read cloned snapshots. Outbound
//! sends are fire-and-forget; while disconnected they are dropped with a
//! warning rather than queued.

use std::collections::HashMap;

use glam::Vec3;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::protocol::{encode_client, ClientMsg, Orientation, PeerInfo, ServerMsg};

/// Local read-mostly copy of a remote player's state; not authoritative
#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub id: Uuid,
    pub name: String,
    pub position: Vec3,
    pub orientation: Orientation,
    pub health: u32,
    pub alive: bool,
    pub score: u32,
}

impl From<PeerInfo> for RemotePlayer {
    fn from(info: PeerInfo) -> Self {
        Self {
            id: info.id,
            name: info.name,
            position: info.position,
            orientation: Orientation {
                yaw: 0.0,
                pitch: 0.0,
            },
            health: info.health,
            alive: info.alive,
            score: info.score,
        }
    }
}

/// Authoritative hit outcome as carried on the wire
#[derive(Debug, Clone, Copy)]
pub struct HitOutcome {
    pub shooter_id: Uuid,
    pub shooter_score: u32,
    pub target_id: Uuid,
    pub target_health: u32,
    pub target_score: u32,
    pub is_kill: bool,
}

/// Inbound event dispatch: one method per event kind. Default bodies are
/// no-ops so consumers implement only the events they care about.
pub trait SyncHandler {
    fn on_room_joined(&mut self, _room_id: &str, _roster: &[RemotePlayer]) {}
    fn on_join_error(&mut self, _message: &str) {}
    fn on_peer_joined(&mut self, _peer: &RemotePlayer) {}
    fn on_peer_left(&mut self, _peer_id: Uuid) {}
    fn on_peer_update(&mut self, _peer: &RemotePlayer) {}
    fn on_peer_shoot(&mut self, _shooter_id: Uuid, _origin: Vec3, _direction: Vec3) {}
    fn on_peer_hit(&mut self, _hit: &HitOutcome) {}
    fn on_peer_respawn(&mut self, _peer_id: Uuid, _position: Vec3) {}
    fn on_disconnected(&mut self) {}
}

/// No-op handler for callers that only need roster upkeep
pub struct NullHandler;

impl SyncHandler for NullHandler {}

/// Connection-scoped synchronization state
#[derive(Debug)]
pub struct NetSession {
    outbound: Option<mpsc::Sender<String>>,
    connected: bool,
    local_id: Uuid,
    room_id: Option<String>,
    peers: HashMap<Uuid, RemotePlayer>,
}

impl NetSession {
    /// Session over an established connection
    pub fn connected(local_id: Uuid, outbound: mpsc::Sender<String>) -> Self {
        Self {
            outbound: Some(outbound),
            connected: true,
            local_id,
            room_id: None,
            peers: HashMap::new(),
        }
    }

    /// Offline session: every send is a no-op, the roster stays empty
    pub fn offline(local_id: Uuid) -> Self {
        Self {
            outbound: None,
            connected: false,
            local_id,
            room_id: None,
            peers: HashMap::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn local_id(&self) -> Uuid {
        self.local_id
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn peers(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.peers.values()
    }

    pub fn peer(&self, id: Uuid) -> Option<&RemotePlayer> {
        self.peers.get(&id)
    }

    /// Immutable roster copy for rendering/UI readers
    pub fn roster_snapshot(&self) -> Vec<RemotePlayer> {
        self.peers.values().cloned().collect()
    }

    pub fn join_room(&self, room_id: &str, player_name: &str) {
        self.send(&ClientMsg::JoinRoom {
            room_id: room_id.to_string(),
            player_name: player_name.to_string(),
        });
    }

    pub fn send_update(&self, position: Vec3, orientation: Orientation) {
        self.send(&ClientMsg::PlayerUpdate {
            position,
            orientation,
        });
    }

    pub fn send_shoot(&self, origin: Vec3, direction: Vec3, timestamp: u64) {
        self.send(&ClientMsg::PlayerShoot {
            origin,
            direction,
            timestamp,
        });
    }

    pub fn send_hit(&self, target_id: Uuid, damage: u32) {
        self.send(&ClientMsg::PlayerHit { target_id, damage });
    }

    fn send(&self, msg: &ClientMsg) {
        if !self.connected {
            warn!("dropping outbound message while disconnected");
            return;
        }
        let Some(outbound) = &self.outbound else {
            return;
        };
        match encode_client(msg) {
            Ok(frame) => {
                if outbound.try_send(frame).is_err() {
                    warn!("outbound channel rejected frame, dropping");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode outbound message"),
        }
    }

    /// Apply one inbound event to the roster and dispatch it
    pub fn apply<H: SyncHandler>(&mut self, msg: ServerMsg, handler: &mut H) {
        match msg {
            ServerMsg::Welcome {
                player_id,
                server_time,
            } => {
                debug!(player_id = %player_id, server_time, "relay welcome");
            }
            ServerMsg::JoinedRoom { room, players } => {
                self.room_id = Some(room.id.clone());
                self.peers = players
                    .into_iter()
                    .filter(|p| p.id != self.local_id)
                    .map(|p| (p.id, RemotePlayer::from(p)))
                    .collect();
                let roster = self.roster_snapshot();
                handler.on_room_joined(&room.id, &roster);
            }
            ServerMsg::JoinRoomError { message } => {
                warn!(error = %message, "failed to join room");
                handler.on_join_error(&message);
            }
            ServerMsg::PlayerJoined { player } => {
                if player.id == self.local_id {
                    return;
                }
                let mirror = RemotePlayer::from(player);
                let mirror = self.peers.entry(mirror.id).or_insert(mirror);
                handler.on_peer_joined(&*mirror);
            }
            ServerMsg::PlayerLeft { player_id } => {
                self.peers.remove(&player_id);
                handler.on_peer_left(player_id);
            }
            ServerMsg::PlayerUpdate {
                player_id,
                position,
                orientation,
            } => {
                // Ignored when the mirror no longer exists
                if let Some(peer) = self.peers.get_mut(&player_id) {
                    peer.position = position;
                    peer.orientation = orientation;
                    handler.on_peer_update(&*peer);
                }
            }
            ServerMsg::PlayerShoot {
                shooter_id,
                origin,
                direction,
            } => {
                if shooter_id != self.local_id {
                    handler.on_peer_shoot(shooter_id, origin, direction);
                }
            }
            ServerMsg::PlayerHit {
                shooter_id,
                shooter_score,
                target_id,
                target_health,
                target_score,
                is_kill,
            } => {
                // The payload carries post-hit authoritative values;
                // nothing is recomputed locally
                if let Some(shooter) = self.peers.get_mut(&shooter_id) {
                    shooter.score = shooter_score;
                }
                if let Some(target) = self.peers.get_mut(&target_id) {
                    target.health = target_health;
                    target.score = target_score;
                    if is_kill {
                        target.alive = false;
                    }
                }
                handler.on_peer_hit(&HitOutcome {
                    shooter_id,
                    shooter_score,
                    target_id,
                    target_health,
                    target_score,
                    is_kill,
                });
            }
            ServerMsg::PlayerRespawn {
                player_id,
                position,
                health,
            } => {
                if let Some(peer) = self.peers.get_mut(&player_id) {
                    peer.position = position;
                    peer.health = health;
                    peer.alive = true;
                }
                handler.on_peer_respawn(player_id, position);
            }
        }
    }

    /// Connection loss: clear the roster, mark disconnected. Rejoining
    /// later is always a fresh join, never a resume.
    pub fn handle_disconnect<H: SyncHandler>(&mut self, handler: &mut H) {
        if !self.connected && self.peers.is_empty() {
            return;
        }
        self.connected = false;
        self.room_id = None;
        self.peers.clear();
        handler.on_disconnected();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::RoomInfo;

    fn peer_info(id: Uuid, name: &str) -> PeerInfo {
        PeerInfo {
            id,
            name: name.to_string(),
            position: Vec3::new(0.0, 2.0, 0.0),
            health: 100,
            alive: true,
            score: 0,
        }
    }

    fn joined(local: Uuid, others: &[Uuid]) -> NetSession {
        let (tx, _rx) = mpsc::channel(16);
        let mut net = NetSession::connected(local, tx);
        let mut players: Vec<PeerInfo> = others
            .iter()
            .enumerate()
            .map(|(i, &id)| peer_info(id, &format!("peer{i}")))
            .collect();
        players.push(peer_info(local, "me"));
        net.apply(
            ServerMsg::JoinedRoom {
                room: RoomInfo {
                    id: "default".to_string(),
                },
                players,
            },
            &mut NullHandler,
        );
        net
    }

    #[test]
    fn roster_excludes_local_player() {
        let local = Uuid::new_v4();
        let other = Uuid::new_v4();
        let net = joined(local, &[other]);

        assert_eq!(net.roster_snapshot().len(), 1);
        assert!(net.peer(other).is_some());
        assert_eq!(net.room_id(), Some("default"));
    }

    #[test]
    fn update_for_unknown_mirror_is_ignored() {
        let mut net = joined(Uuid::new_v4(), &[]);
        net.apply(
            ServerMsg::PlayerUpdate {
                player_id: Uuid::new_v4(),
                position: Vec3::ONE,
                orientation: Orientation {
                    yaw: 1.0,
                    pitch: 0.0,
                },
            },
            &mut NullHandler,
        );
        assert!(net.roster_snapshot().is_empty());
    }

    #[test]
    fn authoritative_kill_flips_mirror_alive_flag() {
        let local = Uuid::new_v4();
        let shooter = Uuid::new_v4();
        let target = Uuid::new_v4();
        let mut net = joined(local, &[shooter, target]);

        net.apply(
            ServerMsg::PlayerHit {
                shooter_id: shooter,
                shooter_score: 5,
                target_id: target,
                target_health: 0,
                target_score: 2,
                is_kill: true,
            },
            &mut NullHandler,
        );

        let mirror = net.peer(target).unwrap();
        assert_eq!(mirror.health, 0);
        assert!(!mirror.alive);
        assert_eq!(net.peer(shooter).unwrap().score, 5);
    }

    #[test]
    fn respawn_resets_mirror() {
        let local = Uuid::new_v4();
        let target = Uuid::new_v4();
        let mut net = joined(local, &[target]);

        net.apply(
            ServerMsg::PlayerHit {
                shooter_id: local,
                shooter_score: 1,
                target_id: target,
                target_health: 0,
                target_score: 0,
                is_kill: true,
            },
            &mut NullHandler,
        );
        assert!(!net.peer(target).unwrap().alive);

        let spawn = Vec3::new(8.0, 2.0, -8.0);
        net.apply(
            ServerMsg::PlayerRespawn {
                player_id: target,
                position: spawn,
                health: 100,
            },
            &mut NullHandler,
        );

        let mirror = net.peer(target).unwrap();
        assert!(mirror.alive);
        assert_eq!(mirror.health, 100);
        assert_eq!(mirror.position, spawn);
    }

    #[test]
    fn disconnect_clears_roster_and_drops_sends() {
        let local = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(16);
        let mut net = NetSession::connected(local, tx);
        net.apply(
            ServerMsg::JoinedRoom {
                room: RoomInfo {
                    id: "default".to_string(),
                },
                players: vec![peer_info(Uuid::new_v4(), "peer")],
            },
            &mut NullHandler,
        );

        net.handle_disconnect(&mut NullHandler);
        assert!(!net.is_connected());
        assert!(net.roster_snapshot().is_empty());
        assert_eq!(net.room_id(), None);

        net.send_hit(Uuid::new_v4(), 25);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sends_encode_frames_while_connected() {
        let local = Uuid::new_v4();
        let (tx, mut rx) = mpsc::channel(16);
        let net = NetSession::connected(local, tx);

        net.join_room("default", "ace");
        let frame = rx.try_recv().unwrap();
        assert!(frame.contains("\"type\":\"joinRoom\""));
    }
}
