//! In-process authoritative relay
//!
//! Stands in for the remote relay service so the full protocol can be
//! exercised headlessly: owns room rosters, resolves hit reports
//! authoritatively, and fans events out to connected peers as JSON frames
//! over plain channels, exactly as they would travel over a socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use glam::Vec3;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::combat::{CombatSystem, RESPAWN_DELAY_MS};
use crate::game::player::MAX_HEALTH;
use crate::net::protocol::{
    decode_client, encode_server, ClientMsg, Orientation, PeerInfo, RoomInfo, ServerMsg,
};
use crate::util::rate_limit::PeerRateLimiter;
use crate::util::time::unix_millis;

/// Maximum peers per room
pub const MAX_ROOM_PLAYERS: usize = 8;

/// Spawn points cycled through on join and respawn
const SPAWN_POINTS: [Vec3; 5] = [
    Vec3::new(0.0, 2.0, 0.0),
    Vec3::new(8.0, 2.0, 8.0),
    Vec3::new(-8.0, 2.0, 8.0),
    Vec3::new(8.0, 2.0, -8.0),
    Vec3::new(-8.0, 2.0, -8.0),
];

/// Authoritative record for one connected peer
#[derive(Debug, Clone)]
struct PeerRecord {
    name: String,
    room: Option<String>,
    position: Vec3,
    orientation: Orientation,
    health: u32,
    alive: bool,
    score: u32,
}

impl PeerRecord {
    fn new() -> Self {
        Self {
            name: String::new(),
            room: None,
            position: SPAWN_POINTS[0],
            orientation: Orientation {
                yaw: 0.0,
                pitch: 0.0,
            },
            health: MAX_HEALTH,
            alive: true,
            score: 0,
        }
    }

    fn info(&self, id: Uuid) -> PeerInfo {
        PeerInfo {
            id,
            name: self.name.clone(),
            position: self.position,
            health: self.health,
            alive: self.alive,
            score: self.score,
        }
    }
}

struct PeerEntry {
    record: PeerRecord,
    tx: mpsc::Sender<String>,
    limiter: PeerRateLimiter,
}

/// Channel pair handed to a connecting client
pub struct PeerConnection {
    pub peer_id: Uuid,
    /// Client-to-relay frames
    pub outbound_tx: mpsc::Sender<String>,
    /// Relay-to-client frames
    pub inbound_rx: mpsc::Receiver<String>,
}

/// Registry of connected peers and their authoritative combat state
pub struct RelayHub {
    peers: DashMap<Uuid, PeerEntry>,
    spawn_cursor: AtomicUsize,
}

impl RelayHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            peers: DashMap::new(),
            spawn_cursor: AtomicUsize::new(0),
        })
    }

    pub fn connected_peers(&self) -> usize {
        self.peers.len()
    }

    fn next_spawn(&self) -> Vec3 {
        let index = self.spawn_cursor.fetch_add(1, Ordering::Relaxed);
        SPAWN_POINTS[index % SPAWN_POINTS.len()]
    }

    /// Accept a connection: assigns an identity, sends the welcome frame,
    /// and spawns the reader task for the peer's outbound channel
    pub fn connect(self: &Arc<Self>) -> PeerConnection {
        let peer_id = Uuid::new_v4();
        let (to_client_tx, inbound_rx) = mpsc::channel(256);
        let (outbound_tx, mut from_client_rx) = mpsc::channel::<String>(256);

        self.peers.insert(
            peer_id,
            PeerEntry {
                record: PeerRecord::new(),
                tx: to_client_tx,
                limiter: PeerRateLimiter::new(),
            },
        );

        info!(peer_id = %peer_id, "peer connected");

        self.send_to(
            peer_id,
            &ServerMsg::Welcome {
                player_id: peer_id,
                server_time: unix_millis(),
            },
        );

        let hub = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(frame) = from_client_rx.recv().await {
                hub.handle_frame(peer_id, &frame);
            }
            hub.disconnect(peer_id);
        });

        PeerConnection {
            peer_id,
            outbound_tx,
            inbound_rx,
        }
    }

    /// Drop a peer and tell its room
    pub fn disconnect(&self, peer_id: Uuid) {
        let Some((_, entry)) = self.peers.remove(&peer_id) else {
            return;
        };
        info!(peer_id = %peer_id, "peer disconnected");

        if let Some(room) = entry.record.room {
            self.broadcast(&room, &ServerMsg::PlayerLeft { player_id: peer_id }, Some(peer_id));
        }
    }

    fn handle_frame(self: &Arc<Self>, peer_id: Uuid, frame: &str) {
        {
            let Some(entry) = self.peers.get(&peer_id) else {
                return;
            };
            if !entry.limiter.check_frame() {
                warn!(peer_id = %peer_id, "rate limited inbound frame");
                return;
            }
        }

        match decode_client(frame) {
            Ok(ClientMsg::JoinRoom {
                room_id,
                player_name,
            }) => self.handle_join(peer_id, room_id, player_name),
            Ok(ClientMsg::PlayerUpdate {
                position,
                orientation,
            }) => self.handle_update(peer_id, position, orientation),
            Ok(ClientMsg::PlayerShoot {
                origin,
                direction,
                timestamp: _,
            }) => self.handle_shoot(peer_id, origin, direction),
            Ok(ClientMsg::PlayerHit { target_id, damage }) => {
                self.handle_hit(peer_id, target_id, damage)
            }
            Err(e) => {
                warn!(peer_id = %peer_id, error = %e, "failed to parse client frame");
            }
        }
    }

    fn handle_join(&self, peer_id: Uuid, room_id: String, player_name: String) {
        let occupancy = self
            .peers
            .iter()
            .filter(|e| e.value().record.room.as_deref() == Some(room_id.as_str()))
            .count();
        if occupancy >= MAX_ROOM_PLAYERS {
            self.send_to(
                peer_id,
                &ServerMsg::JoinRoomError {
                    message: format!("room {room_id} is full"),
                },
            );
            return;
        }

        let spawn = self.next_spawn();
        let joined_info = {
            let Some(mut entry) = self.peers.get_mut(&peer_id) else {
                return;
            };
            let record = &mut entry.record;
            record.name = player_name;
            record.room = Some(room_id.clone());
            record.position = spawn;
            record.health = MAX_HEALTH;
            record.alive = true;
            record.score = 0;
            record.info(peer_id)
        };

        let roster: Vec<PeerInfo> = self
            .peers
            .iter()
            .filter(|e| e.value().record.room.as_deref() == Some(room_id.as_str()))
            .map(|e| e.value().record.info(*e.key()))
            .collect();

        self.send_to(
            peer_id,
            &ServerMsg::JoinedRoom {
                room: RoomInfo {
                    id: room_id.clone(),
                },
                players: roster,
            },
        );

        self.broadcast(
            &room_id,
            &ServerMsg::PlayerJoined {
                player: joined_info,
            },
            Some(peer_id),
        );
    }

    fn handle_update(&self, peer_id: Uuid, position: Vec3, orientation: Orientation) {
        let room = {
            let Some(mut entry) = self.peers.get_mut(&peer_id) else {
                return;
            };
            entry.record.position = position;
            entry.record.orientation = orientation;
            entry.record.room.clone()
        };

        if let Some(room) = room {
            self.broadcast(
                &room,
                &ServerMsg::PlayerUpdate {
                    player_id: peer_id,
                    position,
                    orientation,
                },
                Some(peer_id),
            );
        }
    }

    fn handle_shoot(&self, peer_id: Uuid, origin: Vec3, direction: Vec3) {
        let room = self
            .peers
            .get(&peer_id)
            .and_then(|e| e.record.room.clone());

        if let Some(room) = room {
            self.broadcast(
                &room,
                &ServerMsg::PlayerShoot {
                    shooter_id: peer_id,
                    origin,
                    direction,
                },
                Some(peer_id),
            );
        }
    }

    /// Resolve a hit report: the relay, not the reporting client, owns
    /// the resulting health and score values
    fn handle_hit(self: &Arc<Self>, shooter_id: Uuid, target_id: Uuid, damage: u32) {
        let shooter_room = self
            .peers
            .get(&shooter_id)
            .and_then(|e| e.record.room.clone());
        let Some(room) = shooter_room else {
            return;
        };

        let resolved = {
            let Some(mut target) = self.peers.get_mut(&target_id) else {
                debug!(target_id = %target_id, "hit report for unknown peer");
                return;
            };
            if target.record.room.as_deref() != Some(room.as_str()) || !target.record.alive {
                // Stale report: target left the room or already died
                return;
            }

            let (health, killed) = CombatSystem::apply_damage(target.record.health, damage);
            target.record.health = health;
            if killed {
                target.record.alive = false;
            }
            (health, killed, target.record.score)
        };
        let (target_health, is_kill, target_score) = resolved;

        let shooter_score = {
            let Some(mut shooter) = self.peers.get_mut(&shooter_id) else {
                return;
            };
            if is_kill {
                shooter.record.score += 1;
            }
            shooter.record.score
        };

        self.broadcast(
            &room,
            &ServerMsg::PlayerHit {
                shooter_id,
                shooter_score,
                target_id,
                target_health,
                target_score,
                is_kill,
            },
            None,
        );

        if is_kill {
            self.schedule_respawn(target_id, room);
        }
    }

    /// Respawn the victim after the fixed delay. The deferred effect
    /// re-checks the peer's state at fire time: a peer that disconnected
    /// or was otherwise revived in the meantime is left alone.
    fn schedule_respawn(self: &Arc<Self>, peer_id: Uuid, room: String) {
        let hub = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(RESPAWN_DELAY_MS)).await;

            let spawn = hub.next_spawn();
            {
                let Some(mut entry) = hub.peers.get_mut(&peer_id) else {
                    return;
                };
                if entry.record.alive || entry.record.room.as_deref() != Some(room.as_str()) {
                    return;
                }
                entry.record.alive = true;
                entry.record.health = MAX_HEALTH;
                entry.record.position = spawn;
            }

            hub.broadcast(
                &room,
                &ServerMsg::PlayerRespawn {
                    player_id: peer_id,
                    position: spawn,
                    health: MAX_HEALTH,
                },
                None,
            );
        });
    }

    fn send_to(&self, peer_id: Uuid, msg: &ServerMsg) {
        let Some(entry) = self.peers.get(&peer_id) else {
            return;
        };
        let Ok(frame) = encode_server(msg) else {
            return;
        };
        if entry.tx.try_send(frame).is_err() {
            warn!(peer_id = %peer_id, "peer inbound channel full, dropping frame");
        }
    }

    fn broadcast(&self, room: &str, msg: &ServerMsg, except: Option<Uuid>) {
        let Ok(frame) = encode_server(msg) else {
            return;
        };

        let targets: Vec<mpsc::Sender<String>> = self
            .peers
            .iter()
            .filter(|e| {
                e.value().record.room.as_deref() == Some(room) && Some(*e.key()) != except
            })
            .map(|e| e.value().tx.clone())
            .collect();

        for tx in targets {
            if tx.try_send(frame.clone()).is_err() {
                debug!("dropping broadcast frame for lagging peer");
            }
        }
    }
}
