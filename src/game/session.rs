//! Client game session and the cooperative simulation loop
//!
//! One logical step computes elapsed time since the previous step, then
//! runs movement, weapon, projectile, and combat updates in that fixed
//! order. Fire-rate, reload, and respawn gates are wall-clock based, so
//! behavior is independent of frame-rate fluctuations.

use std::time::Duration;

use glam::Vec3;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::game::combat::{ScoreBoard, RESPAWN_DELAY_MS};
use crate::game::input::{InputEvent, InputState};
use crate::game::movement::MovementSystem;
use crate::game::player::{PlayerState, MAX_HEALTH};
use crate::game::projectile::{PlayerProxy, Projectile, ProjectileOwner, StepOutcome};
use crate::game::sched::{Deferred, Scheduler};
use crate::game::weapon::{Weapon, WeaponSpec, AUTO_RELOAD_DELAY_MS};
use crate::game::world::ArenaWorld;
use crate::net::protocol::{decode_server, Orientation, ServerMsg};
use crate::net::sync::{HitOutcome, NetSession, RemotePlayer, SyncHandler};
use crate::util::rate_limit::UpdatePacer;
use crate::util::time::{unix_millis, TickClock, TICK_DURATION_MICROS};

/// Typed events emitted toward rendering/HUD sinks. Pure outputs; nothing
/// feeds back into simulation state.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Local shot fired
    Shot { origin: Vec3, direction: Vec3 },
    /// Cosmetic tracer for a peer's shot
    PeerShot {
        shooter_id: Uuid,
        origin: Vec3,
        direction: Vec3,
    },
    /// A projectile struck world geometry
    Impact { point: Vec3 },
    /// A local projectile struck a peer proxy and a hit report was sent
    HitReported { target_id: Uuid, damage: u32 },
    /// Local player took authoritative damage
    DamageTaken { attacker_id: Uuid, health: u32 },
    /// Magazine or reserve changed
    AmmoChanged { magazine: u32, reserve: u32 },
    /// Local player died
    Died { killer_id: Option<Uuid> },
    /// Local player respawned
    Respawned { position: Vec3 },
    /// Kill/death counters changed
    ScoreChanged { kills: u32, deaths: u32 },
    /// Joining the requested room failed
    JoinFailed { message: String },
    /// Connection to the relay was lost
    Disconnected,
}

/// Collects the sync outcomes one inbound event produces for the session
struct SyncEffects {
    local_id: Uuid,
    peer_shots: Vec<(Uuid, Vec3, Vec3)>,
    local_hits: Vec<HitOutcome>,
    confirmed_kills: Option<u32>,
    join_error: Option<String>,
    disconnected: bool,
}

impl SyncEffects {
    fn new(local_id: Uuid) -> Self {
        Self {
            local_id,
            peer_shots: Vec::new(),
            local_hits: Vec::new(),
            confirmed_kills: None,
            join_error: None,
            disconnected: false,
        }
    }
}

impl SyncHandler for SyncEffects {
    fn on_join_error(&mut self, message: &str) {
        self.join_error = Some(message.to_string());
    }

    fn on_peer_shoot(&mut self, shooter_id: Uuid, origin: Vec3, direction: Vec3) {
        self.peer_shots.push((shooter_id, origin, direction));
    }

    fn on_peer_hit(&mut self, hit: &HitOutcome) {
        if hit.shooter_id == self.local_id {
            self.confirmed_kills = Some(hit.shooter_score);
        }
        if hit.target_id == self.local_id {
            self.local_hits.push(*hit);
        }
    }

    fn on_disconnected(&mut self) {
        self.disconnected = true;
    }
}

/// Handle for driving a spawned session
#[derive(Clone)]
pub struct SessionHandle {
    pub input_tx: mpsc::Sender<InputEvent>,
    events: broadcast::Sender<GameEvent>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }
}

/// The local simulation: player, projectiles, peer mirrors, deferred
/// effects, and the outbound side of the wire
pub struct GameSession {
    world: ArenaWorld,
    room: String,
    player: PlayerState,
    input: InputState,
    projectiles: Vec<Projectile>,
    scheduler: Scheduler,
    score: ScoreBoard,
    net: NetSession,
    pacer: UpdatePacer,
    events: Vec<GameEvent>,
}

impl GameSession {
    pub fn new(config: &Config, world: ArenaWorld, net: NetSession) -> Self {
        let seed = config.sim_seed.unwrap_or_else(unix_millis);
        let weapon = Weapon::new(WeaponSpec::rifle(), seed);
        let player = PlayerState::new(
            net.local_id(),
            config.player_name.clone(),
            config.mouse_sensitivity,
            weapon,
        );

        Self {
            world,
            room: config.room_id.clone(),
            player,
            input: InputState::new(),
            projectiles: Vec::new(),
            scheduler: Scheduler::new(),
            score: ScoreBoard::default(),
            net,
            pacer: UpdatePacer::new(),
            events: Vec::new(),
        }
    }

    /// Session without a connection; sends become no-ops
    pub fn offline(config: &Config, world: ArenaWorld) -> Self {
        Self::new(config, world, NetSession::offline(Uuid::new_v4()))
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn score(&self) -> &ScoreBoard {
        &self.score
    }

    pub fn net(&self) -> &NetSession {
        &self.net
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Fold one input event into held state
    pub fn apply_input(&mut self, event: InputEvent) {
        self.input.apply(event, &mut self.player.look);
    }

    /// Advance one simulation step and drain the events it produced
    pub fn step(&mut self, now_ms: u64, dt: f32) -> Vec<GameEvent> {
        // Deferred effects first so a due respawn re-enables this step
        for effect in self.scheduler.drain_due(now_ms) {
            match effect {
                Deferred::BeginReload => {
                    if self.player.alive && self.player.weapon.begin_reload(now_ms) {
                        debug!("automatic reload started");
                    }
                }
                Deferred::Respawn => self.respawn(),
            }
        }

        if self.player.alive {
            self.update_movement(dt);
            self.update_weapon(now_ms);
        }

        self.update_projectiles(now_ms, dt);
        self.send_position_update();

        std::mem::take(&mut self.events)
    }

    fn update_movement(&mut self, dt: f32) {
        let result = MovementSystem::step(
            self.player.position,
            self.player.velocity,
            self.player.grounded,
            &self.input.intent,
            self.player.look.yaw,
            dt,
            &self.world,
        );
        self.player.position = result.position;
        self.player.velocity = result.velocity;
        self.player.grounded = result.grounded;
    }

    fn update_weapon(&mut self, now_ms: u64) {
        if self.player.weapon.update(now_ms) {
            self.push_ammo_event();
        }

        if self.input.take_reload() {
            self.player.weapon.begin_reload(now_ms);
        }

        if self.input.fire_held {
            self.try_fire(now_ms);
        }
    }

    fn try_fire(&mut self, now_ms: u64) {
        let origin = self.player.eye_position();
        let aim = self.player.look.aim_direction();
        let Some(projectile) = self.player.weapon.fire(now_ms, origin, aim) else {
            return;
        };

        self.score.record_shot();
        self.net.send_shoot(origin, projectile.direction, now_ms);
        self.events.push(GameEvent::Shot {
            origin,
            direction: projectile.direction,
        });
        self.push_ammo_event();

        if self.player.weapon.wants_auto_reload()
            && !self.scheduler.has_pending(Deferred::BeginReload)
        {
            self.scheduler
                .schedule(now_ms + AUTO_RELOAD_DELAY_MS, Deferred::BeginReload);
        }

        self.projectiles.push(projectile);
    }

    fn update_projectiles(&mut self, now_ms: u64, dt: f32) {
        let proxies: Vec<PlayerProxy> = self
            .net
            .peers()
            .filter(|p| p.alive)
            .map(|p| PlayerProxy {
                id: p.id,
                position: p.position,
            })
            .collect();

        for projectile in &mut self.projectiles {
            let outcome = match projectile.owner {
                ProjectileOwner::Local => projectile.advance(dt, now_ms, &self.world, &proxies),
                // Cosmetic tracers terminate on geometry but never hit players
                ProjectileOwner::Remote(_) => projectile.advance(dt, now_ms, &self.world, &[]),
            };

            match outcome {
                StepOutcome::InFlight | StepOutcome::Expired => {}
                StepOutcome::HitWorld { point } => {
                    self.events.push(GameEvent::Impact { point });
                }
                StepOutcome::HitPlayer { target_id, point } => {
                    let damage = projectile.damage;
                    self.score.record_hit();
                    self.net.send_hit(target_id, damage);
                    self.events.push(GameEvent::Impact { point });
                    self.events.push(GameEvent::HitReported { target_id, damage });
                }
            }
        }

        // Sweep after all updates so removal never skips an adjacent entry
        self.projectiles.retain(|p| !p.terminal);
    }

    fn send_position_update(&mut self) {
        if self.net.is_connected() && self.pacer.ready() {
            self.net.send_update(
                self.player.position,
                Orientation {
                    yaw: self.player.look.yaw,
                    pitch: self.player.look.pitch,
                },
            );
        }
    }

    /// Apply one inbound relay event
    pub fn apply_server_event(&mut self, msg: ServerMsg, now_ms: u64) {
        let mut fx = SyncEffects::new(self.player.id);
        self.net.apply(msg, &mut fx);

        for (shooter_id, origin, direction) in fx.peer_shots {
            self.projectiles.push(Projectile::new(
                ProjectileOwner::Remote(shooter_id),
                origin,
                direction,
                0,
                self.player.weapon.spec().max_range,
                now_ms,
            ));
            self.events.push(GameEvent::PeerShot {
                shooter_id,
                origin,
                direction,
            });
        }

        if let Some(kills) = fx.confirmed_kills {
            if kills != self.score.kills {
                self.score.set_confirmed_kills(kills);
                self.events.push(GameEvent::ScoreChanged {
                    kills: self.score.kills,
                    deaths: self.score.deaths,
                });
            }
        }

        for hit in fx.local_hits {
            self.apply_authoritative_hit(&hit, now_ms);
        }

        if let Some(message) = fx.join_error {
            warn!(error = %message, "join failed");
            self.events.push(GameEvent::JoinFailed { message });
        }
    }

    /// The relay's post-hit values are applied verbatim, never recomputed
    fn apply_authoritative_hit(&mut self, hit: &HitOutcome, now_ms: u64) {
        self.player.health = hit.target_health.min(MAX_HEALTH);
        self.events.push(GameEvent::DamageTaken {
            attacker_id: hit.shooter_id,
            health: self.player.health,
        });

        if hit.is_kill && self.player.alive {
            self.die(Some(hit.shooter_id), now_ms);
        }
    }

    fn die(&mut self, killer_id: Option<Uuid>, now_ms: u64) {
        self.player.alive = false;
        self.player.health = 0;
        self.score.record_death();
        self.input.clear();
        self.events.push(GameEvent::Died { killer_id });
        self.events.push(GameEvent::ScoreChanged {
            kills: self.score.kills,
            deaths: self.score.deaths,
        });

        if !self.scheduler.has_pending(Deferred::Respawn) {
            self.scheduler
                .schedule(now_ms + RESPAWN_DELAY_MS, Deferred::Respawn);
        }
    }

    fn respawn(&mut self) {
        // A reset may have superseded the pending respawn
        if self.player.alive {
            return;
        }
        self.player.reset();
        self.events.push(GameEvent::Respawned {
            position: self.player.position,
        });
        self.push_ammo_event();
    }

    /// Match restart: invalidates every deferred effect before touching
    /// state, so stale timers can never land on the fresh session
    pub fn reset(&mut self) {
        self.scheduler.invalidate();
        self.projectiles.clear();
        self.player.reset();
        self.score.reset();
        self.input.clear();
    }

    /// Connection loss: roster cleared, session marked disconnected;
    /// later reconnects are fresh joins
    pub fn handle_disconnect(&mut self) {
        let mut fx = SyncEffects::new(self.player.id);
        self.net.handle_disconnect(&mut fx);
        if fx.disconnected {
            self.events.push(GameEvent::Disconnected);
        }
    }

    fn push_ammo_event(&mut self) {
        self.events.push(GameEvent::AmmoChanged {
            magazine: self.player.weapon.magazine(),
            reserve: self.player.weapon.reserve(),
        });
    }

    /// Spawn the cooperative session loop; `frames` is the inbound side
    /// of the connection
    pub fn spawn(self, frames: mpsc::Receiver<String>) -> SessionHandle {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(256);

        let handle = SessionHandle {
            input_tx,
            events: event_tx.clone(),
        };

        tokio::spawn(self.run(input_rx, frames, event_tx));

        handle
    }

    async fn run(
        mut self,
        mut input_rx: mpsc::Receiver<InputEvent>,
        mut frames: mpsc::Receiver<String>,
        events_tx: broadcast::Sender<GameEvent>,
    ) {
        info!(player_id = %self.player.id, room = %self.room, "session started");

        if self.net.is_connected() {
            let room = self.room.clone();
            let name = self.player.name.clone();
            self.net.join_room(&room, &name);
        }

        let mut tick = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = TickClock::new();

        'session: loop {
            tick.tick().await;
            let now_ms = unix_millis();

            // Drain pending inputs
            loop {
                match input_rx.try_recv() {
                    Ok(event) => self.apply_input(event),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        info!(player_id = %self.player.id, "input channel closed, session ending");
                        break 'session;
                    }
                }
            }

            // Drain inbound frames; a closed channel is a connection loss
            loop {
                match frames.try_recv() {
                    Ok(frame) => match decode_server(&frame) {
                        Ok(msg) => self.apply_server_event(msg, now_ms),
                        Err(e) => {
                            warn!(player_id = %self.player.id, error = %e, "failed to parse relay frame");
                        }
                    },
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.handle_disconnect();
                        break;
                    }
                }
            }

            let dt = clock.delta();
            for event in self.step(now_ms, dt) {
                let _ = events_tx.send(event);
            }
        }
    }

    /// Roster snapshot for rendering/UI readers
    pub fn roster(&self) -> Vec<RemotePlayer> {
        self.net.roster_snapshot()
    }
}
