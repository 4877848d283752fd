//! Configuration module - environment variable parsing
//!
//! Out-of-range values are clamped to their valid range rather than
//! rejected; a missing or unparseable variable falls back to its default.

use std::env;

/// Mouse sensitivity bounds (multiplier over the base look rate)
pub const MIN_SENSITIVITY: f32 = 0.1;
pub const MAX_SENSITIVITY: f32 = 5.0;

/// Bot count bound for the headless arena runner; matches room capacity
pub const MAX_BOTS: usize = 8;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Room to join at startup
    pub room_id: String,
    /// Display name announced to peers
    pub player_name: String,
    /// Mouse sensitivity multiplier
    pub mouse_sensitivity: f32,
    /// Seed for the session RNG (recoil spread, spawn scatter)
    pub sim_seed: Option<u64>,
    /// Number of bot players for the headless arena runner
    pub bot_count: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let room_id = env::var("ROOM_ID").unwrap_or_else(|_| "default".to_string());

        let player_name = match env::var("PLAYER_NAME") {
            Ok(name) if !name.trim().is_empty() => name,
            _ => "anonymous".to_string(),
        };

        let mouse_sensitivity = env::var("MOUSE_SENSITIVITY")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(1.0)
            .clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);

        let sim_seed = env::var("SIM_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        let bot_count = env::var("BOT_COUNT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(3)
            .clamp(1, MAX_BOTS);

        Self {
            log_level,
            room_id,
            player_name,
            mouse_sensitivity,
            sim_seed,
            bot_count,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            room_id: "default".to_string(),
            player_name: "anonymous".to_string(),
            mouse_sensitivity: 1.0,
            sim_seed: None,
            bot_count: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_is_clamped() {
        env::set_var("MOUSE_SENSITIVITY", "250.0");
        let config = Config::from_env();
        assert_eq!(config.mouse_sensitivity, MAX_SENSITIVITY);
        env::remove_var("MOUSE_SENSITIVITY");
    }

    #[test]
    fn blank_player_name_falls_back() {
        env::set_var("PLAYER_NAME", "   ");
        let config = Config::from_env();
        assert_eq!(config.player_name, "anonymous");
        env::remove_var("PLAYER_NAME");
    }
}
