//! Server configuration loaded from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use game_core::GameConfig;
use runtime::RuntimeConfig;

/// Everything the server needs before the runtime is built.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub runtime: RuntimeConfig,
    /// Rooms opened by the demo host.
    pub room_count: usize,
    /// Directory of `*.json` map templates added to the built-in ones.
    pub template_dir: Option<PathBuf>,
    /// Template the demo rooms are created from.
    pub template_id: String,
    /// Overrides the platform cache directory for log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            room_count: 2,
            template_dir: None,
            template_id: crate::demo::ARENA_ID.to_string(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ROOM_COUNT` - Demo rooms to open (default: 2)
    /// - `TEMPLATE_DIR` - Directory of JSON map templates (default: none)
    /// - `TEMPLATE_ID` - Template used for demo rooms (default: built-in arena)
    /// - `STEP_DELAY_MS` - Pause between replayed move steps (default: 150)
    /// - `THINK_MIN_MS` / `THINK_MAX_MS` - Virtual player thinking pause (default: 400 / 1200)
    /// - `TURN_SECONDS` / `COMBAT_SECONDS` - Turn and combat clocks (default: 30 / 5)
    /// - `RNG_SEED` - Seed for reproducible sessions (default: entropy)
    /// - `LOG_DIR` - Log directory (default: platform cache directory)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(count) = read_env::<usize>("ROOM_COUNT") {
            config.room_count = count.max(1);
        }
        config.template_dir = env::var("TEMPLATE_DIR").ok().map(PathBuf::from);
        if let Ok(id) = env::var("TEMPLATE_ID") {
            config.template_id = id;
        }
        config.log_dir = env::var("LOG_DIR").ok().map(PathBuf::from);

        let runtime = &mut config.runtime;
        if let Some(ms) = read_env::<u64>("STEP_DELAY_MS") {
            runtime.step_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("THINK_MIN_MS") {
            runtime.think_min = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("THINK_MAX_MS") {
            runtime.think_max = Duration::from_millis(ms);
        }
        // think_min..=think_max must stay non-empty.
        if runtime.think_max < runtime.think_min {
            runtime.think_max = runtime.think_min;
        }
        runtime.rng_seed = read_env::<u64>("RNG_SEED");

        runtime.game_config = game_config_from_env();
        config
    }
}

fn game_config_from_env() -> GameConfig {
    let mut game = GameConfig::default();
    if let Some(seconds) = read_env::<u32>("TURN_SECONDS") {
        game.turn_seconds = seconds.max(1);
    }
    if let Some(seconds) = read_env::<u32>("COMBAT_SECONDS") {
        game.combat_seconds = seconds.max(1);
    }
    game
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
