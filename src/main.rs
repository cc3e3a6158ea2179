//! Star Survivor entry point
//!
//! On the web this exports a tick-driven handle the presentation layer calls
//! every animation frame. Natively it runs a headless autopilot session.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use serde::Serialize;
    use wasm_bindgen::prelude::*;

    use star_survivor::consts::*;
    use star_survivor::platform::{Direction, InputState, LocalStore, NoAds};
    use star_survivor::sim::{
        BossPhase, BossProjectile, Enemy, GameEvent, PowerUp, Projectile, TickInput,
    };
    use star_survivor::progression::kills_for_level;
    use star_survivor::{GameContext, GameError, Tuning};

    /// What the renderer needs to draw one frame
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct FrameView<'a> {
        elapsed_ms: f64,
        lives: u8,
        kills: u64,
        /// Kills that complete the current level
        kills_needed: u64,
        gold: u64,
        combo: u32,
        level: u32,
        game_over: bool,
        player: [f32; 2],
        player_visible: bool,
        rapid_fire: bool,
        enemies: &'a [Enemy],
        projectiles: &'a [Projectile],
        boss_projectiles: &'a [BossProjectile],
        power_ups: &'a [PowerUp],
        boss: &'a BossPhase,
    }

    fn parse_direction(name: &str) -> Option<Direction> {
        match name {
            "left" | "ArrowLeft" => Some(Direction::Left),
            "right" | "ArrowRight" => Some(Direction::Right),
            "up" | "ArrowUp" => Some(Direction::Up),
            "down" | "ArrowDown" => Some(Direction::Down),
            _ => None,
        }
    }

    fn to_js(e: GameError) -> JsValue {
        JsValue::from_str(&e.to_string())
    }

    fn browser_confirm(message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    /// Game instance holding all state
    #[wasm_bindgen]
    pub struct WebGame {
        ctx: GameContext,
        keys: InputState,
        buttons: InputState,
        autopilot: bool,
        accumulator: f64,
        events: Vec<GameEvent>,
    }

    #[wasm_bindgen]
    impl WebGame {
        #[wasm_bindgen(constructor)]
        pub fn new() -> WebGame {
            let seed = js_sys::Date::now() as u64;
            let ctx = GameContext::load(
                Box::new(LocalStore),
                Box::new(NoAds),
                Tuning::default(),
                seed,
            )
            .with_confirm_prompt(Box::new(browser_confirm));
            log::info!("Profile {} ready", ctx.profile().name);

            Self {
                ctx,
                keys: InputState::default(),
                buttons: InputState::default(),
                autopilot: false,
                accumulator: 0.0,
                events: Vec::new(),
            }
        }

        /// Physical keyboard state
        pub fn set_key(&mut self, name: &str, pressed: bool) {
            if let Some(dir) = parse_direction(name) {
                self.keys.set(dir, pressed);
            }
        }

        /// On-screen button state
        pub fn set_button(&mut self, name: &str, pressed: bool) {
            if let Some(dir) = parse_direction(name) {
                self.buttons.set(dir, pressed);
            }
        }

        pub fn set_autopilot(&mut self, on: bool) {
            self.autopilot = on;
        }

        pub fn unlock_card(&mut self) -> Result<(), JsValue> {
            self.ctx.unlock_card().map_err(to_js)
        }

        pub fn start(&mut self) -> Result<(), JsValue> {
            self.accumulator = 0.0;
            self.events.clear();
            self.ctx.start_session().map_err(to_js)?;
            Ok(())
        }

        /// Back to the main menu
        pub fn menu(&mut self) {
            self.ctx.end_session();
            self.events.clear();
        }

        pub fn request_continue(&mut self) -> Result<(), JsValue> {
            self.ctx.request_continue().map_err(to_js)
        }

        /// Run fixed simulation steps for `dt_ms` of frame time
        pub fn update(&mut self, dt_ms: f64) {
            let dt_ms = dt_ms.clamp(0.0, 100.0);
            if self.ctx.poll_continue().is_some() {
                self.accumulator = 0.0;
            }

            self.accumulator += dt_ms;
            let input = TickInput {
                movement: self.keys.merge(self.buttons),
                autopilot: self.autopilot,
            };
            let mut substeps = 0;
            while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
                let events = self.ctx.tick(&input, SIM_DT_MS);
                self.events.extend(events);
                self.accumulator -= SIM_DT_MS;
                substeps += 1;
            }
        }

        /// Events since the last call, as a JSON array
        pub fn take_events(&mut self) -> String {
            let events = std::mem::take(&mut self.events);
            serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
        }

        /// Current frame as JSON, `null` outside a session
        pub fn frame(&self) -> String {
            let Some(session) = self.ctx.session() else {
                return "null".to_string();
            };
            let view = FrameView {
                elapsed_ms: session.elapsed_ms,
                lives: session.lives,
                kills: session.current_kills,
                kills_needed: kills_for_level(self.ctx.profile().level, &self.ctx.tuning),
                gold: self.ctx.profile().gold,
                combo: session.combo.count,
                level: self.ctx.profile().level,
                game_over: !session.is_running(),
                player: session.player.pos.to_array(),
                player_visible: session.player_flash_visible(),
                rapid_fire: session.rapid_fire_until_ms.is_some(),
                enemies: &session.entities.enemies,
                projectiles: &session.entities.projectiles,
                boss_projectiles: &session.entities.boss_projectiles,
                power_ups: &session.entities.power_ups,
                boss: &session.boss,
            };
            serde_json::to_string(&view).unwrap_or_else(|_| "null".to_string())
        }

        pub fn profile(&self) -> String {
            serde_json::to_string(self.ctx.profile()).unwrap_or_else(|_| "null".to_string())
        }

        pub fn leaderboard(&self) -> String {
            serde_json::to_string(self.ctx.leaderboard()).unwrap_or_else(|_| "[]".to_string())
        }

        pub fn summary(&self) -> String {
            serde_json::to_string(&self.ctx.last_summary()).unwrap_or_else(|_| "null".to_string())
        }

        pub fn world_width(&self) -> f32 {
            WORLD_WIDTH
        }

        pub fn world_height(&self) -> f32 {
            WORLD_HEIGHT
        }
    }

    impl Default for WebGame {
        fn default() -> Self {
            Self::new()
        }
    }

    pub fn init() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
        }
        log::info!("Star Survivor starting...");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::init();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Simulated time limit of the headless run
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_LIMIT_MS: f64 = 10.0 * 60.0 * 1000.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use star_survivor::GameContext;
    use star_survivor::Tuning;
    use star_survivor::consts::SIM_DT_MS;
    use star_survivor::platform::{FileStore, KeyValueStore, MemoryStore, NoAds};
    use star_survivor::sim::{GameEvent, TickInput};

    env_logger::init();
    log::info!("Star Survivor (native) starting...");

    // Optional save directory, otherwise nothing is written to disk
    let backend: Box<dyn KeyValueStore> = match std::env::args().nth(1) {
        Some(dir) => {
            log::info!("Saving to {}", dir);
            Box::new(FileStore::new(dir))
        }
        None => Box::new(MemoryStore::new()),
    };
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut ctx = GameContext::load(backend, Box::new(NoAds), Tuning::default(), seed);
    if let Err(e) = ctx.unlock_card() {
        log::error!("Cannot play: {}", e);
        return;
    }
    if let Err(e) = ctx.start_session() {
        log::error!("Cannot play: {}", e);
        return;
    }

    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };
    let mut elapsed = 0.0;
    while elapsed < HEADLESS_LIMIT_MS {
        let events = ctx.tick(&input, SIM_DT_MS);
        elapsed += SIM_DT_MS;
        for event in &events {
            match event {
                GameEvent::LevelUp { level, .. } => println!("Level {}", level),
                GameEvent::BossDefeated { wave, gold } => {
                    println!("Boss wave {} defeated (+{} gold)", wave, gold)
                }
                _ => {}
            }
        }
        if events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })) {
            break;
        }
    }

    match ctx.last_summary() {
        Some(summary) => println!(
            "Game over after {:.1}s: {} kills, {} gold, rank {}",
            summary.elapsed_ms / 1000.0,
            summary.kills,
            summary.gold_earned,
            summary
                .rank
                .map(|r| format!("#{}", r))
                .unwrap_or_else(|| "-".to_string())
        ),
        None => {
            let kills = ctx.session().map(|s| s.current_kills).unwrap_or(0);
            println!("Survived the time limit with {} kills", kills);
            ctx.end_session();
        }
    }
    println!(
        "{}: level {}, {} gold",
        ctx.profile().name,
        ctx.profile().level,
        ctx.profile().gold
    );
    if let Some(leader) = ctx.leaderboard().leader() {
        println!("Leader: {} ({} this month)", leader.name, leader.monthly_score);
    }
}
