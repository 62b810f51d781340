//! Headless driver: runs the simulation against an in-memory scene with scripted steering.

use std::time::Duration;

use anyhow::Result;
use game::hud::LogHud;
use game::{GameConfig, GameContext, Phase};
use input::{ElementState, InputMapper, KeyBindings, KeyCode};
use renderer::SceneTree;

const FRAME: Duration = Duration::from_micros(16_667);
/// Seconds between steering changes in the scripted run.
const STEER_PERIOD: u64 = 4;
/// Stop once a launched train is this many planet radii from the centre.
const LAUNCH_EXIT_RADII: f32 = 3.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seconds: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 60,
    };
    let config = GameConfig::load();
    log::info!("Starting orbital train, {} simulated seconds", seconds);

    let mut scene = SceneTree::new();
    let mut game = GameContext::new(config, &mut scene);
    let mut hud = LogHud::new();
    let mut input = InputMapper::new(KeyBindings::default());

    let frames = seconds * 60;
    for frame in 0..frames {
        // Weave: left, straight, right, straight.
        if frame % (STEER_PERIOD * 60) == 0 {
            for event in input.release_all() {
                game.handle_input(event);
            }
            let key = match (frame / (STEER_PERIOD * 60)) % 4 {
                0 => Some(KeyCode::ArrowLeft),
                2 => Some(KeyCode::ArrowRight),
                _ => None,
            };
            if let Some(event) = key.and_then(|k| input.process_keyboard(k, ElementState::Pressed)) {
                game.handle_input(event);
            }
        }

        game.frame(FRAME, &mut scene, &mut hud);
        scene.take_removed();

        if frame % 600 == 0 {
            log::info!("{} | {} scene nodes", hud.summary(), scene.node_count());
        }
        let altitude = game.train().locomotive().position.length();
        if game.phase() == Phase::Launching && altitude > LAUNCH_EXIT_RADII * game.planet().radius() {
            log::info!("Train left the planet");
            break;
        }
    }

    log::info!(
        "Finished after {:.1}s: {} collisions, {} bonus, phase {:?}",
        game.time().elapsed_seconds(),
        game.collisions(),
        game.bonus(),
        game.phase()
    );
    Ok(())
}
