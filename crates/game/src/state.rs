//! Game state: every simulation object plus the per-frame update that ties them together.

use std::time::Duration;

use engine_core::{MicroStepper, Time};
use input::GameInput;
use procgen::{PlanetSurface, SurfaceConfig};
use renderer::{Material, MeshData, NodeId, SceneGraph};

use crate::assets::{spawn_model_load, AssetSlot};
use crate::camera_rig::CameraRig;
use crate::config::GameConfig;
use crate::hud::HudSink;
use crate::planet::Planet;
use crate::player::Player;
use crate::rails::Rails;
use crate::smoke::SmokeTrail;
use crate::train::Train;

/// Loaded models are authored in millimetres.
pub const MODEL_SCALE: f32 = 0.001;
/// Damage flash decay per second.
const DAMAGE_DECAY: f32 = 2.0;
const TRAIN_COLOR: u32 = 0x2f4f6f;
/// Seconds between extrapolated samples while launching.
pub const LAUNCH_INTERVAL: f32 = 1.0 / 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Running the player ahead at high speed until the track window is full.
    Priming,
    Running,
    /// Collision budget spent; the train leaves the planet on its own.
    Launching,
}

/// Everything the frame callback mutates.
pub struct GameContext {
    config: GameConfig,
    phase: Phase,
    paused: bool,
    time: Time,
    stepper: MicroStepper,
    launch_stepper: MicroStepper,
    player: Player,
    rails: Rails,
    planet: Planet,
    train: Train,
    smoke: SmokeTrail,
    camera: CameraRig,
    collisions: u32,
    bonus: u32,
    damage: f32,
    locomotive_model: Option<AssetSlot<MeshData>>,
    wagon_model: Option<AssetSlot<MeshData>>,
    coal_wagon_model: Option<AssetSlot<MeshData>>,
}

impl GameContext {
    /// Build the world under the scene root and start any model loads.
    pub fn new(config: GameConfig, scene: &mut impl SceneGraph) -> Self {
        let root = scene.root();
        let surface = PlanetSurface::new(SurfaceConfig {
            radius: config.planet_radius,
            relief: config.surface_relief,
            frequency: config.surface_frequency,
        });
        let planet = Planet::new(
            scene,
            root,
            surface,
            config.building_count,
            config.crate_count,
            config.seed,
        );
        let player = Player::new(config.planet_radius).with_turn_rate(config.turn_rate);
        let rails = Rails::new(scene, root);
        let train = Train::new(scene, root);
        let smoke = SmokeTrail::new(scene, root);
        let camera = CameraRig::new(
            config.camera_mode,
            config.camera_distance,
            config.camera_height,
            config.planet_radius,
        );
        let locomotive_model = config.locomotive_model.clone().map(|path| spawn_model_load(path));
        let wagon_model = config.wagon_model.clone().map(|path| spawn_model_load(path));
        let coal_wagon_model = config.coal_wagon_model.clone().map(|path| spawn_model_load(path));
        log::info!("Game initialized (seed {}, radius {})", config.seed, config.planet_radius);

        Self {
            stepper: MicroStepper::new(config.micro_step, config.max_steps_per_frame),
            launch_stepper: MicroStepper::new(LAUNCH_INTERVAL, config.max_steps_per_frame),
            config,
            phase: Phase::Priming,
            paused: false,
            time: Time::new(),
            player,
            rails,
            planet,
            train,
            smoke,
            camera,
            collisions: 0,
            bonus: 0,
            damage: 0.0,
            locomotive_model,
            wagon_model,
            coal_wagon_model,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    pub fn bonus(&self) -> u32 {
        self.bonus
    }

    /// Damage flash intensity, 1 right after a hit.
    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn rails(&self) -> &Rails {
        &self.rails
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }

    pub fn train(&self) -> &Train {
        &self.train
    }

    pub fn smoke(&self) -> &SmokeTrail {
        &self.smoke
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn handle_input(&mut self, input: GameInput) {
        match input {
            GameInput::StartSteerLeft => self.player.start_move_left(),
            GameInput::StopSteerLeft => self.player.end_move_left(),
            GameInput::StartSteerRight => self.player.start_move_right(),
            GameInput::StopSteerRight => self.player.end_move_right(),
            GameInput::ToggleDebugCamera => self.camera.toggle_debug(),
            GameInput::TogglePause => {
                self.paused = !self.paused;
                log::info!("{}", if self.paused { "Paused" } else { "Resumed" });
            }
        }
    }

    /// Stop steering and send the train off the planet.
    pub fn launch(&mut self) {
        if self.phase == Phase::Launching {
            return;
        }
        log::info!(
            "Launching train after {} collisions, {} bonus",
            self.collisions,
            self.bonus
        );
        self.launch_stepper.reset();
        self.phase = Phase::Launching;
    }

    /// Advance the game by one host frame.
    pub fn frame(&mut self, duration: Duration, scene: &mut impl SceneGraph, hud: &mut impl HudSink) {
        self.time.update(duration);
        if self.paused {
            return;
        }
        let dt = duration.as_secs_f32();
        self.poll_assets(scene);

        match self.phase {
            Phase::Priming => {
                for _ in 0..self.config.priming_steps_per_frame {
                    self.step_player(scene);
                }
                if self.rails.is_loaded() {
                    log::info!("Track primed, {} train samples", self.train.history().len());
                    self.stepper.reset();
                    self.phase = Phase::Running;
                }
            }
            Phase::Running => {
                let steps = self.stepper.advance(dt * self.config.speed);
                for _ in 0..steps {
                    self.step_player(scene);
                }
            }
            Phase::Launching => {
                for _ in 0..self.launch_stepper.advance(dt) {
                    if !self.train.launch_into_space() {
                        break;
                    }
                }
            }
        }
        if self.phase != Phase::Launching {
            self.train.set_position(self.player.absolute_position());
        }
        self.train.apply_to_scene(scene);

        self.camera.update(&self.player);
        let eye = self.camera.eye();
        self.planet.reduce_buildings(scene, eye);

        if self.phase == Phase::Running {
            self.check_collisions(scene);
        }
        self.planet.update_hit(scene, dt);
        self.damage = (self.damage - dt * DAMAGE_DECAY).max(0.0);
        self.smoke.update(scene, self.train.locomotive(), eye, dt);

        hud.set_collisions(self.collisions);
        hud.set_bonus(self.bonus);
        hud.set_frame_time(dt * 1000.0);
        hud.set_damage(self.damage);
    }

    /// One micro-step of the player, fanned out to everything that samples its path.
    fn step_player(&mut self, scene: &mut impl SceneGraph) {
        self.player.update(self.stepper.step());
        self.player.record_path();
        let pose = self.player.absolute_pose();
        self.rails.add_point(scene, pose.position, pose.rotation);
        self.train.add_point(pose.position, pose.rotation);
    }

    fn check_collisions(&mut self, scene: &mut impl SceneGraph) {
        let tip = self.train.tip_position();
        let speed_factor = self.config.speed * self.planet.radius();
        if self
            .planet
            .check_collision(scene, tip, self.train.direction(), speed_factor)
        {
            self.collisions += 1;
            self.damage = 1.0;
            if self.collisions >= self.config.max_collisions {
                self.launch();
            }
        }
        if self.planet.check_collision_crate(scene, tip) {
            self.bonus += 1;
        }
    }

    /// Hang any models that finished loading under the train nodes.
    fn poll_assets(&mut self, scene: &mut impl SceneGraph) {
        if let Some(mesh) = self.locomotive_model.as_mut().and_then(AssetSlot::poll) {
            attach_model(scene, self.train.locomotive_node(), mesh);
        }
        // The first wagon carries the coal.
        if let Some(mesh) = self.coal_wagon_model.as_mut().and_then(AssetSlot::poll) {
            if let Some(&node) = self.train.wagon_nodes().first() {
                attach_model(scene, node, mesh);
            }
        }
        if let Some(mesh) = self.wagon_model.as_mut().and_then(AssetSlot::poll) {
            for &node in self.train.wagon_nodes().iter().skip(1) {
                attach_model(scene, node, mesh.clone());
            }
        }
    }
}

fn attach_model(scene: &mut impl SceneGraph, parent: NodeId, mesh: MeshData) {
    let node = scene.create_node(parent);
    scene.set_mesh(node, mesh.scaled(MODEL_SCALE), Material::from_hex(TRAIN_COLOR));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hud::LogHud;
    use renderer::SceneTree;

    const FRAME: Duration = Duration::from_millis(16);

    fn new_game(config: GameConfig) -> (SceneTree, GameContext) {
        let mut scene = SceneTree::new();
        let game = GameContext::new(config, &mut scene);
        (scene, game)
    }

    fn empty_world() -> GameConfig {
        GameConfig {
            building_count: 0,
            crate_count: 0,
            ..Default::default()
        }
    }

    /// Largest |x| over the vertices of the model hung under `node`.
    fn attached_extent(scene: &SceneTree, node: NodeId) -> f32 {
        let child = scene.children(node)[0];
        let mesh = scene.mesh(child).unwrap();
        mesh.vertices.iter().map(|v| v.position().x.abs()).fold(0.0, f32::max)
    }

    fn prime(game: &mut GameContext, scene: &mut SceneTree, hud: &mut LogHud) {
        for _ in 0..100 {
            if game.phase() != Phase::Priming {
                return;
            }
            game.frame(FRAME, scene, hud);
        }
        panic!("track never primed");
    }

    #[test]
    fn priming_fills_track_then_runs() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        assert_eq!(game.phase(), Phase::Priming);
        prime(&mut game, &mut scene, &mut hud);
        assert_eq!(game.phase(), Phase::Running);
        assert!(game.rails().is_loaded());
        assert!(game.train().history().len() > 40);
    }

    /// Work per frame follows frame duration, not frame count.
    #[test]
    fn running_frames_advance_by_speed() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        prime(&mut game, &mut scene, &mut hud);
        let before = game.player().absolute_position();
        for _ in 0..10 {
            game.frame(Duration::from_millis(100), &mut scene, &mut hud);
        }
        // One second at 0.1 rad/s on radius 10 is about one unit of arc.
        let moved = game.player().absolute_position().distance(before);
        assert!((moved - 1.0).abs() < 0.05, "moved {}", moved);
    }

    #[test]
    fn pause_freezes_simulation() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        prime(&mut game, &mut scene, &mut hud);
        game.handle_input(GameInput::TogglePause);
        let before = game.player().absolute_position();
        game.frame(Duration::from_millis(500), &mut scene, &mut hud);
        assert_eq!(game.player().absolute_position(), before);
        game.handle_input(GameInput::TogglePause);
        game.frame(Duration::from_millis(500), &mut scene, &mut hud);
        assert_ne!(game.player().absolute_position(), before);
    }

    #[test]
    fn steering_input_reaches_player() {
        let (_, mut game) = new_game(empty_world());
        game.handle_input(GameInput::StartSteerRight);
        assert_eq!(game.player().steering(), -1.0);
        game.handle_input(GameInput::StopSteerRight);
        assert_eq!(game.player().steering(), 0.0);
        game.handle_input(GameInput::ToggleDebugCamera);
        assert!(game.camera().is_debug());
    }

    #[test]
    fn launch_keeps_train_moving_without_player() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        prime(&mut game, &mut scene, &mut hud);
        game.launch();
        assert_eq!(game.phase(), Phase::Launching);
        let player_before = game.player().absolute_position();
        let samples = game.train().history().len();
        let radius_before = game.train().locomotive().position.length();
        for _ in 0..2 {
            game.frame(Duration::from_millis(500), &mut scene, &mut hud);
        }
        assert_eq!(game.player().absolute_position(), player_before);
        assert_eq!(game.train().history().len(), samples + 64);
        assert!(game.train().locomotive().position.length() > radius_before);
    }

    #[test]
    fn launched_train_leaves_the_planet() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        prime(&mut game, &mut scene, &mut hud);
        game.launch();
        for _ in 0..10 {
            game.frame(Duration::from_secs(1), &mut scene, &mut hud);
        }
        let radius = game.planet().radius();
        assert!(game.train().locomotive().position.length() > 3.0 * radius);
        for wagon in game.train().wagons() {
            assert!(wagon.position.length() > 2.0 * radius);
        }
    }

    /// Launch distance follows elapsed time, not the number of frames.
    #[test]
    fn launch_pace_is_independent_of_frame_rate() {
        let launched = |frames: u32, frame: Duration| {
            let (mut scene, mut game) = new_game(empty_world());
            let mut hud = LogHud::new();
            prime(&mut game, &mut scene, &mut hud);
            game.launch();
            let samples = game.train().history().len();
            for _ in 0..frames {
                game.frame(frame, &mut scene, &mut hud);
            }
            (game.train().history().len() - samples, game.train().locomotive().position)
        };
        let (fast, fast_position) = launched(8, Duration::from_millis(125));
        let (slow, slow_position) = launched(1, Duration::from_secs(1));
        assert_eq!(fast, 64);
        assert_eq!(slow, 64);
        assert!(fast_position.distance(slow_position) < 1e-4);
    }

    #[test]
    fn hud_receives_counters() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        game.frame(FRAME, &mut scene, &mut hud);
        assert_eq!(hud.collisions, 0);
        assert_eq!(hud.bonus, 0);
        assert!((hud.frame_time - 16.0).abs() < 1e-3);
    }

    #[test]
    fn damage_flash_decays() {
        let (mut scene, mut game) = new_game(empty_world());
        let mut hud = LogHud::new();
        game.damage = 1.0;
        game.frame(Duration::from_millis(250), &mut scene, &mut hud);
        assert!((game.damage() - 0.5).abs() < 1e-5);
        game.frame(Duration::from_secs(1), &mut scene, &mut hud);
        assert_eq!(game.damage(), 0.0);
    }

    /// A dense planet gets hit while running, and enough hits trigger the launch.
    #[test]
    fn collisions_count_and_trigger_launch() {
        let config = GameConfig {
            building_count: 3000,
            crate_count: 0,
            max_collisions: 2,
            ..Default::default()
        };
        let (mut scene, mut game) = new_game(config);
        let mut hud = LogHud::new();
        prime(&mut game, &mut scene, &mut hud);
        for _ in 0..2000 {
            if game.phase() == Phase::Launching {
                break;
            }
            game.frame(Duration::from_millis(50), &mut scene, &mut hud);
        }
        assert_eq!(game.phase(), Phase::Launching);
        assert_eq!(game.collisions(), 2);
        assert_eq!(hud.collisions, 2);
        assert_eq!(game.planet().hit_buildings().len(), 2);
    }

    #[test]
    fn missing_models_leave_train_nodes_empty() {
        let config = GameConfig {
            locomotive_model: Some("does/not/exist.glb".into()),
            coal_wagon_model: Some("does/not/exist_either.glb".into()),
            ..empty_world()
        };
        let (mut scene, mut game) = new_game(config);
        let mut hud = LogHud::new();
        for _ in 0..20 {
            game.frame(FRAME, &mut scene, &mut hud);
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(scene.children(game.train().locomotive_node()).is_empty());
        assert!(scene.children(game.train().wagon_nodes()[0]).is_empty());
    }

    #[test]
    fn loaded_models_are_attached_scaled() {
        let (mut scene, mut game) = new_game(empty_world());
        let (wagon_tx, wagon) = AssetSlot::channel("wagon");
        let (coal_tx, coal) = AssetSlot::channel("coal wagon");
        game.wagon_model = Some(wagon);
        game.coal_wagon_model = Some(coal);
        wagon_tx.send(Ok(MeshData::cuboid(engine_core::Vec3::splat(1000.0)))).unwrap();
        coal_tx.send(Ok(MeshData::cuboid(engine_core::Vec3::splat(2000.0)))).unwrap();
        let mut hud = LogHud::new();
        game.frame(FRAME, &mut scene, &mut hud);

        let wagons = game.train().wagon_nodes();
        assert_eq!(scene.children(wagons[0]).len(), 1);
        assert!((attached_extent(&scene, wagons[0]) - 1.0).abs() < 1e-4);
        for &node in &wagons[1..] {
            assert_eq!(scene.children(node).len(), 1);
            assert!((attached_extent(&scene, node) - 0.5).abs() < 1e-4);
        }
        assert!(scene.children(game.train().locomotive_node()).is_empty());
    }

    /// Terrain relief moves building bases off the mean radius and bumps the planet mesh.
    #[test]
    fn surface_relief_shapes_planet_and_buildings() {
        let config = GameConfig {
            building_count: 50,
            crate_count: 0,
            surface_relief: 0.3,
            ..Default::default()
        };
        let (scene, game) = new_game(config);
        let radius = game.planet().radius();
        let bases: Vec<f32> = game
            .planet()
            .buildings()
            .iter()
            .map(|b| b.world_position().length())
            .collect();
        assert!(bases.iter().any(|h| (h - radius).abs() > 1e-3));
        assert!(bases.iter().all(|h| (h - radius).abs() <= 0.3 + 1e-4));

        let mesh = scene.mesh(game.planet().root_node()).unwrap();
        let (low, high) = mesh
            .vertices
            .iter()
            .map(|v| v.position().length())
            .fold((f32::MAX, f32::MIN), |(lo, hi), r| (lo.min(r), hi.max(r)));
        assert!(high - low > 1e-2, "flat planet: {}..{}", low, high);
        assert!(low >= radius - 0.3 - 1e-3 && high <= radius + 0.3 + 1e-3);

        let (flat_scene, flat) = new_game(GameConfig {
            surface_relief: 0.0,
            ..empty_world()
        });
        let flat_mesh = flat_scene.mesh(flat.planet().root_node()).unwrap();
        assert!(flat_mesh
            .vertices
            .iter()
            .all(|v| (v.position().length() - radius).abs() < 1e-4));
    }
}
