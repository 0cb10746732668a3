//! The frame orchestrator: camera, streaming, collision snapshot, entity
//! updates, two-phase removal, score and the menu.
//!
//! One `frame` call runs everything in strict order. Nothing suspends
//! mid-frame; the embedding application feeds input events between frames
//! and draws from the entity lists afterwards.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, vec2};
use log::info;

use crate::collision::SolidRect;
use crate::entity::{
    Bullet, Button, DrawSurface, Entity, EntityRef, FrameCtx, Input, InputEvent, Particle, Player,
    Signal, TileEntity, TileEvent,
};
use crate::rect::Rect;
use crate::world::chunk::TileKind;
use crate::world::World;

pub const FPS: f32 = 60.0;
pub const VIEW_W: f32 = 1280.0;
pub const VIEW_H: f32 = 880.0;

/// Vertical kill lines. Falling past the lower one always kills; drifting
/// past the upper one only kills under inverted gravity.
const KILL_BELOW: f32 = 1160.0;
const KILL_ABOVE: f32 = -100.0;

const MENU_SPAWN: Vec2 = vec2(240.0, 520.0);
const RUN_SPAWN: Vec2 = vec2(80.0, 640.0);

const SCORE_DIV: f32 = 10.0;
const SCORE_DECAY: f32 = 0.25;
const SCORE_IDLE_FRAMES: u32 = 20;

/// Shard velocities thrown when a tile breaks.
const SHARD_VELS: [Vec2; 4] = [
    vec2(-4.0, -10.0),
    vec2(-1.0, -12.0),
    vec2(2.0, -11.0),
    vec2(5.0, -9.0),
];
const SHARD_SIZE: f32 = 14.0;
const SHARD_LIFE_MS: u32 = 700;

const CAMERA_SPEED: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Menu,
    Running,
}

/// What the in-world menu beacons are bound to, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Settings,
    Leaderboard,
    Quit,
}

const MENU_ACTIONS: [MenuAction; 4] = [
    MenuAction::Play,
    MenuAction::Settings,
    MenuAction::Leaderboard,
    MenuAction::Quit,
];

/// Smooth-follow camera with environment-dependent vertical bands.
pub struct Camera {
    pub pos: Vec2,
    pub fixed_x: bool,
    pub fixed_y: bool,
}

impl Camera {
    pub fn new() -> Self {
        Camera {
            pos: vec2(0.0, 390.0),
            fixed_x: false,
            fixed_y: false,
        }
    }

    fn y_band(environment: &str) -> (f32, f32) {
        if environment == "moon" {
            (280.0, 390.0)
        } else {
            (100.0, 390.0)
        }
    }

    fn follow(&mut self, target_center: Vec2, environment: &str, frame_scale: f32) {
        let target = target_center - vec2(VIEW_W, VIEW_H) / 2.0;
        let step = (CAMERA_SPEED * frame_scale).min(1.0);
        if !self.fixed_x {
            self.pos.x += (target.x - self.pos.x) * step;
        }
        if !self.fixed_y {
            self.pos.y += (target.y - self.pos.y) * step;
            let (lo, hi) = Self::y_band(environment);
            self.pos.y = self.pos.y.clamp(lo, hi);
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera::new()
    }
}

/// Everything a frame reports back to the embedding application.
#[derive(Clone, Debug, Default)]
pub struct FrameOutput {
    pub died: bool,
    pub score: u32,
    pub menu_action: Option<MenuAction>,
    pub environment: String,
    pub transition_progress: f32,
}

pub struct Game {
    world: World,
    player: Player,
    input: Input,
    camera: Camera,
    mode: GameMode,
    /// Static and cosmetic entities, including tiles from materialized
    /// chunks.
    objects: Vec<EntityRef>,
    /// Roaming hazards: monsters and bullets. Contact kills the player.
    monsters: Vec<EntityRef>,
    /// Slot registry backing this frame's collision snapshot.
    collidables: Vec<EntityRef>,
    menu_beacons: Vec<(EntityRef, MenuAction)>,
    time_ms: u32,
    score: f32,
    max_x: f32,
    idle_frames: u32,
}

impl Game {
    pub fn new(world: World) -> Result<Self, String> {
        let mut game = Game {
            world,
            player: Player::new(MENU_SPAWN),
            input: Input::new(),
            camera: Camera::new(),
            mode: GameMode::Menu,
            objects: Vec::new(),
            monsters: Vec::new(),
            collidables: Vec::new(),
            menu_beacons: Vec::new(),
            time_ms: 0,
            score: 0.0,
            max_x: 0.0,
            idle_frames: 0,
        };
        game.enter_menu()?;
        Ok(game)
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Read-only view over every live entity, the player excluded. A
    /// renderer reads rect, tag, style and flags through this and combines
    /// them with the world's neighbour queries.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.objects.iter().chain(self.monsters.iter())
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        self.input.feed(event);
    }

    /// Rebuilds the menu area and parks the player in it.
    fn enter_menu(&mut self) -> Result<(), String> {
        self.world.generate_menu()?;
        self.objects.clear();
        self.monsters.clear();
        self.collidables.clear();
        self.menu_beacons.clear();

        let anchor = MENU_SPAWN;
        for id in self.world.active_chunks(anchor) {
            let made = self.world.materialize(id)?;
            self.objects.extend(made.entities);
            self.monsters.extend(made.monsters);
        }

        let mut beacons: Vec<EntityRef> = self
            .objects
            .iter()
            .filter(|e| e.borrow().tag() == Some(TileKind::Beacon))
            .cloned()
            .collect();
        beacons.sort_by(|a, b| {
            a.borrow()
                .rect()
                .pos
                .x
                .total_cmp(&b.borrow().rect().pos.x)
        });
        self.menu_beacons = beacons.into_iter().zip(MENU_ACTIONS).collect();

        self.player.respawn(MENU_SPAWN);
        self.camera = Camera::new();
        self.mode = GameMode::Menu;
        Ok(())
    }

    /// Leaves the menu and arms the streaming world.
    fn start_run(&mut self) {
        info!("run started");
        self.world.quit_menu();
        self.objects.clear();
        self.monsters.clear();
        self.collidables.clear();
        self.menu_beacons.clear();
        self.player.respawn(RUN_SPAWN);
        self.camera = Camera::new();
        self.score = 0.0;
        self.max_x = RUN_SPAWN.x;
        self.idle_frames = 0;
        self.mode = GameMode::Running;
    }

    pub fn score(&self) -> u32 {
        self.score.max(0.0) as u32
    }

    /// Advances the whole game by one frame of `dt_ms` milliseconds.
    pub fn frame(&mut self, dt_ms: u32) -> Result<FrameOutput, String> {
        self.time_ms += dt_ms;
        let frame_scale = dt_ms as f32 * FPS / 1000.0;
        let mut output = FrameOutput::default();

        // camera and environment come first so physics and visuals read the
        // same blend for the whole frame
        let anchor = self.player.rect().center();
        let environment = self.world.environment_at(anchor);
        self.camera.follow(anchor, &environment, frame_scale);
        output.environment = environment;
        output.transition_progress = self.world.transition_progress(anchor).1;

        // chunk streaming
        for id in self.world.active_chunks(anchor) {
            let made = self.world.materialize(id)?;
            if made.fresh {
                self.objects.extend(made.entities);
                self.monsters.extend(made.monsters);
            }
        }

        // collision snapshot rebuild
        self.collidables.clear();
        let mut solids: Vec<SolidRect> = Vec::new();
        for e in &self.objects {
            let b = e.borrow();
            if b.flags().suppress_collision {
                continue;
            }
            solids.push(SolidRect {
                rect: b.collider(),
                kind: b.tag().unwrap_or(TileKind::Color),
                slot: self.collidables.len(),
            });
            drop(b);
            self.collidables.push(e.clone());
        }

        // update pass: collect kill intents, apply them afterwards
        let mut spawns: Vec<EntityRef> = Vec::new();
        let mut tile_events: Vec<TileEvent> = Vec::new();
        let mut kills: Vec<EntityRef> = Vec::new();
        {
            let mut ctx = FrameCtx {
                world: &mut self.world,
                solids: &solids,
                input: &self.input,
                frame_scale,
                time_ms: self.time_ms,
                player_rect: self.player.rect(),
                spawns: &mut spawns,
                tile_events: &mut tile_events,
            };
            self.player.update(&mut ctx);
            ctx.player_rect = self.player.rect();
            for e in &self.objects {
                if let Some(Signal::Kill) = e.borrow_mut().update(&mut ctx) {
                    kills.push(e.clone());
                }
            }
            for m in &self.monsters {
                if let Some(Signal::Kill) = m.borrow_mut().update(&mut ctx) {
                    kills.push(m.clone());
                }
            }
        }

        let player_rect = self.player.rect();

        // beacon press state from standing in the zone, then landing events
        for (beacon, _) in &self.menu_beacons {
            let mut b = beacon.borrow_mut();
            if let Some(tile) = b.as_any_mut().downcast_mut::<TileEntity>() {
                let over = tile
                    .button_zone()
                    .map(|z| z.intersects(&player_rect))
                    .unwrap_or(false);
                tile.pressed = over;
            }
        }
        for ev in &tile_events {
            let TileEvent::Landed(slot) = *ev;
            let Some(ent) = self.collidables.get(slot).cloned() else {
                continue;
            };
            let tag = ent.borrow().tag();
            match tag {
                Some(k) if k.breakable() => {
                    Self::break_tile(&ent, &mut spawns);
                }
                Some(TileKind::Beacon) => {
                    if let Some(tile) =
                        ent.borrow_mut().as_any_mut().downcast_mut::<TileEntity>()
                    {
                        tile.pressed = true;
                    }
                }
                _ => {}
            }
        }

        // second phase: removals collected during the update pass
        for dead in &kills {
            if dead.borrow().tag().is_some() {
                self.world.remove_tile(dead);
            }
            self.objects.retain(|e| !Rc::ptr_eq(e, dead));
            self.monsters.retain(|e| !Rc::ptr_eq(e, dead));
        }
        for spawned in spawns {
            if spawned.borrow().as_any().is::<Bullet>() {
                self.monsters.push(spawned);
            } else {
                self.objects.push(spawned);
            }
        }

        match self.mode {
            GameMode::Menu => {
                // the lower kill line applies in the menu area too; past the
                // side chunks there is no floor
                if player_rect.pos.y > KILL_BELOW {
                    output.died = true;
                    self.player.respawn(MENU_SPAWN);
                }
                if self.input.just_pressed(Button::Confirm) {
                    let armed = self
                        .menu_beacons
                        .iter()
                        .find(|(b, _)| {
                            b.borrow()
                                .as_any()
                                .downcast_ref::<TileEntity>()
                                .map(|t| t.pressed)
                                .unwrap_or(false)
                        })
                        .map(|(_, action)| *action);
                    if let Some(action) = armed {
                        output.menu_action = Some(action);
                        if action == MenuAction::Play {
                            self.start_run();
                        }
                    }
                }
            }
            GameMode::Running => {
                self.update_score(player_rect.pos.x);
                if self.check_death(player_rect) {
                    info!("player died at x={:.0}", player_rect.pos.x);
                    output.died = true;
                    output.score = self.score();
                    self.enter_menu()?;
                }
            }
        }

        if !output.died {
            output.score = self.score();
        }
        self.input.end_frame();
        Ok(output)
    }

    fn break_tile(tile: &EntityRef, spawns: &mut Vec<EntityRef>) {
        let already = tile
            .borrow()
            .as_any()
            .downcast_ref::<TileEntity>()
            .map(|t| t.is_dying())
            .unwrap_or(true);
        if already {
            return;
        }
        let (rect, color) = {
            let b = tile.borrow();
            (b.rect(), b.color())
        };
        tile.borrow_mut().kill();
        for vel in SHARD_VELS {
            spawns.push(Rc::new(RefCell::new(Particle::new(
                rect.center(),
                Vec2::splat(SHARD_SIZE),
                vel,
                color,
                SHARD_LIFE_MS,
            ))));
        }
    }

    fn update_score(&mut self, x: f32) {
        if x > self.max_x {
            self.score += (x - self.max_x) / SCORE_DIV;
            self.max_x = x;
            self.idle_frames = 0;
        } else {
            self.idle_frames += 1;
            if self.idle_frames > SCORE_IDLE_FRAMES {
                self.score = (self.score - SCORE_DECAY).max(0.0);
            }
        }
    }

    fn check_death(&self, player_rect: Rect) -> bool {
        if player_rect.pos.y > KILL_BELOW {
            return true;
        }
        let center = player_rect.center();
        if self.world.inverted_at(center) && player_rect.bottom() < KILL_ABOVE {
            return true;
        }
        for m in &self.monsters {
            if m.borrow().rect().intersects(&player_rect) {
                return true;
            }
        }
        for e in &self.objects {
            let b = e.borrow();
            if b.tag() == Some(TileKind::Spike) && b.collider().intersects(&player_rect) {
                return true;
            }
        }
        false
    }

    /// Draws every live entity and the player, camera-relative.
    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        let offset = -self.camera.pos;
        for e in &self.objects {
            let b = e.borrow();
            if b.flags().suppress_draw {
                continue;
            }
            b.draw(surface, offset);
        }
        for m in &self.monsters {
            m.borrow().draw(surface, offset);
        }
        self.player.draw(surface, offset);
    }
}
