//! The player: a kinematic body with jump and dash.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, vec2};

use crate::collision::Kinematics;
use crate::entity::{Button, Entity, EntityFlags, FrameCtx, Signal, Trail};
use crate::rect::Rect;

pub const PLAYER_SIZE: f32 = 80.0;
pub const PLAYER_COLOR: [u8; 3] = [255, 205, 60];

const BASE_VEL: f32 = 10.0;
const JUMP_IMPULSE: f32 = 24.0;
const GRAVITY_STEP: f32 = 1.0;
/// Hard cap on the fall accumulator. The resolver is only safe below one
/// tile per frame, so this must stay under the tile size.
const MAX_FALL: f32 = 40.0;

const DASH_VEL: f32 = 15.0;
const DASH_DURATION_MS: u32 = 100;
const DASH_COOLDOWN_MS: u32 = 400;
const TRAIL_LIFE_MS: u32 = 350;
const TRAIL_CADENCE_MS: u32 = 20;

pub struct Player {
    rect: Rect,
    pub kin: Kinematics,
    pub dead: bool,
    /// -1.0 facing left, 1.0 facing right. Dashes go this way.
    direction: f32,
    dashing: bool,
    dash_available: bool,
    dash_time: u32,
    last_trail: u32,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Player {
            rect: Rect::from_pos_size(pos, Vec2::splat(PLAYER_SIZE)),
            kin: Kinematics::default(),
            dead: false,
            direction: 1.0,
            dashing: false,
            dash_available: true,
            dash_time: 0,
            last_trail: 0,
        }
    }

    pub fn respawn(&mut self, pos: Vec2) {
        self.rect.pos = pos;
        self.kin = Kinematics::default();
        self.dead = false;
        self.dashing = false;
        self.dash_available = true;
    }

    pub fn is_dashing(&self) -> bool {
        self.dashing
    }
}

impl Entity for Player {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn rect(&self) -> Rect {
        self.rect
    }

    fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    fn color(&self) -> [u8; 3] {
        PLAYER_COLOR
    }

    fn flags(&self) -> EntityFlags {
        EntityFlags {
            suppress_collision: true,
            ..EntityFlags::default()
        }
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        if self.dead {
            return None;
        }

        if ctx.input.held(Button::Left) {
            self.kin.vel.x -= BASE_VEL;
            self.direction = -1.0;
        }
        if ctx.input.held(Button::Right) {
            self.kin.vel.x += BASE_VEL;
            self.direction = 1.0;
        }

        let gravity_scale = ctx.world.gravity_scale_at(self.rect.center());

        // jump on the key-down edge, and only from the ground
        if ctx.input.just_pressed(Button::Jump) && !self.kin.airborne {
            self.kin.airborne = true;
            self.kin.fall = if gravity_scale >= 0.0 {
                -JUMP_IMPULSE
            } else {
                JUMP_IMPULSE
            };
        }

        if ctx.input.just_pressed(Button::Dash) && self.dash_available {
            self.dashing = true;
            self.dash_available = false;
            self.dash_time = ctx.time_ms;
            self.last_trail = 0;
        }
        if self.dashing {
            self.kin.vel.x += self.direction * DASH_VEL;
            if ctx.time_ms.saturating_sub(self.last_trail) > TRAIL_CADENCE_MS {
                ctx.spawns.push(Rc::new(RefCell::new(Trail::new(
                    self.rect,
                    PLAYER_COLOR,
                    TRAIL_LIFE_MS,
                    ctx.time_ms,
                ))));
                self.last_trail = ctx.time_ms;
            }
            if ctx.time_ms.saturating_sub(self.dash_time) > DASH_DURATION_MS {
                self.dashing = false;
            }
        }
        if !self.dash_available && ctx.time_ms.saturating_sub(self.dash_time) > DASH_COOLDOWN_MS {
            self.dash_available = true;
        }

        if self.kin.airborne {
            self.kin.vel.y = self.kin.fall;
            self.kin.fall =
                (self.kin.fall + GRAVITY_STEP * gravity_scale).clamp(-MAX_FALL, MAX_FALL);
        }

        self.kin.vel *= ctx.frame_scale;
        ctx.resolve_collisions(self.rect, &mut self.kin);
        self.rect.pos += self.kin.vel;
        self.kin.vel = vec2(0.0, 0.0);

        None
    }
}
