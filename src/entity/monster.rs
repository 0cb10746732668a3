//! Hostile entities: patrolling monsters, cannons and their bullets.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, vec2};

use crate::collision::Kinematics;
use crate::entity::{Entity, EntityFlags, FrameCtx, Signal};
use crate::rect::Rect;
use crate::world::chunk::TileKind;

pub const MONSTER_SIZE: f32 = 80.0;
pub const MONSTER_COLOR: [u8; 3] = [140, 30, 160];

const MONSTER_BASE_VEL: f32 = 5.0;
const MONSTER_GRAVITY_STEP: f32 = 1.0;
const MONSTER_MAX_FALL: f32 = 40.0;

/// Below this line every mobile entity is gone for good.
const FALLOUT_Y: f32 = 1160.0;

/// Walks back and forth on its platform, turning around at walls. Touching
/// it kills the player; the orchestrator checks the overlap.
pub struct Monster {
    rect: Rect,
    kin: Kinematics,
    base_vel: f32,
}

impl Monster {
    pub fn new(pos: Vec2) -> Self {
        Monster {
            rect: Rect::from_pos_size(pos, Vec2::splat(MONSTER_SIZE)),
            kin: Kinematics::default(),
            base_vel: MONSTER_BASE_VEL,
        }
    }

    pub fn heading(&self) -> f32 {
        self.base_vel.signum()
    }
}

impl Entity for Monster {
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
        MONSTER_COLOR
    }

    fn flags(&self) -> EntityFlags {
        EntityFlags {
            suppress_collision: true,
            ..EntityFlags::default()
        }
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        self.kin.vel.x += self.base_vel;

        let gravity_scale = ctx.world.gravity_scale_at(self.rect.center());
        if self.kin.airborne {
            self.kin.vel.y = self.kin.fall;
            self.kin.fall = (self.kin.fall + MONSTER_GRAVITY_STEP * gravity_scale)
                .clamp(-MONSTER_MAX_FALL, MONSTER_MAX_FALL);
        }

        self.kin.vel *= ctx.frame_scale;
        let contact = ctx.resolve_collisions(self.rect, &mut self.kin);
        if contact.wall.is_some() {
            self.base_vel = -self.base_vel;
        }
        self.rect.pos += self.kin.vel;
        self.kin.vel = vec2(0.0, 0.0);

        if self.rect.pos.y > FALLOUT_Y || self.rect.pos.y < -FALLOUT_Y {
            return Some(Signal::Kill);
        }
        None
    }
}

pub const CANNON_COLOR: [u8; 3] = [60, 60, 70];

const CANNON_PERIOD_MS: u32 = 2000;
const CANNON_RANGE: f32 = 600.0;

/// A solid emplacement that fires a bullet at the player whenever the player
/// is in range and the reload period has elapsed.
pub struct Cannon {
    rect: Rect,
    last_shot: u32,
}

impl Cannon {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Cannon {
            rect: Rect::from_pos_size(pos, size),
            last_shot: 0,
        }
    }
}

impl Entity for Cannon {
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
        CANNON_COLOR
    }

    fn tag(&self) -> Option<TileKind> {
        Some(TileKind::Cannon)
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        let towards = ctx.player_rect.center() - self.rect.center();
        if towards.x.abs() > CANNON_RANGE {
            return None;
        }
        if ctx.time_ms.saturating_sub(self.last_shot) > CANNON_PERIOD_MS {
            self.last_shot = ctx.time_ms;
            let muzzle = self.rect.center();
            ctx.spawns.push(Rc::new(RefCell::new(Bullet::new(
                muzzle,
                vec2(BULLET_VEL * towards.x.signum(), 0.0),
            ))));
        }
        None
    }
}

pub const BULLET_SIZE: f32 = 20.0;
pub const BULLET_COLOR: [u8; 3] = [230, 90, 30];

const BULLET_VEL: f32 = 12.0;

/// Travels in a straight line until it hits a solid or leaves the world.
pub struct Bullet {
    rect: Rect,
    vel: Vec2,
}

impl Bullet {
    pub fn new(center: Vec2, vel: Vec2) -> Self {
        let mut rect = Rect::from_pos_size(Vec2::ZERO, Vec2::splat(BULLET_SIZE));
        rect.set_center(center);
        Bullet { rect, vel }
    }
}

impl Entity for Bullet {
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
        BULLET_COLOR
    }

    fn flags(&self) -> EntityFlags {
        EntityFlags {
            suppress_collision: true,
            ..EntityFlags::default()
        }
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        let mut kin = Kinematics {
            vel: self.vel * ctx.frame_scale,
            ..Kinematics::default()
        };
        let contact = ctx.resolve_collisions(self.rect, &mut kin);
        self.rect.pos += kin.vel;
        if contact.wall.is_some() {
            return Some(Signal::Kill);
        }
        if self.rect.pos.y > FALLOUT_Y || self.rect.pos.y < -FALLOUT_Y {
            return Some(Signal::Kill);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::SolidRect;
    use crate::dimension::DimensionSet;
    use crate::entity::{Input, TileEvent};
    use crate::world::World;

    fn run_frame(
        entity: &mut dyn Entity,
        world: &mut World,
        solids: &[SolidRect],
        time_ms: u32,
        spawns: &mut Vec<crate::entity::EntityRef>,
    ) -> Option<Signal> {
        let input = Input::new();
        let mut tile_events: Vec<TileEvent> = Vec::new();
        let mut ctx = FrameCtx {
            world,
            solids,
            input: &input,
            frame_scale: 1.0,
            time_ms,
            player_rect: Rect::new(0.0, 0.0, 80.0, 80.0),
            spawns,
            tile_events: &mut tile_events,
        };
        entity.update(&mut ctx)
    }

    fn floor_and_wall() -> [SolidRect; 2] {
        [
            SolidRect {
                rect: Rect::new(-400.0, 80.0, 1000.0, 80.0),
                kind: TileKind::Grass,
                slot: 0,
            },
            SolidRect {
                rect: Rect::new(200.0, 0.0, 80.0, 80.0),
                kind: TileKind::Stone,
                slot: 1,
            },
        ]
    }

    fn test_world() -> World {
        World::new(1, DimensionSet::load_embedded().unwrap())
    }

    #[test]
    fn test_monster_turns_at_wall() {
        let mut world = test_world();
        let mut monster = Monster::new(vec2(0.0, 0.0));
        let solids = floor_and_wall();
        let mut spawns = Vec::new();
        assert_eq!(monster.heading(), 1.0);
        for t in 0..60 {
            run_frame(&mut monster, &mut world, &solids, t * 16, &mut spawns);
        }
        // walked into the wall at x=200 and came back
        assert_eq!(monster.heading(), -1.0);
        assert!(monster.rect().right() <= 200.0);
    }

    #[test]
    fn test_cannon_fires_toward_player_in_range() {
        let mut world = test_world();
        let mut cannon = Cannon::new(vec2(400.0, 0.0), vec2(80.0, 80.0));
        let mut spawns = Vec::new();
        // player rect in run_frame sits at x=0, to the cannon's left
        run_frame(&mut cannon, &mut world, &[], 2500, &mut spawns);
        assert_eq!(spawns.len(), 1);
        // reload period gates the next shot
        run_frame(&mut cannon, &mut world, &[], 2600, &mut spawns);
        assert_eq!(spawns.len(), 1);
        run_frame(&mut cannon, &mut world, &[], 5000, &mut spawns);
        assert_eq!(spawns.len(), 2);
    }

    #[test]
    fn test_cannon_holds_fire_out_of_range() {
        let mut world = test_world();
        let mut cannon = Cannon::new(vec2(2000.0, 0.0), vec2(80.0, 80.0));
        let mut spawns = Vec::new();
        run_frame(&mut cannon, &mut world, &[], 2500, &mut spawns);
        assert!(spawns.is_empty());
    }

    #[test]
    fn test_bullet_dies_on_wall() {
        let mut world = test_world();
        let mut bullet = Bullet::new(vec2(150.0, 40.0), vec2(BULLET_VEL, 0.0));
        let solids = floor_and_wall();
        let mut spawns = Vec::new();
        let mut signal = None;
        for t in 0..20 {
            signal = run_frame(&mut bullet, &mut world, &solids, t * 16, &mut spawns);
            if signal.is_some() {
                break;
            }
        }
        assert_eq!(signal, Some(Signal::Kill));
        assert!(bullet.rect().right() <= 200.0 + 0.001);
    }
}
