//! Short-lived cosmetic entities. None of these collide.

use glam::Vec2;

use crate::entity::{DrawSurface, Entity, EntityFlags, FrameCtx, Signal};
use crate::rect::Rect;

const PARTICLE_GRAVITY_STEP: f32 = 1.0;

/// A flying shard thrown off by breaking tiles. Ballistic, no collision,
/// removed when its life span runs out.
pub struct Particle {
    rect: Rect,
    vel: Vec2,
    fall: f32,
    color: [u8; 3],
    life_span_ms: u32,
    born_ms: Option<u32>,
}

impl Particle {
    pub fn new(pos: Vec2, size: Vec2, vel: Vec2, color: [u8; 3], life_span_ms: u32) -> Self {
        Particle {
            rect: Rect::from_pos_size(pos, size),
            vel,
            fall: 0.0,
            color,
            life_span_ms,
            born_ms: None,
        }
    }
}

impl Entity for Particle {
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
        self.color
    }

    fn flags(&self) -> EntityFlags {
        EntityFlags {
            suppress_collision: true,
            ..EntityFlags::default()
        }
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        let born = *self.born_ms.get_or_insert(ctx.time_ms);
        if ctx.time_ms.saturating_sub(born) > self.life_span_ms {
            return Some(Signal::Kill);
        }
        let gravity_scale = ctx.world.gravity_scale_at(self.rect.center());
        self.fall += PARTICLE_GRAVITY_STEP * gravity_scale;
        let step = (self.vel + Vec2::new(0.0, self.fall)) * ctx.frame_scale;
        self.rect.pos += step;
        None
    }
}

/// A fading after-image left behind by a dashing body. Drawn at the position
/// it was dropped at, independent of chunk ownership.
pub struct Trail {
    rect: Rect,
    color: [u8; 3],
    life_span_ms: u32,
    born_ms: u32,
    age_ms: u32,
}

impl Trail {
    pub fn new(rect: Rect, color: [u8; 3], life_span_ms: u32, now_ms: u32) -> Self {
        Trail {
            rect,
            color,
            life_span_ms,
            born_ms: now_ms,
            age_ms: 0,
        }
    }

    pub fn alpha(&self) -> u8 {
        let remaining =
            1.0 - (self.age_ms as f32 / self.life_span_ms as f32).min(1.0);
        (remaining * 160.0) as u8
    }
}

impl Entity for Trail {
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
        self.color
    }

    fn flags(&self) -> EntityFlags {
        EntityFlags {
            absolute_draw: true,
            suppress_collision: true,
            ..EntityFlags::default()
        }
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        self.age_ms = ctx.time_ms.saturating_sub(self.born_ms);
        if self.age_ms > self.life_span_ms {
            return Some(Signal::Kill);
        }
        None
    }

    fn draw(&self, surface: &mut dyn DrawSurface, offset: Vec2) {
        surface.fill_rect(self.rect.moved(offset), self.color, self.alpha());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::DimensionSet;
    use crate::entity::{Input, TileEvent};
    use crate::world::World;
    use glam::vec2;

    fn run_frame(entity: &mut dyn Entity, world: &mut World, time_ms: u32) -> Option<Signal> {
        let input = Input::new();
        let mut spawns = Vec::new();
        let mut tile_events: Vec<TileEvent> = Vec::new();
        let mut ctx = FrameCtx {
            world,
            solids: &[],
            input: &input,
            frame_scale: 1.0,
            time_ms,
            player_rect: Rect::new(0.0, 0.0, 80.0, 80.0),
            spawns: &mut spawns,
            tile_events: &mut tile_events,
        };
        entity.update(&mut ctx)
    }

    #[test]
    fn test_particle_expires_after_life_span() {
        let mut world = World::new(1, DimensionSet::load_embedded().unwrap());
        let mut p = Particle::new(vec2(0.0, 0.0), vec2(10.0, 10.0), vec2(3.0, -8.0), [255, 255, 255], 300);
        assert!(run_frame(&mut p, &mut world, 100).is_none());
        assert!(run_frame(&mut p, &mut world, 350).is_none());
        assert_eq!(run_frame(&mut p, &mut world, 450), Some(Signal::Kill));
    }

    #[test]
    fn test_particle_arcs_under_gravity() {
        let mut world = World::new(1, DimensionSet::load_embedded().unwrap());
        let mut p = Particle::new(vec2(0.0, 0.0), vec2(10.0, 10.0), vec2(3.0, -8.0), [255, 255, 255], 10_000);
        let mut last_y = 0.0;
        for t in 1..40 {
            run_frame(&mut p, &mut world, t * 16);
            last_y = p.rect().pos.y;
        }
        // rose first, then the fall accumulator wins
        assert!(last_y > 0.0);
        assert!(p.rect().pos.x > 0.0);
    }

    #[test]
    fn test_trail_fades_out() {
        let mut world = World::new(1, DimensionSet::load_embedded().unwrap());
        let mut trail = Trail::new(Rect::new(0.0, 0.0, 80.0, 80.0), [255, 205, 60], 350, 1000);
        assert!(trail.flags().absolute_draw);
        let full = trail.alpha();
        run_frame(&mut trail, &mut world, 1200);
        assert!(trail.alpha() < full);
        assert_eq!(run_frame(&mut trail, &mut world, 1400), Some(Signal::Kill));
    }
}
