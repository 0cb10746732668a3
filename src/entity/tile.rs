//! Static tiles: the entities a chunk grid translates into.

use glam::Vec2;

use crate::entity::{Entity, EntityFlags, FrameCtx, RenderStyle, Signal};
use crate::rect::Rect;
use crate::world::chunk::TileKind;

/// How long a breakable tile keeps existing after its death is requested,
/// in milliseconds of game time.
pub const TILE_DEATH_DELAY_MS: u32 = 500;

/// Period of the animated color pulse.
const COLOR_PULSE_MS: u32 = 900;

pub struct TileEntity {
    rect: Rect,
    kind: TileKind,
    color: [u8; 3],
    style: Option<RenderStyle>,
    /// Beacon state, set each frame by the orchestrator from player overlap
    /// or by landing on the tile.
    pub pressed: bool,
    dying: bool,
    death_time: Option<u32>,
}

impl TileEntity {
    pub fn new(kind: TileKind, pos: Vec2, size: Vec2) -> Self {
        let color = match kind {
            TileKind::Grass => [124, 94, 66],
            TileKind::Stone => [110, 110, 110],
            TileKind::Beacon => [150, 150, 0],
            TileKind::Spike => [255, 0, 0],
            _ => [37, 31, 77],
        };
        TileEntity {
            rect: Rect::from_pos_size(pos, size),
            kind,
            color,
            style: None,
            pressed: false,
            dying: false,
            death_time: None,
        }
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    /// The zone above a beacon the player presses it from.
    pub fn button_zone(&self) -> Option<Rect> {
        if self.kind != TileKind::Beacon {
            return None;
        }
        Some(Rect::new(
            self.rect.pos.x,
            self.rect.pos.y - 50.0,
            self.rect.size.x,
            50.0,
        ))
    }
}

impl Entity for TileEntity {
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
        if self.kind == TileKind::Beacon && self.pressed {
            let [r, g, _] = self.color;
            return [r.saturating_sub(80), g.saturating_sub(80), 0];
        }
        self.color
    }

    fn flags(&self) -> EntityFlags {
        // dying tiles keep colliding until the delayed kill removes them
        EntityFlags {
            suppress_collision: self.kind == TileKind::Spike,
            ..EntityFlags::default()
        }
    }

    fn tag(&self) -> Option<TileKind> {
        Some(self.kind)
    }

    fn style(&self) -> Option<RenderStyle> {
        self.style
    }

    fn collider(&self) -> Rect {
        if self.kind == TileKind::Spike {
            // the triangle only hurts near its base
            return Rect::new(
                self.rect.pos.x + self.rect.size.x * 0.2,
                self.rect.pos.y + self.rect.size.y * 0.4,
                self.rect.size.x * 0.6,
                self.rect.size.y * 0.6,
            );
        }
        self.rect
    }

    fn kill(&mut self) {
        if self.kind.breakable() && !self.dying {
            self.dying = true;
        }
    }

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal> {
        if self.kind == TileKind::AnimatedColor {
            // slow white-red pulse
            let phase = (ctx.time_ms % COLOR_PULSE_MS) as f32 / COLOR_PULSE_MS as f32;
            let t = if phase < 0.5 { phase * 2.0 } else { 2.0 - phase * 2.0 };
            self.color = [255, (255.0 * (1.0 - t)) as u8, (255.0 * (1.0 - t)) as u8];
        }

        if self.dying {
            let started = *self.death_time.get_or_insert(ctx.time_ms);
            if ctx.time_ms.saturating_sub(started) > TILE_DEATH_DELAY_MS {
                return Some(Signal::Kill);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn test_beacon_has_button_zone() {
        let beacon = TileEntity::new(TileKind::Beacon, vec2(160.0, 800.0), vec2(80.0, 80.0));
        let zone = beacon.button_zone().unwrap();
        assert_eq!(zone.bottom(), 800.0);
        assert_eq!(zone.size.y, 50.0);
        let grass = TileEntity::new(TileKind::Grass, vec2(0.0, 0.0), vec2(80.0, 80.0));
        assert!(grass.button_zone().is_none());
    }

    #[test]
    fn test_spike_never_collides() {
        let spike = TileEntity::new(TileKind::Spike, vec2(0.0, 0.0), vec2(80.0, 80.0));
        assert!(spike.flags().suppress_collision);
        let hurt = spike.collider();
        assert!(hurt.size.x < 80.0 && hurt.size.y < 80.0);
    }

    #[test]
    fn test_only_animated_blocks_break() {
        let mut color = TileEntity::new(TileKind::Color, vec2(0.0, 0.0), vec2(80.0, 80.0));
        color.kill();
        assert!(!color.is_dying());

        let mut grass = TileEntity::new(TileKind::Grass, vec2(0.0, 0.0), vec2(80.0, 80.0));
        grass.kill();
        assert!(!grass.is_dying());

        let mut block = TileEntity::new(TileKind::AnimatedColor, vec2(0.0, 0.0), vec2(80.0, 80.0));
        block.kill();
        assert!(block.is_dying());
        // it keeps holding weight while the death delay runs
        assert!(!block.flags().suppress_collision);
    }
}
