//! Axis-separated swept-AABB collision resolution.
//!
//! The resolver is predictive: instead of moving a body and testing overlap,
//! it compares the gap between the body and each solid against the velocity
//! about to be applied, and clamps the velocity so the move lands flush.
//! This cannot tunnel as long as per-frame velocity stays under one tile;
//! maximum speeds are clamped by the bodies themselves.
//!
//! Ties on simultaneous multi-rectangle contact are broken deterministically
//! by nearest gap first, not by iteration order.

use glam::Vec2;

use crate::rect::Rect;
use crate::world::chunk::TileKind;

/// Tolerance trimming the span-overlap test so edge-adjacent rectangles do
/// not register as blocking.
pub const SPAN_TOLERANCE: f32 = 1.0;

/// Motion state shared by every kinematic body.
#[derive(Clone, Copy, Debug, Default)]
pub struct Kinematics {
    /// Velocity accumulated this frame, zeroed after the position commit.
    pub vel: Vec2,
    /// Cumulative fall accumulator. Positive while falling under normal
    /// gravity, negative while "falling" upward in an inverted dimension.
    pub fall: f32,
    /// Set when nothing is under the body; cleared by a landing.
    pub airborne: bool,
    /// Optional collider override: offset relative to the entity rect plus a
    /// replacement size.
    pub custom_collider: Option<Rect>,
}

impl Kinematics {
    /// The rectangle the resolver actually sweeps.
    pub fn collider_rect(&self, rect: Rect) -> Rect {
        match self.custom_collider {
            Some(c) => Rect::from_pos_size(rect.pos + c.pos, c.size),
            None => rect,
        }
    }
}

/// One entry in the per-frame snapshot of solid geometry. `slot` indexes the
/// orchestrator's collider registry so landing side effects can find the
/// owning tile.
#[derive(Clone, Copy, Debug)]
pub struct SolidRect {
    pub rect: Rect,
    pub kind: TileKind,
    pub slot: usize,
}

/// What the resolver ran into, reported as registry slots. Side effects
/// (breaking a block, pressing a trigger) are applied by the orchestrator in
/// a later pass, never by the resolver itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct Contact {
    pub landed_on: Option<usize>,
    pub bumped: Option<usize>,
    pub wall: Option<usize>,
}

/// Clamps `kin.vel` against `solids` for this frame. `inverted` mirrors the
/// vertical rule: bodies land on the undersides of solids instead of tops.
/// Only the body's velocity and fall state are mutated.
pub fn resolve(rect: Rect, kin: &mut Kinematics, inverted: bool, solids: &[SolidRect]) -> Contact {
    let mut contact = Contact::default();
    let body = kin.collider_rect(rect);

    // Horizontal pass. Span check uses the swept rect, the clamp closes the
    // gap measured from the unmoved rect.
    if kin.vel.x != 0.0 {
        let moved = body.moved(kin.vel);
        let mut best: Option<(f32, usize)> = None;
        for solid in solids {
            if !(moved.top() < solid.rect.bottom() - SPAN_TOLERANCE
                && moved.bottom() > solid.rect.top() + SPAN_TOLERANCE)
            {
                continue;
            }
            let gap = if kin.vel.x > 0.0 {
                solid.rect.left() - body.right()
            } else {
                solid.rect.right() - body.left()
            };
            if gap.abs() <= kin.vel.x.abs() && gap * kin.vel.x >= 0.0 {
                match best {
                    Some((g, _)) if g.abs() <= gap.abs() => {}
                    _ => best = Some((gap, solid.slot)),
                }
            }
        }
        if let Some((gap, slot)) = best {
            kin.vel.x = gap;
            contact.wall = Some(slot);
        }
    }

    // Vertical pass, swept with the (possibly clamped) horizontal velocity.
    let moved = body.moved(kin.vel);
    let mut best_land: Option<(f32, usize)> = None;
    let mut best_bump: Option<(f32, usize)> = None;
    for solid in solids {
        if !(moved.left() < solid.rect.right() && moved.right() > solid.rect.left()) {
            continue;
        }
        let gap_down = solid.rect.top() - body.bottom();
        let gap_up = solid.rect.bottom() - body.top();
        if !inverted {
            // falling onto tops, bumping into bottoms; a zero-motion flush
            // contact counts as grounded so resting bodies stay landed
            if kin.vel.y >= 0.0
                && gap_down >= 0.0
                && gap_down <= kin.vel.y
                && (kin.fall > 0.0 || kin.vel.y == 0.0)
            {
                match best_land {
                    Some((g, _)) if g <= gap_down => {}
                    _ => best_land = Some((gap_down, solid.slot)),
                }
            } else if kin.vel.y < 0.0 && gap_up <= 0.0 && -gap_up <= -kin.vel.y {
                match best_bump {
                    Some((g, _)) if g.abs() <= gap_up.abs() => {}
                    _ => best_bump = Some((gap_up, solid.slot)),
                }
            }
        } else {
            // mirrored: "falling" upward onto bottoms, bumping into tops
            if kin.vel.y <= 0.0
                && gap_up <= 0.0
                && -gap_up <= -kin.vel.y
                && (kin.fall < 0.0 || kin.vel.y == 0.0)
            {
                match best_land {
                    Some((g, _)) if g.abs() <= gap_up.abs() => {}
                    _ => best_land = Some((gap_up, solid.slot)),
                }
            } else if kin.vel.y > 0.0 && gap_down >= 0.0 && gap_down <= kin.vel.y {
                match best_bump {
                    Some((g, _)) if g.abs() <= gap_down.abs() => {}
                    _ => best_bump = Some((gap_down, solid.slot)),
                }
            }
        }
    }

    if let Some((gap, slot)) = best_land {
        kin.vel.y = gap;
        kin.fall = 0.0;
        kin.airborne = false;
        contact.landed_on = Some(slot);
    } else if let Some((gap, slot)) = best_bump {
        kin.vel.y = gap;
        // snappy head bump: cancel the ascent instead of bouncing
        if kin.airborne {
            kin.fall = 0.0;
        }
        contact.bumped = Some(slot);
    }

    contact
}
