//! Game entities and the per-frame context they update against.
//!
//! This module provides the `Entity` trait plus the implementations the
//! world translator spawns: static tiles, the player, monsters, particles.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use glam::Vec2;

use crate::collision::{self, Contact, Kinematics, SolidRect};
use crate::rect::Rect;
use crate::world::World;
use crate::world::chunk::TileKind;

pub mod monster;
pub mod particle;
pub mod player;
pub mod tile;

pub use monster::*;
pub use particle::*;
pub use player::*;
pub use tile::*;

pub type EntityRef = Rc<RefCell<dyn Entity>>;

/// Returned from `Entity::update` when the entity wants to be removed. The
/// orchestrator collects these during the update pass and applies removals
/// in a second pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Kill,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntityFlags {
    /// Drawn every frame regardless of which chunk it sits in.
    pub absolute_draw: bool,
    pub suppress_draw: bool,
    pub suppress_perspective: bool,
    pub suppress_collision: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderStyle {
    Neon,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Right,
    Jump,
    Dash,
    Confirm,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Pressed(Button),
    Released(Button),
}

/// Frame-sampled input state. The embedding application feeds events in;
/// entities read held and just-pressed buttons during their update.
#[derive(Clone, Debug, Default)]
pub struct Input {
    held: HashSet<Button>,
    just_pressed: HashSet<Button>,
}

impl Input {
    pub fn new() -> Self {
        Input::default()
    }

    pub fn feed(&mut self, event: InputEvent) {
        match event {
            InputEvent::Pressed(b) => {
                if self.held.insert(b) {
                    self.just_pressed.insert(b);
                }
            }
            InputEvent::Released(b) => {
                self.held.remove(&b);
            }
        }
    }

    /// Clears the just-pressed set. Called by the orchestrator after each
    /// frame, before the next batch of events is fed.
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
    }

    pub fn held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    pub fn just_pressed(&self, button: Button) -> bool {
        self.just_pressed.contains(&button)
    }
}

/// Renderer boundary: the core never touches a real surface, it only emits
/// colored rectangles through this trait.
pub trait DrawSurface {
    fn fill_rect(&mut self, rect: Rect, color: [u8; 3], alpha: u8);
}

/// Landing side effects recorded by the resolver via the frame context and
/// applied by the orchestrator after the update pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileEvent {
    Landed(usize),
}

/// Everything an entity is allowed to reach during its update. Passed
/// explicitly; entities hold no back-reference to the game.
pub struct FrameCtx<'a> {
    pub world: &'a mut World,
    pub solids: &'a [SolidRect],
    pub input: &'a Input,
    /// `dt * FPS`: velocities are authored per-frame at the reference rate
    /// and scaled by this for frame-rate independence.
    pub frame_scale: f32,
    /// Milliseconds of game time since the session started.
    pub time_ms: u32,
    pub player_rect: Rect,
    pub spawns: &'a mut Vec<EntityRef>,
    pub tile_events: &'a mut Vec<TileEvent>,
}

impl<'a> FrameCtx<'a> {
    /// Runs the collision resolver for a body at `rect`, using the vertical
    /// rule of the dimension the body currently stands in, and records any
    /// landing so the orchestrator can apply tile side effects.
    pub fn resolve_collisions(&mut self, rect: Rect, kin: &mut Kinematics) -> Contact {
        // assume airborne every frame; only a landing this frame clears it
        kin.airborne = true;
        let inverted = self.world.inverted_at(rect.center());
        let contact = collision::resolve(rect, kin, inverted, self.solids);
        if let Some(slot) = contact.landed_on {
            self.tile_events.push(TileEvent::Landed(slot));
        }
        contact
    }
}

/// Base contract every game object fulfils. Optional capabilities (tile tag,
/// render style, collider override) are explicit methods, so call sites
/// branch on presence through the type system.
pub trait Entity: 'static {
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    fn rect(&self) -> Rect;
    fn set_rect(&mut self, rect: Rect);
    fn color(&self) -> [u8; 3];

    fn flags(&self) -> EntityFlags {
        EntityFlags::default()
    }

    fn tag(&self) -> Option<TileKind> {
        None
    }

    fn style(&self) -> Option<RenderStyle> {
        None
    }

    /// The rectangle this entity occupies in the collision snapshot.
    fn collider(&self) -> Rect {
        self.rect()
    }

    /// Requests removal. Tiles delay the actual kill signal so they can play
    /// a short death state first.
    fn kill(&mut self) {}

    fn update(&mut self, ctx: &mut FrameCtx) -> Option<Signal>;

    fn draw(&self, surface: &mut dyn DrawSurface, offset: Vec2) {
        surface.fill_rect(self.rect().moved(offset), self.color(), 255);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_held_and_just_pressed() {
        let mut input = Input::new();
        input.feed(InputEvent::Pressed(Button::Jump));
        assert!(input.held(Button::Jump));
        assert!(input.just_pressed(Button::Jump));

        input.end_frame();
        assert!(input.held(Button::Jump));
        assert!(!input.just_pressed(Button::Jump));

        // repeat press while held does not re-arm just_pressed
        input.feed(InputEvent::Pressed(Button::Jump));
        assert!(!input.just_pressed(Button::Jump));

        input.feed(InputEvent::Released(Button::Jump));
        assert!(!input.held(Button::Jump));
    }
}
