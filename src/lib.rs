//! Core engine for a chunk-streaming 2D platformer: a lazily generated
//! world cycling through gravity dimensions, a predictive swept-AABB
//! collision resolver, and a frame orchestrator driving entities, score and
//! the in-world menu.
//!
//! The crate owns no window, surface or input backend. The embedding
//! application feeds [`entity::InputEvent`]s into the [`game::Game`], calls
//! [`game::Game::frame`] once per tick and draws through its own
//! [`entity::DrawSurface`] implementation.

pub mod bootstrap;
pub mod collision;
pub mod dimension;
pub mod entity;
pub mod game;
pub mod rect;
pub mod world;

pub use bootstrap::{Bootstrap, LoadedAssets};
pub use game::{FrameOutput, Game, GameMode, MenuAction};
pub use rect::Rect;
pub use world::World;
