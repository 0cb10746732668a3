//! The streaming world: lazy chunk generation, the materialized entity
//! cache, neighbour queries and the dimension boundary map.

pub mod chunk;

use std::cell::RefCell;
use std::rc::Rc;

use fxhash::FxHashMap;
use glam::{IVec2, Vec2, ivec2, vec2};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::dimension::DimensionSet;
use crate::entity::{Cannon, EntityRef, Monster, RenderStyle, TileEntity};
use crate::rect::Rect;
use chunk::{ChunkGrid, ChunkId, TileKind};

pub const TILE_SIZE: f32 = 80.0;

/// How many non-boundary chunks stream in before a dimension switch is
/// forced. The boundary lands on the first chunk generated after the
/// counter exceeds this.
pub const CHUNKS_BEFORE_SWITCH: u32 = 6;

const MENU_W: usize = 32;
const MENU_H: usize = 11;

#[rustfmt::skip]
const MENU_MAP: [[i64; MENU_W]; MENU_H] = [
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [3,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,3],
    [3,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,3],
    [3,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,3],
    [3,0,0,0,0,0,12,0,0,0,0,0,12,0,0,0,0,0,0,12,0,0,0,0,0,12,0,0,0,0,0,3],
    [10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10],
    [11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11],
    [11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11],
];

// The side chunks flanking the menu: flat ground plus a small showcase of
// stone pillars, a cannon and a patrolling monster between the pillars.
#[rustfmt::skip]
const MENU_GEN_MAP: [[i64; MENU_W]; MENU_H] = [
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0],
    [0,0,0,0,0,0,11,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,11,0,0,0,0,0,0],
    [0,0,0,0,0,0,11,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,11,0,0,0,0,0,0],
    [0,0,0,0,0,0,11,0,0,0,0,0,0,0,0,13,0,0,20,0,0,0,0,0,0,11,0,0,0,0,0,0],
    [10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10,10],
    [11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11],
    [11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11,11],
];

/// Which axis the active-chunk neighbourhood extends along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollMode {
    Free,
    HorizontalOnly,
    VerticalOnly,
}

/// A chunk column where one dimension hands over to the next.
#[derive(Clone, Debug)]
pub struct Boundary {
    pub chunk_x: i32,
    pub transition: String,
    pub from: String,
    pub to: String,
}

/// Result of a chunk materialization request. `monsters` is only populated
/// on the generating call; roaming entities register once, not per lookup.
pub struct Materialized {
    pub entities: Vec<EntityRef>,
    pub monsters: Vec<EntityRef>,
    pub fresh: bool,
}

pub struct World {
    dims: DimensionSet,
    menu_mode: bool,
    scroll: ScrollMode,
    /// Raw tile grids. Mutated in place when a tile dies.
    chunks: FxHashMap<ChunkId, ChunkGrid>,
    /// Materialized entity lists, built at most once per chunk.
    generated: FxHashMap<ChunkId, Vec<EntityRef>>,
    /// Which preset each on-axis chunk was generated from, for adjacency.
    presets: FxHashMap<ChunkId, String>,
    /// Boundary chunks, keyed for lookup and ordered for environment scans.
    transitions: FxHashMap<ChunkId, String>,
    boundaries: Vec<Boundary>,
    chunks_since_switch: u32,
    rng: StdRng,
}

impl World {
    pub fn new(seed: u64, dims: DimensionSet) -> Self {
        World {
            dims,
            menu_mode: false,
            scroll: ScrollMode::HorizontalOnly,
            chunks: FxHashMap::default(),
            generated: FxHashMap::default(),
            presets: FxHashMap::default(),
            transitions: FxHashMap::default(),
            boundaries: Vec::new(),
            chunks_since_switch: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn dims(&self) -> &DimensionSet {
        &self.dims
    }

    pub fn menu_mode(&self) -> bool {
        self.menu_mode
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        self.scroll
    }

    pub fn set_scroll_mode(&mut self, mode: ScrollMode) {
        self.scroll = mode;
    }

    /// Chunk grid dimensions in cells: the hand-authored menu area uses a
    /// wider grid than the streaming world.
    pub fn chunk_cells(&self) -> IVec2 {
        if self.menu_mode {
            ivec2(MENU_W as i32, MENU_H as i32)
        } else {
            self.dims.chunk_size()
        }
    }

    fn chunk_px(&self) -> Vec2 {
        let cells = self.chunk_cells();
        vec2(cells.x as f32 * TILE_SIZE, cells.y as f32 * TILE_SIZE)
    }

    fn id_for(&self, coord: IVec2) -> ChunkId {
        if self.menu_mode && coord == IVec2::ZERO {
            ChunkId::Menu
        } else {
            ChunkId::At(coord)
        }
    }

    fn origin_of(&self, id: ChunkId) -> Vec2 {
        let px = self.chunk_px();
        match id {
            ChunkId::Menu => Vec2::ZERO,
            ChunkId::At(v) => vec2(v.x as f32 * px.x, v.y as f32 * px.y),
        }
    }

    /// The chunk coordinate a world position falls in. Pure floor division.
    pub fn chunk_at(&self, pos: Vec2) -> IVec2 {
        let px = self.chunk_px();
        ivec2(
            (pos.x / px.x).floor() as i32,
            (pos.y / px.y).floor() as i32,
        )
    }

    /// The chunk ids to keep materialized around an anchor position. The
    /// neighbourhood depends on the scroll mode, with one extra row above
    /// while the low-gravity environment is active.
    pub fn active_chunks(&self, anchor: Vec2) -> Vec<ChunkId> {
        if self.menu_mode {
            return vec![
                ChunkId::At(ivec2(-1, 0)),
                ChunkId::Menu,
                ChunkId::At(ivec2(1, 0)),
            ];
        }
        let c = self.chunk_at(anchor);
        let mut out = Vec::new();
        match self.scroll {
            ScrollMode::Free => {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        out.push(ChunkId::At(ivec2(c.x + dx, c.y + dy)));
                    }
                }
            }
            ScrollMode::HorizontalOnly => {
                let extra_row = self.environment_at(anchor) == "moon";
                for dx in -1..=1 {
                    out.push(ChunkId::At(ivec2(c.x + dx, c.y)));
                    if extra_row {
                        out.push(ChunkId::At(ivec2(c.x + dx, c.y - 1)));
                    }
                }
            }
            ScrollMode::VerticalOnly => {
                for dy in -1..=1 {
                    out.push(ChunkId::At(ivec2(c.x, c.y + dy)));
                }
            }
        }
        out
    }

    /// Picks or forces the preset for a brand-new on-axis chunk and installs
    /// its raw grid. Returns the name of the dimension the chunk belongs to,
    /// for styling.
    fn generate_grid(&mut self, coord: IVec2) -> Result<String, String> {
        if self.chunks_since_switch > CHUNKS_BEFORE_SWITCH {
            let from = self.dims.active().name.clone();
            let next = self.dims.successor().name.clone();
            let preset = self
                .dims
                .active()
                .transition_to
                .get(&next)
                .ok_or_else(|| format!("Dimension '{}' has no transition into '{}'", from, next))?
                .clone();
            let grid = self
                .dims
                .active()
                .preset(&preset)
                .ok_or_else(|| format!("Unknown transition preset '{}'", preset))?
                .clone();
            info!("dimension boundary at chunk {}: {} -> {}", coord.x, from, next);
            self.chunks.insert(ChunkId::At(coord), grid);
            self.presets.insert(ChunkId::At(coord), preset.clone());
            self.transitions.insert(ChunkId::At(coord), preset.clone());
            self.boundaries.push(Boundary {
                chunk_x: coord.x,
                transition: preset.clone(),
                from,
                to: next,
            });
            self.boundaries.sort_by_key(|b| b.chunk_x);
            self.dims.advance();
            self.chunks_since_switch = 0;
            return Ok(preset);
        }

        let prev = self
            .presets
            .get(&ChunkId::At(ivec2(coord.x - 1, coord.y)))
            .cloned()
            .unwrap_or_else(|| self.dims.active().empty_preset.clone());
        let preset = {
            let dim = self.dims.active();
            dim.pick_following(&prev, &mut self.rng)?.to_string()
        };
        let dim = self.dims.active();
        let grid = dim
            .preset(&preset)
            .ok_or_else(|| format!("Unknown preset '{}'", preset))?
            .clone();
        debug!("chunk {} generated from preset '{}'", coord.x, preset);
        let name = dim.name.clone();
        self.chunks.insert(ChunkId::At(coord), grid);
        self.presets.insert(ChunkId::At(coord), preset);
        self.chunks_since_switch += 1;
        Ok(name)
    }

    /// Returns the materialized entity list for a chunk, generating grid and
    /// entities on first request and caching them. Undefined tile codes can
    /// never reach this point; grids are decoded at load time.
    pub fn materialize(&mut self, id: ChunkId) -> Result<Materialized, String> {
        if let Some(cached) = self.generated.get(&id) {
            return Ok(Materialized {
                entities: cached.clone(),
                monsters: Vec::new(),
                fresh: false,
            });
        }

        if !self.chunks.contains_key(&id) {
            match id {
                ChunkId::Menu => {
                    return Err("Menu chunk requested before generate_menu".to_string());
                }
                ChunkId::At(v) => {
                    let off_axis = !self.menu_mode
                        && match self.scroll {
                            ScrollMode::HorizontalOnly => v.y != 0,
                            ScrollMode::VerticalOnly => v.x != 0,
                            ScrollMode::Free => false,
                        };
                    if self.menu_mode || off_axis {
                        // off-axis and off-menu space is open air; cache the
                        // empty list so the materialize-once rule is uniform
                        self.generated.insert(id, Vec::new());
                        return Ok(Materialized {
                            entities: Vec::new(),
                            monsters: Vec::new(),
                            fresh: true,
                        });
                    }
                    self.generate_grid(v)?;
                }
            }
        }

        let env = self.environment_at(self.origin_of(id) + self.chunk_px() / 2.0);
        let neon = self.dims.get(&env).map(|d| d.inverted).unwrap_or(false);
        let grid = &self.chunks[&id];
        let origin = self.origin_of(id);
        let mut entities: Vec<EntityRef> = Vec::new();
        let mut monsters: Vec<EntityRef> = Vec::new();
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                let kind = grid.get(col, row);
                let pos = origin + vec2(col as f32 * TILE_SIZE, row as f32 * TILE_SIZE);
                match kind {
                    TileKind::Empty => {}
                    TileKind::MonsterSpawn => {
                        monsters.push(Rc::new(RefCell::new(Monster::new(pos))));
                    }
                    TileKind::Cannon => {
                        entities.push(Rc::new(RefCell::new(Cannon::new(
                            pos,
                            Vec2::splat(TILE_SIZE),
                        ))));
                    }
                    _ => {
                        let mut tile = TileEntity::new(kind, pos, Vec2::splat(TILE_SIZE));
                        if neon {
                            tile = tile.with_style(RenderStyle::Neon);
                        }
                        entities.push(Rc::new(RefCell::new(tile)));
                    }
                }
            }
        }
        self.generated.insert(id, entities.clone());
        Ok(Materialized {
            entities,
            monsters,
            fresh: true,
        })
    }

    /// Whether the cell one step in `dir` from the cell under `rect` holds a
    /// solid tile. Consults the adjacent chunk across edges; an absent chunk
    /// reads as open space, except below the menu floor which is always
    /// closed.
    pub fn has_neighbour(&self, dir: IVec2, rect: Rect) -> bool {
        let cells = self.chunk_cells();
        let px = self.chunk_px();
        let center = rect.center();
        let mut coord = ivec2(
            (center.x / px.x).floor() as i32,
            (center.y / px.y).floor() as i32,
        );
        let origin = vec2(coord.x as f32 * px.x, coord.y as f32 * px.y);
        let mut col = ((center.x - origin.x) / TILE_SIZE).floor() as i32 + dir.x;
        let mut row = ((center.y - origin.y) / TILE_SIZE).floor() as i32 + dir.y;
        if col < 0 {
            coord.x -= 1;
            col += cells.x;
        } else if col >= cells.x {
            coord.x += 1;
            col -= cells.x;
        }
        if row < 0 {
            coord.y -= 1;
            row += cells.y;
        } else if row >= cells.y {
            if self.menu_mode {
                return true;
            }
            coord.y += 1;
            row -= cells.y;
        }
        match self.chunks.get(&self.id_for(coord)) {
            Some(grid) => grid.get(col as usize, row as usize).solid_for_neighbour(),
            None => false,
        }
    }

    /// The environment name at a position: the transition name inside a
    /// boundary chunk, otherwise the dimension the column belongs to.
    pub fn environment_at(&self, pos: Vec2) -> String {
        let cx = self.chunk_at(pos).x;
        let mut env = self.dims.first().name.as_str();
        for b in &self.boundaries {
            if cx == b.chunk_x {
                return b.transition.clone();
            }
            if cx > b.chunk_x {
                env = &b.to;
            } else {
                break;
            }
        }
        env.to_string()
    }

    /// Inside a boundary chunk: the transition name and how far across the
    /// chunk the position sits, in [0, 1]. Elsewhere: no transition.
    pub fn transition_progress(&self, pos: Vec2) -> (Option<&str>, f32) {
        let cx = self.chunk_at(pos).x;
        let Some(b) = self.boundaries.iter().find(|b| b.chunk_x == cx) else {
            return (None, 0.0);
        };
        let width = self.chunk_px().x;
        let t = ((pos.x - cx as f32 * width) / width).clamp(0.0, 1.0);
        (Some(&b.transition), t)
    }

    /// The gravity multiplier at a position, blended linearly across a
    /// boundary chunk so physics never pops at the seam.
    pub fn gravity_scale_at(&self, pos: Vec2) -> f32 {
        let cx = self.chunk_at(pos).x;
        if let Some(b) = self.boundaries.iter().find(|b| b.chunk_x == cx) {
            let from = self.dims.get(&b.from).map(|d| d.gravity_scale).unwrap_or(1.0);
            let to = self.dims.get(&b.to).map(|d| d.gravity_scale).unwrap_or(1.0);
            let (_, t) = self.transition_progress(pos);
            return from + (to - from) * t;
        }
        self.dims
            .get(&self.environment_at(pos))
            .map(|d| d.gravity_scale)
            .unwrap_or(1.0)
    }

    /// Whether the mirrored vertical collision rule applies at a position.
    /// Only inside the fully inverted dimension, never in its entry
    /// transition chunk.
    pub fn inverted_at(&self, pos: Vec2) -> bool {
        self.dims
            .get(&self.environment_at(pos))
            .map(|d| d.inverted)
            .unwrap_or(false)
    }

    /// Removes a dead tile: drops it from the materialized list and zeroes
    /// its cell in the raw grid so neighbour queries see it as gone.
    pub fn remove_tile(&mut self, entity: &EntityRef) {
        let rect = entity.borrow().rect();
        let px = self.chunk_px();
        let center = rect.center();
        let coord = ivec2(
            (center.x / px.x).floor() as i32,
            (center.y / px.y).floor() as i32,
        );
        let id = self.id_for(coord);
        let origin = self.origin_of(id);
        let col = ((center.x - origin.x) / TILE_SIZE).floor() as i32;
        let row = ((center.y - origin.y) / TILE_SIZE).floor() as i32;
        let cells = self.chunk_cells();
        if col >= 0 && col < cells.x && row >= 0 && row < cells.y {
            if let Some(grid) = self.chunks.get_mut(&id) {
                grid.set(col as usize, row as usize, TileKind::Empty);
            }
        }
        if let Some(list) = self.generated.get_mut(&id) {
            list.retain(|e| !Rc::ptr_eq(e, entity));
        }
    }

    /// Resets the world into the hand-authored menu area.
    pub fn generate_menu(&mut self) -> Result<(), String> {
        self.reset_stores();
        self.menu_mode = true;
        let menu = ChunkGrid::from_rows(&MENU_MAP.iter().map(|r| r.to_vec()).collect::<Vec<_>>())?;
        let side =
            ChunkGrid::from_rows(&MENU_GEN_MAP.iter().map(|r| r.to_vec()).collect::<Vec<_>>())?;
        self.chunks.insert(ChunkId::Menu, menu);
        self.chunks.insert(ChunkId::At(ivec2(-1, 0)), side.clone());
        self.chunks.insert(ChunkId::At(ivec2(1, 0)), side);
        Ok(())
    }

    /// Leaves the menu and arms the streaming world from the first
    /// dimension.
    pub fn quit_menu(&mut self) {
        self.reset_stores();
        self.menu_mode = false;
    }

    fn reset_stores(&mut self) {
        self.chunks.clear();
        self.generated.clear();
        self.presets.clear();
        self.transitions.clear();
        self.boundaries.clear();
        self.chunks_since_switch = 0;
        self.dims.reset();
    }

    pub fn transition_at(&self, id: ChunkId) -> Option<&str> {
        self.transitions.get(&id).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        World::new(7, DimensionSet::load_embedded().unwrap())
    }

    #[test]
    fn test_materialize_is_cached() {
        let mut world = test_world();
        let id = ChunkId::At(ivec2(0, 0));
        let first = world.materialize(id).unwrap();
        assert!(first.fresh);
        let second = world.materialize(id).unwrap();
        assert!(!second.fresh);
        assert_eq!(first.entities.len(), second.entities.len());
        for (a, b) in first.entities.iter().zip(second.entities.iter()) {
            assert!(Rc::ptr_eq(a, b));
        }
        // roaming entities only come out of the generating call
        assert!(second.monsters.is_empty());
    }

    #[test]
    fn test_chunk_crossing_and_active_neighbourhood() {
        let world = test_world();
        let width = world.chunk_cells().x as f32 * TILE_SIZE;
        assert_eq!(world.chunk_at(vec2(width - 1.0, 40.0)), ivec2(0, 0));
        let crossed = vec2(width + 1.0, 40.0);
        assert_eq!(world.chunk_at(crossed), ivec2(1, 0));
        let active = world.active_chunks(crossed);
        assert!(active.contains(&ChunkId::At(ivec2(0, 0))));
        assert!(active.contains(&ChunkId::At(ivec2(2, 0))));
        assert!(!active.contains(&ChunkId::At(ivec2(1, 1))));
    }

    #[test]
    fn test_off_axis_chunks_are_empty_and_cached() {
        let mut world = test_world();
        let above = world.materialize(ChunkId::At(ivec2(0, -1))).unwrap();
        assert!(above.fresh);
        assert!(above.entities.is_empty());
        assert!(!world.materialize(ChunkId::At(ivec2(0, -1))).unwrap().fresh);
    }

    #[test]
    fn test_dimension_cycle_forces_boundary() {
        let mut world = test_world();
        // the counter exceeds the threshold after CHUNKS_BEFORE_SWITCH + 1
        // streamed chunks, so the next one is the boundary
        let boundary_x = (CHUNKS_BEFORE_SWITCH + 1) as i32;
        for x in 0..boundary_x {
            world.materialize(ChunkId::At(ivec2(x, 0))).unwrap();
            assert!(world.transition_at(ChunkId::At(ivec2(x, 0))).is_none());
        }
        world.materialize(ChunkId::At(ivec2(boundary_x, 0))).unwrap();
        assert_eq!(
            world.transition_at(ChunkId::At(ivec2(boundary_x, 0))),
            Some("transition_to_moon")
        );
        assert_eq!(world.dims().active().name, "moon");

        let width = world.chunk_cells().x as f32 * TILE_SIZE;
        let mid_boundary = vec2((boundary_x as f32 + 0.5) * width, 40.0);
        assert_eq!(world.environment_at(mid_boundary), "transition_to_moon");
        let (name, t) = world.transition_progress(mid_boundary);
        assert_eq!(name, Some("transition_to_moon"));
        assert!((t - 0.5).abs() < 1e-3);
        // gravity blends half-way between normal (1.0) and moon (0.5)
        assert!((world.gravity_scale_at(mid_boundary) - 0.75).abs() < 1e-3);
        // past the boundary the column reads as the next dimension
        let after = vec2((boundary_x as f32 + 1.5) * width, 40.0);
        assert_eq!(world.environment_at(after), "moon");
        assert!(!world.inverted_at(mid_boundary));
    }

    #[test]
    fn test_tile_death_round_trip() {
        let mut world = test_world();
        world.generate_menu().unwrap();
        let made = world.materialize(ChunkId::Menu).unwrap();
        // grab a grass tile from the menu floor
        let tile = made
            .entities
            .iter()
            .find(|e| e.borrow().tag() == Some(TileKind::Grass))
            .unwrap()
            .clone();
        let rect = tile.borrow().rect();
        assert!(world.has_neighbour(ivec2(0, 0), rect));

        world.remove_tile(&tile);
        assert!(!world.has_neighbour(ivec2(0, 0), rect));
        let remaining = world.materialize(ChunkId::Menu).unwrap();
        assert!(!remaining.fresh);
        assert!(!remaining.entities.iter().any(|e| Rc::ptr_eq(e, &tile)));
    }

    #[test]
    fn test_menu_side_chunks_spawn_hostiles() {
        let mut world = test_world();
        world.generate_menu().unwrap();
        let made = world.materialize(ChunkId::At(ivec2(1, 0))).unwrap();
        assert_eq!(made.monsters.len(), 1);
        assert!(
            made.entities
                .iter()
                .any(|e| e.borrow().tag() == Some(TileKind::Cannon))
        );
    }

    #[test]
    fn test_menu_bottom_edge_always_has_neighbour() {
        let mut world = test_world();
        world.generate_menu().unwrap();
        let cells = world.chunk_cells();
        let bottom_row = Rect::new(
            TILE_SIZE * 3.0,
            (cells.y - 1) as f32 * TILE_SIZE,
            TILE_SIZE,
            TILE_SIZE,
        );
        assert!(world.has_neighbour(ivec2(0, 1), bottom_row));
        world.quit_menu();
        assert!(!world.menu_mode());
        // same query in the streaming world: the chunk below is absent
        assert!(!world.has_neighbour(ivec2(0, 1), bottom_row));
    }

    #[test]
    fn test_monster_spawns_come_from_reserved_code() {
        let mut world = test_world();
        let id = ChunkId::At(ivec2(0, 0));
        world.chunks.insert(
            id,
            ChunkGrid::from_rows(&[vec![20, 0, 13], vec![10, 10, 10]]).unwrap(),
        );
        let made = world.materialize(id).unwrap();
        assert_eq!(made.monsters.len(), 1);
        // reserved cells never become static geometry
        assert!(made.monsters[0].borrow().tag().is_none());
        // one cannon plus three floor tiles
        assert_eq!(made.entities.len(), 4);
        assert!(
            made.entities
                .iter()
                .any(|e| e.borrow().tag() == Some(TileKind::Cannon))
        );
    }
}
