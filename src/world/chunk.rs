//! Chunks: fixed-size tile grids, the unit of lazy generation and caching.

use glam::IVec2;

/// Identifies a chunk in one of the two worlds the engine knows about: the
/// infinite scrolling world, or the hand-authored menu area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkId {
    Menu,
    At(IVec2),
}

/// Every tile code a chunk grid can hold. Grids are authored as integers in
/// the dimension JSON files and decoded once at load time, so an undefined
/// code is a load error and never reaches the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Empty,
    /// Breakable colored block with a slow color pulse.
    AnimatedColor,
    /// Unbreakable colored block.
    Color,
    /// Hazard. Never collides, kills the player on overlap.
    Spike,
    Grass,
    Stone,
    /// In-world trigger button. Carries a press zone above itself.
    Beacon,
    /// Static turret, fires bullets at the player.
    Cannon,
    /// Reserved code: spawns a roaming monster instead of static geometry.
    MonsterSpawn,
}

impl TileKind {
    pub fn from_code(code: i64) -> Result<Self, String> {
        match code {
            0 => Ok(TileKind::Empty),
            1 | 2 => Ok(TileKind::AnimatedColor),
            3 => Ok(TileKind::Color),
            4 => Ok(TileKind::Spike),
            10 => Ok(TileKind::Grass),
            11 => Ok(TileKind::Stone),
            12 => Ok(TileKind::Beacon),
            13 => Ok(TileKind::Cannon),
            20 => Ok(TileKind::MonsterSpawn),
            _ => Err(format!("Undefined tile code: {}", code)),
        }
    }

    /// Whether a neighbour query should report this cell as occupied.
    /// Hazards and reserved codes read as open space so wall faces render
    /// behind them.
    pub fn solid_for_neighbour(self) -> bool {
        !matches!(
            self,
            TileKind::Empty | TileKind::Spike | TileKind::MonsterSpawn
        )
    }

    /// Whether the translated entity joins the collidable set.
    pub fn collides(self) -> bool {
        !matches!(
            self,
            TileKind::Empty | TileKind::Spike | TileKind::MonsterSpawn
        )
    }

    /// Whether landing on the tile breaks it. Only the animated color
    /// blocks are destructible; terrain and the plain color block persist.
    pub fn breakable(self) -> bool {
        matches!(self, TileKind::AnimatedColor)
    }
}

/// A dense row-major tile grid. Cloned from a dimension preset when a chunk
/// is first generated, then mutated in place when tiles die.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkGrid {
    width: usize,
    height: usize,
    cells: Vec<TileKind>,
}

impl ChunkGrid {
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self, String> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err("Chunk grid has no rows".to_string());
        }
        let width = rows[0].len();
        let height = rows.len();
        let mut cells = Vec::with_capacity(width * height);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "Ragged chunk grid: row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    width
                ));
            }
            for &code in row {
                cells.push(TileKind::from_code(code)?);
            }
        }
        Ok(ChunkGrid {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, col: usize, row: usize) -> TileKind {
        self.cells[row * self.width + col]
    }

    pub fn set(&mut self, col: usize, row: usize, kind: TileKind) {
        self.cells[row * self.width + col] = kind;
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&c| c == TileKind::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_code_round_trip() {
        assert_eq!(TileKind::from_code(0).unwrap(), TileKind::Empty);
        assert_eq!(TileKind::from_code(4).unwrap(), TileKind::Spike);
        assert_eq!(TileKind::from_code(12).unwrap(), TileKind::Beacon);
        assert!(TileKind::from_code(99).is_err());
    }

    #[test]
    fn test_grid_from_rows() {
        let grid = ChunkGrid::from_rows(&[vec![0, 10, 0], vec![10, 10, 10]]).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(1, 0), TileKind::Grass);
        assert_eq!(grid.get(0, 0), TileKind::Empty);
    }

    #[test]
    fn test_grid_rejects_ragged_and_unknown() {
        assert!(ChunkGrid::from_rows(&[vec![0, 0], vec![0]]).is_err());
        assert!(ChunkGrid::from_rows(&[vec![0, 7]]).is_err());
    }

    #[test]
    fn test_solidity_rules() {
        assert!(!TileKind::Spike.solid_for_neighbour());
        assert!(!TileKind::Spike.collides());
        assert!(TileKind::Grass.solid_for_neighbour());
        assert!(TileKind::AnimatedColor.breakable());
        assert!(!TileKind::Grass.breakable());
        assert!(!TileKind::Color.breakable());
    }
}
