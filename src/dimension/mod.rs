//! Dimension rulesets: the data-driven "world themes".
//!
//! Each dimension ships as a JSON file under `src/assets/dimensions/`,
//! embedded into the binary at compile time. A ruleset supplies the chunk
//! presets, the adjacency table used by weighted generation, the gravity
//! rules, and the boundary preset used when the world transitions into
//! another dimension. Adding a dimension is adding a file; everything else
//! is validated at load.

use std::collections::HashMap;

use fxhash::FxHashMap;
use glam::IVec2;
use include_dir::{Dir, include_dir};
use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::world::chunk::ChunkGrid;

static DIMENSION_FILES: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/assets/dimensions");

#[derive(Deserialize)]
struct RulesFile {
    name: String,
    order: u32,
    gravity_scale: f32,
    inverted: bool,
    empty_preset: String,
    presets: HashMap<String, Vec<Vec<i64>>>,
    following: HashMap<String, Vec<(String, u32)>>,
    transition_to: HashMap<String, String>,
}

/// One named dimension: presets, adjacency, gravity and transition targets.
#[derive(Debug)]
pub struct DimensionRules {
    pub name: String,
    pub order: u32,
    /// Multiplier applied to the per-frame gravity step. Negative means the
    /// dimension pulls upward.
    pub gravity_scale: f32,
    /// Whether the vertical collision rule runs mirrored in this dimension.
    pub inverted: bool,
    pub empty_preset: String,
    presets: FxHashMap<String, ChunkGrid>,
    following: FxHashMap<String, Vec<(String, u32)>>,
    pub transition_to: FxHashMap<String, String>,
}

impl DimensionRules {
    fn from_json(source: &str) -> Result<Self, String> {
        let file: RulesFile = serde_json::from_str(source)
            .map_err(|e| format!("Malformed dimension file: {}", e))?;

        let mut presets = FxHashMap::default();
        let mut grid_size: Option<(usize, usize)> = None;
        for (name, rows) in &file.presets {
            let grid = ChunkGrid::from_rows(rows)
                .map_err(|e| format!("Dimension '{}', preset '{}': {}", file.name, name, e))?;
            match grid_size {
                None => grid_size = Some((grid.width(), grid.height())),
                Some((w, h)) if (grid.width(), grid.height()) != (w, h) => {
                    return Err(format!(
                        "Dimension '{}': preset '{}' is {}x{}, expected {}x{}",
                        file.name,
                        name,
                        grid.width(),
                        grid.height(),
                        w,
                        h
                    ));
                }
                _ => {}
            }
            presets.insert(name.clone(), grid);
        }

        if !presets.contains_key(&file.empty_preset) {
            return Err(format!(
                "Dimension '{}': empty preset '{}' does not exist",
                file.name, file.empty_preset
            ));
        }
        for (prev, nexts) in &file.following {
            if nexts.is_empty() {
                return Err(format!(
                    "Dimension '{}': '{}' has no allowed followers",
                    file.name, prev
                ));
            }
            for (next, weight) in nexts {
                if !presets.contains_key(next) {
                    return Err(format!(
                        "Dimension '{}': adjacency references unknown preset '{}'",
                        file.name, next
                    ));
                }
                if *weight == 0 {
                    return Err(format!(
                        "Dimension '{}': zero weight for '{}' after '{}'",
                        file.name, next, prev
                    ));
                }
            }
        }
        for (target, preset) in &file.transition_to {
            if !presets.contains_key(preset) {
                return Err(format!(
                    "Dimension '{}': transition to '{}' uses unknown preset '{}'",
                    file.name, target, preset
                ));
            }
        }

        Ok(DimensionRules {
            name: file.name,
            order: file.order,
            gravity_scale: file.gravity_scale,
            inverted: file.inverted,
            empty_preset: file.empty_preset,
            presets,
            following: FxHashMap::from_iter(file.following),
            transition_to: file.transition_to.into_iter().collect(),
        })
    }

    pub fn preset(&self, name: &str) -> Option<&ChunkGrid> {
        self.presets.get(name)
    }

    pub fn grid_size(&self) -> IVec2 {
        let empty = &self.presets[&self.empty_preset];
        IVec2::new(empty.width() as i32, empty.height() as i32)
    }

    /// Weighted random choice among the presets allowed to follow `prev`.
    pub fn pick_following(&self, prev: &str, rng: &mut StdRng) -> Result<&str, String> {
        let allowed = self.following.get(prev).ok_or_else(|| {
            format!(
                "Dimension '{}': no adjacency entry for preset '{}'",
                self.name, prev
            )
        })?;
        let total: u32 = allowed.iter().map(|(_, w)| w).sum();
        let mut roll = rng.random_range(0..total);
        for (name, weight) in allowed {
            if roll < *weight {
                return Ok(name);
            }
            roll -= weight;
        }
        unreachable!()
    }
}

/// The full cycle of dimensions, ordered. Knows which dimension is streaming
/// right now and which one comes next.
#[derive(Debug)]
pub struct DimensionSet {
    dims: Vec<DimensionRules>,
    active: usize,
}

impl DimensionSet {
    /// Loads every embedded dimension file and validates the set as a whole.
    pub fn load_embedded() -> Result<Self, String> {
        let mut sources = Vec::new();
        for file in DIMENSION_FILES.files() {
            let text = file
                .contents_utf8()
                .ok_or_else(|| format!("Dimension file {:?} is not UTF-8", file.path()))?;
            sources.push(text);
        }
        Self::from_sources(&sources)
    }

    pub fn from_sources(sources: &[&str]) -> Result<Self, String> {
        let mut dims = sources
            .iter()
            .map(|s| DimensionRules::from_json(s))
            .collect::<Result<Vec<_>, _>>()?;
        if dims.is_empty() {
            return Err("No dimension files found".to_string());
        }
        dims.sort_by_key(|d| d.order);

        let size = dims[0].grid_size();
        for dim in &dims {
            if dim.grid_size() != size {
                return Err(format!(
                    "Dimension '{}' uses a different chunk size than '{}'",
                    dim.name, dims[0].name
                ));
            }
        }

        let set = DimensionSet { dims, active: 0 };
        set.validate_cycle()?;
        Ok(set)
    }

    /// Checks that the transition tables actually form the cycle: each
    /// dimension must know how to transition into its successor, and the
    /// successor must accept the boundary preset as a predecessor.
    fn validate_cycle(&self) -> Result<(), String> {
        if self.dims.len() < 2 {
            return Ok(());
        }
        for (i, dim) in self.dims.iter().enumerate() {
            let next = &self.dims[(i + 1) % self.dims.len()];
            let preset = dim.transition_to.get(&next.name).ok_or_else(|| {
                format!(
                    "Dimension '{}' has no transition into '{}'",
                    dim.name, next.name
                )
            })?;
            if !next.following.contains_key(preset) {
                return Err(format!(
                    "Dimension '{}' cannot follow the boundary preset '{}'",
                    next.name, preset
                ));
            }
        }
        Ok(())
    }

    pub fn chunk_size(&self) -> IVec2 {
        self.dims[0].grid_size()
    }

    pub fn active(&self) -> &DimensionRules {
        &self.dims[self.active]
    }

    pub fn get(&self, name: &str) -> Option<&DimensionRules> {
        self.dims.iter().find(|d| d.name == name)
    }

    pub fn first(&self) -> &DimensionRules {
        &self.dims[0]
    }

    /// The deterministic successor of the active dimension in the cycle.
    pub fn successor(&self) -> &DimensionRules {
        &self.dims[(self.active + 1) % self.dims.len()]
    }

    pub fn advance(&mut self) {
        self.active = (self.active + 1) % self.dims.len();
    }

    pub fn reset(&mut self) {
        self.active = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_embedded_set_loads() {
        let set = DimensionSet::load_embedded().unwrap();
        assert_eq!(set.first().name, "normal");
        assert_eq!(set.successor().name, "moon");
        assert!(set.get("neon").unwrap().inverted);
    }

    #[test]
    fn test_cycle_wraps() {
        let mut set = DimensionSet::load_embedded().unwrap();
        set.advance();
        set.advance();
        assert_eq!(set.active().name, "neon");
        assert_eq!(set.successor().name, "normal");
        set.advance();
        assert_eq!(set.active().name, "normal");
    }

    #[test]
    fn test_pick_following_respects_table() {
        let set = DimensionSet::load_embedded().unwrap();
        let normal = set.first();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let next = normal.pick_following("flat", &mut rng).unwrap();
            assert!(normal.preset(next).is_some());
        }
        assert!(normal.pick_following("not_a_preset", &mut rng).is_err());
    }

    #[test]
    fn test_unknown_code_is_fatal() {
        let bad = r#"{
            "name": "bad", "order": 0, "gravity_scale": 1.0, "inverted": false,
            "empty_preset": "empty",
            "presets": { "empty": [[0, 77]] },
            "following": { "empty": [["empty", 1]] },
            "transition_to": {}
        }"#;
        let err = DimensionSet::from_sources(&[bad]).unwrap_err();
        assert!(err.contains("Undefined tile code"), "{}", err);
    }

    #[test]
    fn test_missing_adjacency_for_boundary_preset() {
        let a = r#"{
            "name": "a", "order": 0, "gravity_scale": 1.0, "inverted": false,
            "empty_preset": "empty",
            "presets": { "empty": [[0]], "bridge": [[3]] },
            "following": { "empty": [["empty", 1]] },
            "transition_to": { "b": "bridge" }
        }"#;
        let b = r#"{
            "name": "b", "order": 1, "gravity_scale": 0.5, "inverted": false,
            "empty_preset": "empty",
            "presets": { "empty": [[0]], "back": [[3]] },
            "following": { "empty": [["empty", 1]] },
            "transition_to": { "a": "back" }
        }"#;
        // b never accepts "bridge" as a predecessor, so the cycle is broken
        let err = DimensionSet::from_sources(&[a, b]).unwrap_err();
        assert!(err.contains("bridge"), "{}", err);
    }
}
