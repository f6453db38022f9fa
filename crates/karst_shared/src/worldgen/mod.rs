pub mod carver;
pub mod caves;
pub mod fields;
pub mod rng;
pub mod terrain;

use serde::Deserialize;

use crate::block::{register_default_blocks, BlockId, BlockRegistry};
use crate::column::ChunkColumn;

/// One step of the per-column generation pipeline. Passes run in
/// registration order and mutate the column in place; a pass must confine
/// its writes to the column it was handed.
pub trait TerrainPass: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, column: &mut ChunkColumn, col_x: i32, col_z: i32);
}

/// Block ids the carver writes, resolved from the registry once at
/// initialization. A missing entry is an upstream contract violation.
#[derive(Clone, Copy, Debug)]
pub struct CaveMaterials {
    pub air: BlockId,
    pub lava: BlockId,
    pub basalt: BlockId,
}

impl CaveMaterials {
    pub fn resolve(registry: &BlockRegistry) -> Self {
        let lookup = |name: &str| {
            registry
                .get_by_name(name)
                .unwrap_or_else(|| panic!("block '{name}' missing from registry"))
        };
        Self {
            air: BlockId::AIR,
            lava: lookup("lava_source"),
            basalt: lookup("basalt"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldgenSettings {
    pub seed: u64,
    pub sea_level: i32,
    pub lava_layer_y: i32,
    /// Chance per source column of starting a cave system.
    pub caves_per_column: f32,
    /// Chunk radius from which cave systems can reach a generated column.
    pub carve_range: i32,
    /// World x/z start positions where cave spawning is opted out.
    pub suppressed_columns: Vec<(i32, i32)>,
}

impl Default for WorldgenSettings {
    fn default() -> Self {
        Self {
            seed: 0xC0FFEE,
            sea_level: 110,
            lava_layer_y: 12,
            caves_per_column: 0.35,
            carve_range: 5,
            suppressed_columns: Vec::new(),
        }
    }
}

pub struct WorldGenerator {
    seed: u64,
    registry: BlockRegistry,
    passes: Vec<Box<dyn TerrainPass>>,
}

impl WorldGenerator {
    pub fn new(settings: &WorldgenSettings) -> Self {
        let registry = register_default_blocks();
        let materials = CaveMaterials::resolve(&registry);
        let passes: Vec<Box<dyn TerrainPass>> = vec![
            Box::new(terrain::TerrainGenerator::new(settings)),
            Box::new(caves::CaveGenerator::new(settings, materials)),
        ];
        Self {
            seed: settings.seed,
            registry,
            passes,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Runs the full pass pipeline for one column. Pure and synchronous;
    /// safe to call for any column from any worker thread.
    pub fn generate_column(&self, col_x: i32, col_z: i32) -> ChunkColumn {
        let mut column = ChunkColumn::new();
        for pass in &self.passes {
            pass.generate(&mut column, col_x, col_z);
        }
        column
    }
}
