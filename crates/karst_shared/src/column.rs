use glam::IVec3;
use rustc_hash::FxHashMap;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::block::BlockId;
use crate::coords::{
    cell_index, local_to_index, LocalPos, CHUNK_SIZE, CHUNK_VOLUME, COLUMN_AREA, COLUMN_CHUNKS,
    WORLD_HEIGHT,
};

#[derive(Clone, Debug)]
pub struct ChunkData {
    pub blocks: Box<[BlockId; CHUNK_VOLUME]>,
}

impl ChunkData {
    pub fn new_empty() -> Self {
        Self {
            blocks: Box::new([BlockId::AIR; CHUNK_VOLUME]),
        }
    }

    pub fn new_filled(block: BlockId) -> Self {
        Self {
            blocks: Box::new([block; CHUNK_VOLUME]),
        }
    }

    pub fn get(&self, local: LocalPos) -> BlockId {
        self.blocks[local_to_index(local)]
    }

    pub fn set(&mut self, local: LocalPos, block: BlockId) {
        let index = local_to_index(local);
        self.blocks[index] = block;
    }
}

impl Default for ChunkData {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl Serialize for ChunkData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.blocks.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChunkData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let blocks = Vec::<BlockId>::deserialize(deserializer)?;
        if blocks.len() != CHUNK_VOLUME {
            return Err(de::Error::custom(format!(
                "expected {CHUNK_VOLUME} blocks, got {}",
                blocks.len()
            )));
        }

        let blocks: [BlockId; CHUNK_VOLUME] = blocks
            .try_into()
            .map_err(|_| de::Error::custom("failed to deserialize chunk block array"))?;

        Ok(Self {
            blocks: Box::new(blocks),
        })
    }
}

/// A full-height stack of chunks plus the auxiliary per-column data the
/// worldgen passes maintain. Allocated per generation request, mutated in
/// place by the passes, then handed to the caller; the worldgen core never
/// keeps a reference past the generation call.
#[derive(Clone, Debug)]
pub struct ChunkColumn {
    chunks: Vec<ChunkData>,
    /// Top solid surface y per column cell.
    pub height_map: [u8; COLUMN_AREA],
    /// Top rain-blocking (non-air) y per column cell.
    pub rain_height_map: [u8; COLUMN_AREA],
    /// Noise bytes biasing cave ceiling height, filled by the terrain pass.
    pub height_distortion: [u8; COLUMN_AREA],
    /// Hot-spring markers recorded during carving, keyed by column-local
    /// position, value = horizontal cavity radius. Append-only; consumed by
    /// later feature-placement passes.
    pub hot_springs: FxHashMap<IVec3, f32>,
    /// Column-local positions with pending lighting updates (lava
    /// placement), drained by the lighting engine.
    pub light_updates: Vec<IVec3>,
}

impl ChunkColumn {
    pub fn new() -> Self {
        Self {
            chunks: (0..COLUMN_CHUNKS).map(|_| ChunkData::new_empty()).collect(),
            height_map: [0; COLUMN_AREA],
            rain_height_map: [0; COLUMN_AREA],
            height_distortion: [0; COLUMN_AREA],
            hot_springs: FxHashMap::default(),
            light_updates: Vec::new(),
        }
    }

    pub fn chunk(&self, index: usize) -> &ChunkData {
        &self.chunks[index]
    }

    pub fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        let size = CHUNK_SIZE as i32;
        (0..size).contains(&x) && (0..WORLD_HEIGHT).contains(&y) && (0..size).contains(&z)
    }

    /// Column-local block read; callers must stay inside the column window.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        assert!(
            Self::in_bounds(x, y, z),
            "column-local read out of bounds: ({x}, {y}, {z})"
        );
        let chunk = y as usize / CHUNK_SIZE;
        self.chunks[chunk].get(LocalPos {
            x: x as u8,
            y: (y as usize % CHUNK_SIZE) as u8,
            z: z as u8,
        })
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockId) {
        assert!(
            Self::in_bounds(x, y, z),
            "column-local write out of bounds: ({x}, {y}, {z})"
        );
        let chunk = y as usize / CHUNK_SIZE;
        self.chunks[chunk].set(
            LocalPos {
                x: x as u8,
                y: (y as usize % CHUNK_SIZE) as u8,
                z: z as u8,
            },
            block,
        );
    }

    pub fn surface_height(&self, x: usize, z: usize) -> u8 {
        self.height_map[cell_index(x, z)]
    }

    /// Removes one voxel from the tracked surface of a cell. Both height
    /// maps drop by one and never wrap below zero.
    pub fn lower_surface(&mut self, x: usize, z: usize) {
        let idx = cell_index(x, z);
        self.height_map[idx] = self.height_map[idx].saturating_sub(1);
        self.rain_height_map[idx] = self.rain_height_map[idx].saturating_sub(1);
    }

    pub fn schedule_light_update(&mut self, local: IVec3) {
        self.light_updates.push(local);
    }

    pub fn record_hot_spring(&mut self, local: IVec3, radius: f32) {
        self.hot_springs.entry(local).or_insert(radius);
    }
}

impl Default for ChunkColumn {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::{ChunkColumn, ChunkData};
    use crate::block::BlockId;
    use crate::coords::{LocalPos, CHUNK_VOLUME, WORLD_HEIGHT};

    #[test]
    fn chunk_creation_and_get_set_work() {
        let mut chunk = ChunkData::new_empty();
        let pos = LocalPos { x: 3, y: 7, z: 11 };
        assert_eq!(chunk.get(pos), BlockId::AIR);

        chunk.set(pos, BlockId::GRANITE);
        assert_eq!(chunk.get(pos), BlockId::GRANITE);
    }

    #[test]
    fn chunk_bincode_round_trip_preserves_data() {
        let mut original = ChunkData::new_filled(BlockId::GRANITE);
        original.set(LocalPos { x: 0, y: 0, z: 0 }, BlockId::AIR);
        original.set(LocalPos { x: 31, y: 31, z: 31 }, BlockId::BASALT);

        let encoded = bincode::serialize(&original).expect("serialize chunk");
        let decoded: ChunkData = bincode::deserialize(&encoded).expect("deserialize chunk");

        assert_eq!(decoded.blocks.len(), CHUNK_VOLUME);
        for (lhs, rhs) in original.blocks.iter().zip(decoded.blocks.iter()) {
            assert_eq!(lhs, rhs);
        }
    }

    #[test]
    fn column_addresses_blocks_across_stacked_chunks() {
        let mut column = ChunkColumn::new();
        assert_eq!(column.block_at(5, 0, 5), BlockId::AIR);

        column.set_block(5, 0, 5, BlockId::BEDSTONE);
        column.set_block(5, 200, 5, BlockId::GRANITE);
        column.set_block(5, WORLD_HEIGHT - 1, 5, BlockId::SNOWCAP);

        assert_eq!(column.block_at(5, 0, 5), BlockId::BEDSTONE);
        assert_eq!(column.block_at(5, 200, 5), BlockId::GRANITE);
        assert_eq!(column.block_at(5, WORLD_HEIGHT - 1, 5), BlockId::SNOWCAP);
        assert_eq!(column.block_at(5, 1, 5), BlockId::AIR);

        // y 200 lands in the seventh stacked chunk.
        let local = LocalPos { x: 5, y: 8, z: 5 };
        assert_eq!(column.chunk(6).get(local), BlockId::GRANITE);
    }

    #[test]
    fn lower_surface_saturates_at_zero() {
        let mut column = ChunkColumn::new();
        column.height_map[0] = 1;
        column.rain_height_map[0] = 2;

        column.lower_surface(0, 0);
        assert_eq!(column.height_map[0], 0);
        assert_eq!(column.rain_height_map[0], 1);

        column.lower_surface(0, 0);
        assert_eq!(column.height_map[0], 0);
        assert_eq!(column.rain_height_map[0], 0);
    }

    #[test]
    fn hot_spring_markers_keep_first_recorded_radius() {
        let mut column = ChunkColumn::new();
        let pos = IVec3::new(4, 20, 9);

        column.record_hot_spring(pos, 5.0);
        column.record_hot_spring(pos, 9.0);

        assert_eq!(column.hot_springs.len(), 1);
        assert_eq!(column.hot_springs[&pos], 5.0);
    }
}
