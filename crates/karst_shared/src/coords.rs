use glam::IVec3;
use serde::{Deserialize, Serialize};

pub const CHUNK_SIZE: usize = 32;
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// Chunks stacked vertically per column.
pub const COLUMN_CHUNKS: usize = 8;
pub const WORLD_HEIGHT: i32 = (COLUMN_CHUNKS * CHUNK_SIZE) as i32;
pub const COLUMN_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Horizontal chunk-grid coordinate of a column (a full-height stack of
/// chunks sharing the same x/z footprint).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPos {
    pub x: i32,
    pub z: i32,
}

impl ColumnPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World coordinate of the column's minimum corner.
    pub fn world_origin(self) -> IVec3 {
        IVec3::new(self.x * CHUNK_SIZE as i32, 0, self.z * CHUNK_SIZE as i32)
    }
}

/// Position within a single cubic chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

fn div_rem_floor(value: i32, divisor: i32) -> (i32, i32) {
    let mut q = value / divisor;
    let mut r = value % divisor;
    if r < 0 {
        q -= 1;
        r += divisor;
    }
    (q, r)
}

/// Splits a world position into the owning column and the column-local
/// position (x/z in 0..CHUNK_SIZE, y untouched).
pub fn world_to_column(world_pos: IVec3) -> (ColumnPos, IVec3) {
    let size = CHUNK_SIZE as i32;
    let (col_x, local_x) = div_rem_floor(world_pos.x, size);
    let (col_z, local_z) = div_rem_floor(world_pos.z, size);
    (
        ColumnPos { x: col_x, z: col_z },
        IVec3::new(local_x, world_pos.y, local_z),
    )
}

pub fn column_to_world(column: ColumnPos, local: IVec3) -> IVec3 {
    column.world_origin() + local
}

/// Index into a flat per-chunk voxel array.
pub fn local_to_index(local: LocalPos) -> usize {
    usize::from(local.x)
        + usize::from(local.z) * CHUNK_SIZE
        + usize::from(local.y) * CHUNK_SIZE * CHUNK_SIZE
}

pub fn index_to_local(index: usize) -> LocalPos {
    assert!(index < CHUNK_VOLUME, "chunk index out of bounds: {index}");

    let y = index / (CHUNK_SIZE * CHUNK_SIZE);
    let rem = index % (CHUNK_SIZE * CHUNK_SIZE);
    let z = rem / CHUNK_SIZE;
    let x = rem % CHUNK_SIZE;

    LocalPos {
        x: x as u8,
        y: y as u8,
        z: z as u8,
    }
}

/// Index into a flat per-column 2D map (height maps, distortion bytes).
pub fn cell_index(x: usize, z: usize) -> usize {
    debug_assert!(x < CHUNK_SIZE && z < CHUNK_SIZE);
    z * CHUNK_SIZE + x
}
