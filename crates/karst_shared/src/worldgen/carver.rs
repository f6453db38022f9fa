use glam::{DVec3, IVec3};

use crate::block::{is_water_block, BlockId};
use crate::column::ChunkColumn;
use crate::coords::{cell_index, CHUNK_SIZE, WORLD_HEIGHT};

use super::fields::GeologicProvinces;
use super::CaveMaterials;

/// Radii are clamped to this floor before any ellipsoid test.
pub const MIN_RADIUS: f64 = 0.35;

const BASALT_THRESHOLD: f64 = 0.55;
const HOT_SPRING_MIN_RADIUS: f64 = 4.0;
const HOT_SPRING_DEPTH_BAND: i32 = 20;
const HOT_SPRING_MIN_ACTIVITY: u8 = 176;

pub struct CarveContext<'a> {
    pub materials: CaveMaterials,
    pub geology: &'a GeologicProvinces,
    pub lava_layer_y: i32,
    /// World position of the generated column's minimum corner (y = 0).
    pub origin: IVec3,
}

/// Inclusive column-local bounding box of an ellipsoid, clamped to the
/// column window. `None` when the ellipsoid misses the column entirely.
fn local_bounds(center: DVec3, horiz_r: f64, vert_r: f64) -> Option<(IVec3, IVec3)> {
    let size = CHUNK_SIZE as i32;

    let min = IVec3::new(
        ((center.x - horiz_r).floor() as i32).max(0),
        ((center.y - vert_r).floor() as i32).max(0),
        ((center.z - horiz_r).floor() as i32).max(0),
    );
    let max = IVec3::new(
        ((center.x + horiz_r).ceil() as i32).min(size - 1),
        ((center.y + vert_r).ceil() as i32).min(WORLD_HEIGHT - 1),
        ((center.z + horiz_r).ceil() as i32).min(size - 1),
    );

    if min.x > max.x || min.y > max.y || min.z > max.z {
        return None;
    }
    Some((min, max))
}

/// Carves one ellipsoid cavity into the column. `center` is in world
/// coordinates. Returns `false` only when the pre-check scan found open
/// water abutting the would-be cavity, in which case nothing was written.
pub fn carve_ellipsoid(
    column: &mut ChunkColumn,
    ctx: &CarveContext<'_>,
    center: DVec3,
    horiz_r: f64,
    vert_r: f64,
) -> bool {
    let horiz_r = horiz_r.max(MIN_RADIUS);
    let vert_r = vert_r.max(MIN_RADIUS);

    let local = center - DVec3::new(ctx.origin.x as f64, 0.0, ctx.origin.z as f64);

    // Scan the inflated box first; touching open water means the cavity
    // would breach a lake or ocean, so the whole carve is dropped.
    if let Some((min, max)) = local_bounds(local, horiz_r + 1.0, vert_r + 1.0) {
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                for y in min.y..=max.y {
                    if is_water_block(column.block_at(x, y, z)) {
                        return false;
                    }
                }
            }
        }
    }

    let Some((min, max)) = local_bounds(local, horiz_r, vert_r) else {
        return true;
    };

    let geo = ctx
        .geology
        .activity_at(center.x.floor() as i32, center.z.floor() as i32);
    // More active provinces push molten rock a few blocks higher.
    let lava_line = ctx.lava_layer_y - 4 + i32::from(geo / 32);

    let distortion_amp = ((vert_r - 1.0) * 0.7).clamp(0.0, 3.0);

    for z in min.z..=max.z {
        let dz = (z as f64 + 0.5 - local.z) / horiz_r;
        for x in min.x..=max.x {
            let dx = (x as f64 + 0.5 - local.x) / horiz_r;

            // The distortion byte lifts or lowers the cavity ceiling for
            // this cell; the extent below the center is never biased.
            let byte = column.height_distortion[cell_index(x as usize, z as usize)];
            let bias = (f64::from(byte) - 128.0) / 128.0 * distortion_amp;
            let upper_extent = (vert_r + bias).max(MIN_RADIUS);

            for y in (min.y..=max.y).rev() {
                let dy_raw = y as f64 + 0.5 - local.y;
                let dy = if dy_raw > 0.0 {
                    dy_raw / upper_extent
                } else {
                    dy_raw / vert_r
                };

                if dx * dx + dy * dy + dz * dz >= 1.0 {
                    continue;
                }

                let existing = column.block_at(x, y, z);
                if existing == BlockId::BEDSTONE {
                    continue;
                }

                if y as u8 == column.surface_height(x as usize, z as usize) {
                    column.lower_surface(x as usize, z as usize);
                }

                let world_x = ctx.origin.x + x;
                let world_z = ctx.origin.z + z;

                if y <= lava_line || y == ctx.lava_layer_y {
                    if ctx.geology.basalt_at(world_x, y, world_z) > BASALT_THRESHOLD {
                        column.set_block(x, y, z, ctx.materials.basalt);
                    } else if y <= lava_line {
                        column.set_block(x, y, z, ctx.materials.lava);
                        column.schedule_light_update(IVec3::new(x, y, z));
                    } else {
                        column.set_block(x, y, z, ctx.materials.air);
                    }
                } else {
                    column.set_block(x, y, z, ctx.materials.air);
                }
            }
        }
    }

    let center_y = center.y.floor() as i32;
    if horiz_r >= HOT_SPRING_MIN_RADIUS
        && center_y > ctx.lava_layer_y
        && center_y <= ctx.lava_layer_y + HOT_SPRING_DEPTH_BAND
        && geo > HOT_SPRING_MIN_ACTIVITY
    {
        let marker = IVec3::new(local.x.floor() as i32, center_y, local.z.floor() as i32);
        if ChunkColumn::in_bounds(marker.x, marker.y, marker.z) {
            column.record_hot_spring(marker, horiz_r as f32);
        }
    }

    true
}
