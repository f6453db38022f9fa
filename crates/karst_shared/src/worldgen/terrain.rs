use noise::{NoiseFn, Perlin};

use crate::block::BlockId;
use crate::column::ChunkColumn;
use crate::coords::{cell_index, CHUNK_SIZE, WORLD_HEIGHT};

use super::fields::HeightDistortionField;
use super::rng::mix;
use super::{TerrainPass, WorldgenSettings};

const SNOW_LINE: i32 = 190;
const BEDSTONE_DEPTH: i32 = 3;

/// Base terrain fill: surface shaping, soil layering, sea fill, and the
/// per-column auxiliary maps the cave pass consumes.
pub struct TerrainGenerator {
    sea_level: i32,
    surface: Perlin,
    detail: Perlin,
    distortion: HeightDistortionField,
}

impl TerrainGenerator {
    pub fn new(settings: &WorldgenSettings) -> Self {
        Self {
            sea_level: settings.sea_level,
            surface: Perlin::new(mix(settings.seed, 0x7E44) as u32),
            detail: Perlin::new(mix(settings.seed, 0xDE7A) as u32),
            distortion: HeightDistortionField::new(settings.seed),
        }
    }

    fn surface_height(&self, world_x: i32, world_z: i32) -> i32 {
        let wx = world_x as f64;
        let wz = world_z as f64;

        let coarse = self.surface.get([wx * 0.008, wz * 0.008]);
        let detail = self.detail.get([wx * 0.032 + 101.3, wz * 0.032 - 73.7]) * 0.35;
        let ridge = (1.0 - self.surface.get([wx * 0.004 + 401.0, wz * 0.004 - 257.0]).abs())
            .powf(1.7);

        let height = coarse * 26.0 + detail * 10.0 + ridge * 18.0 + self.sea_level as f64 + 6.0;
        (height.round() as i32).clamp(BEDSTONE_DEPTH + 1, WORLD_HEIGHT - 8)
    }

    fn layer_block(&self, y: i32, surface_y: i32) -> BlockId {
        if y < BEDSTONE_DEPTH {
            BlockId::BEDSTONE
        } else if y < surface_y - 8 {
            BlockId::GRANITE
        } else if y < surface_y - 3 {
            BlockId::TUFF
        } else if y < surface_y {
            BlockId::LOAM
        } else if surface_y > SNOW_LINE {
            BlockId::SNOWCAP
        } else if surface_y <= self.sea_level - 6 {
            BlockId::GRAVEL_BED
        } else if surface_y <= self.sea_level + 1 {
            BlockId::DUNE_SAND
        } else {
            BlockId::VERDANT_TURF
        }
    }
}

impl TerrainPass for TerrainGenerator {
    fn name(&self) -> &'static str {
        "terrain"
    }

    fn generate(&self, column: &mut ChunkColumn, col_x: i32, col_z: i32) {
        self.distortion
            .fill_column(col_x, col_z, &mut column.height_distortion);

        let size = CHUNK_SIZE as i32;
        let origin_x = col_x * size;
        let origin_z = col_z * size;

        for z in 0..size {
            for x in 0..size {
                let surface_y = self.surface_height(origin_x + x, origin_z + z);

                for y in 0..=surface_y {
                    column.set_block(x, y, z, self.layer_block(y, surface_y));
                }
                for y in surface_y + 1..=self.sea_level.min(WORLD_HEIGHT - 1) {
                    column.set_block(x, y, z, BlockId::STILL_WATER);
                }

                let cell = cell_index(x as usize, z as usize);
                column.height_map[cell] = surface_y as u8;
                // Rain stops on the sea surface where the land dips under.
                column.rain_height_map[cell] = surface_y.max(self.sea_level) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TerrainGenerator;
    use crate::block::{is_water_block, BlockId};
    use crate::column::ChunkColumn;
    use crate::coords::{cell_index, CHUNK_SIZE};
    use crate::worldgen::{TerrainPass, WorldgenSettings};

    fn generate(seed: u64, col_x: i32, col_z: i32) -> ChunkColumn {
        let settings = WorldgenSettings {
            seed,
            ..WorldgenSettings::default()
        };
        let gen = TerrainGenerator::new(&settings);
        let mut column = ChunkColumn::new();
        gen.generate(&mut column, col_x, col_z);
        column
    }

    #[test]
    fn height_map_tracks_the_top_solid_voxel() {
        let column = generate(11, 0, 0);

        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let h = i32::from(column.height_map[cell_index(x, z)]);
                let top = column.block_at(x as i32, h, z as i32);
                assert_ne!(top, BlockId::AIR, "surface voxel must be placed");
                assert!(!is_water_block(top), "height map tracks land, not sea");

                let above = column.block_at(x as i32, h + 1, z as i32);
                assert!(
                    above == BlockId::AIR || is_water_block(above),
                    "voxel above the surface must be open"
                );
            }
        }
    }

    #[test]
    fn sea_fills_open_space_up_to_sea_level() {
        let settings = WorldgenSettings::default();
        let column = generate(11, 40, -25);

        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let h = i32::from(column.height_map[cell_index(x, z)]);
                for y in h + 1..=settings.sea_level {
                    assert!(is_water_block(column.block_at(x as i32, y, z as i32)));
                }
                let rain = i32::from(column.rain_height_map[cell_index(x, z)]);
                assert_eq!(rain, h.max(settings.sea_level));
            }
        }
    }

    #[test]
    fn terrain_pass_is_deterministic_and_fills_distortion() {
        let a = generate(77, 3, 9);
        let b = generate(77, 3, 9);

        assert_eq!(a.height_map, b.height_map);
        assert_eq!(a.height_distortion, b.height_distortion);
        assert!(a.height_distortion.iter().any(|&v| v != a.height_distortion[0]));

        for z in 0..CHUNK_SIZE as i32 {
            for x in 0..CHUNK_SIZE as i32 {
                for y in (0..64).chain(100..140) {
                    assert_eq!(a.block_at(x, y, z), b.block_at(x, y, z));
                }
            }
        }
    }

    #[test]
    fn bedstone_floor_is_always_present() {
        let column = generate(5, -8, 14);
        for z in 0..CHUNK_SIZE as i32 {
            for x in 0..CHUNK_SIZE as i32 {
                for y in 0..3 {
                    assert_eq!(column.block_at(x, y, z), BlockId::BEDSTONE);
                }
            }
        }
    }
}
