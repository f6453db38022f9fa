use std::f64::consts::{PI, TAU};

use glam::DVec3;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::column::ChunkColumn;
use crate::coords::{ColumnPos, CHUNK_SIZE, WORLD_HEIGHT};

use super::carver::{carve_ellipsoid, CarveContext, MIN_RADIUS};
use super::fields::GeologicProvinces;
use super::rng::CaveRand;
use super::{CaveMaterials, TerrainPass, WorldgenSettings};

/// Tunnel branches stop spawning at this depth.
pub const MAX_BRANCH_DEPTH: u8 = 3;

const EVENT_TABLE_SIZE: i32 = 10_000;
const SHAFT_CHANCE: i32 = 250;
const SHAFT_MIN_RADIUS: f64 = 2.0;
const SHAFT_MIN_HEIGHT_ABOVE_LAVA: i32 = 50;
const SHAFT_FAN_WINDOW: i32 = 10;
const WIDE_NEAR_LAVA_RANGE: f64 = 40.0;

/// Counters for one column's cave generation, logged per column and used
/// by the diagnostic driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenStats {
    pub systems: u32,
    pub tunnel_branches: u32,
    pub shaft_branches: u32,
    pub terminal_branches: u32,
    pub carves: u32,
    pub liquid_aborts: u32,
}

#[derive(Clone, Copy, Debug)]
struct TunnelParams {
    pos: DVec3,
    yaw: f64,
    pitch: f64,
    horiz_size: f64,
    vert_size: f64,
    budget: i32,
    depth: u8,
    wide_near_lava: bool,
    extra_branchy: bool,
}

#[derive(Clone, Copy, Debug)]
struct ShaftParams {
    pos: DVec3,
    yaw: f64,
    pitch: f64,
    size: f64,
    budget: i32,
    depth: u8,
}

pub struct CaveGenerator {
    seed: u64,
    sea_level: i32,
    lava_layer_y: i32,
    caves_per_column: f32,
    carve_range: i32,
    suppressed: FxHashSet<(i32, i32)>,
    materials: CaveMaterials,
    geology: GeologicProvinces,
}

impl CaveGenerator {
    pub fn new(settings: &WorldgenSettings, materials: CaveMaterials) -> Self {
        Self {
            seed: settings.seed,
            sea_level: settings.sea_level,
            lava_layer_y: settings.lava_layer_y,
            caves_per_column: settings.caves_per_column,
            carve_range: settings.carve_range,
            suppressed: settings.suppressed_columns.iter().copied().collect(),
            materials,
            geology: GeologicProvinces::new(settings.seed),
        }
    }

    /// Carves every cave system that can reach this column. Source columns
    /// within the carve range each get their own position-reseeded stream,
    /// so the result does not depend on which neighbors were generated
    /// first, or on the thread running the request.
    pub fn carve_column(&self, column: &mut ChunkColumn, col_x: i32, col_z: i32) -> GenStats {
        let mut stats = GenStats::default();
        let ctx = CarveContext {
            materials: self.materials,
            geology: &self.geology,
            lava_layer_y: self.lava_layer_y,
            origin: ColumnPos::new(col_x, col_z).world_origin(),
        };

        for src_x in col_x - self.carve_range..=col_x + self.carve_range {
            for src_z in col_z - self.carve_range..=col_z + self.carve_range {
                self.start_systems(column, &ctx, src_x, src_z, &mut stats);
            }
        }
        stats
    }

    fn start_systems(
        &self,
        column: &mut ChunkColumn,
        ctx: &CarveContext<'_>,
        src_x: i32,
        src_z: i32,
        stats: &mut GenStats,
    ) {
        let size = CHUNK_SIZE as i32;
        let mut rand = CaveRand::for_column(self.seed, src_x, src_z);

        if rand.next_f32() >= self.caves_per_column {
            return;
        }

        let start_x = src_x * size + rand.next_i32(size);
        let start_z = src_z * size + rand.next_i32(size);

        // Two multiplied draws bias starts toward the depths.
        let span = WORLD_HEIGHT - 48;
        let start_y = 8 + rand.next_i32(span) * rand.next_i32(span) / span;

        if self.suppressed.contains(&(start_x, start_z)) {
            return;
        }

        let yaw = rand.next_f64() * TAU;
        let pitch = (rand.next_f64() - 0.5) * 0.25;
        let mut horiz_size = 1.5 + rand.next_f64() * 2.5;
        let mut vert_size = 0.75 + rand.next_f64();

        if rand.next_i32(12) == 0 {
            horiz_size += rand.next_f64() * 4.0;
            if rand.next_i32(3) == 0 {
                vert_size += rand.next_f64() * 2.0;
            }
        } else if rand.next_i32(12) == 0 {
            horiz_size = 0.75 + rand.next_f64() * 0.5;
        }

        let extra_branchy = rand.next_i32(8) == 0;
        let wide_near_lava = start_y < self.sea_level / 2 && rand.next_i32(5) == 0;

        let budget = self.carve_range * size - size / 2 - rand.next_i32(size);

        stats.systems += 1;
        let params = TunnelParams {
            pos: DVec3::new(
                start_x as f64 + 0.5,
                start_y as f64 + 0.5,
                start_z as f64 + 0.5,
            ),
            yaw,
            pitch,
            horiz_size,
            vert_size,
            budget,
            depth: 0,
            wide_near_lava,
            extra_branchy,
        };
        let mut walker_rand = rand.fork();
        self.walk_tunnel(column, ctx, &mut walker_rand, params, stats);
    }

    fn walk_tunnel(
        &self,
        column: &mut ChunkColumn,
        ctx: &CarveContext<'_>,
        rand: &mut CaveRand,
        params: TunnelParams,
        stats: &mut GenStats,
    ) {
        let TunnelParams {
            mut pos,
            mut yaw,
            mut pitch,
            horiz_size,
            vert_size,
            budget,
            mut depth,
            wide_near_lava,
            extra_branchy,
        } = params;

        if budget <= 0 {
            return;
        }

        let mut yaw_rate = 0.0f64;
        let mut pitch_rate = 0.0f64;

        // Smoothed size transitions: events set gains, gains decay linearly,
        // accumulators follow at the shared speed and clamp at zero.
        let mut horiz_gain = 0.0f64;
        let mut horiz_gain_accum = 0.0f64;
        let mut horiz_loss = 0.0f64;
        let mut horiz_loss_accum = 0.0f64;
        let mut vert_gain = 0.0f64;
        let mut vert_gain_accum = 0.0f64;
        let mut vert_loss = 0.0f64;
        let mut vert_loss_accum = 0.0f64;
        let mut speed_accum = 0.33f64;
        let mut speed_gain = 0.0f64;

        for iter in 0..budget {
            let progress = iter as f64 / budget as f64;
            let bulge = (progress * PI).sin();

            let mut horiz_r =
                (1.5 + bulge * horiz_size + horiz_gain_accum - horiz_loss_accum).max(MIN_RADIUS);
            let mut vert_r =
                (1.5 + bulge * vert_size + vert_gain_accum - vert_loss_accum).max(MIN_RADIUS);

            if wide_near_lava {
                let dist = (pos.y - self.lava_layer_y as f64).abs();
                if dist < WIDE_NEAR_LAVA_RANGE {
                    let scale = 1.0 + (WIDE_NEAR_LAVA_RANGE - dist) / WIDE_NEAR_LAVA_RANGE * 2.0;
                    horiz_r *= scale;
                    vert_r *= scale;
                }
            }

            // Advance. Thin tunnels climb and dive slower than tall ones.
            let (pitch_sin, pitch_cos) = pitch.sin_cos();
            let vertical_clamp = (vert_r * 0.7).min(1.0);
            pos.x += yaw.cos() * pitch_cos;
            pos.y += pitch_sin.clamp(-vertical_clamp, vertical_clamp);
            pos.z += yaw.sin() * pitch_cos;
            pitch *= 0.8;

            pitch += pitch_rate * 0.1;
            yaw += yaw_rate * 0.1;
            pitch_rate = pitch_rate * 0.9 + (rand.next_f64() - rand.next_f64()) * rand.next_f64();
            yaw_rate =
                yaw_rate * 0.9 + (rand.next_f64() - rand.next_f64()) * rand.next_f64() * 2.0;
            if rand.next_i32(90) == 0 {
                yaw_rate *= 1.0 + rand.next_f64() * 5.0;
            }

            // One draw against the rare-event table; entries are mutually
            // exclusive and some only apply at depth.
            let event = rand.next_i32(EVENT_TABLE_SIZE);
            match event {
                0..=29 => yaw += (rand.next_f64() - 0.5) * PI,
                30..=89 => yaw += (rand.next_f64() - 0.5) * PI * 0.25,
                90..=179 => {
                    horiz_gain = 1.0 + rand.next_f64();
                    speed_gain = speed_gain.max(0.05);
                }
                180..=269 => {
                    horiz_loss = 0.5 + rand.next_f64() * 0.5;
                    speed_gain = speed_gain.max(0.05);
                }
                270..=339 if pos.y < self.sea_level as f64 => {
                    vert_loss = 0.4 + rand.next_f64() * 0.4;
                    speed_gain = speed_gain.max(0.05);
                }
                340..=389 if pos.y < (self.sea_level - 20) as f64 => {
                    horiz_gain = 1.5 + rand.next_f64();
                    speed_gain = speed_gain.max(0.08);
                }
                390..=439 => {
                    vert_gain = 1.2 + rand.next_f64() * 0.8;
                    speed_gain = speed_gain.max(0.08);
                }
                440..=459 if pos.y < (self.lava_layer_y + 30) as f64 => {
                    horiz_gain = 2.5 + rand.next_f64() * 1.5;
                    vert_gain = 1.0 + rand.next_f64() * 0.5;
                    speed_gain = speed_gain.max(0.1);
                }
                _ => {}
            }

            let remaining = budget - iter;

            if depth < MAX_BRANCH_DEPTH {
                let one_in = (if extra_branchy { 30 } else { 60 }) + 40 * i32::from(depth);
                if rand.next_i32(one_in) == 0 {
                    let child = TunnelParams {
                        pos,
                        yaw: yaw + PI + (rand.next_f64() - 0.5) * PI * 0.5,
                        pitch: pitch / 3.0,
                        horiz_size: horiz_size + vert_gain_accum,
                        vert_size,
                        budget: remaining - rand.next_i32((remaining / 2).max(1)),
                        depth: depth + 1,
                        wide_near_lava,
                        extra_branchy,
                    };
                    let mut child_rand = rand.fork();
                    stats.tunnel_branches += 1;
                    self.walk_tunnel(column, ctx, &mut child_rand, child, stats);
                }
            }

            // At most one shaft per lineage; the draw comes first so the
            // stream stays aligned whether or not the thresholds pass.
            if depth < 1
                && rand.next_i32(SHAFT_CHANCE) == 0
                && horiz_r >= SHAFT_MIN_RADIUS
                && pos.y >= (self.lava_layer_y + SHAFT_MIN_HEIGHT_ABOVE_LAVA) as f64
            {
                let shaft = ShaftParams {
                    pos,
                    yaw,
                    pitch: -1.2 - rand.next_f64() * 0.3,
                    size: horiz_size.max(1.0),
                    budget: remaining,
                    depth: depth + 1,
                };
                let mut child_rand = rand.fork();
                stats.shaft_branches += 1;
                self.walk_shaft(column, ctx, &mut child_rand, shaft, stats);
                depth += 1;
            }

            let skip_wide = horiz_r > 1.0 && rand.next_i32(3) == 0;
            let mut carved = true;
            if !skip_wide && self.within_reach(ctx, pos, horiz_r) {
                carved = carve_ellipsoid(column, ctx, pos, horiz_r, vert_r);
                if carved {
                    stats.carves += 1;
                } else {
                    stats.liquid_aborts += 1;
                }
            }

            // An aborted carve skips this step's accumulator population.
            if carved {
                horiz_gain_accum = (horiz_gain_accum + horiz_gain * speed_accum).max(0.0);
                horiz_loss_accum = (horiz_loss_accum + horiz_loss * speed_accum).max(0.0);
                vert_gain_accum = (vert_gain_accum + vert_gain * speed_accum).max(0.0);
                vert_loss_accum = (vert_loss_accum + vert_loss * speed_accum).max(0.0);
            }

            horiz_gain = (horiz_gain - 0.25).max(-1.0);
            horiz_loss = (horiz_loss - 0.25).max(-1.0);
            vert_gain = (vert_gain - 0.25).max(-1.0);
            vert_loss = (vert_loss - 0.25).max(-1.0);
            speed_accum = (speed_accum - 0.01 + speed_gain).max(0.33);
            speed_gain = (speed_gain - 0.02).max(0.0);
        }
    }

    fn walk_shaft(
        &self,
        column: &mut ChunkColumn,
        ctx: &CarveContext<'_>,
        rand: &mut CaveRand,
        params: ShaftParams,
        stats: &mut GenStats,
    ) {
        let ShaftParams {
            mut pos,
            yaw,
            mut pitch,
            size,
            budget,
            depth,
        } = params;

        if budget <= 0 {
            return;
        }

        let mut pitch_rate = 0.0f64;

        for iter in 0..budget {
            let progress = iter as f64 / budget as f64;
            let horiz_r = (1.0 + size * (1.0 - progress)).max(0.6);
            let vert_r = horiz_r + 1.0;

            // Near the end of the descent, fan out into ordinary tunnels
            // from the terminal point and stop carving.
            if budget - iter <= SHAFT_FAN_WINDOW {
                let count = 3 + rand.next_i32(4);
                for _ in 0..count {
                    let child = TunnelParams {
                        pos,
                        yaw: rand.next_f64() * TAU,
                        pitch: (rand.next_f64() - 0.5) * 0.25,
                        horiz_size: 1.0 + rand.next_f64() * 1.5,
                        vert_size: 0.75 + rand.next_f64() * 0.5,
                        budget: budget - iter,
                        depth,
                        wide_near_lava: false,
                        extra_branchy: false,
                    };
                    let mut child_rand = rand.fork();
                    stats.terminal_branches += 1;
                    self.walk_tunnel(column, ctx, &mut child_rand, child, stats);
                }
                return;
            }

            let (pitch_sin, pitch_cos) = pitch.sin_cos();
            pos.x += yaw.cos() * pitch_cos;
            pos.y += pitch_sin;
            pos.z += yaw.sin() * pitch_cos;

            pitch_rate =
                pitch_rate * 0.9 + (rand.next_f64() - rand.next_f64()) * rand.next_f64() * 0.5;
            pitch = (pitch + pitch_rate * 0.1).clamp(-1.55, -0.85);

            let skip_wide = horiz_r > 1.0 && rand.next_i32(3) == 0;
            if !skip_wide && self.within_reach(ctx, pos, horiz_r) {
                if carve_ellipsoid(column, ctx, pos, horiz_r, vert_r) {
                    stats.carves += 1;
                } else {
                    stats.liquid_aborts += 1;
                }
            }
        }
    }

    /// A cursor can only produce writes while its ellipsoid can touch the
    /// generated column's footprint.
    fn within_reach(&self, ctx: &CarveContext<'_>, pos: DVec3, horiz_r: f64) -> bool {
        let margin = horiz_r * 2.0 + 2.0;
        let ox = ctx.origin.x as f64;
        let oz = ctx.origin.z as f64;
        let size = CHUNK_SIZE as f64;

        pos.x >= ox - margin
            && pos.x <= ox + size + margin
            && pos.z >= oz - margin
            && pos.z <= oz + size + margin
    }
}

impl TerrainPass for CaveGenerator {
    fn name(&self) -> &'static str {
        "caves"
    }

    fn generate(&self, column: &mut ChunkColumn, col_x: i32, col_z: i32) {
        let stats = self.carve_column(column, col_x, col_z);
        debug!(
            col_x,
            col_z,
            systems = stats.systems,
            branches = stats.tunnel_branches,
            shafts = stats.shaft_branches,
            carves = stats.carves,
            aborts = stats.liquid_aborts,
            "carved cave systems"
        );
    }
}
