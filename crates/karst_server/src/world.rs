use rustc_hash::FxHashMap;
use tracing::info;

use karst_core::events;
use karst_core::jobs::JobSystem;
use karst_shared::column::ChunkColumn;
use karst_shared::coords::ColumnPos;
use karst_shared::worldgen::{WorldGenerator, WorldgenSettings};

#[derive(Clone, Copy, Debug, Default)]
pub struct RegenReport {
    pub columns: usize,
    pub hot_springs: usize,
    pub light_updates: usize,
}

pub struct ServerWorld {
    generator: WorldGenerator,
    columns: FxHashMap<ColumnPos, ChunkColumn>,
}

impl ServerWorld {
    pub fn new(settings: &WorldgenSettings) -> Self {
        Self {
            generator: WorldGenerator::new(settings),
            columns: FxHashMap::default(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn get_or_generate(&mut self, pos: ColumnPos) -> &ChunkColumn {
        if !self.columns.contains_key(&pos) {
            let column = self.generator.generate_column(pos.x, pos.z);
            self.columns.insert(pos, column);
        }
        self.columns
            .get(&pos)
            .expect("column must exist after generation")
    }

    /// Drops and regenerates the square of columns around the origin on the
    /// worker pool. Used by the diagnostic `regen` command; each column is
    /// generated independently, so the fan-out is embarrassingly parallel.
    pub fn regenerate_area(&mut self, radius: i32, jobs: &JobSystem) -> RegenReport {
        let positions: Vec<ColumnPos> = (-radius..=radius)
            .flat_map(|x| (-radius..=radius).map(move |z| ColumnPos::new(x, z)))
            .collect();

        for pos in &positions {
            self.columns.remove(pos);
        }

        let (tx, rx) = events::channel();
        let generator = &self.generator;
        let scoped_positions = positions;
        jobs.scope(move |scope| {
            for &pos in &scoped_positions {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let column = generator.generate_column(pos.x, pos.z);
                    let _ = tx.send((pos, column));
                });
            }
        });

        let mut report = RegenReport::default();
        for (pos, column) in rx.drain() {
            report.columns += 1;
            report.hot_springs += column.hot_springs.len();
            report.light_updates += column.light_updates.len();
            self.columns.insert(pos, column);
        }

        info!(
            columns = report.columns,
            hot_springs = report.hot_springs,
            light_updates = report.light_updates,
            "regenerated area"
        );
        report
    }
}
