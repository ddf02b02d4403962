//! Parallel conversion over units (region files).
//!
//! Every unit runs on the blocking pool and walks its chunks sequentially.
//! The first failing unit stops the others and its error is returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mc_conv_states::Mappings;
use mc_conv_world::{ChunkSink, Dimension, RuntimeIdRegistry, WorldSettings};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::source::ChunkSource;
use crate::translator::{ChunkOutcome, ChunkTranslator};

/// Totals of a conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub units: usize,
    pub translated: usize,
    pub skipped: usize,
    pub blocks: usize,
    pub waterlogged: usize,
}

impl ConversionStats {
    fn merge(&mut self, other: ConversionStats) {
        self.units += other.units;
        self.translated += other.translated;
        self.skipped += other.skipped;
        self.blocks += other.blocks;
        self.waterlogged += other.waterlogged;
    }
}

pub struct Converter {
    translator: Arc<ChunkTranslator>,
}

impl Converter {
    pub fn new(
        mappings: Arc<Mappings>,
        registry: Arc<dyn RuntimeIdRegistry>,
        dimension: Dimension,
    ) -> Result<Self, ConvertError> {
        Ok(Self {
            translator: Arc::new(ChunkTranslator::new(mappings, registry, dimension)?),
        })
    }

    pub fn translator(&self) -> &ChunkTranslator {
        &self.translator
    }

    /// Convert every unit into `sink`.
    pub async fn convert<S>(
        &self,
        units: Vec<Box<dyn ChunkSource>>,
        sink: Arc<S>,
    ) -> Result<ConversionStats, ConvertError>
    where
        S: ChunkSink + 'static,
    {
        info!(
            "Converting {} units into {:?}",
            units.len(),
            self.translator.dimension()
        );
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        for mut unit in units {
            let translator = Arc::clone(&self.translator);
            let sink = Arc::clone(&sink);
            let cancelled = Arc::clone(&cancelled);
            tasks.spawn_blocking(move || {
                convert_unit(&translator, unit.as_mut(), sink.as_ref(), &cancelled)
            });
        }

        let mut stats = ConversionStats::default();
        while let Some(joined) = tasks.join_next().await {
            let result = joined.unwrap_or_else(|e| Err(ConvertError::TaskFailed(e.to_string())));
            match result {
                Ok(unit) => stats.merge(unit),
                Err(err) => {
                    warn!("Conversion aborted: {err}");
                    cancelled.store(true, Ordering::Relaxed);
                    tasks.abort_all();
                    return Err(err);
                }
            }
        }

        info!(
            "Converted {} chunks ({} skipped, {} blocks) from {} units",
            stats.translated, stats.skipped, stats.blocks, stats.units
        );
        Ok(stats)
    }

    /// Forward world-level metadata to the sink.
    pub fn write_settings(
        &self,
        sink: &dyn ChunkSink,
        settings: &WorldSettings,
    ) -> Result<(), ConvertError> {
        info!("Writing world settings for {:?}", settings.name);
        sink.save_settings(settings)?;
        Ok(())
    }
}

fn convert_unit(
    translator: &ChunkTranslator,
    source: &mut dyn ChunkSource,
    sink: &dyn ChunkSink,
    cancelled: &AtomicBool,
) -> Result<ConversionStats, ConvertError> {
    let (ux, uz) = source.position();
    debug!("Converting unit {ux},{uz}");
    let mut stats = ConversionStats {
        units: 1,
        ..Default::default()
    };

    while let Some(record) = source.next_chunk() {
        if cancelled.load(Ordering::Relaxed) {
            debug!("Unit {ux},{uz} cancelled");
            break;
        }
        let chunk = match record {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Skipping chunk in unit {ux},{uz}: {e}");
                stats.skipped += 1;
                continue;
            }
        };
        match translator.translate_chunk(&chunk, sink)? {
            ChunkOutcome::Translated(chunk_stats) => {
                stats.translated += 1;
                stats.blocks += chunk_stats.blocks;
                stats.waterlogged += chunk_stats.waterlogged;
            }
            ChunkOutcome::Skipped(_) => stats.skipped += 1,
        }
    }

    debug!(
        "Unit {ux},{uz} done: {} chunks, {} skipped",
        stats.translated, stats.skipped
    );
    Ok(stats)
}
