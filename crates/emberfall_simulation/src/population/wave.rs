//! Wave planning (количество врагов и элитная квота).

use crate::config::SpawnerConfig;

/// План одной волны
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavePlan {
    /// Номер волны (с 1)
    pub wave: usize,
    pub total: usize,
    pub elites: usize,
}

impl WavePlan {
    pub fn normals(&self) -> usize {
        self.total - self.elites
    }

    /// Элиты первыми, потом обычные
    pub fn spawn_order(&self) -> impl Iterator<Item = bool> {
        std::iter::repeat(true)
            .take(self.elites)
            .chain(std::iter::repeat(false).take(self.normals()))
    }
}

/// count = base + (wave-1)·growth (≤ max_enemies);
/// elites = min(base_elite + ⌊(wave-1)/interval⌋, count, elite archetypes)
pub fn plan_wave(wave: usize, config: &SpawnerConfig, elite_archetypes: usize) -> WavePlan {
    let step = wave.saturating_sub(1);
    let total = (config.enemies_per_wave + step * config.wave_growth).min(config.max_enemies);

    let bonus = if config.elite_interval == 0 {
        0
    } else {
        step / config.elite_interval
    };
    let elites = (config.base_elite + bonus).min(total).min(elite_archetypes);

    WavePlan { wave, total, elites }
}
