//! Replication substrate interfaces
//!
//! Сам substrate (tick sync + property replication) внешний. Здесь: то, что
//! симуляция от него потребляет:
//! - `NetworkTick`: монотонный tick counter + delta seconds
//! - `NetworkRole`: роль текущего peer для entity (Authority / Controller / Observer)
//! - `InputAuthority`: этот peer поставляет input для entity
//! - `NetId`: стабильный id entity между peers
//!
//! И authority gate: любая мутация authoritative поля проходит через `require_authority`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

pub mod snapshot;
pub mod stamp;
pub mod timer;


pub use snapshot::{apply_snapshot, capture_snapshot, ReplicatedImpact, ReplicatedState};
pub use stamp::{CombatStamps, CosmeticCursors, DedupeCursor, EventKind, EventStamp};
pub use timer::TickTimer;

/// Глобальный tick counter (от substrate)
///
/// `tick` = 0 до первого шага; первый симулированный тик = 1,
/// поэтому stamp == 0 всегда означает "никогда не происходило".
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct NetworkTick {
    pub tick: u64,
    /// Секунд на тик
    pub delta_secs: f32,
}

impl NetworkTick {
    pub fn from_hz(hz: f32) -> Self {
        Self {
            tick: 0,
            delta_secs: 1.0 / hz,
        }
    }

    /// Количество тиков для длительности в секундах (ceil)
    pub fn ticks_for(&self, seconds: f32) -> u64 {
        if seconds <= 0.0 || self.delta_secs <= 0.0 {
            return 0;
        }
        // eps: 0.3s @ 10Hz == ровно 3 тика, а не 4 из-за f32
        ((seconds / self.delta_secs) - 1e-3).ceil().max(0.0) as u64
    }

    /// Время симуляции в секундах
    pub fn elapsed_secs(&self) -> f32 {
        self.tick as f32 * self.delta_secs
    }
}

impl Default for NetworkTick {
    fn default() -> Self {
        Self::from_hz(60.0)
    }
}

/// Роль текущего peer для entity
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub enum NetworkRole {
    /// Единственный writer authoritative полей
    Authority,
    /// Поставляет input; только cosmetic prediction
    Controller,
    /// Read-only зеркало
    #[default]
    Observer,
}

impl NetworkRole {
    pub fn is_authority(&self) -> bool {
        matches!(self, NetworkRole::Authority)
    }
}

/// Marker: этот peer поставляет input для entity (локальный игрок).
///
/// На host-игроке стоит вместе с `NetworkRole::Authority`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct InputAuthority;

/// Стабильный сетевой id (одинаковый на всех peers)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct NetId(pub u64);

/// Выдача NetId на authority
#[derive(Resource, Debug, Default)]
pub struct NetIdAllocator {
    next: u64,
}

impl NetIdAllocator {
    pub fn allocate(&mut self) -> NetId {
        self.next += 1;
        NetId(self.next)
    }
}

/// Authority gate
///
/// Ok если роль Authority, иначе `AuthorityViolation` (вызывающий логирует и no-op).
pub fn require_authority(
    role: NetworkRole,
    entity: Entity,
    operation: &'static str,
) -> Result<(), SimError> {
    if role.is_authority() {
        Ok(())
    } else {
        Err(SimError::AuthorityViolation {
            entity,
            operation,
            role,
        })
    }
}

/// System: продвинуть tick counter (FixedUpdate, запускается ПЕРВЫМ)
pub fn advance_network_tick(mut tick: ResMut<NetworkTick>) {
    tick.tick = tick.tick.wrapping_add(1);
}

pub struct ReplicationPlugin {
    pub tick_rate: f32,
}

impl Default for ReplicationPlugin {
    fn default() -> Self {
        Self { tick_rate: 60.0 }
    }
}

impl Plugin for ReplicationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(NetworkTick::from_hz(self.tick_rate))
            .init_resource::<NetIdAllocator>()
            .add_systems(
                FixedUpdate,
                advance_network_tick.in_set(crate::SimulationSet::Tick),
            );
    }
}
