//! Tick Dedupe Cursor
//!
//! One-shot события (swing, landed, hit, blocked, death, shot) не имеют RPC: только
//! replicated "тик последнего события" (`EventStamp`) на authority и локальный
//! курсор (`DedupeCursor`) на каждом наблюдающем peer.
//!
//! Правило: replay iff `stamp > cursor && stamp > 0`, затем `cursor = stamp`.
//! Пропущенные промежуточные значения и повторная доставка не важны: смотрим
//! только на текущее значение.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Replicated тик последнего события (0 = никогда)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Reflect, Serialize, Deserialize)]
pub struct EventStamp(pub u64);

impl EventStamp {
    pub fn tick(&self) -> u64 {
        self.0
    }

    pub fn has_fired(&self) -> bool {
        self.0 > 0
    }

    /// Отметить событие на тике `tick`. Никогда не уменьшается.
    pub fn bump(&mut self, tick: u64) {
        if tick > self.0 {
            self.0 = tick;
        }
    }
}

/// Локальный курсор наблюдателя (НЕ реплицируется)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub struct DedupeCursor {
    last_seen: u64,
}

impl DedupeCursor {
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// true ровно один раз на каждое новое значение stamp
    pub fn consume(&mut self, stamp: EventStamp) -> bool {
        if stamp.0 > self.last_seen && stamp.0 > 0 {
            self.last_seen = stamp.0;
            true
        } else {
            false
        }
    }
}

/// Виды one-shot событий
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum EventKind {
    /// Начало замаха (attack swing animation)
    Swing,
    /// Удар попал хотя бы по одной цели
    Landed,
    /// Получен урон (hit reaction)
    Hit,
    /// Урон поглощён блоком
    Blocked,
    /// Смерть
    Death,
    /// Hitscan выстрел (muzzle flash; impact по `ShotTrace`)
    Shot,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Swing,
        EventKind::Landed,
        EventKind::Hit,
        EventKind::Blocked,
        EventKind::Death,
        EventKind::Shot,
    ];
}

/// Replicated stamps всех one-shot событий entity (пишет только Authority)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct CombatStamps {
    pub swing: EventStamp,
    pub landed: EventStamp,
    pub hit: EventStamp,
    pub blocked: EventStamp,
    pub death: EventStamp,
    #[serde(default)]
    pub shot: EventStamp,
}

impl CombatStamps {
    pub fn get(&self, kind: EventKind) -> EventStamp {
        match kind {
            EventKind::Swing => self.swing,
            EventKind::Landed => self.landed,
            EventKind::Hit => self.hit,
            EventKind::Blocked => self.blocked,
            EventKind::Death => self.death,
            EventKind::Shot => self.shot,
        }
    }

    pub fn bump(&mut self, kind: EventKind, tick: u64) {
        let stamp = match kind {
            EventKind::Swing => &mut self.swing,
            EventKind::Landed => &mut self.landed,
            EventKind::Hit => &mut self.hit,
            EventKind::Blocked => &mut self.blocked,
            EventKind::Death => &mut self.death,
            EventKind::Shot => &mut self.shot,
        };
        stamp.bump(tick);
    }
}

/// Локальные курсоры наблюдателя: по одному на EventKind
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct CosmeticCursors {
    pub swing: DedupeCursor,
    pub landed: DedupeCursor,
    pub hit: DedupeCursor,
    pub blocked: DedupeCursor,
    pub death: DedupeCursor,
    pub shot: DedupeCursor,
}

impl CosmeticCursors {
    pub fn cursor_mut(&mut self, kind: EventKind) -> &mut DedupeCursor {
        match kind {
            EventKind::Swing => &mut self.swing,
            EventKind::Landed => &mut self.landed,
            EventKind::Hit => &mut self.hit,
            EventKind::Blocked => &mut self.blocked,
            EventKind::Death => &mut self.death,
            EventKind::Shot => &mut self.shot,
        }
    }

    /// Все kinds, для которых stamp продвинулся с прошлого вызова
    pub fn advance(&mut self, stamps: &CombatStamps) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.cursor_mut(*kind).consume(stamps.get(*kind)))
            .collect()
    }

    /// Сдвинуть курсоры на текущие stamps без replay
    ///
    /// Для late-join: история до подключения не проигрывается.
    pub fn sync_to(&mut self, stamps: &CombatStamps) {
        let _ = self.advance(stamps);
    }
}
