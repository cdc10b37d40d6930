//! Session: peers, игроки, local player registry, респавн
//!
//! Bootstrap сессии внешний; сюда приходят только PeerJoined / PeerLeft /
//! SessionEnded. Игроков спавнит и удаляет Authority (host).

use bevy::prelude::*;

use crate::collision::{layers, CollisionVolume};
use crate::combat::components::{Dead, Knockback, MeleeCombat, RangedWeapon, Respawning, ShotTrace};
use crate::components::{Actor, Health, Orientation, PeerId, Player, Position, Velocity, FACTION_PLAYERS};
use crate::config::{MeleeData, SimulationConfig};
use crate::input::PlayerInput;
use crate::locomotion::{set_position, CharacterMotor};
use crate::replication::{InputAuthority, NetIdAllocator, NetworkRole, NetworkTick};
use crate::SimulationSet;

/// Peer подключился
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerJoined {
    pub peer: PeerId,
}

/// Peer отключился
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerLeft {
    pub peer: PeerId,
}

/// Сессия закончилась (для этого peer)
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SessionEnded;

/// Параметры сессии текущего peer
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub local_peer: PeerId,
    /// Host = state authority
    pub is_host: bool,
    /// Следующая player spawn point (round-robin)
    pub next_spawn_index: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::host(PeerId(1))
    }
}

impl Session {
    pub fn host(local_peer: PeerId) -> Self {
        Self {
            local_peer,
            is_host: true,
            next_spawn_index: 0,
        }
    }

    pub fn client(local_peer: PeerId) -> Self {
        Self {
            local_peer,
            is_host: false,
            next_spawn_index: 0,
        }
    }
}

/// Единственная ссылка на локального игрока
///
/// Ставится когда локальная entity появилась, снимается при despawn / конце сессии.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalPlayerRegistry {
    player: Option<Entity>,
}

impl LocalPlayerRegistry {
    pub fn get(&self) -> Option<Entity> {
        self.player
    }

    pub fn set(&mut self, entity: Entity) {
        if self.player != Some(entity) {
            crate::logger::log_info(&format!("🎮 Local player registered: {:?}", entity));
            self.player = Some(entity);
        }
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.player.take() {
            crate::logger::log_info(&format!("🎮 Local player cleared (was {:?})", previous));
        }
    }
}

/// Melee игрока: hit-stun берётся из character data
fn player_melee(config: &SimulationConfig) -> MeleeData {
    MeleeData {
        hit_stun: config.character.hit_stun,
        ..config.player_melee.clone()
    }
}

/// System: PeerJoined → спавн игрока (только host)
pub fn handle_peer_joined(
    mut commands: Commands,
    mut session: ResMut<Session>,
    config: Res<SimulationConfig>,
    mut ids: ResMut<NetIdAllocator>,
    mut joined: EventReader<PeerJoined>,
    players: Query<&Player>,
) {
    for event in joined.read() {
        if !session.is_host {
            continue;
        }
        if players.iter().any(|p| p.owner == event.peer) {
            crate::logger::log_warning(&format!("⚠️ Peer {:?} already has a player, join ignored", event.peer));
            continue;
        }

        let points = &config.lifecycle.player_spawn_points;
        let spawn_point = if points.is_empty() {
            Vec3::ZERO
        } else {
            Vec3::from_array(points[session.next_spawn_index % points.len()])
        };
        session.next_spawn_index += 1;

        let id = ids.allocate();
        let mut entity_commands = commands.spawn((
            (
                Actor {
                    faction_id: FACTION_PLAYERS,
                },
                Player {
                    owner: event.peer,
                    spawn_point,
                },
                id,
                NetworkRole::Authority,
                Health::new(config.character.max_health),
                Position(spawn_point),
                Orientation::default(),
            ),
            (
                CharacterMotor::from_data(&config.character),
                MeleeCombat::new(player_melee(&config)),
                RangedWeapon::new(config.character.ranged_data()),
                ShotTrace::default(),
                CollisionVolume::on_layer(layers::PLAYERS),
                PlayerInput::default(),
            ),
        ));

        let local = event.peer == session.local_peer;
        if local {
            entity_commands.insert(InputAuthority);
        }

        crate::logger::log_info(&format!(
            "🧍 Player {:?} ({:?}) spawned for peer {:?} at {:?}{}",
            entity_commands.id(),
            id,
            event.peer,
            spawn_point,
            if local { " [local]" } else { "" }
        ));
    }
}

/// System: PeerLeft → despawn игроков этого peer (только host)
pub fn handle_peer_left(
    mut commands: Commands,
    session: Res<Session>,
    mut left: EventReader<PeerLeft>,
    players: Query<(Entity, &Player)>,
) {
    for event in left.read() {
        if !session.is_host {
            continue;
        }
        for (entity, _) in players.iter().filter(|(_, p)| p.owner == event.peer) {
            crate::logger::log_info(&format!("👋 Peer {:?} left, despawning player {:?}", event.peer, entity));
            commands.entity(entity).despawn();
        }
    }
}

/// System: конец сессии → снять local player, убрать игроков (host)
pub fn handle_session_ended(
    mut commands: Commands,
    session: Res<Session>,
    mut ended: EventReader<SessionEnded>,
    mut registry: ResMut<LocalPlayerRegistry>,
    players: Query<Entity, With<Player>>,
) {
    if ended.read().count() == 0 {
        return;
    }
    registry.clear();
    if session.is_host {
        for entity in players.iter() {
            commands.entity(entity).despawn();
        }
    }
    crate::logger::log_info("🏁 Session ended");
}

/// System: LocalPlayerRegistry ← entity с InputAuthority
pub fn sync_local_player(
    mut registry: ResMut<LocalPlayerRegistry>,
    local: Query<Entity, (With<Player>, With<InputAuthority>)>,
) {
    let mut found = local.iter();
    match (found.next(), found.next()) {
        (Some(entity), None) => registry.set(entity),
        (None, _) => registry.clear(),
        (Some(first), Some(second)) => {
            crate::logger::log_error(&format!(
                "❌ More than one local player ({:?}, {:?}), keeping registry as is",
                first, second
            ));
        }
    }
}

/// System: респавн игроков с истёкшим Respawning (Authority-only)
pub fn respawn_players(
    mut commands: Commands,
    tick: Res<NetworkTick>,
    mut players: Query<
        (
            Entity,
            &NetworkRole,
            &Player,
            &Respawning,
            &mut Health,
            &mut Position,
            &mut Velocity,
            &mut Knockback,
            Option<&mut CollisionVolume>,
            Option<&mut MeleeCombat>,
            Option<&mut RangedWeapon>,
            Option<&mut CharacterMotor>,
        ),
        With<Dead>,
    >,
) {
    for (
        entity,
        role,
        player,
        respawning,
        mut health,
        mut position,
        mut velocity,
        mut knockback,
        volume,
        combat,
        weapon,
        motor,
    ) in players.iter_mut()
    {
        if !respawning.timer.expired(tick.tick) {
            continue;
        }
        if let Err(err) = set_position(entity, *role, &mut position, player.spawn_point) {
            err.report();
            continue;
        }

        health.restore_full();
        velocity.0 = Vec3::ZERO;
        knockback.cancel();
        if let Some(mut volume) = volume {
            volume.enabled = true;
        }
        if let Some(mut combat) = combat {
            combat.reset();
        }
        if let Some(mut weapon) = weapon {
            weapon.reset();
        }
        if let Some(mut motor) = motor {
            motor.reset();
        }
        commands.entity(entity).remove::<(Dead, Respawning)>();

        crate::logger::log_info(&format!(
            "✨ Player {:?} respawned at {:?} ({:.0} HP)",
            entity, player.spawn_point, health.current
        ));
    }
}

/// Session Plugin
///
/// - Population set: join / leave / session end
/// - Cleanup set: респавн, затем sync local player registry
pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PeerJoined>()
            .add_event::<PeerLeft>()
            .add_event::<SessionEnded>()
            .init_resource::<LocalPlayerRegistry>();

        if !app.world().contains_resource::<Session>() {
            app.init_resource::<Session>();
        }

        app.add_systems(
            FixedUpdate,
            (handle_peer_joined, handle_peer_left, handle_session_ended)
                .chain()
                .in_set(SimulationSet::Population),
        );
        app.add_systems(
            FixedUpdate,
            (respawn_players, sync_local_player)
                .chain()
                .in_set(SimulationSet::Cleanup),
        );
    }
}
