//! Presentation (render pass, Update)
//!
//! Всё здесь read-only относительно authoritative state:
//! - replay_cosmetics: stamps → cursors → CosmeticCue (ровно один раз на событие),
//!   плюс LandedFeedback и ImpactCue
//! - predict_local_cosmetics: мгновенный Swing / Shot на нажатие (controlling peer)
//! - interpolate_render_state: сглаживание Position / yaw в RenderState
//!
//! Host такой же наблюдатель, Authority никогда не играет cosmetics inline.

use bevy::prelude::*;

use crate::combat::components::{Dead, MeleeCombat, RangedWeapon, ShotTrace};
use crate::components::{normalize_yaw, shortest_arc, Orientation, Position};
use crate::config::SimulationConfig;
use crate::input::PlayerInput;
use crate::replication::{CombatStamps, CosmeticCursors, EventKind, InputAuthority, NetworkRole, NetworkTick, TickTimer};

/// Cosmetic, который должен сыграть рендер (анимация, звук, партиклы)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosmeticCue {
    pub entity: Entity,
    pub kind: EventKind,
    /// true = локальное предсказание, не replay stamp'а
    pub predicted: bool,
}

/// Обратная связь попадания (звук / тряска камеры) для того, кто сам ударил
///
/// Только на peer, который и Authority, и управляет атакующим.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandedFeedback {
    pub entity: Entity,
}

/// Impact эффект выстрела в реплицированной точке попадания
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ImpactCue {
    pub shooter: Entity,
    pub point: Vec3,
    pub normal: Vec3,
}

/// Локальные (нереплицируемые) cooldowns предсказания
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PredictionCooldown {
    pub swing: TickTimer,
    pub shot: TickTimer,
}

/// Сглаженное состояние для рендера
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderState {
    pub position: Vec3,
    pub yaw: f32,
}

/// Коэффициент сглаживания за кадр (1.0 = без интерполяции)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct RenderClock {
    pub alpha: f32,
}

impl Default for RenderClock {
    fn default() -> Self {
        Self { alpha: 0.5 }
    }
}

/// Нужно ли играть replay для kind на этом peer
///
/// Swing и Shot своего персонажа уже предсказаны → курсор двигается молча.
/// Landed эффект видят все peers.
pub fn should_replay(kind: EventKind, _role: NetworkRole, controlling: bool) -> bool {
    match kind {
        EventKind::Swing | EventKind::Shot => !controlling,
        EventKind::Landed | EventKind::Hit | EventKind::Blocked | EventKind::Death => true,
    }
}

/// Landed feedback: только peer, который и Authority, и управляет
pub fn wants_landed_feedback(kind: EventKind, role: NetworkRole, controlling: bool) -> bool {
    kind == EventKind::Landed && role.is_authority() && controlling
}

/// System: cursor replay
pub fn replay_cosmetics(
    mut cues: EventWriter<CosmeticCue>,
    mut feedback: EventWriter<LandedFeedback>,
    mut impacts: EventWriter<ImpactCue>,
    mut observers: Query<(
        Entity,
        &NetworkRole,
        &CombatStamps,
        &mut CosmeticCursors,
        Option<&ShotTrace>,
        Has<InputAuthority>,
    )>,
) {
    for (entity, role, stamps, mut cursors, trace, controlling) in observers.iter_mut() {
        for kind in cursors.advance(stamps) {
            if should_replay(kind, *role, controlling) {
                crate::logger::log(&format!("🎬 Cue {:?} for {:?}", kind, entity));
                cues.write(CosmeticCue {
                    entity,
                    kind,
                    predicted: false,
                });
            }
            if wants_landed_feedback(kind, *role, controlling) {
                feedback.write(LandedFeedback { entity });
            }
            // Impact не предсказывается: играет и у стрелка
            if kind == EventKind::Shot {
                if let Some(impact) = trace.and_then(|t| t.impact) {
                    impacts.write(ImpactCue {
                        shooter: entity,
                        point: impact.point,
                        normal: impact.normal,
                    });
                }
            }
        }
    }
}

/// Запустить локальный cooldown, если он истёк (иначе нажатие не предсказываем)
fn arm_prediction(timer: &mut TickTimer, tick: &NetworkTick, cooldown_secs: f32) -> bool {
    if !timer.expired_or_not_running(tick.tick) {
        return false;
    }
    *timer = TickTimer::from_seconds(tick, cooldown_secs);
    true
}

/// System: предсказание swing / shot на controlling peer
///
/// Второй путь того же input: authoritative TryAttack идёт через `apply_player_input`.
pub fn predict_local_cosmetics(
    mut commands: Commands,
    tick: Res<NetworkTick>,
    config: Res<SimulationConfig>,
    mut cues: EventWriter<CosmeticCue>,
    mut local: Query<
        (
            Entity,
            &mut PlayerInput,
            Option<&MeleeCombat>,
            Option<&RangedWeapon>,
            Option<&mut PredictionCooldown>,
            Has<Dead>,
        ),
        With<InputAuthority>,
    >,
) {
    for (entity, mut input, combat, weapon, cooldown, dead) in local.iter_mut() {
        if !input.attack_cue_pending && !input.shoot_cue_pending {
            continue;
        }
        let swing = std::mem::take(&mut input.attack_cue_pending);
        let shot = std::mem::take(&mut input.shoot_cue_pending);
        if dead {
            continue;
        }

        let mut timers = cooldown.as_deref().copied().unwrap_or_default();
        let mut predicted = Vec::new();
        if swing {
            let secs = combat.map_or(config.player_melee.cooldown, |c| c.stats.cooldown);
            if arm_prediction(&mut timers.swing, &tick, secs) {
                predicted.push(EventKind::Swing);
            }
        }
        if shot {
            // У зеркала на клиенте нет RangedWeapon: берём fire rate из config
            let secs = weapon.map_or_else(|| config.character.ranged_data().cooldown(), |w| w.stats.cooldown());
            if arm_prediction(&mut timers.shot, &tick, secs) {
                predicted.push(EventKind::Shot);
            }
        }

        match cooldown {
            Some(mut cooldown) => *cooldown = timers,
            None => {
                commands.entity(entity).insert(timers);
            }
        }

        for kind in predicted {
            cues.write(CosmeticCue {
                entity,
                kind,
                predicted: true,
            });
        }
    }
}

/// System: сглаживание позиции / yaw для рендера
pub fn interpolate_render_state(
    mut commands: Commands,
    clock: Res<RenderClock>,
    mut bodies: Query<(Entity, &Position, &Orientation, Option<&mut RenderState>)>,
) {
    let alpha = clock.alpha.clamp(0.0, 1.0);
    for (entity, position, orientation, render) in bodies.iter_mut() {
        match render {
            Some(mut render) => {
                render.position = render.position.lerp(position.0, alpha);
                render.yaw = normalize_yaw(render.yaw + shortest_arc(render.yaw, orientation.yaw) * alpha);
            }
            None => {
                commands.entity(entity).insert(RenderState {
                    position: position.0,
                    yaw: orientation.yaw,
                });
            }
        }
    }
}

/// Presentation Plugin (Update, после FixedUpdate этого кадра)
pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CosmeticCue>()
            .add_event::<LandedFeedback>()
            .add_event::<ImpactCue>()
            .init_resource::<RenderClock>();

        app.add_systems(
            Update,
            (predict_local_cosmetics, replay_cosmetics, interpolate_render_state).chain(),
        );
    }
}
