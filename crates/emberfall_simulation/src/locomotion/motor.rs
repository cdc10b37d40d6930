//! Character motor (игроки).
//!
//! Кинематический контроллер: гравитация, прыжок, разгон/торможение по input,
//! интеграция позиции и grounding против navigation surface.

use bevy::prelude::*;

use crate::components::Orientation;
use crate::config::CharacterData;
use crate::navigation::NavigationSurface;

/// Input короче этого считается "нет input"
pub const INPUT_DEADZONE: f32 = 0.1;

/// Параметры и состояние motor'а (пишет только Authority)
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CharacterMotor {
    /// Ускорение свободного падения (отрицательное)
    pub gravity: f32,
    pub jump_impulse: f32,
    pub acceleration: f32,
    pub braking: f32,
    pub max_speed: f32,
    pub grounded: bool,
    /// x = strafe (right), y = forward; длина ≤ 1
    pub move_input: Vec2,
    pub jump_requested: bool,
}

impl Default for CharacterMotor {
    fn default() -> Self {
        Self::from_data(&CharacterData::default())
    }
}

impl CharacterMotor {
    pub fn from_data(data: &CharacterData) -> Self {
        Self {
            gravity: data.gravity,
            jump_impulse: data.jump_force,
            acceleration: data.acceleration,
            braking: data.braking,
            max_speed: data.movement_speed,
            grounded: false,
            move_input: Vec2::ZERO,
            jump_requested: false,
        }
    }

    /// Направление движения в мире из input и yaw (None = нет input)
    pub fn move_direction(&self, orientation: &Orientation) -> Option<Vec3> {
        if self.move_input.length() < INPUT_DEADZONE {
            return None;
        }
        let input = self.move_input.clamp_length_max(1.0);
        Some(orientation.forward() * input.y + orientation.right() * input.x)
    }

    /// Один тик: возвращает (новая позиция, новая velocity)
    ///
    /// Порядок: grounded clamp → прыжок → гравитация → горизонталь → интеграция → grounding.
    pub fn step(
        &mut self,
        position: Vec3,
        velocity: Vec3,
        orientation: &Orientation,
        dt: f32,
        surface: &dyn NavigationSurface,
    ) -> (Vec3, Vec3) {
        let mut vertical = velocity.y;
        if self.grounded && vertical < 0.0 {
            vertical = 0.0;
        }

        if self.jump_requested && self.grounded {
            vertical += self.jump_impulse;
            self.grounded = false;
        }
        self.jump_requested = false;

        vertical += self.gravity * dt;

        let mut horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
        horizontal = match self.move_direction(orientation) {
            Some(direction) => {
                (horizontal + direction * self.acceleration * dt).clamp_length_max(self.max_speed)
            }
            None => horizontal.lerp(Vec3::ZERO, (self.braking * dt).min(1.0)),
        };

        let mut next = position + (horizontal + Vec3::Y * vertical) * dt;

        let ground = match surface.ground_height(next) {
            Some(ground) => Some(ground),
            None => {
                // край walkable области: горизонтальный шаг откатывается
                next.x = position.x;
                next.z = position.z;
                horizontal = Vec3::ZERO;
                surface.ground_height(next)
            }
        };

        match ground {
            Some(ground) if next.y <= ground => {
                next.y = ground;
                vertical = vertical.max(0.0);
                self.grounded = true;
            }
            _ => self.grounded = false,
        }

        (next, Vec3::new(horizontal.x, vertical, horizontal.z))
    }

    /// Сбросить input и кинематику (респавн / смерть)
    pub fn reset(&mut self) {
        self.move_input = Vec2::ZERO;
        self.jump_requested = false;
        self.grounded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::ArenaSurface;

    const DT: f32 = 1.0 / 60.0;

    fn settle(motor: &mut CharacterMotor, surface: &ArenaSurface) -> (Vec3, Vec3) {
        let mut state = (Vec3::ZERO, Vec3::ZERO);
        for _ in 0..3 {
            state = motor.step(state.0, state.1, &Orientation::default(), DT, surface);
        }
        state
    }

    #[test]
    fn test_gravity_grounds_on_floor() {
        let surface = ArenaSurface::default();
        let mut motor = CharacterMotor::default();
        let (pos, vel) = motor.step(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, &Orientation::default(), DT, &surface);
        assert!(pos.y < 1.0);
        assert!(vel.y < 0.0);
        assert!(!motor.grounded);

        let (pos, vel) = settle(&mut motor, &surface);
        assert_eq!(pos.y, 0.0);
        assert_eq!(vel.y, 0.0);
        assert!(motor.grounded);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let surface = ArenaSurface::default();
        let mut motor = CharacterMotor::default();
        let (pos, vel) = settle(&mut motor, &surface);

        motor.jump_requested = true;
        let (pos, vel) = motor.step(pos, vel, &Orientation::default(), DT, &surface);
        assert!((vel.y - (8.0 - 20.0 * DT)).abs() < 1e-4);
        assert!(pos.y > 0.0);
        assert!(!motor.grounded);

        // в воздухе прыжок игнорируется
        motor.jump_requested = true;
        let (_, vel2) = motor.step(pos, vel, &Orientation::default(), DT, &surface);
        assert!(vel2.y < vel.y);
        assert!(!motor.jump_requested);
    }

    #[test]
    fn test_acceleration_capped_at_max_speed() {
        let surface = ArenaSurface::default();
        let mut motor = CharacterMotor::default();
        motor.move_input = Vec2::new(0.0, 1.0);

        let (mut pos, mut vel) = settle(&mut motor, &surface);
        for _ in 0..120 {
            (pos, vel) = motor.step(pos, vel, &Orientation::default(), DT, &surface);
        }
        let horizontal = Vec3::new(vel.x, 0.0, vel.z);
        assert!((horizontal.length() - 6.0).abs() < 1e-3);
        // yaw = 0 → вперёд по +Z
        assert!(vel.z > 0.0 && pos.z > 0.0);
    }

    #[test]
    fn test_deadzone_input_brakes() {
        let surface = ArenaSurface::default();
        let mut motor = CharacterMotor::default();
        motor.grounded = true;
        motor.move_input = Vec2::new(0.05, 0.05);

        let (_, vel) = motor.step(Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0), &Orientation::default(), DT, &surface);
        let expected = 4.0 * (1.0 - 10.0 * DT);
        assert!((vel.x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_edge_of_surface_reverts_horizontal() {
        let surface = ArenaSurface::square(5.0);
        let mut motor = CharacterMotor::default();
        motor.grounded = true;

        let start = Vec3::new(4.99, 0.0, 0.0);
        let (pos, vel) = motor.step(start, Vec3::new(6.0, 0.0, 0.0), &Orientation::default(), DT, &surface);
        assert_eq!(pos.x, start.x);
        assert_eq!(vel.x, 0.0);
        assert!(motor.grounded);
    }
}
