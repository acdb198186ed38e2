use core::f64::consts::{PI, TAU};

use asteroids_core::{
    entities::ShipMode,
    geometry::{shortest_offset, Vec2},
    Control, InputState, Session,
};

/// Scripted player used to generate input logs.
pub trait Pilot: Send {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn next_input(&mut self, session: &Session) -> InputState;
}

pub fn pilot_ids() -> &'static [&'static str] {
    &["aim", "idle"]
}

pub fn create_pilot(id: &str) -> Option<Box<dyn Pilot>> {
    match id {
        "aim" => Some(Box::new(AimPilot::default())),
        "idle" => Some(Box::new(IdlePilot)),
        _ => None,
    }
}

pub fn describe_pilots() -> Vec<(&'static str, &'static str)> {
    pilot_ids()
        .iter()
        .filter_map(|id| create_pilot(id))
        .map(|pilot| (pilot.id(), pilot.description()))
        .collect()
}

/// Never touches the controls.
pub struct IdlePilot;

impl Pilot for IdlePilot {
    fn id(&self) -> &'static str {
        "idle"
    }

    fn description(&self) -> &'static str {
        "sits at the spawn point without input"
    }

    fn next_input(&mut self, _session: &Session) -> InputState {
        InputState::new()
    }
}

const AIM_GAIN: f64 = 2.5;
const SPIN_DAMPING: f64 = 0.35;
const FIRE_ARC: f64 = 0.12;
const CRUISE_DISTANCE: f64 = 320.0;
const PANIC_DISTANCE: f64 = 70.0;

/// Turns toward the nearest hazard, shoots when lined up, closes distance
/// when everything is far away and jumps out of imminent collisions.
#[derive(Default)]
pub struct AimPilot {
    frame: u32,
}

fn normalize_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

fn nearest_hazard(session: &Session, from: Vec2) -> Option<Vec2> {
    let state = session.state();
    let world = session.world();
    state
        .asteroids
        .iter()
        .chain(&state.ufos)
        .filter_map(|id| session.entity(*id))
        .map(|entity| shortest_offset(from, entity.body().position(), world))
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
}

impl Pilot for AimPilot {
    fn id(&self) -> &'static str {
        "aim"
    }

    fn description(&self) -> &'static str {
        "turns toward the nearest hazard and fires when aligned"
    }

    fn next_input(&mut self, session: &Session) -> InputState {
        self.frame = self.frame.wrapping_add(1);
        let mut input = InputState::new();
        let Some(ship) = session.ship() else {
            return input;
        };
        if ship.mode() == ShipMode::Hyperspacing {
            return input;
        }

        let Some(offset) = nearest_hazard(session, ship.body.position()) else {
            // Field cleared: idle spin until the next level spawns.
            return input.with(Control::Right, 0.3);
        };
        let distance = offset.length();
        if distance < PANIC_DISTANCE && ship.is_vulnerable() {
            return input.with(Control::Hyperspace, 1.0);
        }

        let error = normalize_angle(offset.y.atan2(offset.x) - ship.body.rotation());
        let turn = (error * AIM_GAIN - ship.body.rotation_speed() * SPIN_DAMPING).clamp(-1.0, 1.0);
        if turn > 0.0 {
            input.set(Control::Right, turn);
        } else {
            input.set(Control::Left, -turn);
        }

        if error.abs() < FIRE_ARC {
            input.set(Control::Fire, 1.0);
            if distance > CRUISE_DISTANCE && self.frame % 4 == 0 {
                input.set(Control::Thrust, 0.6);
            }
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asteroids_core::{SessionConfig, WorldSize};

    #[test]
    fn angles_normalize_into_half_turns() {
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn every_listed_pilot_can_be_created() {
        for id in pilot_ids() {
            let pilot = create_pilot(id).expect("listed pilot");
            assert_eq!(pilot.id(), *id);
        }
        assert!(create_pilot("nobody").is_none());
    }

    #[test]
    fn aim_pilot_steers_toward_hazards() {
        let mut session = Session::seeded(
            "pilot",
            WorldSize::new(800.0, 600.0),
            SessionConfig::default(),
        );
        session.start();
        let mut pilot = AimPilot::default();
        let input = pilot.next_input(&session);
        assert!(input.turn() != 0.0 || input.pressed(Control::Fire));
    }
}
