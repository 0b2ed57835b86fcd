//! Per-particle steering: DLA sticking, chemotaxis and flocking combined into
//! one new velocity.

use crate::field::ScalarField;
use crate::particles::Particle;
use crate::rng::SimRng;
use crate::settings::SimulationParams;
use crate::spatial::SpatialIndex;

/// Contact distance for sticking, in multiples of particle size
const CONTACT_FACTOR: f32 = 3.0;
/// Share of the chemotactic velocity when neighbors are present
const CHEMICAL_WEIGHT: f32 = 0.6;
/// Share of the combined flocking force when neighbors are present
const FLOCK_WEIGHT: f32 = 0.4;
/// Separation falloff length as a fraction of the perception radius
const SEPARATION_FALLOFF: f32 = 0.25;
/// Extra speed per unit of center-sensor reading when heading straight
const STRAIGHT_BOOST: f32 = 0.5;

/// What happened to a particle during its step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Free particle received a new velocity and should move
    Steered,
    /// Free particle touched the aggregate and stuck this tick
    Stuck,
    /// Stuck particle stayed stuck
    Frozen,
    /// Stuck particle let go; it stays put until next tick
    Released,
}

impl StepOutcome {
    /// Whether the particle should integrate its velocity this tick
    pub fn moves(&self) -> bool {
        matches!(self, StepOutcome::Steered)
    }
}

/// Running sums over the neighborhood of one particle
#[derive(Debug, Default)]
struct Neighborhood {
    count: usize,
    sum_vx: f32,
    sum_vy: f32,
    sum_x: f32,
    sum_y: f32,
    sep_x: f32,
    sep_y: f32,
    touches_aggregate: bool,
}

/// Three sensor readings: left, center, right
pub type SensorReading = (f32, f32, f32);

/// Read the field at `distance` along `angle` from (x, y)
#[inline]
pub fn sense(field: &ScalarField, x: f32, y: f32, angle: f32, distance: f32) -> f32 {
    field.query(x + angle.cos() * distance, y + angle.sin() * distance)
}

/// Sample the left, center and right sensors of a particle
pub fn read_sensors(field: &ScalarField, p: &Particle, params: &SimulationParams) -> SensorReading {
    let reach = params.sensor_distance * params.particle_size;
    (
        sense(field, p.x, p.y, p.angle - params.sensor_angle, reach),
        sense(field, p.x, p.y, p.angle, reach),
        sense(field, p.x, p.y, p.angle + params.sensor_angle, reach),
    )
}

/// Decide the new heading and the speed multiplier from a sensor reading.
///
/// Nothing sensed: bounded random turn. Center strictly strongest: keep
/// going with a boost. Otherwise turn a full `turn_speed` toward the stronger
/// side; a tie between the sides turns right.
pub fn steer(angle: f32, reading: SensorReading, turn_speed: f32, rng: &mut SimRng) -> (f32, f32) {
    let (left, center, right) = reading;
    let strongest = left.max(center).max(right);

    if strongest <= 0.0 {
        let half = turn_speed * 0.5;
        (angle + rng.range(-half, half), 1.0)
    } else if center > left && center > right {
        (angle, 1.0 + STRAIGHT_BOOST * center)
    } else if left > right {
        (angle - turn_speed, 1.0)
    } else {
        (angle + turn_speed, 1.0)
    }
}

fn scan_neighbors(
    particles: &[Particle],
    idx: usize,
    index: &SpatialIndex,
    params: &SimulationParams,
) -> Neighborhood {
    let me = particles[idx];
    let perception = params.perception_radius.max(0.0);
    let contact = CONTACT_FACTOR * params.particle_size.max(0.0);
    let falloff = perception * SEPARATION_FALLOFF;
    let mut hood = Neighborhood::default();

    index.for_each_neighbor(particles, idx, perception.max(contact), |other, dist| {
        let n = &particles[other];
        if n.is_stuck && dist <= contact {
            hood.touches_aggregate = true;
        }
        if dist > perception {
            return;
        }
        hood.count += 1;
        hood.sum_vx += n.vx;
        hood.sum_vy += n.vy;
        hood.sum_x += n.x;
        hood.sum_y += n.y;
        if dist > 0.0 {
            let weight = (-dist / falloff).exp();
            hood.sep_x += (me.x - n.x) / dist * weight;
            hood.sep_y += (me.y - n.y) / dist * weight;
        }
    });

    hood
}

/// Advance the steering state of `particles[idx]` by one tick.
///
/// Only the particle at `idx` is written. Position is left untouched; the
/// caller integrates velocity for `StepOutcome::Steered`.
pub fn step_particle(
    particles: &mut [Particle],
    idx: usize,
    index: &SpatialIndex,
    field: &ScalarField,
    params: &SimulationParams,
    rng: &mut SimRng,
) -> StepOutcome {
    let me = particles[idx];

    if me.is_stuck {
        if rng.unit() < params.release_probability {
            particles[idx].is_stuck = false;
            return StepOutcome::Released;
        }
        return StepOutcome::Frozen;
    }

    let hood = scan_neighbors(particles, idx, index, params);

    // Aggregation takes precedence over sensing
    if hood.touches_aggregate && rng.unit() < params.sticking_probability {
        particles[idx].stick();
        return StepOutcome::Stuck;
    }

    let reading = read_sensors(field, &me, params);
    let (angle, boost) = steer(me.angle, reading, params.turn_speed, rng);
    let chem_speed = params.move_speed * boost;
    let chem_x = angle.cos() * chem_speed;
    let chem_y = angle.sin() * chem_speed;

    let (mut vx, mut vy) = if hood.count > 0 {
        let n = hood.count as f32;
        let align_x = hood.sum_vx / n * params.alignment_force;
        let align_y = hood.sum_vy / n * params.alignment_force;
        let cohesion_x = (hood.sum_x / n - me.x) / params.perception_radius * params.cohesion_force;
        let cohesion_y = (hood.sum_y / n - me.y) / params.perception_radius * params.cohesion_force;
        let sep_x = hood.sep_x / n * params.separation_force / n;
        let sep_y = hood.sep_y / n * params.separation_force / n;
        (
            CHEMICAL_WEIGHT * chem_x + FLOCK_WEIGHT * (align_x + cohesion_x + sep_x),
            CHEMICAL_WEIGHT * chem_y + FLOCK_WEIGHT * (align_y + cohesion_y + sep_y),
        )
    } else {
        (chem_x, chem_y)
    };

    let magnitude = (vx * vx + vy * vy).sqrt();
    let speed = if magnitude > 0.0 && magnitude.is_finite() {
        let scale = params.move_speed / magnitude;
        vx *= scale;
        vy *= scale;
        params.move_speed
    } else {
        vx = 0.0;
        vy = 0.0;
        0.0
    };

    let p = &mut particles[idx];
    p.angle = angle;
    p.vx = vx;
    p.vy = vy;
    p.speed = speed;
    StepOutcome::Steered
}
