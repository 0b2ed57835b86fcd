use crate::rng::SimRng;

/// A single chemotactic agent. Positions are continuous, in field-cell units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Heading in radians, steered by the sensors
    pub angle: f32,
    /// Magnitude of (vx, vy)
    pub speed: f32,
    pub vx: f32,
    pub vy: f32,
    /// Stuck particles have zero velocity and never move until released
    pub is_stuck: bool,
}

impl Particle {
    /// A motionless, stuck particle at (x, y)
    pub fn pinned(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            is_stuck: true,
            ..Default::default()
        }
    }

    /// Random position, random heading, and a velocity along a second,
    /// independent random direction.
    fn spawn(rng: &mut SimRng, width: usize, height: usize, speed: f32) -> Self {
        let x = rng.range(0.0, width as f32);
        let y = rng.range(0.0, height as f32);
        let angle = rng.angle();
        let direction = rng.angle();
        Self {
            x,
            y,
            angle,
            speed,
            vx: direction.cos() * speed,
            vy: direction.sin() * speed,
            is_stuck: false,
        }
    }

    /// Fix the particle in place
    pub fn stick(&mut self) {
        self.is_stuck = true;
        self.vx = 0.0;
        self.vy = 0.0;
        self.speed = 0.0;
    }

    #[inline]
    pub fn velocity_magnitude(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// Owner of the live particle list. Count changes go through
/// `reconcile_count` so existing particles keep their identity.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    width: usize,
    height: usize,
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            particles: Vec::new(),
        }
    }

    /// Discard everything and spawn `count` fresh particles
    pub fn initialize(&mut self, count: usize, speed: f32, rng: &mut SimRng) {
        self.particles.clear();
        self.particles.reserve(count);
        self.append_random(count, speed, rng);
    }

    fn append_random(&mut self, count: usize, speed: f32, rng: &mut SimRng) {
        let (width, height) = (self.width, self.height);
        self.particles
            .extend((0..count).map(|_| Particle::spawn(rng, width, height, speed)));
    }

    /// Grow or shrink to `new_count`.
    ///
    /// Growth appends fresh random particles. Shrinking removes free particles
    /// first, taken from the tail of the free subset, and only then stuck ones,
    /// again from the tail. Returns the signed change in count.
    pub fn reconcile_count(&mut self, new_count: usize, speed: f32, rng: &mut SimRng) -> isize {
        let current = self.particles.len();
        if new_count > current {
            self.append_random(new_count - current, speed, rng);
            return (new_count - current) as isize;
        }
        if new_count == current {
            return 0;
        }

        let excess = current - new_count;
        let mut remove = vec![false; current];
        let mut marked = 0;
        for (i, p) in self.particles.iter().enumerate().rev() {
            if marked == excess {
                break;
            }
            if !p.is_stuck {
                remove[i] = true;
                marked += 1;
            }
        }
        for (i, p) in self.particles.iter().enumerate().rev() {
            if marked == excess {
                break;
            }
            if p.is_stuck {
                remove[i] = true;
                marked += 1;
            }
        }

        let mut flags = remove.into_iter();
        self.particles.retain(|_| !flags.next().unwrap_or(false));
        -(excess as isize)
    }

    /// Scale every free particle's velocity to `new_speed`, keeping direction.
    /// Zero-length velocities are left alone.
    pub fn rescale_speed(&mut self, new_speed: f32) {
        for p in self.particles.iter_mut().filter(|p| !p.is_stuck) {
            let magnitude = p.velocity_magnitude();
            if magnitude > 0.0 {
                let scale = new_speed / magnitude;
                p.vx *= scale;
                p.vy *= scale;
                p.speed = new_speed;
            }
        }
    }

    /// Insert a stuck particle at (x, y), wrapped onto the torus
    pub fn spawn_pinned(&mut self, x: f32, y: f32) {
        let x = wrap_coord(x, self.width as f32);
        let y = wrap_coord(y, self.height as f32);
        self.particles.push(Particle::pinned(x, y));
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn stuck_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_stuck).count()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }
}

/// Wrap `v` into `[0, max)`; non-finite input maps to 0
#[inline]
pub fn wrap_coord(v: f32, max: f32) -> f32 {
    if !v.is_finite() || max <= 0.0 {
        return 0.0;
    }
    let wrapped = v.rem_euclid(max);
    // rem_euclid can round up to `max` for tiny negative inputs
    if wrapped >= max {
        0.0
    } else {
        wrapped
    }
}
