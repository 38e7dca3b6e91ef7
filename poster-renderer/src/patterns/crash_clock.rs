//! Crash clock: a seeded particle field drifting on value noise.
//!
//! The field lives in the design space with the origin at the centre. The
//! seed fixes the initial particles; a render then simulates one step per
//! frame of animation time and draws the result through the export scale.

use poster_core::{CrashClockParams, MouseMode, RandomStream, ValueNoise};

use super::{simulated_frames, RenderContext};
use crate::color::{hue_background, Rgba};
use crate::surface::Surface;

/// Share of the half-extent particles start within.
const SPAWN_EXTENT: f64 = 0.85;

/// Particles stay this far inside the edges.
const EDGE_MARGIN: f64 = 5.0;

/// One particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// X relative to the centre.
    pub x: f64,
    /// Y relative to the centre.
    pub y: f64,
    /// Velocity on x.
    pub vx: f64,
    /// Velocity on y.
    pub vy: f64,
    /// Diameter.
    pub size: f64,
    /// Colour group, 0 to 2.
    pub group: usize,
}

/// Simulated particle field.
#[derive(Debug, Clone)]
pub struct ParticleField {
    params: CrashClockParams,
    noise: ValueNoise,
    particles: Vec<Particle>,
    half_width: f64,
    half_height: f64,
    frame: u32,
}

impl ParticleField {
    /// Seed a field for a `width × height` design canvas.
    #[must_use]
    pub fn new(params: &CrashClockParams, seed: u32, width: f64, height: f64) -> Self {
        let params = params.clone().clamped();
        let (half_width, half_height) = (width / 2.0, height / 2.0);
        let mut rng = RandomStream::new(seed);
        let particles = (0..params.particle_count)
            .map(|_| {
                let x = rng.range(-half_width * SPAWN_EXTENT, half_width * SPAWN_EXTENT);
                let y = rng.range(-half_height * SPAWN_EXTENT, half_height * SPAWN_EXTENT);
                let size = (params.particle_size + rng.centered(params.particle_size_jitter)).max(2.0);
                let group = rng.index(3);
                Particle {
                    x,
                    y,
                    vx: 0.0,
                    vy: 0.0,
                    size,
                    group,
                }
            })
            .collect();
        Self {
            params,
            noise: ValueNoise::new(seed),
            particles,
            half_width,
            half_height,
            frame: 0,
        }
    }

    /// Current particles.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Frames simulated so far.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advance one frame. `pointer` is a centre-relative position held down.
    pub fn step(&mut self, pointer: Option<(f64, f64)>) {
        self.frame += 1;
        let p = &self.params;
        let frame = f64::from(self.frame);
        let phase = frame * p.rotation_speed;
        let max_x = (self.half_width - EDGE_MARGIN).max(0.0);
        let max_y = (self.half_height - EDGE_MARGIN).max(0.0);

        for particle in &mut self.particles {
            let n = self.noise.sample(particle.x * 0.003, particle.y * 0.003, frame * 0.01);
            particle.vx += (n - 0.5) * p.noise_flow;
            particle.vy += ((particle.x + particle.y) * 0.004 * p.wobble_freq + phase).sin()
                * (p.wobble_amp * 0.01);

            if let Some((mx, my)) = pointer {
                let (dx, dy) = (particle.x - mx, particle.y - my);
                let d = dx.hypot(dy);
                if d < p.mouse_radius {
                    let force = (1.0 - d / p.mouse_radius) * p.mouse_force;
                    let (nx, ny) = (dx / (d + 1e-6), dy / (d + 1e-6));
                    let sign = match p.mouse_mode {
                        MouseMode::Repel => 1.0,
                        MouseMode::Attract => -1.0,
                    };
                    particle.vx += sign * nx * force;
                    particle.vy += sign * ny * force;
                }
            }

            particle.vx *= p.friction;
            particle.vy *= p.friction;
            particle.x = (particle.x + particle.vx).clamp(-max_x, max_x);
            particle.y = (particle.y + particle.vy).clamp(-max_y, max_y);
        }
    }
}

/// Background colour: 0 is black, 360 is white.
#[must_use]
pub fn background(params: &CrashClockParams) -> Rgba {
    hue_background(params.bg_hue, 60.0, 30.0)
}

/// Particle colour: 0 is black, 360 is white.
#[must_use]
pub fn particle_color(params: &CrashClockParams) -> Rgba {
    hue_background(params.hue, 80.0, 90.0)
}

/// Simulate `time` frames and draw the field.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    params: &CrashClockParams,
    seed: u32,
    time: f64,
    ctx: &RenderContext<'_>,
) {
    surface.background(background(params));
    let mut field = ParticleField::new(params, seed, ctx.design_width, ctx.design_height);
    let pointer = ctx
        .interaction
        .and_then(|i| i.pointer)
        .map(|(x, y)| (x - ctx.design_width / 2.0, y - ctx.design_height / 2.0));
    for _ in 0..simulated_frames(time) {
        field.step(pointer);
    }

    surface.push();
    surface.translate(surface.width() / 2.0, surface.height() / 2.0);
    surface.scale(ctx.scale);
    surface.no_stroke();
    surface.fill(particle_color(params));
    for particle in field.particles() {
        surface.ellipse(particle.x, particle.y, particle.size, particle.size);
    }
    surface.pop();
}
