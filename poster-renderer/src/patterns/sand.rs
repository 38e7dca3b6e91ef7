//! Kinetic sand: grains falling onto curved, rotatable obstacles.
//!
//! Everything runs in the design space on an occupancy grid of 4-pixel
//! cells. The stream seeds the obstacles and grains and keeps being consumed
//! by the simulation (settling chances, left/right spills, presses), so the
//! outcome depends on the exact sequence of steps: 300 settle steps, then any
//! presses, then one step per frame of animation time.

use std::f64::consts::PI;

use poster_core::{RandomStream, SandColorMode, SandParams, ValueNoise};

use super::{map_range, simulated_frames, RenderContext};
use crate::color::Rgba;
use crate::surface::Surface;

/// Occupancy cell size in design pixels.
pub const CELL_SIZE: f64 = 4.0;

/// Steps run before the first frame is drawn.
pub const SETTLE_STEPS: u32 = 300;

/// Obstacle thickness.
const OBSTACLE_HEIGHT: f64 = 12.0;

/// Vertices per obstacle curve, minus one.
const CURVE_SEGMENTS: u32 = 20;

/// Grains this close to an obstacle end slide off instead of landing.
const SLIDE_MARGIN: f64 = 20.0;

/// A curved shelf rotating about its pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Pivot x.
    pub pivot_x: f64,
    /// Pivot y.
    pub pivot_y: f64,
    /// Length.
    pub width: f64,
    /// Thickness.
    pub height: f64,
    /// Current angle in radians.
    pub angle: f64,
    /// Sag of the curve at its middle.
    pub curve: f64,
    /// Angle the obstacle is easing toward.
    pub target_angle: f64,
    /// Whether it is still easing.
    pub rotating: bool,
}

impl Obstacle {
    /// `(x, y)` in the obstacle's rotated frame.
    fn local(&self, x: f64, y: f64) -> (f64, f64) {
        let (lx, ly) = (x - self.pivot_x, y - self.pivot_y);
        let (sin, cos) = (-self.angle).sin_cos();
        (lx * cos - ly * sin, lx * sin + ly * cos)
    }

    /// Height of the curve at local `x`, if `x` is over the obstacle.
    fn curve_at(&self, local_x: f64) -> Option<f64> {
        let t = local_x / self.width + 0.5;
        (0.0..=1.0)
            .contains(&t)
            .then(|| (t * PI).sin() * self.curve)
    }

    /// Whether a grain of diameter `grain` at `(x, y)` touches the obstacle.
    #[must_use]
    pub fn collides(&self, x: f64, y: f64, grain: f64) -> bool {
        let (rx, ry) = self.local(x, y);
        if rx.abs() > self.width / 2.0 + grain {
            return false;
        }
        self.curve_at(rx)
            .is_some_and(|cy| (ry - cy).abs() < self.height / 2.0 + grain)
    }

    /// Polyline of the curve in the obstacle's local frame.
    #[must_use]
    pub fn outline(&self) -> Vec<(f64, f64)> {
        (0..=CURVE_SEGMENTS)
            .map(|i| {
                let t = f64::from(i) / f64::from(CURVE_SEGMENTS);
                ((t - 0.5) * self.width, (t * PI).sin() * self.curve)
            })
            .collect()
    }
}

/// One grain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grain {
    /// X.
    pub x: f64,
    /// Y.
    pub y: f64,
    /// Velocity on x.
    pub vx: f64,
    /// Velocity on y.
    pub vy: f64,
    /// Resting grains only occupy the grid.
    pub settled: bool,
    /// Hue offset used by the gradient colour mode.
    pub hue_offset: f64,
}

/// Sand simulation state.
#[derive(Debug, Clone)]
pub struct SandSimulation {
    params: SandParams,
    rng: RandomStream,
    noise: ValueNoise,
    obstacles: Vec<Obstacle>,
    grains: Vec<Grain>,
    occupied: Vec<bool>,
    cols: i64,
    rows: i64,
    width: f64,
    height: f64,
}

impl SandSimulation {
    /// Seed obstacles and grains for a `width × height` canvas and run the
    /// initial settle.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(params: &SandParams, seed: u32, width: f64, height: f64) -> Self {
        let params = params.clone().clamped();
        let mut rng = RandomStream::new(seed);
        let obstacles = (0..params.obstacle_count)
            .map(|_| {
                let length = rng.next_f64() * 250.0 + 150.0;
                let x = rng.next_f64() * (width - length);
                let y = rng.next_f64() * (height - 400.0) + 250.0;
                let angle = rng.centered(0.4);
                let curve = rng.next_f64() * 30.0 + 20.0;
                let target_angle = rng.centered(0.4);
                Obstacle {
                    pivot_x: x,
                    pivot_y: y,
                    width: length,
                    height: OBSTACLE_HEIGHT,
                    angle,
                    curve,
                    target_angle,
                    rotating: false,
                }
            })
            .collect();
        let grains = (0..params.sand_amount)
            .map(|_| {
                let x = rng.next_f64() * width;
                let y = rng.next_f64() * (height * 0.3);
                Grain {
                    x,
                    y,
                    vx: 0.0,
                    vy: 0.0,
                    settled: false,
                    hue_offset: rng.centered(40.0),
                }
            })
            .collect();
        let cols = (width / CELL_SIZE).floor().max(0.0) as i64;
        let rows = (height / CELL_SIZE).floor().max(0.0) as i64;
        let mut sim = Self {
            params,
            rng,
            noise: ValueNoise::new(seed),
            obstacles,
            grains,
            occupied: vec![false; usize::try_from(cols * rows).unwrap_or(0)],
            cols,
            rows,
            width,
            height,
        };
        for _ in 0..SETTLE_STEPS {
            sim.update_sand();
        }
        sim
    }

    /// Obstacles.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Grains.
    #[must_use]
    pub fn grains(&self) -> &[Grain] {
        &self.grains
    }

    /// Number of resting grains.
    #[must_use]
    pub fn settled_count(&self) -> usize {
        self.grains.iter().filter(|g| g.settled).count()
    }

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn cell(&self, col: i64, row: i64) -> Option<usize> {
        ((0..self.cols).contains(&col) && (0..self.rows).contains(&row))
            .then(|| (col * self.rows + row) as usize)
    }

    fn is_free(&self, col: i64, row: i64) -> bool {
        self.cell(col, row).is_some_and(|i| !self.occupied[i])
    }

    /// One frame: move the sand, then ease rotating obstacles.
    pub fn step(&mut self) {
        self.update_sand();
        for obstacle in &mut self.obstacles {
            if obstacle.rotating {
                obstacle.angle += (obstacle.target_angle - obstacle.angle) * 0.08;
                if (obstacle.angle - obstacle.target_angle).abs() < 0.01 {
                    obstacle.rotating = false;
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn update_sand(&mut self) {
        self.occupied.fill(false);
        let grain_size = self.params.particle_size;
        let fall = self.params.gravity * self.params.sand_flow;

        for i in 0..self.grains.len() {
            let mut g = self.grains[i];
            if g.settled {
                let col = (g.x / CELL_SIZE).floor() as i64;
                let row = (g.y / CELL_SIZE).floor() as i64;
                if let Some(idx) = self.cell(col, row) {
                    self.occupied[idx] = true;
                }
                continue;
            }

            g.vy += fall;
            g.vx *= 0.95;
            g.vy *= 0.98;
            let (next_x, next_y) = (g.x + g.vx, g.y + g.vy);

            let hit = self
                .obstacles
                .iter()
                .find(|o| o.collides(next_x, next_y, grain_size))
                .copied();
            if let Some(obstacle) = hit {
                let (rx, _) = obstacle.local(g.x, g.y);
                if rx.abs() > obstacle.width / 2.0 - SLIDE_MARGIN {
                    g.vx = if rx > 0.0 { 1.0 } else { -1.0 };
                    g.vy *= 0.5;
                } else {
                    g.vy = 0.0;
                    g.vx *= 0.8;
                    if g.vx.abs() < 0.5 && self.rng.above(0.7) {
                        g.settled = true;
                        g.vx = 0.0;
                    }
                }
            } else {
                let col = (next_x / CELL_SIZE).floor() as i64;
                let row = (next_y / CELL_SIZE).floor() as i64;
                if row >= self.rows - 1 {
                    g.y = (self.rows - 1) as f64 * CELL_SIZE;
                    g.settled = true;
                    g.vx = 0.0;
                    g.vy = 0.0;
                } else if self.cell(col, row).is_some() && !self.is_free(col, row + 1) {
                    let left = self.is_free(col - 1, row + 1);
                    let right = self.is_free(col + 1, row + 1);
                    match (left, right) {
                        (true, true) => g.vx = if self.rng.above(0.5) { -1.0 } else { 1.0 },
                        (true, false) => g.vx = -1.0,
                        (false, true) => g.vx = 1.0,
                        (false, false) => {
                            g.settled = true;
                            g.vx = 0.0;
                            g.vy = 0.0;
                        }
                    }
                } else {
                    g.x = next_x;
                    g.y = next_y;
                }
            }

            g.x = g.x.clamp(0.0, self.width);
            self.grains[i] = g;
        }
    }

    /// Press at `(x, y)`: the nearest obstacle under the pointer turns so its
    /// far end points at the press, and grains resting on it are knocked
    /// loose. Returns whether an obstacle was hit.
    pub fn press(&mut self, x: f64, y: f64) -> bool {
        let mut best: Option<(usize, f64)> = None;
        for (i, obstacle) in self.obstacles.iter().enumerate() {
            let (rx, ry) = obstacle.local(x, y);
            if rx.abs() >= obstacle.width / 2.0 + 30.0 {
                continue;
            }
            let Some(cy) = obstacle.curve_at(rx) else {
                continue;
            };
            let d = (ry - cy).abs();
            if d < obstacle.height + 30.0 && !best.is_some_and(|(_, b)| d >= b) {
                best = Some((i, d));
            }
        }
        let Some((index, _)) = best else {
            return false;
        };

        let obstacle = &mut self.obstacles[index];
        obstacle.target_angle = (y - obstacle.pivot_y).atan2(x - obstacle.pivot_x);
        obstacle.rotating = true;
        let obstacle = *obstacle;

        let grain_size = self.params.particle_size;
        for g in &mut self.grains {
            if obstacle.collides(g.x, g.y, grain_size) {
                g.settled = false;
                g.vx = self.rng.centered(2.0);
                g.vy = -1.0;
            }
        }
        tracing::debug!(index, target = obstacle.target_angle, "obstacle pressed");
        true
    }

    /// Move every obstacle to a new seeded place and angle, and wake all
    /// grains.
    pub fn shuffle(&mut self) {
        for obstacle in &mut self.obstacles {
            obstacle.pivot_x = self.rng.next_f64() * self.width;
            obstacle.pivot_y = self.rng.next_f64() * (self.height - 400.0) + 250.0;
            obstacle.target_angle = self.rng.centered(PI);
            obstacle.rotating = true;
        }
        for g in &mut self.grains {
            g.settled = false;
        }
    }

    /// Colour of `grain`.
    #[must_use]
    pub fn grain_color(&self, grain: &Grain) -> Rgba {
        let p = &self.params;
        match p.color_mode {
            SandColorMode::Mono => Rgba::hsb_opaque(0.0, 0.0, 95.0),
            SandColorMode::Gradient => Rgba::hsb_opaque((p.hue + grain.hue_offset) % 360.0, p.saturation, 90.0),
            SandColorMode::Depth => {
                let shift = map_range(grain.y, 0.0, self.height, -60.0, 60.0);
                Rgba::hsb_opaque((p.hue + shift) % 360.0, p.saturation, 88.0)
            }
            SandColorMode::Warm => {
                let n = self.noise.sample2(grain.x * 0.01, grain.y * 0.01);
                Rgba::hsb_opaque(map_range(n, 0.0, 1.0, 15.0, 45.0), 80.0, 92.0)
            }
        }
    }
}

/// Settle, apply presses, simulate `time` frames and draw.
pub fn render<S: Surface + ?Sized>(
    surface: &mut S,
    params: &SandParams,
    seed: u32,
    time: f64,
    ctx: &RenderContext<'_>,
) {
    surface.background(Rgba::BLACK);
    let mut sim = SandSimulation::new(params, seed, ctx.design_width, ctx.design_height);
    if let Some(interaction) = ctx.interaction {
        for &(x, y) in &interaction.presses {
            sim.press(x, y);
        }
    }
    for _ in 0..simulated_frames(time) {
        sim.step();
    }

    surface.push();
    surface.scale(ctx.scale);
    surface.no_fill();
    surface.stroke(Rgba::hsb_opaque(40.0, 20.0, 60.0));
    for obstacle in sim.obstacles() {
        surface.push();
        surface.translate(obstacle.pivot_x, obstacle.pivot_y);
        surface.rotate(obstacle.angle);
        surface.stroke_weight(obstacle.height);
        surface.polyline(&obstacle.outline());
        surface.pop();
    }

    surface.no_stroke();
    let size = sim.params.particle_size;
    for grain in sim.grains() {
        surface.fill(sim.grain_color(grain));
        surface.ellipse(grain.x, grain.y, size, size);
    }
    surface.pop();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SandParams {
        SandParams {
            sand_amount: 300,
            obstacle_count: 4,
            ..SandParams::default()
        }
    }

    #[test]
    fn obstacles_are_placed_in_bounds() {
        let sim = SandSimulation::new(&small(), 12345, 1000.0, 1500.0);
        assert_eq!(sim.obstacles().len(), 4);
        for o in sim.obstacles() {
            assert!((150.0..400.0).contains(&o.width));
            assert!(o.pivot_x >= 0.0 && o.pivot_x + o.width <= 1000.0);
            assert!((250.0..1350.0).contains(&o.pivot_y));
            assert!(o.angle.abs() <= 0.2);
            assert!((20.0..50.0).contains(&o.curve));
        }
    }

    #[test]
    fn settle_is_reproducible_and_some_grains_rest() {
        let a = SandSimulation::new(&small(), 7, 1000.0, 1500.0);
        let b = SandSimulation::new(&small(), 7, 1000.0, 1500.0);
        assert_eq!(a.grains(), b.grains());
        assert!(a.settled_count() > 0);
        assert!(a.grains().iter().all(|g| (0.0..=1000.0).contains(&g.x)));
    }

    #[test]
    fn collision_follows_curve() {
        let o = Obstacle {
            pivot_x: 100.0,
            pivot_y: 100.0,
            width: 200.0,
            height: 12.0,
            angle: 0.0,
            curve: 30.0,
            target_angle: 0.0,
            rotating: false,
        };
        assert!(o.collides(100.0, 130.0, 4.0));
        assert!(!o.collides(100.0, 100.0, 4.0));
        assert!(o.collides(0.0, 100.0, 4.0));
        assert!(!o.collides(400.0, 100.0, 4.0));
        assert_eq!(o.outline().len(), 21);
    }

    #[test]
    fn press_rotates_nearest_obstacle() {
        let mut sim = SandSimulation::new(&small(), 3, 1000.0, 1500.0);
        let o = sim.obstacles()[0];
        let (sin, cos) = o.angle.sin_cos();
        let (px, py) = (o.pivot_x - sin * o.curve, o.pivot_y + cos * o.curve);
        assert!(sim.press(px, py));
        assert!(sim.obstacles().iter().any(|o| o.rotating));
        assert!(!sim.press(-5000.0, -5000.0));
        for _ in 0..200 {
            sim.step();
        }
        assert!(sim.obstacles().iter().all(|o| !o.rotating));
    }

    #[test]
    fn shuffle_wakes_every_grain() {
        let mut sim = SandSimulation::new(&small(), 3, 1000.0, 1500.0);
        sim.shuffle();
        assert_eq!(sim.settled_count(), 0);
        assert!(sim.obstacles().iter().all(|o| o.rotating));
    }

    #[test]
    fn colour_modes() {
        let sim = SandSimulation::new(
            &SandParams {
                sand_amount: 1,
                color_mode: SandColorMode::Mono,
                ..small()
            },
            1,
            1000.0,
            1500.0,
        );
        let grain = sim.grains()[0];
        assert_eq!(sim.grain_color(&grain), Rgba::hsb_opaque(0.0, 0.0, 95.0));
    }
}
