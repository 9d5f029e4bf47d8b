use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::VecDeque, f64::consts::PI};

/// Canvas pixels per star.
pub const STAR_DENSITY: f64 = 8000.0;
pub const MAX_TRAIL_POINTS: usize = 50;
/// How far past the canvas edge a meteor may travel before it is dropped.
pub const METEOR_MARGIN: f64 = 200.0;

const FADE_IN_STEP: f64 = 0.002;
const FADE_OUT_STEP: f64 = 0.001;
const FADE_OUT_CHANCE: f64 = 0.3;
const METEOR_FADE_STEP: f64 = 0.005;

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub opacity: f64,
    pub twinkle_speed: f64,
    pub twinkle_phase: f64,
    pub fade_in: bool,
    pub target_opacity: f64,
}

impl Star {
    fn random(rng: &mut StdRng, width: f64, height: f64) -> Self {
        let opacity = rng.random::<f64>() * 0.5 + 0.5;
        Self {
            x: rng.random::<f64>() * width,
            y: rng.random::<f64>() * height,
            size: rng.random::<f64>() * 2.0 + 0.5,
            opacity,
            twinkle_speed: rng.random::<f64>() * 0.02 + 0.01,
            twinkle_phase: rng.random::<f64>() * PI * 2.0,
            fade_in: rng.random::<f64>() > 0.5,
            target_opacity: opacity,
        }
    }

    /// Opacity as drawn: the lifecycle opacity modulated by the twinkle.
    pub fn visible_opacity(&self) -> f64 {
        let twinkle = self.twinkle_phase.sin() * 0.3 + 0.7;
        (self.opacity * twinkle).max(0.0)
    }

    /// Larger, brighter stars get a soft glow.
    pub fn glows(&self) -> bool {
        self.size > 1.5 && self.visible_opacity() > 0.3
    }

    fn step(&mut self, rng: &mut StdRng, width: f64, height: f64) {
        self.twinkle_phase += self.twinkle_speed;

        if self.fade_in {
            self.opacity += FADE_IN_STEP;
            if self.opacity >= self.target_opacity {
                self.opacity = self.target_opacity;
                self.fade_in = false;
                if rng.random::<f64>() < FADE_OUT_CHANCE {
                    self.target_opacity = 0.0;
                }
            }
        } else {
            self.opacity -= FADE_OUT_STEP;
            if self.opacity <= 0.0 {
                self.opacity = 0.0;
                self.fade_in = true;
                self.target_opacity = rng.random::<f64>() * 0.5 + 0.5;
                self.x = rng.random::<f64>() * width;
                self.y = rng.random::<f64>() * height;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
}

/// One quad of a meteor trail, spanning two consecutive trail points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSegment {
    pub corners: [(f64, f64); 4],
    pub opacity: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Meteor {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    pub angle: f64,
    pub opacity: f64,
    pub trail: VecDeque<TrailPoint>,
}

impl Meteor {
    fn step(&mut self) {
        self.x += self.angle.cos() * self.speed;
        self.y += self.angle.sin() * self.speed;

        self.trail.push_back(TrailPoint {
            x: self.x,
            y: self.y,
            opacity: self.opacity,
        });
        if self.trail.len() > MAX_TRAIL_POINTS {
            self.trail.pop_front();
        }

        self.opacity -= METEOR_FADE_STEP;
    }

    fn is_alive(&self, width: f64, height: f64) -> bool {
        self.opacity > 0.0
            && self.x > -METEOR_MARGIN
            && self.x < width + METEOR_MARGIN
            && self.y > -METEOR_MARGIN
            && self.y < height + METEOR_MARGIN
    }

    /// Tapered trail geometry: thin and faint at the tail, wide and bright at the head.
    pub fn trail_segments(&self) -> Vec<TrailSegment> {
        let len = self.trail.len();
        if len <= 2 {
            return Vec::new();
        }

        self.trail
            .iter()
            .zip(self.trail.iter().skip(1))
            .enumerate()
            .filter_map(|(i, (point, next))| {
                let progress = i as f64 / len as f64;
                let opacity = point.opacity * progress * 0.8;
                let width = 0.5 + progress * 3.5;

                let dx = next.x - point.x;
                let dy = next.y - point.y;
                let length = (dx * dx + dy * dy).sqrt();
                if length <= 0.0 {
                    return None;
                }

                let perp_x = -dy / length * width;
                let perp_y = dx / length * width;

                Some(TrailSegment {
                    corners: [
                        (point.x - perp_x, point.y - perp_y),
                        (point.x + perp_x, point.y + perp_y),
                        (next.x + perp_x, next.y + perp_y),
                        (next.x - perp_x, next.y - perp_y),
                    ],
                    opacity,
                    width,
                })
            })
            .collect()
    }
}

/// Star field plus meteor showers, advanced one frame at a time.
pub struct Starfield {
    width: f64,
    height: f64,
    stars: Vec<Star>,
    meteors: Vec<Meteor>,
    pending_meteors: Vec<f64>,
    last_burst_ms: f64,
    next_burst_gap_ms: f64,
    next_meteor_id: u64,
    rng: StdRng,
}

impl Starfield {
    pub fn new(width: f64, height: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let next_burst_gap_ms = Self::burst_gap(&mut rng);
        let mut starfield = Self {
            width,
            height,
            stars: Vec::new(),
            meteors: Vec::new(),
            pending_meteors: Vec::new(),
            last_burst_ms: 0.0,
            next_burst_gap_ms,
            next_meteor_id: 0,
            rng,
        };
        starfield.init_stars();
        starfield
    }

    pub fn star_count_for(width: f64, height: f64) -> usize {
        ((width * height) / STAR_DENSITY).floor().max(0.0) as usize
    }

    fn burst_gap(rng: &mut StdRng) -> f64 {
        1000.0 + rng.random::<f64>() * 2000.0
    }

    fn init_stars(&mut self) {
        let count = Self::star_count_for(self.width, self.height);
        let (width, height) = (self.width, self.height);
        let rng = &mut self.rng;
        self.stars = (0..count).map(|_| Star::random(rng, width, height)).collect();
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn meteors(&self) -> &[Meteor] {
        &self.meteors
    }

    fn spawn_meteor(&mut self) {
        let rng = &mut self.rng;
        let meteor = Meteor {
            id: self.next_meteor_id,
            x: rng.random::<f64>() * self.width * 0.5 + self.width * 0.25,
            y: rng.random::<f64>() * self.height * 0.3,
            speed: rng.random::<f64>() * 3.0 + 4.0,
            angle: PI / 4.0 + (rng.random::<f64>() - 0.5) * 0.4,
            opacity: 1.0,
            trail: VecDeque::with_capacity(MAX_TRAIL_POINTS + 1),
        };
        self.next_meteor_id += 1;
        self.meteors.push(meteor);
    }

    /// Advances one frame drawn at `timestamp_ms`.
    pub fn tick(&mut self, timestamp_ms: f64) {
        let (width, height) = (self.width, self.height);
        for star in &mut self.stars {
            star.step(&mut self.rng, width, height);
        }

        if timestamp_ms - self.last_burst_ms > self.next_burst_gap_ms {
            let count = self.rng.random_range(2..=3);
            let mut delay = 0.0;
            for i in 0..count {
                if i > 0 {
                    delay += 100.0 + self.rng.random::<f64>() * 200.0;
                }
                self.pending_meteors.push(timestamp_ms + delay);
            }
            self.last_burst_ms = timestamp_ms;
            self.next_burst_gap_ms = Self::burst_gap(&mut self.rng);
        }

        let due = self
            .pending_meteors
            .iter()
            .filter(|&&at| at <= timestamp_ms)
            .count();
        self.pending_meteors.retain(|&at| at > timestamp_ms);
        for _ in 0..due {
            self.spawn_meteor();
        }

        for meteor in &mut self.meteors {
            meteor.step();
        }
        self.meteors.retain(|meteor| meteor.is_alive(width, height));
    }
}
