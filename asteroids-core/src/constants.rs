//! Gameplay tuning.
//!
//! Distances are in world pixels, durations in seconds, angles in radians.

use core::f64::consts::{FRAC_PI_2, PI};

// Default world, used until the input source reports a size
pub const DEFAULT_WORLD_WIDTH: f64 = 960.0;
pub const DEFAULT_WORLD_HEIGHT: f64 = 720.0;

// Starting state
pub const STARTING_LIVES: u32 = 3;
pub const DEFAULT_INPUT_DEADZONE: f64 = 0.15;
pub const DEFAULT_MAX_FRAMES: u32 = 216_000; // one hour at 60fps
pub const THEME_COUNT: u8 = 4;

// Ship
pub const SHIP_HULL: [[f64; 2]; 3] = [[14.0, 0.0], [-10.0, -9.0], [-10.0, 9.0]];
pub const SHIP_START_ROTATION: f64 = -FRAC_PI_2; // facing up
pub const SHIP_ACCELERATION: f64 = 420.0;
pub const SHIP_FRICTION: f64 = 140.0;
pub const SHIP_MAX_SPEED: f64 = 340.0;
pub const SHIP_ROTATION_ACCELERATION: f64 = 40.0;
pub const SHIP_ROTATION_FRICTION: f64 = 30.0;
pub const SHIP_MAX_ROTATION_SPEED: f64 = 4.8;
pub const SHIP_FIRE_COOLDOWN: f64 = 0.16;
pub const SHIP_GUN_OFFSET: f64 = 16.0;
pub const SHIP_RECOIL: f64 = 6.0;
pub const SHIP_PROJECTILE_SPEED_FACTOR: f64 = 0.5;
pub const SHIP_INVULNERABLE_TIME: f64 = 2.0;
pub const SHIP_HYPERSPACE_TIME: f64 = 1.0;
pub const SHIP_RESPAWN_DELAY: f64 = 1.25;
pub const SHIP_SAFE_DISTANCE: f64 = 120.0;

// Projectiles
pub const PROJECTILE_RADIUS: f64 = 2.0;
pub const PROJECTILE_SPEED: f64 = 520.0;
pub const PROJECTILE_MAX_DISTANCE: f64 = 560.0;
pub const UFO_PROJECTILE_SPEED: f64 = 280.0;
pub const UFO_PROJECTILE_MAX_DISTANCE: f64 = 400.0;

// Asteroids
pub const ASTEROID_GENERATIONS: u8 = 3;
pub const ASTEROID_CHILDREN_COUNT: usize = 2;
pub const ASTEROID_INITIAL: u32 = 4;
pub const ASTEROID_INCREASE_PER_LEVEL: u32 = 1;
pub const ASTEROID_MAX_INITIAL: u32 = 11;
pub const ASTEROID_HULL_VERTICES: usize = 9;
pub const ASTEROID_MODEL_COUNT: i32 = 4;
pub const ASTEROID_RADIUS: [f64; ASTEROID_GENERATIONS as usize] = [48.0, 28.0, 16.0];
pub const ASTEROID_SPEED: [(f64, f64); ASTEROID_GENERATIONS as usize] =
    [(34.0, 58.0), (62.0, 94.0), (98.0, 142.0)];
pub const ASTEROID_SCORE: [u32; ASTEROID_GENERATIONS as usize] = [20, 50, 100];
pub const ASTEROID_MAX_ROTATION_SPEED: f64 = 1.2;
pub const ASTEROID_CHILD_OFFSET: f64 = 8.0;
pub const ASTEROID_CHILD_MIN_SEPARATION: f64 = PI / 12.0; // 15 degrees

// Shared by every "find a free spot" search
pub const SPAWN_SEARCH_ATTEMPTS: u32 = 32;

// UFOs
pub const UFO_HULL: [[f64; 2]; 6] = [
    [1.0, 0.0],
    [0.55, -0.45],
    [-0.55, -0.45],
    [-1.0, 0.0],
    [-0.55, 0.4],
    [0.55, 0.4],
];
pub const UFO_LARGE_HALF_WIDTH: f64 = 22.0;
pub const UFO_SMALL_HALF_WIDTH: f64 = 14.0;
pub const UFO_LARGE_SPEED: f64 = 70.0;
pub const UFO_SMALL_SPEED: f64 = 95.0;
pub const UFO_LARGE_SCORE: u32 = 200;
pub const UFO_SMALL_SCORE: u32 = 1000;
pub const UFO_LARGE_FIRE_INTERVAL: (f64, f64) = (1.4, 2.4);
pub const UFO_SMALL_FIRE_INTERVAL: (f64, f64) = (0.9, 1.6);
pub const UFO_SPAWN_INTERVAL: (f64, f64) = (7.0, 14.0);
pub const UFO_SPAWN_EDGE_MARGIN: f64 = 80.0;
pub const UFO_SHIFT_INTERVAL: (f64, f64) = (1.0, 3.0);
pub const UFO_SHIFT_DURATION: (f64, f64) = (0.4, 1.2);
pub const UFO_SHIFT_SPEED_FACTOR: f64 = 0.8;
pub const UFO_SHIFT_EDGE_MARGIN: f64 = 60.0;
pub const UFO_DIFFICULTY_SCORE: u32 = 40_000; // difficulty stops scaling here
pub const UFO_SMALL_WEIGHT: (f64, f64) = (1.0, 3.0); // (easy, hard)
pub const UFO_LARGE_WEIGHT: (f64, f64) = (3.0, 1.0);
pub const UFO_INACCURACY: (f64, f64) = (0.35, 0.04);

// Session pacing
pub const LEVEL_ADVANCE_DELAY: f64 = 2.0;

// Cosmetic debris
pub const DEBRIS_COUNT: usize = 6;
pub const DEBRIS_LIFETIME: (f64, f64) = (0.4, 0.9);
pub const DEBRIS_SPEED: (f64, f64) = (30.0, 120.0);
