//! The movement library.
//!
//! A [`Movement`] is attached to at most one entity and mutates that
//! entity's bounding box each tick. Every kind shares the same contract:
//! `update` advances the position up to the current clock date, a suspended
//! movement advances nothing and shifts its pending dates on resume, and a
//! finished movement stays attached, inert, until the owner replaces it.
//!
//! Obstacle tests are injected as a closure so the kinds stay independent
//! from the map and the entity lists; the movement system builds the
//! closure from the tile grid and the obstacle entities.

use bevy_ecs::prelude::{Component, Entity};

use crate::components::entity::BoundingBox;
use crate::geometry::{DIRECTIONS8, Point, Rectangle};

/// Test returning true when a candidate box collides with an obstacle.
pub type ObstacleTest<'a> = dyn FnMut(&Rectangle) -> bool + 'a;

/// A movement step on both axes, in pixels.
pub type Step = (i32, i32);

/// Parse a pixel trajectory string: pairs of `dx dy` separated by blanks,
/// e.g. `"0 -2  0 -2  1 0"`.
pub fn parse_trajectory(trajectory: &str) -> Vec<Step> {
    let mut values = trajectory
        .split_whitespace()
        .map(|v| v.parse::<i32>().unwrap_or_else(|_| panic!("bad trajectory token '{v}'")));
    let mut steps = Vec::new();
    while let Some(dx) = values.next() {
        let dy = values.next().expect("odd number of trajectory values");
        steps.push((dx, dy));
    }
    steps
}

/// Parse a path string: each char '0'..'7' is an 8-pixel segment in that
/// 8-direction.
pub fn parse_path(path: &str) -> Vec<u8> {
    path.bytes()
        .map(|b| {
            assert!((b'0'..=b'7').contains(&b), "bad path char");
            b - b'0'
        })
        .collect()
}

/// Per-axis pixel stepping at a constant speed, the base of the target,
/// thrown and knock-back movements.
#[derive(Debug, Clone, Default)]
pub struct StraightState {
    /// Signed speeds in px/s.
    pub x_speed: f32,
    pub y_speed: f32,
    pub next_move_date_x: u32,
    pub next_move_date_y: u32,
    /// Total distance after which the movement finishes; 0 = unbounded.
    pub max_distance: i32,
    pub distance_covered: i32,
}

impl StraightState {
    pub fn new(x_speed: f32, y_speed: f32, now: u32) -> Self {
        let mut state = StraightState {
            x_speed,
            y_speed,
            ..Default::default()
        };
        state.reset_dates(now);
        state
    }

    pub fn set_speeds(&mut self, x_speed: f32, y_speed: f32, now: u32) {
        self.x_speed = x_speed;
        self.y_speed = y_speed;
        self.reset_dates(now);
    }

    fn reset_dates(&mut self, now: u32) {
        self.next_move_date_x = now + Self::delay(self.x_speed);
        self.next_move_date_y = now + Self::delay(self.y_speed);
    }

    fn delay(speed: f32) -> u32 {
        if speed == 0.0 {
            u32::MAX / 2
        } else {
            (1000.0 / speed.abs()).max(1.0) as u32
        }
    }

    pub fn is_moving(&self) -> bool {
        self.x_speed != 0.0 || self.y_speed != 0.0
    }

    fn shift_dates(&mut self, offset: u32) {
        self.next_move_date_x += offset;
        self.next_move_date_y += offset;
    }
}

/// State of the grid alignment attempted before a path starts.
#[derive(Debug, Clone)]
pub struct Snapping {
    pub deadline: u32,
    pub done: bool,
}

/// The movement kinds of the library.
#[derive(Debug, Clone)]
pub enum MovementKind {
    /// A finite list of (dx, dy) steps with a fixed per-step delay.
    Pixel {
        steps: Vec<Step>,
        index: usize,
        delay: u32,
        next_step_date: u32,
        loops: bool,
    },
    /// 8-pixel segments along 8-directions at a given speed.
    Path {
        path: Vec<u8>,
        segment: usize,
        /// Pixels already covered inside the current segment, 0..8.
        covered: i32,
        /// Delay between two 1-pixel steps, straight and diagonal.
        step_delay: u32,
        diagonal_step_delay: u32,
        next_step_date: u32,
        loops: bool,
        snapping: Option<Snapping>,
    },
    /// Seeks a point (possibly refreshed from a target entity) at constant
    /// speed, recomputing its angle every 150 ms.
    Target {
        target: Point,
        entity: Option<Entity>,
        speed: f32,
        next_recompute_date: u32,
        straight: StraightState,
    },
    /// The hero's 8-direction keyboard movement, with obstacle smoothing.
    Player {
        /// Wanted direction, -1 when stopped. Written by the hero state.
        direction8: i32,
        speed: f32,
        moving_enabled: bool,
        direction_enabled: bool,
        straight: StraightState,
    },
    /// Straight px-per-px steps from explicit speeds (thrown items,
    /// knock-back). Finishes after `max_distance` when set.
    Straight { straight: StraightState },
    /// A fixed-length move along an 8-direction with a parabolic height
    /// used only by the sprite draw.
    Jump {
        direction8: i32,
        length: i32,
        covered: i32,
        step_delay: u32,
        next_step_date: u32,
    },
    /// A path movement that picks a fresh random direction whenever a
    /// segment ends or hits an obstacle.
    RandomWalk {
        speed: f32,
        step_delay: u32,
        next_step_date: u32,
        direction8: u8,
        remaining: i32,
    },
    /// Keeps a fixed offset from another entity. The system refreshes
    /// `anchor` from the followed entity before each update.
    Follow {
        followed: Entity,
        dx: i32,
        dy: i32,
        anchor: Point,
    },
}

/// A movement attached to an entity.
#[derive(Debug, Clone, Component)]
pub struct Movement {
    pub kind: MovementKind,
    /// Skip every obstacle test, map border included.
    pub ignore_obstacles: bool,
    pub finished: bool,
    suspended: bool,
    suspended_since: u32,
    /// Position change applied by the last `update` call.
    pub xy_change: Step,
    /// Last candidate box that was refused by an obstacle.
    pub last_collision_box: Option<Rectangle>,
    /// Raised when the last update was blocked.
    pub stopped_by_obstacle: bool,
}

/// Height of a jump above the shadow, by eighth of progress.
const JUMP_HEIGHTS: [i32; 8] = [0, 4, 8, 12, 16, 12, 8, 4];

/// Preset bounces of a pickable item appearing, per fall height.
const FALLING_TRAJECTORIES: [&str; 3] = [
    "0 0  0 2  -1 2  0 2  1 2  0 2  0 0",
    "0 0  0 2  -1 2  0 2  1 2  0 2  1 2  0 2  -1 2  0 0",
    "0 0  0 2  -1 2  0 2  1 3  0 2  1 2  0 2  -1 2  0 2  -1 3  0 2  1 2  0 0",
];

impl Movement {
    fn with_kind(kind: MovementKind) -> Self {
        Movement {
            kind,
            ignore_obstacles: false,
            finished: false,
            suspended: false,
            suspended_since: 0,
            xy_change: (0, 0),
            last_collision_box: None,
            stopped_by_obstacle: false,
        }
    }

    pub fn pixel(trajectory: &str, delay: u32, loops: bool, now: u32) -> Self {
        Movement::with_kind(MovementKind::Pixel {
            steps: parse_trajectory(trajectory),
            index: 0,
            delay,
            next_step_date: now + delay,
            loops,
        })
    }

    pub fn path(path: &str, speed: f32, loops: bool, snap_to_grid: bool, now: u32) -> Self {
        let step_delay = (1000.0 / speed).max(1.0) as u32;
        Movement::with_kind(MovementKind::Path {
            path: parse_path(path),
            segment: 0,
            covered: 0,
            step_delay,
            diagonal_step_delay: (1414.0 / speed).max(1.0) as u32,
            next_step_date: now + step_delay,
            loops,
            snapping: snap_to_grid.then_some(Snapping {
                deadline: now + 500,
                done: false,
            }),
        })
    }

    pub fn target_point(x: i32, y: i32, speed: f32, now: u32) -> Self {
        Movement::with_kind(MovementKind::Target {
            target: Point::new(x, y),
            entity: None,
            speed,
            next_recompute_date: now,
            straight: StraightState::new(0.0, 0.0, now),
        })
    }

    pub fn target_entity(entity: Entity, speed: f32, now: u32) -> Self {
        Movement::with_kind(MovementKind::Target {
            target: Point::new(0, 0),
            entity: Some(entity),
            speed,
            next_recompute_date: now,
            straight: StraightState::new(0.0, 0.0, now),
        })
    }

    pub fn player(speed: f32, now: u32) -> Self {
        Movement::with_kind(MovementKind::Player {
            direction8: -1,
            speed,
            moving_enabled: true,
            direction_enabled: true,
            straight: StraightState::new(0.0, 0.0, now),
        })
    }

    pub fn straight(x_speed: f32, y_speed: f32, max_distance: i32, now: u32) -> Self {
        let mut straight = StraightState::new(x_speed, y_speed, now);
        straight.max_distance = max_distance;
        Movement::with_kind(MovementKind::Straight { straight })
    }

    pub fn jump(direction8: i32, length: i32, speed: f32, ignore_obstacles: bool, now: u32) -> Self {
        let step_delay = (1000.0 / speed).max(1.0) as u32;
        let mut movement = Movement::with_kind(MovementKind::Jump {
            direction8,
            length,
            covered: 0,
            step_delay,
            next_step_date: now + step_delay,
        });
        movement.ignore_obstacles = ignore_obstacles;
        movement
    }

    pub fn random_walk(speed: f32, now: u32) -> Self {
        let step_delay = (1000.0 / speed).max(1.0) as u32;
        Movement::with_kind(MovementKind::RandomWalk {
            speed,
            step_delay,
            next_step_date: now + step_delay,
            direction8: (fastrand::u8(0..4)) * 2,
            remaining: 8 * (1 + fastrand::i32(0..3)),
        })
    }

    pub fn follow(followed: Entity, dx: i32, dy: i32) -> Self {
        let mut movement = Movement::with_kind(MovementKind::Follow {
            followed,
            dx,
            dy,
            anchor: Point::new(0, 0),
        });
        movement.ignore_obstacles = true;
        movement
    }

    /// Bounce of a pickable item appearing, by fall height 0..3.
    pub fn falling_on_floor(height: usize, now: u32) -> Self {
        let mut movement = Movement::pixel(FALLING_TRAJECTORIES[height], 30, false, now);
        movement.ignore_obstacles = true;
        movement
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Suspend or resume; resuming shifts every pending date by the
    /// suspension duration so no step is skipped or replayed.
    pub fn set_suspended(&mut self, suspended: bool, now: u32) {
        if suspended == self.suspended {
            return;
        }
        self.suspended = suspended;
        if suspended {
            self.suspended_since = now;
        } else {
            let offset = now - self.suspended_since;
            match &mut self.kind {
                MovementKind::Pixel { next_step_date, .. }
                | MovementKind::Jump { next_step_date, .. }
                | MovementKind::RandomWalk { next_step_date, .. } => *next_step_date += offset,
                MovementKind::Path {
                    next_step_date,
                    snapping,
                    ..
                } => {
                    *next_step_date += offset;
                    if let Some(snapping) = snapping {
                        snapping.deadline += offset;
                    }
                }
                MovementKind::Target {
                    next_recompute_date,
                    straight,
                    ..
                } => {
                    *next_recompute_date += offset;
                    straight.shift_dates(offset);
                }
                MovementKind::Player { straight, .. } | MovementKind::Straight { straight } => {
                    straight.shift_dates(offset)
                }
                MovementKind::Follow { .. } => {}
            }
        }
    }

    /// Height above the entity's shadow, non-zero only while jumping.
    pub fn jump_height(&self) -> i32 {
        match &self.kind {
            MovementKind::Jump {
                length, covered, ..
            } => {
                if *length == 0 {
                    0
                } else {
                    JUMP_HEIGHTS[(covered * 8 / length).clamp(0, 7) as usize]
                }
            }
            _ => 0,
        }
    }

    /// Try one elementary move; records the refusal box when blocked.
    fn try_move(
        &mut self,
        bounding_box: &mut BoundingBox,
        dx: i32,
        dy: i32,
        test: &mut ObstacleTest,
    ) -> bool {
        let mut candidate = bounding_box.rect;
        candidate.translate(dx, dy);
        if !self.ignore_obstacles && test(&candidate) {
            self.last_collision_box = Some(candidate);
            false
        } else {
            bounding_box.rect = candidate;
            self.xy_change.0 += dx;
            self.xy_change.1 += dy;
            true
        }
    }

    /// Advance the movement up to clock date `now`.
    pub fn update(&mut self, now: u32, bounding_box: &mut BoundingBox, test: &mut ObstacleTest) {
        self.xy_change = (0, 0);
        self.stopped_by_obstacle = false;
        if self.suspended || self.finished {
            return;
        }

        // borrow dance: the kind is advanced against local copies of the
        // shared flags, then written back
        let mut kind = std::mem::replace(
            &mut self.kind,
            MovementKind::Straight {
                straight: StraightState::default(),
            },
        );
        match &mut kind {
            MovementKind::Pixel {
                steps,
                index,
                delay,
                next_step_date,
                loops,
            } => {
                while !self.finished && now >= *next_step_date {
                    let (dx, dy) = steps[*index];
                    if !self.try_move(bounding_box, dx, dy, test) {
                        self.stopped_by_obstacle = true;
                    }
                    *next_step_date += *delay;
                    *index += 1;
                    if *index == steps.len() {
                        if *loops {
                            *index = 0;
                        } else {
                            self.finished = true;
                        }
                    }
                }
            }
            MovementKind::Path {
                path,
                segment,
                covered,
                step_delay,
                diagonal_step_delay,
                next_step_date,
                loops,
                snapping,
            } => {
                if let Some(snap) = snapping {
                    if !snap.done {
                        Self::snap_step(self, bounding_box, test);
                        let aligned = bounding_box.rect.x % 8 == 0 && bounding_box.rect.y % 8 == 0;
                        if aligned || now >= snap.deadline {
                            snap.done = true;
                            if !aligned {
                                // could not reach the grid in time
                                self.finished = true;
                                self.stopped_by_obstacle = true;
                            }
                        }
                        self.kind = kind;
                        return;
                    }
                }
                while !self.finished && !self.stopped_by_obstacle && now >= *next_step_date {
                    let direction = path[*segment] as usize;
                    let (dx, dy) = DIRECTIONS8[direction];
                    if self.try_move(bounding_box, dx, dy, test) {
                        *covered += 1;
                        let diagonal = dx != 0 && dy != 0;
                        *next_step_date += if diagonal {
                            *diagonal_step_delay
                        } else {
                            *step_delay
                        };
                        if *covered == 8 {
                            *covered = 0;
                            *segment += 1;
                            if *segment == path.len() {
                                if *loops {
                                    *segment = 0;
                                } else {
                                    self.finished = true;
                                }
                            }
                        }
                    } else {
                        self.stopped_by_obstacle = true;
                        self.finished = true;
                    }
                }
            }
            MovementKind::Target {
                target,
                speed,
                next_recompute_date,
                straight,
                ..
            } => {
                let origin = bounding_box.origin_point();
                if now >= *next_recompute_date {
                    let dx = (target.x - origin.x) as f32;
                    let dy = (target.y - origin.y) as f32;
                    let distance = (dx * dx + dy * dy).sqrt();
                    if distance >= 1.0 {
                        straight.set_speeds(*speed * dx / distance, *speed * dy / distance, now);
                    } else {
                        straight.set_speeds(0.0, 0.0, now);
                    }
                    *next_recompute_date = now + 150;
                }
                Self::update_straight(self, straight, now, bounding_box, test, false);
                let origin = bounding_box.origin_point();
                if origin.x == target.x && origin.y == target.y {
                    self.finished = true;
                }
            }
            MovementKind::Player {
                direction8,
                speed,
                moving_enabled,
                straight,
                ..
            } => {
                let wanted = if *moving_enabled { *direction8 } else { -1 };
                let (x_speed, y_speed) = if wanted == -1 {
                    (0.0, 0.0)
                } else {
                    let (dx, dy) = DIRECTIONS8[wanted as usize];
                    let scale = if dx != 0 && dy != 0 {
                        std::f32::consts::FRAC_1_SQRT_2
                    } else {
                        1.0
                    };
                    (*speed * dx as f32 * scale, *speed * dy as f32 * scale)
                };
                if (x_speed, y_speed) != (straight.x_speed, straight.y_speed) {
                    straight.set_speeds(x_speed, y_speed, now);
                }
                Self::update_straight(self, straight, now, bounding_box, test, true);
            }
            MovementKind::Straight { straight } => {
                Self::update_straight(self, straight, now, bounding_box, test, false);
                if straight.max_distance > 0 && straight.distance_covered >= straight.max_distance {
                    self.finished = true;
                }
            }
            MovementKind::Jump {
                direction8,
                length,
                covered,
                step_delay,
                next_step_date,
            } => {
                let (dx, dy) = DIRECTIONS8[*direction8 as usize];
                while !self.finished && now >= *next_step_date {
                    if !self.try_move(bounding_box, dx, dy, test) {
                        self.stopped_by_obstacle = true;
                    }
                    *covered += 1;
                    *next_step_date += *step_delay;
                    if *covered >= *length {
                        self.finished = true;
                    }
                }
            }
            MovementKind::RandomWalk {
                step_delay,
                next_step_date,
                direction8,
                remaining,
                ..
            } => {
                while now >= *next_step_date {
                    let (dx, dy) = DIRECTIONS8[*direction8 as usize];
                    let moved = self.try_move(bounding_box, dx, dy, test);
                    *next_step_date += *step_delay;
                    if moved {
                        *remaining -= 1;
                    }
                    if !moved || *remaining == 0 {
                        // pick a fresh direction and segment length
                        *direction8 = fastrand::u8(0..4) * 2;
                        *remaining = 8 * (1 + fastrand::i32(0..3));
                    }
                }
            }
            MovementKind::Follow { dx, dy, anchor, .. } => {
                let target = Point::new(anchor.x + *dx, anchor.y + *dy);
                let current = bounding_box.rect.position();
                let step = (target.x - current.x, target.y - current.y);
                if step != (0, 0) && !self.try_move(bounding_box, step.0, step.1, test) {
                    self.stopped_by_obstacle = true;
                }
            }
        }
        self.kind = kind;
    }

    /// One pixel towards the 8×8 grid on both axes.
    fn snap_step(&mut self, bounding_box: &mut BoundingBox, test: &mut ObstacleTest) {
        let rect = bounding_box.rect;
        let snap_delta = |v: i32| -> i32 {
            let m = v.rem_euclid(8);
            match m {
                0 => 0,
                1..=4 => -1,
                _ => 1,
            }
        };
        let dx = snap_delta(rect.x);
        let dy = snap_delta(rect.y);
        if (dx, dy) != (0, 0) {
            self.try_move(bounding_box, dx, dy, test);
        }
    }

    /// Advance a straight state, with optional orthogonal smoothing: when a
    /// move on one axis is refused, try sliding along the obstacle.
    fn update_straight(
        &mut self,
        straight: &mut StraightState,
        now: u32,
        bounding_box: &mut BoundingBox,
        test: &mut ObstacleTest,
        smooth: bool,
    ) {
        let mut blocked = false;
        while straight.x_speed != 0.0 && now >= straight.next_move_date_x {
            let dx = straight.x_speed.signum() as i32;
            let mut moved = self.try_move(bounding_box, dx, 0, test);
            if !moved && smooth && straight.y_speed == 0.0 {
                // slide along the obstacle: cut the corner diagonally, or
                // creep sideways toward an opening
                moved = self.try_move(bounding_box, dx, 1, test)
                    || self.try_move(bounding_box, dx, -1, test)
                    || self.try_move(bounding_box, 0, 1, test)
                    || self.try_move(bounding_box, 0, -1, test);
            }
            if moved {
                straight.distance_covered += 1;
            } else {
                blocked = true;
            }
            straight.next_move_date_x += StraightState::delay(straight.x_speed);
        }
        while straight.y_speed != 0.0 && now >= straight.next_move_date_y {
            let dy = straight.y_speed.signum() as i32;
            let mut moved = self.try_move(bounding_box, 0, dy, test);
            if !moved && smooth && straight.x_speed == 0.0 {
                moved = self.try_move(bounding_box, 1, dy, test)
                    || self.try_move(bounding_box, -1, dy, test)
                    || self.try_move(bounding_box, 1, 0, test)
                    || self.try_move(bounding_box, -1, 0, test);
            }
            if moved {
                straight.distance_covered += 1;
            } else {
                blocked = true;
            }
            straight.next_move_date_y += StraightState::delay(straight.y_speed);
        }
        // a diagonal may still slide on the free axis, so only report a
        // stop when nothing moved at all this tick
        if blocked && self.xy_change == (0, 0) {
            self.stopped_by_obstacle = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn free(_: &Rectangle) -> bool {
        false
    }

    fn make_box() -> BoundingBox {
        BoundingBox::new(Rectangle::new(100, 100, 16, 16), Point::new(8, 13))
    }

    #[test]
    fn pixel_movement_walks_its_trajectory_then_finishes() {
        let mut bounding_box = make_box();
        let mut movement = Movement::pixel("0 -2  0 -2  1 0", 10, false, 0);
        movement.update(30, &mut bounding_box, &mut free);
        assert!(movement.is_finished());
        assert_eq!(bounding_box.rect.position(), Point::new(101, 96));
        // a finished movement stays inert
        movement.update(100, &mut bounding_box, &mut free);
        assert_eq!(movement.xy_change, (0, 0));
    }

    #[test]
    fn path_movement_covers_8_pixels_per_segment() {
        let mut bounding_box = make_box();
        let mut movement = Movement::path("00", 64.0, false, false, 0);
        // 1000/64 = 15 ms per pixel, 16 pixels total
        movement.update(15 * 16, &mut bounding_box, &mut free);
        assert!(movement.is_finished());
        assert_eq!(bounding_box.rect.x, 116);
        assert_eq!(bounding_box.rect.y, 100);
    }

    #[test]
    fn path_movement_reports_obstacle() {
        let mut bounding_box = make_box();
        let mut movement = Movement::path("0", 100.0, false, false, 0);
        let mut wall = |candidate: &Rectangle| candidate.x > 103;
        movement.update(1000, &mut bounding_box, &mut wall);
        assert!(movement.stopped_by_obstacle);
        assert!(movement.is_finished());
        assert_eq!(bounding_box.rect.x, 103);
        assert_eq!(
            movement.last_collision_box,
            Some(Rectangle::new(104, 100, 16, 16))
        );
    }

    #[test]
    fn suspension_freezes_and_shifts_dates() {
        let mut bounding_box = make_box();
        let mut movement = Movement::pixel("1 0  1 0", 100, false, 0);
        movement.update(100, &mut bounding_box, &mut free);
        assert_eq!(bounding_box.rect.x, 101);

        movement.set_suspended(true, 150);
        movement.update(1000, &mut bounding_box, &mut free);
        assert_eq!(movement.xy_change, (0, 0));
        assert_eq!(bounding_box.rect.x, 101);

        movement.set_suspended(false, 1150);
        // the second step was due at 200; shifted by 1000 it fires at 1200
        movement.update(1199, &mut bounding_box, &mut free);
        assert_eq!(bounding_box.rect.x, 101);
        movement.update(1200, &mut bounding_box, &mut free);
        assert_eq!(bounding_box.rect.x, 102);
        assert!(movement.is_finished());
    }

    #[test]
    fn target_movement_reaches_its_point() {
        let mut bounding_box = make_box();
        let mut movement = Movement::target_point(140, 113, 100.0, 0);
        let mut now = 0;
        while !movement.is_finished() && now < 10_000 {
            now += 16;
            movement.update(now, &mut bounding_box, &mut free);
        }
        assert!(movement.is_finished());
        assert_eq!(bounding_box.origin_point(), Point::new(140, 113));
    }

    #[test]
    fn player_movement_smooths_along_walls() {
        let mut bounding_box = make_box();
        let mut movement = Movement::player(88.0, 0);
        if let MovementKind::Player { direction8, .. } = &mut movement.kind {
            *direction8 = 0; // pushing right
        }
        // a wall with a gap below: x may not exceed 103 unless y >= 110
        let mut wall = |candidate: &Rectangle| candidate.x > 103 && candidate.y < 110;
        let mut now = 0;
        for _ in 0..100 {
            now += 16;
            movement.update(now, &mut bounding_box, &mut wall);
        }
        // the hero slid down along the wall and kept going right
        assert!(bounding_box.rect.y >= 110);
        assert!(bounding_box.rect.x > 103);
    }

    #[test]
    fn jump_height_follows_the_parabola() {
        let mut bounding_box = make_box();
        let mut movement = Movement::jump(0, 40, 200.0, true, 0);
        assert_eq!(movement.jump_height(), 0);
        let mut max_height = 0;
        let mut now = 0;
        while !movement.is_finished() {
            now += 5;
            movement.update(now, &mut bounding_box, &mut free);
            max_height = max_height.max(movement.jump_height());
        }
        assert_eq!(bounding_box.rect.x, 140);
        assert_eq!(max_height, 16);
    }
}
