use crate::config::{ConfigError, GameConfig};
use crate::fruit::FruitSpawner;
use serde::{Deserialize, Serialize};
use snake_common::{Direction, GridPosition};
use std::collections::HashSet;

/// One body unit of the snake.
///
/// `direction` is the way the segment travels during the current tick
/// interval; `None` means it has not started moving (coiled on the start cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub position: GridPosition,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimState {
    Running,
    Paused,
    /// Terminal. No further ticks are processed.
    Dead,
}

/// What the head ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    Wall,
    Body,
}

/// Result of a single [`SnakeSimulation::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running (paused or dead); nothing happened.
    Halted,
    /// Running, but no direction has been given yet.
    Waiting,
    Moved,
    /// Moved onto the fruit and grew by one segment.
    Ate,
    Died(CollisionKind),
}

/// Record of every observable change, drained by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Steered { direction: Direction },
    Moved { tick: u64, head: GridPosition },
    Grew { length: usize },
    FruitSpawned { at: GridPosition },
    /// No free cell is left for the fruit.
    BoardFull,
    Paused,
    Resumed,
    Died { cause: CollisionKind, at: GridPosition },
}

/// Authoritative snake game state.
///
/// All mutations go through [`set_direction`](Self::set_direction),
/// [`tick`](Self::tick) and [`toggle_pause`](Self::toggle_pause). Rendering
/// reads the segments and fruit but never writes them.
#[derive(Debug)]
pub struct SnakeSimulation {
    config: GameConfig,
    segments: Vec<Segment>,
    pending: Option<Direction>,
    fruit: Option<GridPosition>,
    spawner: FruitSpawner,
    state: SimState,
    ticks: u64,
    fruit_eaten: u32,
    events: Vec<SimEvent>,
}

impl SnakeSimulation {
    /// Start a game: the snake lies coiled on `config.start` and the first
    /// fruit is placed from `seed`.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let coiled = Segment {
            position: config.start,
            direction: None,
        };
        let mut sim = Self {
            segments: vec![coiled; config.initial_length],
            pending: None,
            fruit: None,
            spawner: FruitSpawner::new(config.board_size(), seed),
            state: SimState::Running,
            ticks: 0,
            fruit_eaten: 0,
            events: Vec::new(),
            config,
        };
        sim.respawn_fruit();
        tracing::debug!(
            start = %sim.config.start,
            length = sim.segments.len(),
            seed,
            "simulation created"
        );
        Ok(sim)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Segments in order; index 0 is the head.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn head(&self) -> Segment {
        self.segments[0]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a snake has at least its head.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn fruit(&self) -> Option<GridPosition> {
        self.fruit
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// Direction queued for the next tick, if any.
    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending
    }

    /// Number of ticks in which the snake actually moved.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fruit eaten so far.
    pub fn score(&self) -> u32 {
        self.fruit_eaten
    }

    /// Distinct cells currently covered by the snake.
    pub fn occupied(&self) -> HashSet<GridPosition> {
        self.segments.iter().map(|s| s.position).collect()
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queue `direction` for the next tick.
    ///
    /// A reversal of the head's current direction is refused while the snake
    /// is longer than one segment. Returns whether the request was accepted.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.state == SimState::Dead {
            return false;
        }
        let current = self.segments[0].direction;
        if self.segments.len() > 1 && current.is_some_and(|c| c.is_opposite(direction)) {
            tracing::debug!(?direction, "reversal refused");
            return false;
        }
        if self.pending != Some(direction) {
            self.pending = Some(direction);
            self.events.push(SimEvent::Steered { direction });
        }
        true
    }

    /// Running <-> Paused. Has no effect once dead.
    pub fn toggle_pause(&mut self) -> SimState {
        self.state = match self.state {
            SimState::Running => {
                self.events.push(SimEvent::Paused);
                SimState::Paused
            }
            SimState::Paused => {
                self.events.push(SimEvent::Resumed);
                SimState::Running
            }
            SimState::Dead => SimState::Dead,
        };
        self.state
    }

    /// Whether `pos` may be entered.
    ///
    /// Cells off the board are never valid. For a head move every body
    /// segment is compared against the cell it will hold once this tick's
    /// follow step is done, so a cell being vacated (the tail's, or any
    /// segment's pre-move cell) does not count as a collision. Otherwise
    /// `pos` is compared against the current cells of all body segments.
    pub fn is_valid_cell(&self, pos: GridPosition, is_head_move: bool) -> bool {
        if !self.config.in_bounds(pos) {
            return false;
        }
        let body = &self.segments[1..];
        if is_head_move {
            !body.iter().any(|s| Self::cell_after_step(s) == pos)
        } else {
            !body.iter().any(|s| s.position == pos)
        }
    }

    fn cell_after_step(segment: &Segment) -> GridPosition {
        match segment.direction {
            Some(d) => segment.position.step(d),
            None => segment.position,
        }
    }

    /// Advance the game by one discrete step.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SimState::Running {
            return TickOutcome::Halted;
        }
        if let Some(d) = self.pending.take() {
            self.segments[0].direction = Some(d);
        }
        let Some(heading) = self.segments[0].direction else {
            return TickOutcome::Waiting;
        };

        let target = self.segments[0].position.step(heading);
        if !self.is_valid_cell(target, true) {
            let cause = if self.config.in_bounds(target) {
                CollisionKind::Body
            } else {
                CollisionKind::Wall
            };
            self.state = SimState::Dead;
            self.events.push(SimEvent::Died { cause, at: target });
            tracing::info!(?cause, at = %target, length = self.len(), "snake died");
            return TickOutcome::Died(cause);
        }

        let old_tail = self.segments[self.segments.len() - 1];

        for segment in &mut self.segments {
            segment.position = Self::cell_after_step(segment);
        }
        // Each follower inherits the heading its predecessor just used.
        for i in (1..self.segments.len()).rev() {
            self.segments[i].direction = self.segments[i - 1].direction;
        }

        self.ticks += 1;
        self.events.push(SimEvent::Moved {
            tick: self.ticks,
            head: target,
        });

        if self.fruit == Some(target) {
            self.segments.push(old_tail);
            self.fruit_eaten += 1;
            self.events.push(SimEvent::Grew {
                length: self.segments.len(),
            });
            tracing::debug!(length = self.segments.len(), "fruit eaten");
            self.respawn_fruit();
            return TickOutcome::Ate;
        }
        TickOutcome::Moved
    }

    fn respawn_fruit(&mut self) {
        let occupied = self.occupied();
        self.fruit = self.spawner.respawn(&occupied);
        match self.fruit {
            Some(at) => self.events.push(SimEvent::FruitSpawned { at }),
            None => {
                tracing::info!("board is full, no fruit left to spawn");
                self.events.push(SimEvent::BoardFull);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> SnakeSimulation {
        SnakeSimulation::new(GameConfig::default(), 42).unwrap()
    }

    /// Move the fruit out of the way so scripted paths never eat it.
    fn park_fruit(sim: &mut SnakeSimulation, at: GridPosition) {
        sim.fruit = Some(at);
    }

    fn positions(sim: &SnakeSimulation) -> Vec<GridPosition> {
        sim.segments().iter().map(|s| s.position).collect()
    }

    #[test]
    fn starts_coiled_and_running() {
        let s = sim();
        assert_eq!(s.len(), 4);
        assert_eq!(s.state(), SimState::Running);
        assert!(s.segments().iter().all(|seg| seg.position == GridPosition::new(5, 5)));
        assert!(s.head().direction.is_none());
        let fruit = s.fruit().unwrap();
        assert_ne!(fruit, GridPosition::new(5, 5));
    }

    #[test]
    fn waits_for_first_input() {
        let mut s = sim();
        assert_eq!(s.tick(), TickOutcome::Waiting);
        assert_eq!(s.ticks(), 0);
        assert_eq!(s.head().position, GridPosition::new(5, 5));
    }

    #[test]
    fn four_ticks_east_unfurls_body() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(1, 1));
        assert!(s.set_direction(Direction::East));
        for _ in 0..4 {
            assert_eq!(s.tick(), TickOutcome::Moved);
        }
        assert_eq!(
            positions(&s),
            vec![
                GridPosition::new(9, 5),
                GridPosition::new(8, 5),
                GridPosition::new(7, 5),
                GridPosition::new(6, 5),
            ]
        );
        assert!(s.segments().iter().all(|seg| seg.direction == Some(Direction::East)));
    }

    #[test]
    fn eating_fruit_grows_by_one_and_respawns_elsewhere() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(6, 5));
        s.set_direction(Direction::East);
        assert_eq!(s.tick(), TickOutcome::Ate);
        assert_eq!(s.len(), 5);
        assert_eq!(s.score(), 1);
        let fruit = s.fruit().unwrap();
        assert!(!s.occupied().contains(&fruit));
        assert!(s.segments().iter().all(|seg| seg.position != fruit));
    }

    #[test]
    fn growth_appends_at_previous_tail_cell() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(1, 1));
        s.set_direction(Direction::East);
        for _ in 0..4 {
            s.tick();
        }
        // tail is at (6,5) heading east
        park_fruit(&mut s, GridPosition::new(10, 5));
        assert_eq!(s.tick(), TickOutcome::Ate);
        let tail = *s.segments().last().unwrap();
        assert_eq!(tail.position, GridPosition::new(6, 5));
        assert_eq!(tail.direction, Some(Direction::East));
        assert_eq!(
            positions(&s),
            vec![
                GridPosition::new(10, 5),
                GridPosition::new(9, 5),
                GridPosition::new(8, 5),
                GridPosition::new(7, 5),
                GridPosition::new(6, 5),
            ]
        );
    }

    #[test]
    fn east_wall_kills_and_freezes() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(1, 1));
        s.set_direction(Direction::East);
        for _ in 0..5 {
            assert_eq!(s.tick(), TickOutcome::Moved);
        }
        assert_eq!(s.head().position, GridPosition::new(10, 5));
        let before = positions(&s);

        assert_eq!(s.tick(), TickOutcome::Died(CollisionKind::Wall));
        assert_eq!(s.state(), SimState::Dead);
        assert_eq!(positions(&s), before);

        assert_eq!(s.tick(), TickOutcome::Halted);
        assert_eq!(positions(&s), before);
        assert!(matches!(
            s.events().last(),
            Some(SimEvent::Died {
                cause: CollisionKind::Wall,
                ..
            })
        ));
    }

    #[test]
    fn reversal_is_refused_when_longer_than_one() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(1, 1));
        s.set_direction(Direction::East);
        s.tick();
        assert!(!s.set_direction(Direction::West));
        assert_eq!(s.pending_direction(), None);
        s.tick();
        assert_eq!(s.head().direction, Some(Direction::East));
        assert_eq!(s.head().position, GridPosition::new(7, 5));
    }

    #[test]
    fn double_turn_within_one_tick_cannot_reverse() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(1, 1));
        s.set_direction(Direction::East);
        s.tick();
        assert!(s.set_direction(Direction::North));
        // still heading east until the next tick, so west is a reversal
        assert!(!s.set_direction(Direction::West));
        assert_eq!(s.pending_direction(), Some(Direction::North));
    }

    #[test]
    fn length_one_may_reverse() {
        let config = GameConfig {
            initial_length: 1,
            ..GameConfig::default()
        };
        let mut s = SnakeSimulation::new(config, 1).unwrap();
        park_fruit(&mut s, GridPosition::new(1, 1));
        s.set_direction(Direction::East);
        s.tick();
        assert!(s.set_direction(Direction::West));
        assert_eq!(s.tick(), TickOutcome::Moved);
        assert_eq!(s.head().position, GridPosition::new(5, 5));
    }

    #[test]
    fn first_input_may_go_any_way() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(10, 10));
        assert!(s.set_direction(Direction::West));
        assert_eq!(s.tick(), TickOutcome::Moved);
        assert_eq!(s.head().position, GridPosition::new(4, 5));
    }

    #[test]
    fn running_into_own_body_kills() {
        let config = GameConfig {
            initial_length: 5,
            ..GameConfig::default()
        };
        let mut s = SnakeSimulation::new(config, 3).unwrap();
        park_fruit(&mut s, GridPosition::new(1, 10));
        s.set_direction(Direction::East);
        for _ in 0..4 {
            s.tick();
        }
        // body: (9,5) (8,5) (7,5) (6,5) (5,5)
        s.set_direction(Direction::North);
        s.tick(); // (9,6)
        s.set_direction(Direction::West);
        s.tick(); // (8,6)
        s.set_direction(Direction::South);
        assert_eq!(s.tick(), TickOutcome::Died(CollisionKind::Body));
        assert_eq!(s.state(), SimState::Dead);
    }

    #[test]
    fn head_may_enter_the_cell_the_tail_vacates() {
        let mut s = sim();
        park_fruit(&mut s, GridPosition::new(1, 10));
        s.set_direction(Direction::East);
        for _ in 0..4 {
            s.tick();
        }
        // body: (9,5) (8,5) (7,5) (6,5); curl round and chase the tail
        s.set_direction(Direction::North);
        s.tick(); // (9,6) (9,5) (8,5) (7,5)
        s.set_direction(Direction::West);
        s.tick(); // (8,6) (9,6) (9,5) (8,5)
        s.set_direction(Direction::South);
        // tail at (8,5) moves out to (9,5) this tick
        assert!(s.is_valid_cell(GridPosition::new(8, 5), true));
        assert!(!s.is_valid_cell(GridPosition::new(8, 5), false));
        assert_eq!(s.tick(), TickOutcome::Moved);
        assert_eq!(s.head().position, GridPosition::new(8, 5));
    }

    #[test]
    fn out_of_bounds_is_never_valid() {
        let s = sim();
        assert!(!s.is_valid_cell(GridPosition::new(0, 5), true));
        assert!(!s.is_valid_cell(GridPosition::new(11, 5), false));
        assert!(s.is_valid_cell(GridPosition::new(1, 1), false));
    }

    #[test]
    fn pause_toggle_is_idempotent_in_pairs() {
        let mut s = sim();
        assert_eq!(s.toggle_pause(), SimState::Paused);
        assert_eq!(s.tick(), TickOutcome::Halted);
        assert_eq!(s.toggle_pause(), SimState::Running);
    }

    #[test]
    fn dead_ignores_pause_and_steering() {
        let mut s = sim();
        s.state = SimState::Dead;
        assert_eq!(s.toggle_pause(), SimState::Dead);
        assert!(!s.set_direction(Direction::North));
    }

    /// Closed tour over every cell of the default 10x10 board: east along
    /// row 1, serpentine through columns 2..=10, then down column 1.
    fn tour_direction(p: GridPosition) -> Direction {
        if p.x == 1 && p.y > 1 {
            Direction::South
        } else if p.y % 2 == 1 {
            if p.x < 10 { Direction::East } else { Direction::North }
        } else if p.x > 2 || p.y == 10 {
            Direction::West
        } else {
            Direction::North
        }
    }

    /// Put the fruit two cells ahead of the head along the tour.
    fn fruit_ahead(sim: &mut SnakeSimulation) {
        let next = sim.head().position.step(tour_direction(sim.head().position));
        park_fruit(sim, next.step(tour_direction(next)));
    }

    #[test]
    fn tour_visits_every_cell_once() {
        let mut p = GridPosition::new(1, 1);
        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(GameConfig::default().in_bounds(p));
            assert!(seen.insert(p), "revisited {p}");
            p = p.step(tour_direction(p));
        }
        assert_eq!(p, GridPosition::new(1, 1));
    }

    #[test]
    fn length_never_shrinks_and_grows_one_per_fruit() {
        let mut s = sim();
        let mut len = s.len();
        let mut eaten = 0;
        for i in 0..300 {
            if i % 10 == 0 {
                fruit_ahead(&mut s);
            }
            s.set_direction(tour_direction(s.head().position));
            match s.tick() {
                TickOutcome::Ate => eaten += 1,
                other => assert_eq!(other, TickOutcome::Moved, "tick {i}"),
            }
            assert!(s.len() >= len);
            len = s.len();
            assert_eq!(s.len(), 4 + eaten);
        }
        assert!(eaten >= 30, "only ate {eaten}");
        assert_eq!(s.score() as usize, eaten);
    }

    #[test]
    fn unfurled_snake_never_overlaps_itself() {
        let mut s = sim();
        let mut checked = 0;
        for i in 0..400 {
            if i % 5 == 0 && s.len() < 60 {
                fruit_ahead(&mut s);
            }
            s.set_direction(tour_direction(s.head().position));
            assert!(!matches!(s.tick(), TickOutcome::Died(_)), "died on tick {i}");
            if s.segments().iter().all(|seg| seg.direction.is_some()) {
                assert_eq!(s.occupied().len(), s.len(), "overlap after tick {i}");
                checked += 1;
            }
        }
        assert!(s.len() >= 40, "length {}", s.len());
        assert!(checked > 300);
    }

    #[test]
    fn fruit_respawn_avoids_every_segment() {
        let mut s = sim();
        s.set_direction(Direction::East);
        for i in 0..4 {
            park_fruit(&mut s, GridPosition::new(6 + i, 5));
            assert_eq!(s.tick(), TickOutcome::Ate);
            let fruit = s.fruit().unwrap();
            assert!(s.segments().iter().all(|seg| seg.position != fruit));
        }
        assert_eq!(s.len(), 8);
    }

    #[test]
    fn events_are_recorded_and_drained() {
        let mut s = sim();
        assert!(matches!(s.events()[0], SimEvent::FruitSpawned { .. }));
        park_fruit(&mut s, GridPosition::new(1, 1));
        s.set_direction(Direction::North);
        s.tick();
        let events = s.drain_events();
        assert!(events.contains(&SimEvent::Steered {
            direction: Direction::North
        }));
        assert!(events.contains(&SimEvent::Moved {
            tick: 1,
            head: GridPosition::new(5, 6)
        }));
        assert!(s.events().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig {
            grid_size: 0,
            ..GameConfig::default()
        };
        assert!(SnakeSimulation::new(config, 0).is_err());
    }
}
