use glam::Vec2;
use snake_common::{Direction, GridPosition, Transform};
use snake_kernel::{Segment, SimState, SnakeSimulation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Fruit,
    Segment,
    Head,
}

impl SpriteKind {
    /// Half the sprite's side length in cells' world units.
    pub fn half_extent(self) -> f32 {
        match self {
            SpriteKind::Fruit => 0.4,
            SpriteKind::Segment => 0.45,
            SpriteKind::Head => 0.5,
        }
    }
}

/// One drawable component: which cell it logically occupies, and where it
/// is drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub cell: GridPosition,
    pub direction: Option<Direction>,
    pub transform: Transform,
    pub tint: [f32; 4],
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub board_size: i32,
    pub tick: u64,
    pub score: u32,
    pub state: SimState,
    pub fruit: Option<Sprite>,
    /// Body segments from neck to tail.
    pub body: Vec<Sprite>,
    pub head: Sprite,
}

const BODY_TINT: [f32; 4] = [0.35, 0.85, 0.45, 1.0];
const TAIL_TINT: [f32; 4] = [0.15, 0.5, 0.25, 1.0];
const DEAD_TINT: [f32; 4] = [0.55, 0.55, 0.55, 1.0];

impl Scene {
    /// Snapshot the simulation, placing each segment `alpha` of the way
    /// along its current direction.
    pub fn capture(sim: &SnakeSimulation, alpha: f32) -> Self {
        let alpha = if sim.state() == SimState::Dead {
            0.0
        } else {
            alpha.clamp(0.0, 1.0)
        };

        let segments = sim.segments();
        let head = segment_sprite(SpriteKind::Head, &segments[0], alpha, [1.0; 4]);
        let body_len = segments.len().saturating_sub(1);
        let body = segments[1..]
            .iter()
            .enumerate()
            .map(|(i, seg)| {
                let tint = if sim.state() == SimState::Dead {
                    DEAD_TINT
                } else {
                    body_tint(i, body_len)
                };
                segment_sprite(SpriteKind::Segment, seg, alpha, tint)
            })
            .collect();

        let fruit = sim.fruit().map(|cell| Sprite {
            kind: SpriteKind::Fruit,
            cell,
            direction: None,
            transform: Transform::sprite(cell.center(), 0.0, SpriteKind::Fruit.half_extent()),
            tint: [1.0; 4],
        });

        Self {
            board_size: sim.config().board_size(),
            tick: sim.ticks(),
            score: sim.score(),
            state: sim.state(),
            fruit,
            body,
            head,
        }
    }

    /// Fruit, body and head in draw order.
    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> + '_ {
        self.fruit
            .iter()
            .chain(self.body.iter())
            .chain(std::iter::once(&self.head))
    }

    pub fn sprite_count(&self) -> usize {
        usize::from(self.fruit.is_some()) + self.body.len() + 1
    }
}

fn segment_sprite(kind: SpriteKind, seg: &Segment, alpha: f32, tint: [f32; 4]) -> Sprite {
    let offset = seg
        .direction
        .map(|d| d.vector().as_vec2() * alpha)
        .unwrap_or(Vec2::ZERO);
    let angle = seg.direction.map(Direction::rotation).unwrap_or(0.0);
    Sprite {
        kind,
        cell: seg.position,
        direction: seg.direction,
        transform: Transform::sprite(seg.position.center() + offset, angle, kind.half_extent()),
        tint,
    }
}

/// Fade from the body colour at the neck to a darker shade at the tail.
fn body_tint(index: usize, len: usize) -> [f32; 4] {
    let t = if len <= 1 {
        0.0
    } else {
        index as f32 / (len - 1) as f32
    };
    let mut out = [0.0; 4];
    for (o, (a, b)) in out.iter_mut().zip(BODY_TINT.iter().zip(TAIL_TINT.iter())) {
        *o = a + (b - a) * t;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_kernel::GameConfig;

    fn moving_sim() -> SnakeSimulation {
        let mut sim = SnakeSimulation::new(GameConfig::default(), 42).unwrap();
        sim.set_direction(Direction::East);
        sim.tick();
        sim
    }

    #[test]
    fn capture_counts_every_component() {
        let sim = moving_sim();
        let scene = Scene::capture(&sim, 0.0);
        assert_eq!(scene.body.len(), 3);
        assert_eq!(scene.sprite_count(), sim.len() + 1);
        assert_eq!(scene.sprites().count(), scene.sprite_count());
        assert_eq!(scene.board_size, 10);
    }

    #[test]
    fn draw_order_is_fruit_body_head() {
        let scene = Scene::capture(&moving_sim(), 0.0);
        let kinds: Vec<SpriteKind> = scene.sprites().map(|s| s.kind).collect();
        assert_eq!(kinds.first(), Some(&SpriteKind::Fruit));
        assert_eq!(kinds.last(), Some(&SpriteKind::Head));
        assert!(kinds[1..kinds.len() - 1]
            .iter()
            .all(|k| *k == SpriteKind::Segment));
    }

    #[test]
    fn head_interpolates_along_direction() {
        let sim = moving_sim();
        let scene = Scene::capture(&sim, 0.5);
        // head cell (6,5) has center (5.5, 4.5); half a cell east
        assert!((scene.head.transform.position.x - 6.0).abs() < 1e-5);
        assert!((scene.head.transform.position.y - 4.5).abs() < 1e-5);
        assert_eq!(scene.head.cell, GridPosition::new(6, 5));
    }

    #[test]
    fn coiled_segments_stay_put() {
        let sim = moving_sim();
        let scene = Scene::capture(&sim, 0.75);
        // segment 1 trails east, segments 2 and 3 are still coiled
        assert!((scene.body[0].transform.position.x - 5.25).abs() < 1e-5);
        assert!((scene.body[2].transform.position.x - 4.5).abs() < 1e-5);
    }

    #[test]
    fn body_tint_fades_towards_tail() {
        assert_eq!(body_tint(0, 4), BODY_TINT);
        assert_eq!(body_tint(3, 4), TAIL_TINT);
        assert_eq!(body_tint(0, 1), BODY_TINT);
    }
}
