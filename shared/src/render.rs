//! Frame planning: what to draw and in which order.
//!
//! [`plan_frame`] is pure. It culls, depth-sorts and resolves sprites into a
//! flat list of [`DrawCommand`]s that any [`Surface`] can replay.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::camera::Camera;
use crate::geometry::{MapBounds, Rect, TileCoord, diamond, sprite_rect};
use crate::visible::{ViewportSize, VisibleTile, visible_tiles};

/// Load state of one image as reported by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AssetState {
    #[default]
    Pending,
    Ready {
        width: f64,
        height: f64,
    },
    Failed,
}

impl AssetState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, AssetState::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteId {
    Base,
    Special,
}

/// Readiness of every image the renderer needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpriteAssets {
    pub base: AssetState,
    pub special: AssetState,
}

impl SpriteAssets {
    pub fn set(&mut self, id: SpriteId, state: AssetState) {
        match id {
            SpriteId::Base => self.base = state,
            SpriteId::Special => self.special = state,
        }
    }
}

/// Horizontal strip of equally sized animation frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteSheet {
    pub total_frames: u32,
}

impl SpriteSheet {
    pub fn frame_rect(&self, frame: u32, sheet_width: f64, sheet_height: f64) -> Rect {
        let frames = self.total_frames.max(1);
        let frame_width = sheet_width / frames as f64;
        Rect::new((frame % frames) as f64 * frame_width, 0.0, frame_width, sheet_height)
    }
}

/// Frame index driven by wall-clock time, independent of how often frames are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    pub interval_ms: u32,
    pub total_frames: u32,
}

impl AnimationClock {
    pub fn frame_at(&self, now_ms: i64) -> u32 {
        if self.interval_ms == 0 || self.total_frames <= 1 {
            return 0;
        }
        let ticks = now_ms.max(0) / self.interval_ms as i64;
        (ticks % self.total_frames as i64) as u32
    }
}

/// Sort back-to-front: ascending screen Y, ties by row then column.
pub fn depth_sort(tiles: &mut [VisibleTile]) {
    tiles.sort_by(depth_order);
}

fn depth_order(a: &VisibleTile, b: &VisibleTile) -> Ordering {
    a.screen_y
        .total_cmp(&b.screen_y)
        .then_with(|| a.row.cmp(&b.row))
        .then_with(|| a.col.cmp(&b.col))
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        width: f64,
        height: f64,
    },
    Outline {
        tile: TileCoord,
        points: [(f64, f64); 4],
    },
    Sprite {
        tile: TileCoord,
        sprite: SpriteId,
        source: Option<Rect>,
        dest: Rect,
    },
}

/// Why a frame has nothing to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Drawn,
    /// Base sprite still loading; first paint waits for it.
    AwaitingAssets,
    EmptyViewport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub status: FrameStatus,
    pub commands: Vec<DrawCommand>,
}

pub struct FrameInput<'a> {
    pub camera: &'a Camera,
    pub map: &'a MapBounds,
    pub viewport: ViewportSize,
    pub assets: SpriteAssets,
    pub special_tiles: &'a HashSet<TileCoord>,
    pub sheet: SpriteSheet,
    pub frame: u32,
}

/// Compute the full draw list for one frame.
///
/// A failed base sprite degrades to outlines only. A special sheet that
/// isn't ready falls back to the base sprite.
pub fn plan_frame(input: FrameInput<'_>) -> FramePlan {
    let FrameInput {
        camera,
        map,
        viewport,
        assets,
        special_tiles,
        sheet,
        frame,
    } = input;

    if !assets.base.is_settled() {
        return FramePlan {
            status: FrameStatus::AwaitingAssets,
            commands: Vec::new(),
        };
    }

    let mut tiles = visible_tiles(camera, map, viewport);
    if tiles.is_empty() {
        return FramePlan {
            status: FrameStatus::EmptyViewport,
            commands: vec![DrawCommand::Clear {
                width: viewport.width,
                height: viewport.height,
            }],
        };
    }
    depth_sort(&mut tiles);

    let ts = camera.tile_size(map);
    let mut commands = Vec::with_capacity(tiles.len() * 2 + 1);
    commands.push(DrawCommand::Clear {
        width: viewport.width,
        height: viewport.height,
    });

    for t in &tiles {
        let tile = TileCoord::new(t.row, t.col);
        commands.push(DrawCommand::Outline {
            tile,
            points: diamond(t.screen_x, t.screen_y, ts),
        });

        let dest = sprite_rect(t.screen_x, t.screen_y, ts);
        let special = special_tiles.contains(&tile);
        match (special, assets.special, assets.base) {
            (true, AssetState::Ready { width, height }, _) => {
                commands.push(DrawCommand::Sprite {
                    tile,
                    sprite: SpriteId::Special,
                    source: Some(sheet.frame_rect(frame, width, height)),
                    dest,
                });
            }
            (_, _, AssetState::Ready { .. }) => {
                commands.push(DrawCommand::Sprite {
                    tile,
                    sprite: SpriteId::Base,
                    source: None,
                    dest,
                });
            }
            _ => {}
        }
    }

    FramePlan {
        status: FrameStatus::Drawn,
        commands,
    }
}

/// Drawing backend that replays a [`FramePlan`].
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn stroke_polygon(&mut self, points: &[(f64, f64)]);
    fn draw_sprite(&mut self, sprite: SpriteId, source: Option<Rect>, dest: Rect);
}

pub fn draw_frame<S: Surface + ?Sized>(surface: &mut S, plan: &FramePlan) {
    for command in &plan.commands {
        match command {
            DrawCommand::Clear { width, height } => surface.clear(*width, *height),
            DrawCommand::Outline { points, .. } => surface.stroke_polygon(points),
            DrawCommand::Sprite {
                sprite,
                source,
                dest,
                ..
            } => surface.draw_sprite(*sprite, *source, *dest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<String>,
        sprite_ys: Vec<f64>,
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self, width: f64, height: f64) {
            self.calls.push(format!("clear {width}x{height}"));
        }

        fn stroke_polygon(&mut self, points: &[(f64, f64)]) {
            self.calls.push(format!("outline {:?}", points[0]));
        }

        fn draw_sprite(&mut self, sprite: SpriteId, _source: Option<Rect>, dest: Rect) {
            self.calls.push(format!("{sprite:?}"));
            self.sprite_ys.push(dest.y);
        }
    }

    fn ready() -> AssetState {
        AssetState::Ready {
            width: 100.0,
            height: 100.0,
        }
    }

    fn input<'a>(
        camera: &'a Camera,
        map: &'a MapBounds,
        special: &'a HashSet<TileCoord>,
        assets: SpriteAssets,
    ) -> FrameInput<'a> {
        FrameInput {
            camera,
            map,
            viewport: ViewportSize::new(300.0, 200.0),
            assets,
            special_tiles: special,
            sheet: SpriteSheet { total_frames: 4 },
            frame: 2,
        }
    }

    fn tile(row: u32, col: u32, y: f64) -> VisibleTile {
        VisibleTile {
            row,
            col,
            screen_x: 0.0,
            screen_y: y,
        }
    }

    #[test]
    fn depth_sort_orders_by_y_then_row_then_col() {
        let mut tiles = vec![tile(3, 1, 40.0), tile(0, 5, 10.0), tile(1, 2, 40.0), tile(1, 0, 40.0)];
        depth_sort(&mut tiles);
        let order: Vec<_> = tiles.iter().map(|t| (t.row, t.col)).collect();
        assert_eq!(order, vec![(0, 5), (1, 0), (1, 2), (3, 1)]);
    }

    #[test]
    fn sprites_are_drawn_in_non_decreasing_y() {
        let cam = Camera::default();
        let map = MapBounds::square(50, 50.0);
        let special = HashSet::new();
        let assets = SpriteAssets {
            base: ready(),
            special: ready(),
        };
        let plan = plan_frame(input(&cam, &map, &special, assets));
        assert_eq!(plan.status, FrameStatus::Drawn);

        let mut surface = RecordingSurface::default();
        draw_frame(&mut surface, &plan);
        assert!(surface.calls[0].starts_with("clear"));
        assert!(!surface.sprite_ys.is_empty());
        assert!(surface.sprite_ys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn overlapping_tile_lower_on_screen_is_drawn_later() {
        let cam = Camera::default();
        let map = MapBounds::square(50, 50.0);
        let special = HashSet::new();
        let assets = SpriteAssets {
            base: ready(),
            special: AssetState::Failed,
        };
        let plan = plan_frame(input(&cam, &map, &special, assets));
        let position = |target: TileCoord| {
            plan.commands.iter().position(|c| {
                matches!(c, DrawCommand::Sprite { tile, .. } if *tile == target)
            })
        };
        // (1, 1) sits half a tile below (1, 0) and their sprites overlap.
        let upper = position(TileCoord::new(1, 0)).unwrap();
        let lower = position(TileCoord::new(1, 1)).unwrap();
        assert!(upper < lower);
    }

    #[test]
    fn outline_precedes_sprite_for_each_tile() {
        let cam = Camera::default();
        let map = MapBounds::square(2, 50.0);
        let special = HashSet::new();
        let assets = SpriteAssets {
            base: ready(),
            special: ready(),
        };
        let plan = plan_frame(input(&cam, &map, &special, assets));
        for pair in plan.commands[1..].chunks(2) {
            match pair {
                [DrawCommand::Outline { tile: a, .. }, DrawCommand::Sprite { tile: b, .. }] => {
                    assert_eq!(a, b)
                }
                other => panic!("unexpected command pair {other:?}"),
            }
        }
    }

    #[test]
    fn special_tile_uses_current_sheet_frame() {
        let cam = Camera::default();
        let map = MapBounds::square(10, 50.0);
        let special: HashSet<_> = [TileCoord::new(1, 2)].into_iter().collect();
        let assets = SpriteAssets {
            base: ready(),
            special: AssetState::Ready {
                width: 400.0,
                height: 120.0,
            },
        };
        let plan = plan_frame(input(&cam, &map, &special, assets));
        let sprite = plan
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Sprite {
                    tile,
                    sprite,
                    source,
                    ..
                } if *tile == TileCoord::new(1, 2) => Some((*sprite, *source)),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            sprite,
            (SpriteId::Special, Some(Rect::new(200.0, 0.0, 100.0, 120.0)))
        );
    }

    #[test]
    fn special_tile_falls_back_to_base_until_sheet_loads() {
        let cam = Camera::default();
        let map = MapBounds::square(10, 50.0);
        let special: HashSet<_> = [TileCoord::new(1, 2)].into_iter().collect();
        let assets = SpriteAssets {
            base: ready(),
            special: AssetState::Pending,
        };
        let plan = plan_frame(input(&cam, &map, &special, assets));
        assert!(plan.commands.iter().any(|c| matches!(
            c,
            DrawCommand::Sprite { tile, sprite: SpriteId::Base, .. } if *tile == TileCoord::new(1, 2)
        )));
    }

    #[test]
    fn pending_base_sprite_gates_first_paint() {
        let cam = Camera::default();
        let map = MapBounds::square(10, 50.0);
        let special = HashSet::new();
        let plan = plan_frame(input(&cam, &map, &special, SpriteAssets::default()));
        assert_eq!(plan.status, FrameStatus::AwaitingAssets);
        assert!(plan.commands.is_empty());
    }

    #[test]
    fn failed_base_sprite_degrades_to_outlines() {
        let cam = Camera::default();
        let map = MapBounds::square(10, 50.0);
        let special = HashSet::new();
        let assets = SpriteAssets {
            base: AssetState::Failed,
            special: AssetState::Failed,
        };
        let plan = plan_frame(input(&cam, &map, &special, assets));
        assert_eq!(plan.status, FrameStatus::Drawn);
        assert!(plan.commands.iter().any(|c| matches!(c, DrawCommand::Outline { .. })));
        assert!(!plan.commands.iter().any(|c| matches!(c, DrawCommand::Sprite { .. })));
    }

    #[test]
    fn sheet_frame_geometry() {
        let sheet = SpriteSheet { total_frames: 4 };
        assert_eq!(sheet.frame_rect(0, 256.0, 64.0), Rect::new(0.0, 0.0, 64.0, 64.0));
        assert_eq!(sheet.frame_rect(3, 256.0, 64.0), Rect::new(192.0, 0.0, 64.0, 64.0));
        assert_eq!(sheet.frame_rect(5, 256.0, 64.0), Rect::new(64.0, 0.0, 64.0, 64.0));
    }

    #[test]
    fn animation_advances_on_wall_clock() {
        let clock = AnimationClock {
            interval_ms: 500,
            total_frames: 3,
        };
        assert_eq!(clock.frame_at(0), 0);
        assert_eq!(clock.frame_at(499), 0);
        assert_eq!(clock.frame_at(500), 1);
        assert_eq!(clock.frame_at(1_250), 2);
        assert_eq!(clock.frame_at(1_500), 0);

        let still = AnimationClock {
            interval_ms: 500,
            total_frames: 1,
        };
        assert_eq!(still.frame_at(123_456), 0);
    }
}
