//! Per-frame display list.
//!
//! A [`Frame`] is built from the latest world and then handed to the renderer.
//! Keeping composition separate from macroquad lets the exact paint order be
//! checked without a window.

use crate::connection::ConnectionState;
use crate::dragon::{self, DragonPart};
use crate::game::{Viewport, World};
use crate::palette::{ColorAllocator, PALETTE_SIZE};
use macroquad::color::Color;
use macroquad::math::{vec2, Vec2};
use shared::Orb;

pub const GRID_SIZE: f32 = 40.0;
pub const ORB_RADIUS: f32 = 15.0;
pub const WATERMARK: &str = "ARENA DASH";

const BACKGROUND: Color = Color::new(0.02, 0.027, 0.07, 1.0);
const PANEL: Color = Color::new(0.0, 0.0, 0.0, 0.45);
const PANEL_BORDER: Color = Color::new(1.0, 1.0, 1.0, 0.1);
const TEXT: Color = Color::new(0.9, 0.91, 0.93, 1.0);
const MUTED: Color = Color::new(0.6, 0.62, 0.66, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub thickness: f32,
}

impl Stroke {
    pub fn new(color: Color, thickness: f32) -> Self {
        Self { color, thickness }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Backend-independent drawing primitive. Angles are in radians.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Clear(Color),
    Line {
        from: Vec2,
        to: Vec2,
        thickness: f32,
        color: Color,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    /// Filled disc whose color runs through `stops` (offset 0..=1) from the
    /// center outwards.
    RadialGlow {
        center: Vec2,
        radius: f32,
        stops: Vec<(f32, Color)>,
    },
    Ellipse {
        center: Vec2,
        radii: Vec2,
        rotation: f32,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// Star-shaped polygon, filled as a fan around its centroid.
    Polygon {
        points: Vec<Vec2>,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Polyline {
        points: Vec<Vec2>,
        closed: bool,
        stroke: Stroke,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Text {
        text: String,
        position: Vec2,
        size: f32,
        color: Color,
        align: TextAlign,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Clear,
    Grid,
    OrbGlow,
    OrbBody,
    OrbHighlight,
    Dragon { id: String, part: DragonPart },
    Watermark,
    Hud,
    Scoreboard,
    ErrorBanner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub shapes: Vec<Shape>,
}

impl Layer {
    pub fn new(kind: LayerKind, shapes: Vec<Shape>) -> Self {
        Self { kind, shapes }
    }
}

/// One complete frame, layers in paint order (back to front).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub viewport: Viewport,
    pub layers: Vec<Layer>,
}

impl Frame {
    /// Ids of the dragons painted in this frame, in paint order.
    pub fn dragon_ids(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter_map(|layer| match &layer.kind {
                LayerKind::Dragon {
                    id,
                    part: DragonPart::Body,
                } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Parts painted for one dragon, in paint order.
    pub fn dragon_parts(&self, dragon_id: &str) -> Vec<DragonPart> {
        self.layers
            .iter()
            .filter_map(|layer| match &layer.kind {
                LayerKind::Dragon { id, part } if id == dragon_id => Some(*part),
                _ => None,
            })
            .collect()
    }

    pub fn layer(&self, kind: &LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|layer| &layer.kind == kind)
    }

    pub fn shape_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.shapes.len()).sum()
    }
}

/// UI state drawn on top of the arena.
#[derive(Debug, Clone)]
pub struct Overlay<'a> {
    pub room_id: &'a str,
    pub connection: ConnectionState,
    pub error: Option<&'a str>,
}

/// Builds the frame for `world`: clear, grid, orb, every dragon, watermark,
/// then the HUD overlays.
///
/// Colors for players who left are released before any color is resolved.
pub fn compose_frame(
    world: &World,
    colors: &mut ColorAllocator,
    viewport: Viewport,
    overlay: &Overlay<'_>,
) -> Frame {
    let mut layers = vec![
        Layer::new(LayerKind::Clear, vec![Shape::Clear(BACKGROUND)]),
        grid_layer(viewport),
    ];
    layers.extend(orb_layers(&world.orb));

    colors.retain_present(world.players.iter().map(|p| p.id.as_str()));
    for player in &world.players {
        let palette = colors.palette_for(&player.id);
        layers.extend(dragon::dragon_layers(&player.id, vec2(player.x, player.y), &palette));
    }

    layers.push(watermark_layer(viewport));
    layers.push(hud_layer(world, overlay));
    layers.push(scoreboard_layer(world, colors, viewport));
    if let Some(message) = overlay.error {
        layers.push(error_banner_layer(message, viewport));
    }

    Frame { viewport, layers }
}

fn grid_layer(viewport: Viewport) -> Layer {
    let (w, h) = (viewport.width as f32, viewport.height as f32);
    let color = Color::new(1.0, 1.0, 1.0, 0.05);
    let mut shapes = Vec::new();

    let mut x = 0.0;
    while x < w {
        shapes.push(Shape::Line {
            from: vec2(x, 0.0),
            to: vec2(x, h),
            thickness: 1.0,
            color,
        });
        x += GRID_SIZE;
    }

    let mut y = 0.0;
    while y < h {
        shapes.push(Shape::Line {
            from: vec2(0.0, y),
            to: vec2(w, y),
            thickness: 1.0,
            color,
        });
        y += GRID_SIZE;
    }

    Layer::new(LayerKind::Grid, shapes)
}

fn orb_layers(orb: &Orb) -> [Layer; 3] {
    let center = vec2(orb.x, orb.y);

    [
        Layer::new(
            LayerKind::OrbGlow,
            vec![Shape::RadialGlow {
                center,
                radius: ORB_RADIUS * 2.0,
                stops: vec![
                    (0.0, Color::new(1.0, 0.843, 0.0, 0.8)),
                    (0.5, Color::new(1.0, 0.647, 0.0, 0.4)),
                    (1.0, Color::new(1.0, 0.392, 0.0, 0.0)),
                ],
            }],
        ),
        Layer::new(
            LayerKind::OrbBody,
            vec![Shape::Circle {
                center,
                radius: ORB_RADIUS,
                color: Color::new(1.0, 0.843, 0.0, 1.0),
            }],
        ),
        Layer::new(
            LayerKind::OrbHighlight,
            vec![Shape::Circle {
                center: center - vec2(ORB_RADIUS * 0.3, ORB_RADIUS * 0.3),
                radius: ORB_RADIUS * 0.4,
                color: Color::new(1.0, 1.0, 1.0, 0.6),
            }],
        ),
    ]
}

fn watermark_layer(viewport: Viewport) -> Layer {
    Layer::new(
        LayerKind::Watermark,
        vec![Shape::Text {
            text: WATERMARK.to_string(),
            position: vec2(viewport.width as f32 / 2.0, viewport.height as f32 / 2.0),
            size: 80.0,
            color: Color::new(0.176, 0.851, 0.965, 0.03),
            align: TextAlign::Center,
        }],
    )
}

fn connection_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Open => Color::new(0.204, 0.827, 0.6, 1.0),
        ConnectionState::Connecting | ConnectionState::Reconnecting => {
            Color::new(0.98, 0.75, 0.14, 1.0)
        }
        _ => Color::new(0.97, 0.44, 0.44, 1.0),
    }
}

fn hud_layer(world: &World, overlay: &Overlay<'_>) -> Layer {
    let origin = vec2(12.0, 12.0);
    let lines = [
        format!("Room {}", overlay.room_id),
        format!("Players {} / {}", world.players.len(), PALETTE_SIZE),
        overlay.connection.label().to_string(),
    ];

    let mut shapes = vec![Shape::Rect {
        origin,
        size: vec2(180.0, 72.0),
        fill: Some(PANEL),
        stroke: Some(Stroke::new(PANEL_BORDER, 1.0)),
    }];

    for (i, line) in lines.into_iter().enumerate() {
        let is_status = i == 2;
        let indent = if is_status { 22.0 } else { 10.0 };
        shapes.push(Shape::Text {
            text: line,
            position: origin + vec2(indent, 22.0 + i as f32 * 20.0),
            size: 18.0,
            color: if is_status { MUTED } else { TEXT },
            align: TextAlign::Left,
        });
    }

    shapes.push(Shape::Circle {
        center: origin + vec2(13.0, 56.0),
        radius: 4.0,
        color: connection_color(overlay.connection),
    });

    Layer::new(LayerKind::Hud, shapes)
}

fn scoreboard_layer(world: &World, colors: &mut ColorAllocator, viewport: Viewport) -> Layer {
    let mut ranked: Vec<_> = world.players.iter().collect();
    ranked.sort_by(|a, b| {
        b.orbs_collected
            .cmp(&a.orbs_collected)
            .then_with(|| a.name.cmp(&b.name))
    });

    let width = 200.0;
    let origin = vec2(viewport.width as f32 - width - 12.0, 12.0);
    let height = 34.0 + ranked.len() as f32 * 20.0;

    let mut shapes = vec![
        Shape::Rect {
            origin,
            size: vec2(width, height),
            fill: Some(PANEL),
            stroke: Some(Stroke::new(PANEL_BORDER, 1.0)),
        },
        Shape::Text {
            text: "ORBS".to_string(),
            position: origin + vec2(10.0, 22.0),
            size: 16.0,
            color: MUTED,
            align: TextAlign::Left,
        },
    ];

    for (i, player) in ranked.into_iter().enumerate() {
        let row = origin + vec2(10.0, 42.0 + i as f32 * 20.0);
        shapes.push(Shape::Circle {
            center: row + vec2(4.0, -5.0),
            radius: 5.0,
            color: colors.palette_for(&player.id).body,
        });
        shapes.push(Shape::Text {
            text: format!("{}  {}", player.name, player.orbs_collected),
            position: row + vec2(16.0, 0.0),
            size: 16.0,
            color: TEXT,
            align: TextAlign::Left,
        });
    }

    Layer::new(LayerKind::Scoreboard, shapes)
}

fn error_banner_layer(message: &str, viewport: Viewport) -> Layer {
    let size = vec2(420.0_f32.min(viewport.width as f32 - 24.0), 76.0);
    let origin = vec2(
        (viewport.width as f32 - size.x) / 2.0,
        viewport.height as f32 - size.y - 24.0,
    );

    Layer::new(
        LayerKind::ErrorBanner,
        vec![
            Shape::Rect {
                origin,
                size,
                fill: Some(Color::new(0.05, 0.06, 0.1, 0.92)),
                stroke: Some(Stroke::new(Color::new(0.94, 0.27, 0.27, 0.5), 1.5)),
            },
            Shape::Text {
                text: "Connection Error".to_string(),
                position: origin + vec2(14.0, 24.0),
                size: 20.0,
                color: Color::new(0.99, 0.65, 0.65, 1.0),
                align: TextAlign::Left,
            },
            Shape::Text {
                text: message.to_string(),
                position: origin + vec2(14.0, 46.0),
                size: 16.0,
                color: TEXT,
                align: TextAlign::Left,
            },
            Shape::Text {
                text: "Press Enter to dismiss".to_string(),
                position: origin + vec2(14.0, 66.0),
                size: 14.0,
                color: MUTED,
                align: TextAlign::Left,
            },
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Player;

    fn world(players: &[(&str, f32, f32)], orb: (f32, f32)) -> World {
        World {
            players: players
                .iter()
                .map(|(id, x, y)| Player::new(*id, id.to_uppercase(), *x, *y))
                .collect(),
            orb: Orb::new(orb.0, orb.1),
        }
    }

    fn overlay() -> Overlay<'static> {
        Overlay {
            room_id: "Z3K9D",
            connection: ConnectionState::Open,
            error: None,
        }
    }

    fn kinds(frame: &Frame) -> Vec<&LayerKind> {
        frame.layers.iter().map(|layer| &layer.kind).collect()
    }

    #[test]
    fn test_three_dragons_and_one_orb() {
        let world = world(&[("a", 100.0, 100.0), ("b", 200.0, 200.0), ("c", 300.0, 300.0)], (120.0, 340.0));
        let frame = compose_frame(&world, &mut ColorAllocator::new(), Viewport::new(800, 600), &overlay());

        assert_eq!(frame.dragon_ids(), vec!["a", "b", "c"]);

        let orb_layers: Vec<&Layer> = frame
            .layers
            .iter()
            .filter(|l| matches!(l.kind, LayerKind::OrbGlow))
            .collect();
        assert_eq!(orb_layers.len(), 1);
        match &orb_layers[0].shapes[0] {
            Shape::RadialGlow { center, radius, .. } => {
                assert_eq!(*center, vec2(120.0, 340.0));
                assert_eq!(*radius, ORB_RADIUS * 2.0);
            }
            other => panic!("expected glow, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_layer_order() {
        let world = world(&[("a", 10.0, 10.0)], (1.0, 1.0));
        let frame = compose_frame(&world, &mut ColorAllocator::new(), Viewport::new(800, 600), &overlay());
        let kinds = kinds(&frame);

        assert_eq!(kinds[0], &LayerKind::Clear);
        assert_eq!(kinds[1], &LayerKind::Grid);
        assert_eq!(kinds[2], &LayerKind::OrbGlow);
        assert_eq!(kinds[3], &LayerKind::OrbBody);
        assert_eq!(kinds[4], &LayerKind::OrbHighlight);

        let watermark = kinds.iter().position(|k| **k == LayerKind::Watermark).unwrap();
        let last_dragon = kinds
            .iter()
            .rposition(|k| matches!(k, LayerKind::Dragon { .. }))
            .unwrap();
        assert!(last_dragon < watermark);
        assert_eq!(frame.dragon_parts("a"), DragonPart::ALL.to_vec());
    }

    #[test]
    fn test_first_shape_clears_full_surface() {
        let frame = compose_frame(&World::default(), &mut ColorAllocator::new(), Viewport::new(800, 600), &overlay());
        assert!(matches!(&frame.layers[0].shapes[..], [Shape::Clear(_)]));
    }

    #[test]
    fn test_grid_covers_viewport() {
        let frame = compose_frame(&World::default(), &mut ColorAllocator::new(), Viewport::new(800, 600), &overlay());
        let grid = frame.layer(&LayerKind::Grid).unwrap();
        // 800 / 40 vertical + 600 / 40 horizontal
        assert_eq!(grid.shapes.len(), 20 + 15);
    }

    #[test]
    fn test_departed_players_release_colors() {
        let mut colors = ColorAllocator::new();
        let vp = Viewport::new(800, 600);

        compose_frame(&world(&[("p1", 0.0, 0.0), ("p2", 0.0, 0.0)], (0.0, 0.0)), &mut colors, vp, &overlay());
        assert_eq!(colors.assigned("p1"), Some(0));

        compose_frame(&world(&[("p2", 0.0, 0.0), ("p9", 0.0, 0.0)], (0.0, 0.0)), &mut colors, vp, &overlay());
        assert_eq!(colors.assigned("p1"), None);
        assert_eq!(colors.assigned("p9"), Some(0));
        assert_eq!(colors.assigned("p2"), Some(1));
    }

    #[test]
    fn test_error_banner_only_with_error() {
        let vp = Viewport::new(800, 600);
        let frame = compose_frame(&World::default(), &mut ColorAllocator::new(), vp, &overlay());
        assert!(frame.layer(&LayerKind::ErrorBanner).is_none());

        let with_error = Overlay {
            error: Some("server unreachable"),
            ..overlay()
        };
        let frame = compose_frame(&World::default(), &mut ColorAllocator::new(), vp, &with_error);
        let banner = frame.layer(&LayerKind::ErrorBanner).unwrap();
        assert!(banner.shapes.iter().any(
            |s| matches!(s, Shape::Text { text, .. } if text == "server unreachable")
        ));
    }

    #[test]
    fn test_hud_shows_room_and_player_count() {
        let world = world(&[("a", 0.0, 0.0), ("b", 0.0, 0.0), ("c", 0.0, 0.0)], (0.0, 0.0));
        let frame = compose_frame(&world, &mut ColorAllocator::new(), Viewport::new(800, 600), &overlay());
        let hud = frame.layer(&LayerKind::Hud).unwrap();

        let texts: Vec<&str> = hud
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"Room Z3K9D"));
        assert!(texts.contains(&"Players 3 / 8"));
        assert!(texts.contains(&"connected"));
    }

    #[test]
    fn test_scoreboard_ranks_by_orbs() {
        let mut world = world(&[("a", 0.0, 0.0), ("b", 0.0, 0.0)], (0.0, 0.0));
        world.players[1].orbs_collected = 4;
        let frame = compose_frame(&world, &mut ColorAllocator::new(), Viewport::new(800, 600), &overlay());
        let board = frame.layer(&LayerKind::Scoreboard).unwrap();

        let rows: Vec<&str> = board
            .shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Text { text, .. } if text != "ORBS" => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(rows, vec!["B  4", "A  0"]);
    }
}
