//! Dragon geometry.
//!
//! Every dragon is built from the same parts in the same order, centered on the
//! player's position and scaled by [`PLAYER_RADIUS`]. Only the palette differs
//! between players; the eyes and the fire breath keep fixed colors.

use crate::palette::DragonPalette;
use crate::scene::{Layer, LayerKind, Shape, Stroke};
use macroquad::color::Color;
use macroquad::math::{vec2, Vec2};

pub const PLAYER_RADIUS: f32 = 20.0;

const TAIL_SEGMENTS: usize = 12;
const SPINE_COUNT: usize = 9;

const EYE: Color = Color::new(0.102, 0.102, 0.102, 1.0);
const FIRE_OUTER: Color = Color::new(0.957, 0.486, 0.059, 1.0);
const FIRE_INNER: Color = Color::new(1.0, 0.902, 0.0, 1.0);
const FIRE_CORE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragonPart {
    Wings,
    Body,
    Tail,
    Spines,
    Legs,
    Head,
    Horns,
    Eyes,
    Breath,
    Outline,
}

impl DragonPart {
    /// Paint order, back to front.
    pub const ALL: [DragonPart; 10] = [
        DragonPart::Wings,
        DragonPart::Body,
        DragonPart::Tail,
        DragonPart::Spines,
        DragonPart::Legs,
        DragonPart::Head,
        DragonPart::Horns,
        DragonPart::Eyes,
        DragonPart::Breath,
        DragonPart::Outline,
    ];
}

/// Points of the quadratic curve `from -> to` bent towards `control`,
/// both ends included.
pub fn quadratic_points(from: Vec2, control: Vec2, to: Vec2, segments: usize) -> Vec<Vec2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let u = 1.0 - t;
            from * (u * u) + control * (2.0 * u * t) + to * (t * t)
        })
        .collect()
}

/// Key anchor points of one dragon, shared by several parts.
#[derive(Debug, Clone, Copy)]
struct Anatomy {
    center: Vec2,
    r: f32,
    body_radii: Vec2,
    head: Vec2,
    head_radii: Vec2,
    snout: Vec2,
    snout_radii: Vec2,
}

impl Anatomy {
    fn new(center: Vec2) -> Self {
        let r = PLAYER_RADIUS;
        let head = center + vec2(-0.9 * r, -0.1 * r);
        let head_radii = vec2(r, 0.85 * r);
        let snout = vec2(head.x - head_radii.x * 0.6, head.y);

        Self {
            center,
            r,
            body_radii: vec2(1.4 * r, 1.1 * r),
            head,
            head_radii,
            snout,
            snout_radii: vec2(head_radii.x * 0.5, head_radii.y * 0.6),
        }
    }

    /// `center + (dx, dy) * r`
    fn at(&self, dx: f32, dy: f32) -> Vec2 {
        self.center + vec2(dx, dy) * self.r
    }
}

fn triangle(a: Vec2, b: Vec2, c: Vec2, fill: Color, stroke: Option<Stroke>) -> Shape {
    Shape::Polygon {
        points: vec![a, b, c],
        fill: Some(fill),
        stroke,
    }
}

fn ellipse(center: Vec2, radii: Vec2, rotation: f32, fill: Color) -> Shape {
    Shape::Ellipse {
        center,
        radii,
        rotation,
        fill: Some(fill),
        stroke: None,
    }
}

/// One layer per [`DragonPart`], in paint order.
pub fn dragon_layers(id: &str, center: Vec2, palette: &DragonPalette) -> Vec<Layer> {
    let anatomy = Anatomy::new(center);

    DragonPart::ALL
        .iter()
        .map(|&part| {
            let shapes = match part {
                DragonPart::Wings => wings(&anatomy, palette),
                DragonPart::Body => body(&anatomy, palette),
                DragonPart::Tail => tail(&anatomy, palette),
                DragonPart::Spines => spines(&anatomy, palette),
                DragonPart::Legs => legs(&anatomy, palette),
                DragonPart::Head => head(&anatomy, palette),
                DragonPart::Horns => horns(&anatomy, palette),
                DragonPart::Eyes => eyes(&anatomy),
                DragonPart::Breath => breath(&anatomy),
                DragonPart::Outline => outline(&anatomy, palette),
            };
            Layer::new(
                LayerKind::Dragon {
                    id: id.to_string(),
                    part,
                },
                shapes,
            )
        })
        .collect()
}

fn wings(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let membrane = [
        (0.0, 0.0),
        (-1.0, -0.8),
        (-2.2, -0.2),
        (-2.0, 0.3),
        (-1.3, 0.6),
        (-0.5, 0.4),
    ];
    let veins = [(-1.0, -0.8), (-2.2, -0.2), (-1.3, 0.6)];
    let mut shapes = Vec::new();

    // left wing, then the right one mirrored around the body
    for side in [1.0_f32, -1.0] {
        let base = a.at(-0.2 * side, -0.5);
        let point = |(dx, dy): (f32, f32)| base + vec2(dx * side, dy) * a.r;

        shapes.push(Shape::Polygon {
            points: membrane.iter().copied().map(point).collect(),
            fill: Some(palette.wing),
            stroke: Some(Stroke::new(palette.outline, 2.5)),
        });
        for vein in veins {
            shapes.push(Shape::Line {
                from: base,
                to: point(vein),
                thickness: 1.5,
                color: palette.dark,
            });
        }
    }

    shapes
}

fn body(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let belly = a.at(0.0, 0.3);
    let belly_radii = vec2(a.body_radii.x * 0.9, a.body_radii.y * 0.5);

    let mut shapes = vec![
        ellipse(a.center, a.body_radii, 0.0, palette.body),
        ellipse(belly, belly_radii, 0.0, palette.underbelly),
    ];

    for i in 0..4 {
        let x = belly.x - belly_radii.x * 0.6 + i as f32 * belly_radii.x * 0.4;
        shapes.push(Shape::Line {
            from: vec2(x, belly.y - belly_radii.y * 0.6),
            to: vec2(x, belly.y + belly_radii.y * 0.6),
            thickness: 1.5,
            color: palette.dark,
        });
    }

    shapes
}

fn tail(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let start = a.at(1.0, 0.2);
    let control = a.at(2.0, -0.3);
    let end = a.at(2.8, -0.5);
    let width = 0.5 * a.r;

    let upper = quadratic_points(start, control, end, TAIL_SEGMENTS);
    let lower = quadratic_points(
        start + vec2(0.0, width * 0.4),
        control + vec2(0.0, width * 0.3),
        end + vec2(width * 0.2, 0.0),
        TAIL_SEGMENTS,
    );

    // filled as a strip of quads so the bend never folds over itself
    let mut shapes: Vec<Shape> = (0..TAIL_SEGMENTS)
        .map(|i| Shape::Polygon {
            points: vec![upper[i], upper[i + 1], lower[i + 1], lower[i]],
            fill: Some(palette.body),
            stroke: None,
        })
        .collect();

    let mut outline = upper.clone();
    outline.extend(lower.iter().rev());
    shapes.push(Shape::Polyline {
        points: outline,
        closed: true,
        stroke: Stroke::new(palette.outline, 2.0),
    });

    shapes.push(triangle(
        end,
        end + vec2(width * 0.3, -width * 0.2),
        end + vec2(width * 0.2, 0.0),
        palette.body,
        Some(Stroke::new(palette.outline, 2.0)),
    ));

    shapes
}

fn spines(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    (0..SPINE_COUNT)
        .map(|i| {
            let t = i as f32 / (SPINE_COUNT - 1) as f32;
            let height = a.r * (0.25 + i as f32 * 0.03);
            // run along the top of the body from the neck towards the tail
            let x = a.center.x - a.body_radii.x * 0.7 + t * a.body_radii.x * 1.6;
            let y = a.center.y - a.body_radii.y * (1.0 - (t - 0.45).abs() * 0.6);
            let base = vec2(x, y);

            triangle(
                base + vec2(-0.4 * height, 0.0),
                base + vec2(0.0, -height),
                base + vec2(0.4 * height, 0.0),
                palette.dark,
                Some(Stroke::new(palette.outline, 2.0)),
            )
        })
        .collect()
}

fn legs(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let placements = [(-0.5, 0.4, 0.2), (-0.2, 0.5, -0.1), (0.4, 0.5, 0.1), (0.7, 0.4, -0.15)];
    let radii = vec2(0.25 * a.r, 0.6 * a.r);
    let mut shapes = Vec::new();

    for (dx, dy, rotation) in placements {
        let leg = a.at(dx, dy);
        shapes.push(Shape::Ellipse {
            center: leg,
            radii,
            rotation,
            fill: Some(palette.body),
            stroke: Some(Stroke::new(palette.outline, 2.0)),
        });

        for (left, tip, right) in [(-0.3, -0.6, -0.1), (0.0, -0.2, 0.2), (0.3, 0.1, 0.5)] {
            shapes.push(triangle(
                vec2(leg.x + radii.x * left, leg.y + radii.y * 0.7),
                vec2(leg.x + radii.x * tip, leg.y + radii.y * 0.9),
                vec2(leg.x + radii.x * right, leg.y + radii.y * 0.9),
                palette.underbelly,
                None,
            ));
        }
    }

    shapes
}

fn head(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let mouth = vec2(
        a.snout.x - a.snout_radii.x * 0.2,
        a.snout.y + a.snout_radii.y * 0.2,
    );
    let chin = vec2(a.snout.x, a.snout.y + a.snout_radii.y * 0.8);

    vec![
        ellipse(a.head, a.head_radii, -0.1, palette.body),
        ellipse(a.snout, a.snout_radii, -0.1, palette.body),
        ellipse(
            mouth,
            vec2(a.snout_radii.x * 0.3, a.snout_radii.y * 0.25),
            0.0,
            palette.underbelly,
        ),
        triangle(
            chin + vec2(-0.1 * a.r, 0.0),
            chin + vec2(0.0, 0.25 * a.r),
            chin + vec2(0.1 * a.r, 0.0),
            palette.body,
            Some(Stroke::new(palette.outline, 1.5)),
        ),
    ]
}

fn horns(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let top = a.head.y - a.head_radii.y * 0.7;

    [(-0.3, -0.5), (0.2, 0.5)]
        .iter()
        .map(|&(offset, lean)| {
            let base = vec2(a.head.x + offset * a.r, top);
            triangle(
                base + vec2(-0.12 * a.r, 0.0),
                base + vec2(lean * 0.3 * a.r, -0.6 * a.r),
                base + vec2(0.12 * a.r, 0.0),
                palette.underbelly,
                Some(Stroke::new(palette.outline, 2.0)),
            )
        })
        .collect()
}

fn eyes(a: &Anatomy) -> Vec<Shape> {
    [-0.15, 0.15]
        .iter()
        .map(|&dx| Shape::Circle {
            center: vec2(a.head.x + dx * a.r, a.head.y - 0.1 * a.r),
            radius: 0.12 * a.r,
            color: EYE,
        })
        .collect()
}

fn breath(a: &Anatomy) -> Vec<Shape> {
    let start = vec2(a.head.x - a.r - 0.3 * a.r, a.head.y);
    let flame = |scale: f32| -> Vec<Vec2> {
        [(0.0, 0.0), (-0.8, -0.3), (-0.6, 0.0), (-0.8, 0.3)]
            .iter()
            .map(|&(dx, dy)| start + vec2(dx, dy) * a.r * scale)
            .collect()
    };

    vec![
        Shape::Polygon {
            points: flame(1.0),
            fill: Some(FIRE_OUTER),
            stroke: None,
        },
        Shape::Polygon {
            points: flame(0.6),
            fill: Some(FIRE_INNER),
            stroke: None,
        },
        Shape::Circle {
            center: start - vec2(0.3 * a.r, 0.0),
            radius: 0.1 * a.r,
            color: FIRE_CORE,
        },
    ]
}

fn outline(a: &Anatomy, palette: &DragonPalette) -> Vec<Shape> {
    let stroke = Some(Stroke::new(palette.outline, 2.5));

    [
        (a.center, a.body_radii, 0.0),
        (a.head, a.head_radii, -0.1),
        (a.snout, a.snout_radii, -0.1),
    ]
    .iter()
    .map(|&(center, radii, rotation)| Shape::Ellipse {
        center,
        radii,
        rotation,
        fill: None,
        stroke,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::dragon_palette;
    use assert_approx_eq::assert_approx_eq;

    fn layers() -> Vec<Layer> {
        dragon_layers("p1", vec2(200.0, 150.0), &dragon_palette(0))
    }

    fn shapes_of(layers: &[Layer], part: DragonPart) -> &[Shape] {
        layers
            .iter()
            .find(|l| matches!(l.kind, LayerKind::Dragon { part: p, .. } if p == part))
            .map(|l| l.shapes.as_slice())
            .unwrap()
    }

    #[test]
    fn test_parts_follow_paint_order() {
        let parts: Vec<DragonPart> = layers()
            .iter()
            .map(|l| match &l.kind {
                LayerKind::Dragon { id, part } => {
                    assert_eq!(id, "p1");
                    *part
                }
                other => panic!("unexpected layer {:?}", other),
            })
            .collect();
        assert_eq!(parts, DragonPart::ALL.to_vec());
    }

    #[test]
    fn test_body_centered_on_player() {
        let layers = layers();
        match &shapes_of(&layers, DragonPart::Body)[0] {
            Shape::Ellipse { center, radii, .. } => {
                assert_eq!(*center, vec2(200.0, 150.0));
                assert_approx_eq!(radii.x, 1.4 * PLAYER_RADIUS);
                assert_approx_eq!(radii.y, 1.1 * PLAYER_RADIUS);
            }
            other => panic!("expected ellipse, got {:?}", other),
        }
    }

    #[test]
    fn test_palette_tints_body_but_not_eyes() {
        let a = dragon_layers("x", Vec2::ZERO, &dragon_palette(0));
        let b = dragon_layers("x", Vec2::ZERO, &dragon_palette(3));

        assert_ne!(
            shapes_of(&a, DragonPart::Body),
            shapes_of(&b, DragonPart::Body)
        );
        assert_eq!(shapes_of(&a, DragonPart::Eyes), shapes_of(&b, DragonPart::Eyes));
        assert_eq!(
            shapes_of(&a, DragonPart::Breath),
            shapes_of(&b, DragonPart::Breath)
        );
    }

    #[test]
    fn test_counts() {
        let layers = layers();
        assert_eq!(shapes_of(&layers, DragonPart::Spines).len(), SPINE_COUNT);
        assert_eq!(shapes_of(&layers, DragonPart::Eyes).len(), 2);
        assert_eq!(shapes_of(&layers, DragonPart::Horns).len(), 2);
        // 4 legs, each with 3 claws
        assert_eq!(shapes_of(&layers, DragonPart::Legs).len(), 16);
        assert_eq!(shapes_of(&layers, DragonPart::Outline).len(), 3);
    }

    #[test]
    fn test_wings_mirror() {
        let layers = layers();
        let wings: Vec<&Vec<Vec2>> = shapes_of(&layers, DragonPart::Wings)
            .iter()
            .filter_map(|s| match s {
                Shape::Polygon { points, .. } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(wings.len(), 2);

        for (left, right) in wings[0].iter().zip(wings[1].iter()) {
            assert_approx_eq!(left.x - 200.0, -(right.x - 200.0));
            assert_approx_eq!(left.y, right.y);
        }
    }

    #[test]
    fn test_quadratic_endpoints() {
        let points = quadratic_points(vec2(0.0, 0.0), vec2(5.0, 10.0), vec2(10.0, 0.0), 4);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], vec2(0.0, 0.0));
        assert_eq!(points[4], vec2(10.0, 0.0));
        // apex of a symmetric curve is halfway to the control point
        assert_approx_eq!(points[2].x, 5.0);
        assert_approx_eq!(points[2].y, 5.0);
    }
}
