use crate::scene::{Frame, Shape, Stroke, TextAlign};
use macroquad::prelude::*;

/// Rings used to approximate a radial gradient.
const GLOW_RINGS: usize = 24;

/// Paints a [`Frame`] with macroquad. Holds no game state of its own.
pub struct Renderer {
    frames_drawn: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self { frames_drawn: 0 }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn draw(&mut self, frame: &Frame) {
        for layer in &frame.layers {
            for shape in &layer.shapes {
                self.draw_shape(shape);
            }
        }
        self.frames_drawn += 1;
    }

    fn draw_shape(&self, shape: &Shape) {
        match shape {
            Shape::Clear(color) => clear_background(*color),
            Shape::Line {
                from,
                to,
                thickness,
                color,
            } => draw_line(from.x, from.y, to.x, to.y, *thickness, *color),
            Shape::Circle {
                center,
                radius,
                color,
            } => draw_circle(center.x, center.y, *radius, *color),
            Shape::RadialGlow {
                center,
                radius,
                stops,
            } => self.draw_glow(*center, *radius, stops),
            Shape::Ellipse {
                center,
                radii,
                rotation,
                fill,
                stroke,
            } => {
                let degrees = rotation.to_degrees();
                if let Some(color) = fill {
                    draw_ellipse(center.x, center.y, radii.x, radii.y, degrees, *color);
                }
                if let Some(Stroke { color, thickness }) = stroke {
                    draw_ellipse_lines(
                        center.x, center.y, radii.x, radii.y, degrees, *thickness, *color,
                    );
                }
            }
            Shape::Polygon {
                points,
                fill,
                stroke,
            } => {
                if let Some(color) = fill {
                    fill_polygon(points, *color);
                }
                if let Some(stroke) = stroke {
                    stroke_path(points, true, stroke);
                }
            }
            Shape::Polyline {
                points,
                closed,
                stroke,
            } => stroke_path(points, *closed, stroke),
            Shape::Rect {
                origin,
                size,
                fill,
                stroke,
            } => {
                if let Some(color) = fill {
                    draw_rectangle(origin.x, origin.y, size.x, size.y, *color);
                }
                if let Some(Stroke { color, thickness }) = stroke {
                    draw_rectangle_lines(origin.x, origin.y, size.x, size.y, *thickness, *color);
                }
            }
            Shape::Text {
                text,
                position,
                size,
                color,
                align,
            } => {
                let font_size = size.round() as u16;
                let x = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => {
                        let dims = measure_text(text, None, font_size, 1.0);
                        position.x - dims.width / 2.0
                    }
                };
                draw_text(text, x, position.y, *size, *color);
            }
        }
    }

    /// Draws concentric discs from the outside in, each colored by
    /// interpolating the gradient stops at its radius.
    fn draw_glow(&self, center: Vec2, radius: f32, stops: &[(f32, Color)]) {
        for ring in (1..=GLOW_RINGS).rev() {
            let offset = ring as f32 / GLOW_RINGS as f32;
            let color = gradient_at(stops, offset);
            // discs overlap, so only paint what this ring adds on top
            let layer_alpha = color.a / GLOW_RINGS as f32 * 2.0;
            draw_circle(
                center.x,
                center.y,
                radius * offset,
                Color::new(color.r, color.g, color.b, layer_alpha.min(1.0)),
            );
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_polygon(points: &[Vec2], color: Color) {
    if points.len() < 3 {
        return;
    }

    let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        draw_triangle(centroid, *a, b, color);
    }
}

fn stroke_path(points: &[Vec2], closed: bool, stroke: &Stroke) {
    for pair in points.windows(2) {
        draw_line(pair[0].x, pair[0].y, pair[1].x, pair[1].y, stroke.thickness, stroke.color);
    }
    if closed && points.len() > 2 {
        let (first, last) = (points[0], points[points.len() - 1]);
        draw_line(last.x, last.y, first.x, first.y, stroke.thickness, stroke.color);
    }
}

/// Linear interpolation between the stops surrounding `offset`.
pub fn gradient_at(stops: &[(f32, Color)], offset: f32) -> Color {
    let Some(&(first_offset, first)) = stops.first() else {
        return Color::new(0.0, 0.0, 0.0, 0.0);
    };
    if offset <= first_offset {
        return first;
    }

    for pair in stops.windows(2) {
        let (start, from) = pair[0];
        let (end, to) = pair[1];
        if offset <= end {
            let t = if end > start {
                (offset - start) / (end - start)
            } else {
                1.0
            };
            return Color::new(
                from.r + (to.r - from.r) * t,
                from.g + (to.g - from.g) * t,
                from.b + (to.b - from.b) * t,
                from.a + (to.a - from.a) * t,
            );
        }
    }

    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn stops() -> Vec<(f32, Color)> {
        vec![
            (0.0, Color::new(1.0, 0.0, 0.0, 0.8)),
            (0.5, Color::new(0.0, 1.0, 0.0, 0.4)),
            (1.0, Color::new(0.0, 0.0, 1.0, 0.0)),
        ]
    }

    #[test]
    fn test_gradient_hits_stops() {
        let stops = stops();
        assert_eq!(gradient_at(&stops, 0.0), stops[0].1);
        assert_eq!(gradient_at(&stops, 0.5), stops[1].1);
        assert_eq!(gradient_at(&stops, 1.0), stops[2].1);
    }

    #[test]
    fn test_gradient_interpolates() {
        let color = gradient_at(&stops(), 0.25);
        assert_approx_eq!(color.r, 0.5);
        assert_approx_eq!(color.g, 0.5);
        assert_approx_eq!(color.a, 0.6);
    }

    #[test]
    fn test_gradient_clamps() {
        let stops = stops();
        assert_eq!(gradient_at(&stops, 2.0), stops[2].1);
        assert_eq!(gradient_at(&[], 0.3).a, 0.0);
    }
}
