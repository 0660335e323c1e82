//! Deterministic L-system expansion and turtle interpretation

use std::collections::HashMap;

use tracing::{debug, info};

use super::{validate_angle, validate_iterations, CurveGenerator};
use crate::errors::{FractalError, Result};
use crate::geometry::Point;

/// Rewriting rule of the classic Lévy C-curve
pub const LEVY_RULE: &str = "+F--F+";

/// Generic rewriting system with a turtle-graphics reading
///
/// Symbols understood by [`LSystem::interpret`]:
///
/// | symbol     | action                                      |
/// |------------|---------------------------------------------|
/// | `F`, `G`   | move forward one step and emit the position |
/// | `f`        | move forward without emitting               |
/// | `+`        | turn clockwise by the angle                 |
/// | `-`        | turn counter-clockwise by the angle         |
/// | `[` / `]`  | push / pop position and heading             |
///
/// Anything else is carried through expansion and ignored when drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct LSystem {
    pub axiom: String,
    pub rules: HashMap<char, String>,
    pub angle_deg: f64,
}

impl LSystem {
    pub fn new(axiom: impl Into<String>, angle_deg: f64) -> Self {
        Self {
            axiom: axiom.into(),
            rules: HashMap::new(),
            angle_deg,
        }
    }

    pub fn with_rule(mut self, symbol: char, replacement: impl Into<String>) -> Self {
        self.rules.insert(symbol, replacement.into());
        self
    }

    /// Apply the rules `iterations` times, starting from the axiom
    pub fn expand(&self, iterations: u32) -> String {
        let mut current = self.axiom.clone();
        for _ in 0..iterations {
            let mut next = String::with_capacity(current.len() * 2);
            for ch in current.chars() {
                match self.rules.get(&ch) {
                    Some(replacement) => next.push_str(replacement),
                    None => next.push(ch),
                }
            }
            current = next;
        }
        current
    }

    /// Walk the instruction string and collect the visited positions
    ///
    /// The first point is always the origin.
    pub fn interpret(&self, instructions: &str, step: f64) -> Result<Vec<Point>> {
        let angle = self.angle_deg.to_radians();
        let draws = instructions.chars().filter(|c| matches!(c, 'F' | 'G')).count();

        let mut pos = Point::new(0.0, 0.0);
        let mut heading = 0.0_f64;
        let mut points = Vec::with_capacity(draws + 1);
        let mut stack: Vec<(Point, f64)> = Vec::new();
        points.push(pos);

        for ch in instructions.chars() {
            match ch {
                'F' | 'G' => {
                    pos = advance(pos, heading, step);
                    points.push(pos);
                }
                'f' => pos = advance(pos, heading, step),
                '+' => heading -= angle,
                '-' => heading += angle,
                '[' => stack.push((pos, heading)),
                ']' => {
                    let (saved_pos, saved_heading) = stack.pop().ok_or_else(|| {
                        FractalError::invalid("instructions", "unbalanced ']' in L-system string")
                    })?;
                    pos = saved_pos;
                    heading = saved_heading;
                    points.push(pos);
                }
                _ => {}
            }
        }
        Ok(points)
    }
}

#[inline]
fn advance(pos: Point, heading: f64, step: f64) -> Point {
    let (s, c) = heading.sin_cos();
    Point::new(pos.x + step * c, pos.y + step * s)
}

/// The Lévy C-curve as an L-system
#[derive(Debug, Clone)]
pub struct LevyLSystem {
    system: LSystem,
    iterations: u32,
}

impl LevyLSystem {
    /// Validate input and set up the `F -> +F--F+` system
    pub fn new(iterations: i64, angle_deg: f64) -> Result<Self> {
        let iterations = validate_iterations(iterations)?;
        let angle_deg = validate_angle(angle_deg)?;
        Ok(Self {
            system: LSystem::new("F", angle_deg).with_rule('F', LEVY_RULE),
            iterations,
        })
    }

    /// Step length that keeps the 45° curve's chord at unit length
    pub fn step(&self) -> f64 {
        2.0_f64.powf(-f64::from(self.iterations) / 2.0)
    }

    pub fn instructions(&self) -> String {
        self.system.expand(self.iterations)
    }
}

impl CurveGenerator for LevyLSystem {
    fn generate(&self) -> Result<Vec<Point>> {
        let instructions = self.instructions();
        debug!(
            iterations = self.iterations,
            symbols = instructions.len(),
            "expanded L-system"
        );
        let points = self.system.interpret(&instructions, self.step())?;
        info!(
            iterations = self.iterations,
            angle = self.system.angle_deg,
            points = points.len(),
            "generated L-system curve"
        );
        Ok(points)
    }

    fn name(&self) -> &'static str {
        "lsystem"
    }

    fn is_ordered(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_expand_one_round() {
        let ls = LSystem::new("F", 45.0).with_rule('F', LEVY_RULE);
        assert_eq!(ls.expand(0), "F");
        assert_eq!(ls.expand(1), "+F--F+");
        assert_eq!(ls.expand(2), "++F--F+--+F--F++");
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(4)]
    #[case(10)]
    fn test_segment_count_doubles(#[case] k: i64) {
        let curve = LevyLSystem::new(k, 45.0).unwrap();
        let draws = curve.instructions().chars().filter(|&c| c == 'F').count();
        assert_eq!(draws, 1 << k);
        assert_eq!(curve.generate().unwrap().len(), (1 << k) + 1);
    }

    #[rstest]
    #[case(1)]
    #[case(6)]
    #[case(11)]
    fn test_endpoints_span_unit_chord(#[case] k: i64) {
        let points = LevyLSystem::new(k, 45.0).unwrap().generate().unwrap();
        let first = points[0];
        let last = points[points.len() - 1];
        assert_eq!(first, Point::new(0.0, 0.0));
        assert!((last.x - 1.0).abs() < 1e-9, "last = {last:?}");
        assert!(last.y.abs() < 1e-9, "last = {last:?}");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = LevyLSystem::new(8, 45.0).unwrap().generate().unwrap();
        let b = LevyLSystem::new(8, 45.0).unwrap().generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_first_turn_is_clockwise() {
        let points = LevyLSystem::new(1, 45.0).unwrap().generate().unwrap();
        assert!((points[1].x - 0.5).abs() < 1e-12);
        assert!((points[1].y + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_branching_restores_position() {
        let ls = LSystem::new("F[+F]F", 90.0);
        let points = ls.interpret("F[+F]F", 1.0).unwrap();
        // origin, F, +F, restored, F
        assert_eq!(points.len(), 5);
        assert_eq!(points[3], Point::new(1.0, 0.0));
        assert!((points[4].x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_move_without_drawing() {
        let ls = LSystem::new("FfF", 0.0);
        let points = ls.interpret("FfF", 1.0).unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[2].x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unbalanced_bracket_is_rejected() {
        let ls = LSystem::new("F]", 45.0);
        assert!(matches!(
            ls.interpret("F]", 1.0),
            Err(FractalError::InvalidParameter { .. })
        ));
    }
}
