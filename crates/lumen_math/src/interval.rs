/// A closed range of ray parameters `[min, max]`.
///
/// Inverted (`min > max`) when the range is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}
