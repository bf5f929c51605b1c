use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bounds {
    pub position: Position,
    pub size: Size,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            position: Position::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Builds bounds from left/top/right/bottom edges. Inverted edges collapse to zero size.
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left).max(0) as u32,
            bottom.saturating_sub(top).max(0) as u32,
        )
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Position of these bounds expressed in the coordinate space whose origin is `origin`.
    pub fn relative_to(&self, origin: &Position) -> Position {
        Position::new(self.position.x - origin.x, self.position.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ltrb() {
        let bounds = Bounds::from_ltrb(10, 20, 30, 40);
        assert_eq!(bounds, Bounds::new(10, 20, 20, 20));
        assert_eq!(bounds.width(), 20);
        assert_eq!(bounds.height(), 20);
    }

    #[test]
    fn test_from_ltrb_inverted_collapses() {
        let bounds = Bounds::from_ltrb(30, 40, 10, 20);
        assert_eq!(bounds.size, Size::new(0, 0));
        assert_eq!(bounds.position, Position::new(30, 40));
    }

    #[test]
    fn test_relative_to() {
        let task = Bounds::from_ltrb(10, 0, 50, 40);
        let fragment = Bounds::from_ltrb(30, 0, 50, 40);
        assert_eq!(fragment.relative_to(&task.position), Position::new(20, 0));
    }
}
