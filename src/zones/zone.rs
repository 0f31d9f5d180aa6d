use serde::{Deserialize, Serialize};
use std::fmt;

/// Зона привязки. "Вне зон" выражается как `Option<Zone>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Top,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Zone {
    #[cfg(test)]
    pub const ALL: [Zone; 7] = [
        Zone::Top,
        Zone::Left,
        Zone::Right,
        Zone::TopLeft,
        Zone::TopRight,
        Zone::BottomLeft,
        Zone::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Top => "top",
            Zone::Left => "left",
            Zone::Right => "right",
            Zone::TopLeft => "topleft",
            Zone::TopRight => "topright",
            Zone::BottomLeft => "bottomleft",
            Zone::BottomRight => "bottomright",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Полуоткрытый прямоугольник `[left, right) x [top, bottom)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Расширить во все стороны на `margin` пикселей
    pub fn inflate(&self, margin: i32) -> Self {
        Self {
            left: self.left.saturating_sub(margin),
            top: self.top.saturating_sub(margin),
            right: self.right.saturating_add(margin),
            bottom: self.bottom.saturating_add(margin),
        }
    }
}
