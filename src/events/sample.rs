use super::window::WindowId;
use std::fmt;

/// Размер экрана, читается один раз при старте
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub width: i32,
    pub height: i32,
}

impl Screen {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Снимок состояния указателя за один тик. Живёт только в пределах тика.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub x: i32,
    pub y: i32,
    pub button_held: bool,
    pub active_window: Option<WindowId>,
}

impl Sample {
    pub fn new(x: i32, y: i32, button_held: bool) -> Self {
        Self {
            x,
            y,
            button_held,
            active_window: None,
        }
    }

    pub fn with_window(mut self, window: WindowId) -> Self {
        self.active_window = Some(window);
        self
    }

    #[cfg(test)]
    pub fn pressed(x: i32, y: i32, window: WindowId) -> Self {
        Self::new(x, y, true).with_window(window)
    }

    pub fn released(x: i32, y: i32) -> Self {
        Self::new(x, y, false)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self
            .active_window
            .map(|w| w.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "({}, {}) button={} window={}",
            self.x,
            self.y,
            if self.button_held { "held" } else { "up" },
            window
        )
    }
}
