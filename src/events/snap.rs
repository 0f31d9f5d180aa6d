use super::window::WindowId;
use crate::zones::Zone;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

/// События жизненного цикла перетаскивания, которые читает UI.
///
/// Сериализуются в JSON-объект с полем `event`, по одному объекту на строку.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SnapEvent {
    ZoneEnter {
        zone: Zone,
        x: i32,
        y: i32,
        #[serde(rename = "windowId")]
        window_id: WindowId,
    },
    ZoneLeave {
        x: i32,
        y: i32,
    },
    /// Поток позиций, пока активна зона `top` (подсветка вариантов раскладки)
    DragPosition {
        zone: Zone,
        x: i32,
        y: i32,
        #[serde(rename = "windowId")]
        window_id: WindowId,
    },
    SnapApply {
        zone: Zone,
        x: i32,
        y: i32,
        #[serde(rename = "windowId")]
        window_id: WindowId,
    },
    DragEnd,
    Error {
        message: String,
    },
}

/// За один тик автомат выдаёт не больше двух событий (zone_leave + zone_enter).
pub type TickEvents = SmallVec<[SnapEvent; 2]>;

impl SnapEvent {
    pub fn error(message: impl Into<String>) -> Self {
        SnapEvent::Error {
            message: message.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SnapEvent::ZoneEnter { .. } => "zone_enter",
            SnapEvent::ZoneLeave { .. } => "zone_leave",
            SnapEvent::DragPosition { .. } => "drag_position",
            SnapEvent::SnapApply { .. } => "snap_apply",
            SnapEvent::DragEnd => "drag_end",
            SnapEvent::Error { .. } => "error",
        }
    }

    /// Завершает ли событие сессию перетаскивания
    pub fn is_terminal(&self) -> bool {
        matches!(self, SnapEvent::SnapApply { .. } | SnapEvent::DragEnd)
    }
}

impl fmt::Display for SnapEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapEvent::ZoneEnter { zone, x, y, window_id }
            | SnapEvent::DragPosition { zone, x, y, window_id }
            | SnapEvent::SnapApply { zone, x, y, window_id } => {
                write!(f, "{} {} ({}, {}) window={}", self.name(), zone, x, y, window_id)
            }
            SnapEvent::ZoneLeave { x, y } => write!(f, "zone_leave ({}, {})", x, y),
            SnapEvent::DragEnd => write!(f, "drag_end"),
            SnapEvent::Error { message } => write!(f, "error: {}", message),
        }
    }
}
