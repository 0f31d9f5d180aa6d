use super::zone::{Rect, Zone};
use crate::error::{Result, SnapError};
use crate::events::Screen;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Пороговые значения геометрии зон (пиксели).
///
/// Это значения для подстройки, а не контракт: все они переопределяются
/// через секцию `[zones]` конфигурации.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneGeometry {
    /// Внутренняя полоса у верхнего края, где `top` побеждает при любом x
    pub always_top_px: i32,
    pub top_band_px: i32,
    pub edge_band_px: i32,
    /// Отступ угла, измеряется независимо по x и по y
    pub corner_band_px: i32,
    pub top_hysteresis_px: i32,
    pub edge_hysteresis_px: i32,
}

impl Default for ZoneGeometry {
    fn default() -> Self {
        Self {
            always_top_px: 40,
            top_band_px: 80,
            edge_band_px: 30,
            corner_band_px: 60,
            top_hysteresis_px: 20,
            edge_hysteresis_px: 15,
        }
    }
}

impl ZoneGeometry {
    pub fn validate(&self) -> anyhow::Result<()> {
        let bands = [
            ("always_top_px", self.always_top_px),
            ("top_band_px", self.top_band_px),
            ("edge_band_px", self.edge_band_px),
            ("corner_band_px", self.corner_band_px),
        ];
        for (name, value) in bands {
            if value <= 0 {
                anyhow::bail!("zones.{} должно быть больше 0 (получено {})", name, value);
            }
        }

        if self.top_hysteresis_px < 0 || self.edge_hysteresis_px < 0 {
            anyhow::bail!("Гистерезис зон не может быть отрицательным");
        }

        // Иначе прямоугольники зон перестают соответствовать правилам приоритета
        if self.always_top_px > self.top_band_px {
            anyhow::bail!(
                "zones.always_top_px ({}) не может превышать zones.top_band_px ({})",
                self.always_top_px,
                self.top_band_px
            );
        }
        if self.edge_band_px > self.corner_band_px {
            anyhow::bail!(
                "zones.edge_band_px ({}) не может превышать zones.corner_band_px ({})",
                self.edge_band_px,
                self.corner_band_px
            );
        }

        Ok(())
    }
}

/// Отображение `(x, y)` в зону для конкретного экрана.
#[derive(Debug, Clone)]
pub struct ZoneClassifier {
    geometry: ZoneGeometry,
    screen: Screen,
}

impl ZoneClassifier {
    pub fn new(geometry: ZoneGeometry, screen: Screen) -> Result<Self> {
        geometry.validate()?;

        if screen.width <= 2 * geometry.corner_band_px
            || screen.height <= geometry.top_band_px + geometry.corner_band_px
        {
            return Err(SnapError::Config(anyhow::anyhow!(
                "Экран {} слишком мал для зон (угол {}px, верхняя полоса {}px)",
                screen,
                geometry.corner_band_px,
                geometry.top_band_px
            )));
        }

        Ok(Self { geometry, screen })
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Правила приоритета (первое совпадение побеждает):
    /// 1. `y < always_top` - всегда `top`;
    /// 2. верхняя полоса: углы слева/справа, иначе `top`;
    /// 3. нижние углы;
    /// 4-5. левый/правый край.
    pub fn classify(&self, x: i32, y: i32) -> Option<Zone> {
        let g = &self.geometry;
        let (width, height) = (self.screen.width, self.screen.height);

        if y < g.always_top_px {
            return Some(Zone::Top);
        }

        if y < g.top_band_px {
            return Some(if x < g.corner_band_px {
                Zone::TopLeft
            } else if x > width - g.corner_band_px {
                Zone::TopRight
            } else {
                Zone::Top
            });
        }

        if y > height - g.corner_band_px {
            if x < g.corner_band_px {
                return Some(Zone::BottomLeft);
            }
            if x > width - g.corner_band_px {
                return Some(Zone::BottomRight);
            }
        }

        if x < g.edge_band_px {
            Some(Zone::Left)
        } else if x > width - g.edge_band_px {
            Some(Zone::Right)
        } else {
            None
        }
    }

    /// Исходные границы зоны. Точка классифицируется как `zone`
    /// тогда и только тогда, когда лежит в одном из прямоугольников.
    pub fn regions(&self, zone: Zone) -> SmallVec<[Rect; 2]> {
        let g = &self.geometry;
        let (w, h) = (self.screen.width, self.screen.height);
        // Первый столбец/строка, попадающие под строгое "x > w - band"
        let right_corner = w - g.corner_band_px + 1;
        let right_edge = w - g.edge_band_px + 1;
        let bottom_corner = h - g.corner_band_px + 1;

        match zone {
            Zone::Top => smallvec![
                Rect::new(0, 0, w, g.always_top_px),
                Rect::new(g.corner_band_px, g.always_top_px, right_corner, g.top_band_px),
            ],
            Zone::TopLeft => smallvec![Rect::new(0, g.always_top_px, g.corner_band_px, g.top_band_px)],
            Zone::TopRight => smallvec![Rect::new(right_corner, g.always_top_px, w, g.top_band_px)],
            Zone::BottomLeft => smallvec![Rect::new(0, bottom_corner, g.corner_band_px, h)],
            Zone::BottomRight => smallvec![Rect::new(right_corner, bottom_corner, w, h)],
            Zone::Left => smallvec![Rect::new(0, g.top_band_px, g.edge_band_px, bottom_corner)],
            Zone::Right => smallvec![Rect::new(right_edge, g.top_band_px, w, bottom_corner)],
        }
    }

    pub fn hysteresis(&self, zone: Zone) -> i32 {
        match zone {
            Zone::Top => self.geometry.top_hysteresis_px,
            _ => self.geometry.edge_hysteresis_px,
        }
    }

    /// Остаётся ли указатель в уже активированной зоне с учётом гистерезиса.
    /// Расширяются только границы `zone`, соседние зоны не затрагиваются.
    pub fn retains(&self, zone: Zone, x: i32, y: i32) -> bool {
        let margin = self.hysteresis(zone);
        self.regions(zone)
            .iter()
            .any(|rect| rect.inflate(margin).contains(x, y))
    }
}
