use crate::error::Result;
use crate::snap_error;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Идентификатор окна X11 (XID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for WindowId {
    type Err = crate::error::SnapError;

    /// Принимает как шестнадцатеричную (`0x1a00003`), так и десятичную запись.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => trimmed.parse::<u32>(),
        };

        match parsed {
            Ok(0) => Err(snap_error!(invalid_window_id, "'{}': XID не может быть нулевым", s)),
            Ok(id) => Ok(WindowId(id)),
            Err(e) => Err(snap_error!(invalid_window_id, "'{}': {}", s, e)),
        }
    }
}

// В потоке событий окно всегда передаётся строкой "0x..."
impl Serialize for WindowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Окна, которые никогда не считаются объектом перетаскивания
/// (собственные always-on-top поверхности оболочки и т.п.).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedSet {
    ids: HashSet<WindowId>,
}

impl ProtectedSet {
    #[cfg(test)]
    pub fn new(ids: impl IntoIterator<Item = WindowId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Разобрать список из конфигурации. Любой некорректный идентификатор - ошибка.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let ids = raw
            .iter()
            .map(|id| id.parse::<WindowId>())
            .collect::<Result<HashSet<_>>>()?;
        Ok(Self { ids })
    }

    pub fn is_protected(&self, id: WindowId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl fmt::Display for ProtectedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut ids: Vec<_> = self.ids.iter().collect();
        ids.sort_by_key(|id| id.0);
        let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        write!(f, "{}", rendered.join(", "))
    }
}
