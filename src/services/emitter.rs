use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::SnapEvent;
use std::io::{self, Stdout, Write};
use tracing::info;

/// Пишет события в поток построчно: один JSON-объект на строку, в порядке поступления.
pub struct EventEmitter<W: Write = Stdout> {
    out: W,
    dry_run: bool,
    emitted: u64,
}

impl EventEmitter<Stdout> {
    pub fn stdout(dry_run: bool) -> Self {
        Self::new(io::stdout(), dry_run)
    }
}

impl<W: Write> EventEmitter<W> {
    pub fn new(out: W, dry_run: bool) -> Self {
        info!("Инициализация EventEmitter (dry_run: {})", dry_run);
        Self {
            out,
            dry_run,
            emitted: 0,
        }
    }

    /// Ошибка записи означает, что потребитель событий пропал - это фатально.
    pub fn emit(&mut self, event: &SnapEvent) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Событие: {}", event);
        } else {
            debug_if_enabled!("Событие: {}", event);
        }

        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        // UI читает поток построчно - без flush события застрянут в буфере
        self.out.flush()?;

        self.emitted += 1;
        Ok(())
    }

    pub fn emit_all<'a>(&mut self, events: impl IntoIterator<Item = &'a SnapEvent>) -> Result<()> {
        for event in events {
            self.emit(event)?;
        }
        Ok(())
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
