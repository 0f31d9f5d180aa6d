use crate::error::{Result, SnapError};
use crate::events::SnapEvent;
use crate::services::clock::Clock;
use crate::services::drag_state::DragMachine;
use crate::services::emitter::EventEmitter;
use crate::services::sampler::PointerSampler;
use crate::trace_if_enabled;
use std::io::{Stdout, Write};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30);
pub const DEFAULT_FAILURE_LIMIT: u32 = 3;

/// Цикл опроса: сэмпл -> классификация -> переход автомата -> вывод.
///
/// Весь тик выполняется последовательно в одном потоке, поэтому состояние
/// автомата никогда не наблюдается посреди перехода.
pub struct SnapDetector<W: Write = Stdout> {
    sampler: Box<dyn PointerSampler>,
    machine: DragMachine,
    emitter: EventEmitter<W>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    failure_limit: u32,
    consecutive_failures: u32,
    sessions: u64,
}

impl<W: Write> SnapDetector<W> {
    pub fn new(
        sampler: Box<dyn PointerSampler>,
        machine: DragMachine,
        emitter: EventEmitter<W>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!("Инициализация SnapDetector (сэмплер: {})", sampler.name());
        Self {
            sampler,
            machine,
            emitter,
            clock,
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_limit: DEFAULT_FAILURE_LIMIT,
            consecutive_failures: 0,
            sessions: 0,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_failure_limit(mut self, failure_limit: u32) -> Self {
        self.failure_limit = failure_limit.max(1);
        self
    }

    /// Крутит тики до сигнала остановки. Флаг проверяется в начале каждой итерации.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let classifier = self.machine.context().classifier();
        info!(
            "SnapDetector запущен: экран {}, интервал {}мс, защищённые окна: {}",
            classifier.screen(),
            self.poll_interval.as_millis(),
            self.machine.context().protected()
        );

        let mut ticker = interval(self.poll_interval);
        // После долгого тика не догоняем пропущенные - просто сдвигаем расписание
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        warn!("Канал остановки закрыт - завершаем цикл опроса");
                        break;
                    }
                    continue;
                }
            }

            if let Err(e) = self.tick().await {
                error!("SnapDetector остановлен из-за ошибки: {}", e);
                return Err(e);
            }
        }

        if self.machine.is_dragging() {
            warn!("Остановка посреди перетаскивания - сессия отброшена без события");
        }
        info!(
            "SnapDetector завершил работу: сессий перетаскивания {}, отправлено событий {}",
            self.sessions,
            self.emitter.emitted()
        );
        Ok(())
    }

    /// Один тик. `Ok` - можно продолжать, `Err` - только фатальные ошибки.
    pub async fn tick(&mut self) -> Result<()> {
        match self.sampler.poll().await {
            Ok(sample) => {
                trace_if_enabled!("Тик: {}", sample);
                if self.consecutive_failures > 0 {
                    info!("Опрос восстановлен после {} ошибок", self.consecutive_failures);
                    self.consecutive_failures = 0;
                }
                let now = self.clock.now();
                let events = self.machine.advance(&sample, now);
                self.sessions += events.iter().filter(|e| e.is_terminal()).count() as u64;
                self.emitter.emit_all(&events)
            }
            Err(e) if e.is_fatal() => {
                error!("Фатальная ошибка опроса: {}", e);
                self.emitter.emit(&SnapEvent::error(e.to_string()))?;
                Err(e)
            }
            Err(e) => {
                // Тик пропускается целиком: автомат этот сэмпл не видит
                self.consecutive_failures += 1;
                warn!(
                    "Ошибка опроса ({}/{}): {}",
                    self.consecutive_failures, self.failure_limit, e
                );
                self.emitter.emit(&SnapEvent::error(e.to_string()))?;

                if self.consecutive_failures >= self.failure_limit {
                    let lost = SnapError::SamplingLost {
                        count: self.consecutive_failures,
                        last: e.to_string(),
                    };
                    self.emitter.emit(&SnapEvent::error(lost.to_string()))?;
                    return Err(lost);
                }
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub fn machine(&self) -> &DragMachine {
        &self.machine
    }

    #[cfg(test)]
    pub fn into_emitter(self) -> EventEmitter<W> {
        self.emitter
    }
}
