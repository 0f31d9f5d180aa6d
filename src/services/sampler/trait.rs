use crate::config::Config;
use crate::error::Result;
use crate::events::{Sample, Screen, WindowId};
use tracing::info;

/// Trait for pointer samplers that can run against a real display or a script
#[async_trait::async_trait]
pub trait PointerSampler: Send {
    fn name(&self) -> &'static str;

    /// Screen geometry, read once when the sampler is created
    fn screen(&self) -> Screen;

    /// One-off startup check that the source actually answers
    async fn probe(&mut self) -> Result<()>;

    /// Read the current pointer position, button state and active window
    async fn poll(&mut self) -> Result<Sample>;

    async fn active_window(&mut self) -> Result<Option<WindowId>>;
}

/// Factory function to create an appropriate sampler based on the dry_run flag
pub fn create_sampler(config: &Config, dry_run: bool) -> Result<Box<dyn PointerSampler>> {
    if dry_run {
        Ok(Box::new(super::dry_run::DryRunSampler::new()))
    } else {
        let target = config.detector.display.as_deref();
        info!("Подключение к X-серверу {}", target.unwrap_or("$DISPLAY"));
        Ok(Box::new(super::x11::X11Sampler::connect(target)?))
    }
}
