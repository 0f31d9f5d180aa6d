use crate::error::{Result, SnapError};
use tracing::{info, warn};

/// Проверить, что окружение позволяет опрашивать X-сервер
pub fn check_display_environment(configured: Option<&str>) -> Result<()> {
    info!("Проверка окружения X11...");

    let resolved = resolve_display(configured, std::env::var("DISPLAY").ok())
        .ok_or_else(|| {
            SnapError::Config(anyhow::anyhow!(
                "X-дисплей не задан: укажите --display или переменную DISPLAY"
            ))
        })?;
    info!("Используется дисплей {}", resolved);

    if let Some(warning) = session_warning(std::env::var("XDG_SESSION_TYPE").ok().as_deref()) {
        warn!("{}", warning);
    }

    Ok(())
}

/// Явно заданный дисплей важнее `$DISPLAY`; пустые значения не считаются.
fn resolve_display(configured: Option<&str>, env: Option<String>) -> Option<String> {
    configured
        .map(str::to_string)
        .or(env)
        .filter(|display| !display.trim().is_empty())
}

fn session_warning(session_type: Option<&str>) -> Option<&'static str> {
    match session_type {
        Some("wayland") => Some(
            "Сессия Wayland: через XWayland виден только указатель над X-клиентами, \
             жесты над нативными окнами Wayland не будут распознаны",
        ),
        Some("tty") => Some("Сессия tty: графический сервер, скорее всего, недоступен"),
        _ => None,
    }
}
