use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::signal::{self, unix::SignalKind};
use tokio::sync::watch;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;
mod zones;

use config::{Config, Overrides};
use events::SnapEvent;
use services::{
    create_sampler,
    DragContext,
    DragMachine,
    EventEmitter,
    MonotonicClock,
    SnapDetector,
};

#[derive(Parser, Debug)]
#[command(name = "snapzone")]
#[command(about = "Детектор жестов перетаскивания окна к краям экрана (snap layouts)")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "snapzone.toml")]
    config: String,

    /// XID окон, которые никогда не считаются объектом перетаскивания
    #[arg(long, num_args = 1..)]
    protected: Vec<String>,

    /// Интервал опроса указателя в миллисекундах
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// X-дисплей (по умолчанию $DISPLAY)
    #[arg(long)]
    display: Option<String>,

    /// Режим сухого запуска (эмуляция жестов без X-сервера)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (detector, stop_rx) = match start(args).await {
        Ok(started) => started,
        Err(e) => {
            // Логирование могло ещё не быть инициализировано: текст ошибки
            // попадёт в stderr при возврате из main
            report_startup_failure(&mut EventEmitter::stdout(false), &e);
            return Err(e);
        }
    };

    // Фатальная ошибка цикла уже отправлена в поток событий самим детектором
    detector
        .run(stop_rx)
        .await
        .context("Детектор остановлен из-за неустранимой ошибки")?;

    info!("snapzone завершил работу");
    Ok(())
}

/// stdout - поток событий: UI должен увидеть и ошибку запуска
fn report_startup_failure<W: Write>(emitter: &mut EventEmitter<W>, e: &anyhow::Error) {
    if let Err(emit_error) = emitter.emit(&SnapEvent::error(format!("{:#}", e))) {
        warn!("Не удалось отправить ошибку запуска в поток событий: {}", emit_error);
    }
}

async fn start(args: Args) -> Result<(SnapDetector, watch::Receiver<bool>)> {
    let overrides = Overrides {
        protected: args.protected.clone(),
        poll_interval_ms: args.poll_interval_ms,
        display: args.display.clone(),
    };

    // Загрузка конфигурации
    let config = Config::load_with(&args.config, &overrides)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск snapzone v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - жесты эмулируются, X-сервер не используется");
    } else {
        utils::check_display_environment(config.detector.display.as_deref())?;
    }

    // Инициализация компонентов
    let mut sampler = create_sampler(&config, args.dry_run)
        .context("Не удалось подключиться к оконной системе")?;
    sampler
        .probe()
        .await
        .with_context(|| format!("Сэмплер {} не отвечает", sampler.name()))?;

    let context = DragContext::from_config(&config, sampler.screen())?;
    let detector = SnapDetector::new(
        sampler,
        DragMachine::new(context),
        EventEmitter::stdout(args.dry_run),
        Arc::new(MonotonicClock),
    )
    .with_poll_interval(config.poll_interval())
    .with_failure_limit(config.detector.max_consecutive_failures);

    info!("Все компоненты инициализированы");

    // Ожидание сигнала завершения
    let mut terminate = signal::unix::signal(SignalKind::terminate())
        .context("Не удалось установить обработчик SIGTERM")?;
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            },
            _ = terminate.recv() => info!("Получен сигнал завершения (SIGTERM)"),
        }
        let _ = stop_tx.send(true);
    });

    Ok((detector, stop_rx))
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    // stdout занят потоком событий, все логи - в stderr
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "compact" => registry.with(layer.compact()).init(),
        _ => registry.with(layer).init(),
    }

    Ok(())
}
