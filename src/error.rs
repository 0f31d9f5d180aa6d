use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка сериализации события: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Не удалось подключиться к X-серверу: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("Соединение с X-сервером потеряно: {0}")]
    Disconnected(String),

    #[error("Ошибка опроса указателя: {0}")]
    Sampling(String),

    #[error("Опрос указателя не удался {count} раз подряд, последняя ошибка: {last}")]
    SamplingLost { count: u32, last: String },

    #[error("Неверный идентификатор окна: {0}")]
    InvalidWindowId(String),
}

impl SnapError {
    /// Ошибки, после которых продолжать цикл опроса бессмысленно.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SnapError::Sampling(_))
    }
}

impl From<x11rb::errors::ConnectionError> for SnapError {
    fn from(e: x11rb::errors::ConnectionError) -> Self {
        SnapError::Disconnected(e.to_string())
    }
}

impl From<x11rb::errors::ReplyError> for SnapError {
    fn from(e: x11rb::errors::ReplyError) -> Self {
        match e {
            x11rb::errors::ReplyError::ConnectionError(e) => e.into(),
            x11rb::errors::ReplyError::X11Error(e) => {
                SnapError::Sampling(format!("X11 вернул ошибку: {:?}", e.error_kind))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! snap_error {
    (disconnected, $($arg:tt)*) => {
        $crate::error::SnapError::Disconnected(format!($($arg)*))
    };
    (sampling, $($arg:tt)*) => {
        $crate::error::SnapError::Sampling(format!($($arg)*))
    };
    (invalid_window_id, $($arg:tt)*) => {
        $crate::error::SnapError::InvalidWindowId(format!($($arg)*))
    };
}
