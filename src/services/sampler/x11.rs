use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{Sample, Screen, WindowId};
use crate::snap_error;
use tracing::{info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _, KeyButMask, Window};
use x11rb::rust_connection::RustConnection;

use super::r#trait::PointerSampler;

/// Опрос через `XQueryPointer`: в отличие от подписки на события,
/// продолжает работать, пока оконный менеджер держит grab указателя.
pub struct X11Sampler {
    conn: RustConnection,
    root: Window,
    screen: Screen,
    net_active_window: Atom,
}

impl X11Sampler {
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display)?;

        let (root, screen) = {
            let setup_screen = conn.setup().roots.get(screen_num).ok_or_else(|| {
                snap_error!(disconnected, "X-сервер не сообщил экран #{}", screen_num)
            })?;
            (
                setup_screen.root,
                Screen::new(
                    i32::from(setup_screen.width_in_pixels),
                    i32::from(setup_screen.height_in_pixels),
                ),
            )
        };

        let net_active_window = conn
            .intern_atom(false, b"_NET_ACTIVE_WINDOW")?
            .reply()?
            .atom;

        info!("Подключено к X-серверу: экран #{} {}, root {:#x}", screen_num, screen, root);

        Ok(Self {
            conn,
            root,
            screen,
            net_active_window,
        })
    }
}

#[async_trait::async_trait]
impl PointerSampler for X11Sampler {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn screen(&self) -> Screen {
        self.screen
    }

    async fn probe(&mut self) -> Result<()> {
        let pointer = self.conn.query_pointer(self.root)?.reply()?;
        if !pointer.same_screen {
            warn!("Указатель сейчас на другом экране - координаты будут недостоверны");
        }

        match self.active_window().await? {
            Some(window) => info!("Активное окно при старте: {}", window),
            None => warn!("_NET_ACTIVE_WINDOW пуст - WM без поддержки EWMH? Сессии не будут начинаться"),
        }
        Ok(())
    }

    async fn poll(&mut self) -> Result<Sample> {
        let pointer = self.conn.query_pointer(self.root)?.reply()?;
        let button_held = u16::from(pointer.mask) & u16::from(KeyButMask::BUTTON1) != 0;

        // Активное окно нужно автомату только при зажатой кнопке
        let active_window = if button_held {
            self.active_window().await?
        } else {
            None
        };

        let sample = Sample {
            x: i32::from(pointer.root_x),
            y: i32::from(pointer.root_y),
            button_held,
            active_window,
        };
        debug_if_enabled!("X11 сэмпл: {}", sample);
        Ok(sample)
    }

    async fn active_window(&mut self) -> Result<Option<WindowId>> {
        let reply = self
            .conn
            .get_property(false, self.root, self.net_active_window, AtomEnum::WINDOW, 0, 1)?
            .reply()?;

        Ok(reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&xid| xid != 0)
            .map(WindowId))
    }
}

impl Drop for X11Sampler {
    fn drop(&mut self) {
        info!("X11Sampler завершает работу");
    }
}
