use crate::error::Result;
use crate::events::{Sample, Screen, WindowId};
use tracing::info;

use super::r#trait::PointerSampler;

/// Окно, которое "перетаскивается" в режиме эмуляции
pub const DRY_RUN_WINDOW: WindowId = WindowId(0xd0d0);

struct Gesture {
    name: &'static str,
    window: Option<WindowId>,
    to: (i32, i32),
    hold_ticks: usize,
}

const GESTURES: [Gesture; 5] = [
    Gesture {
        name: "привязка к левой половине",
        window: Some(DRY_RUN_WINDOW),
        to: (8, 540),
        hold_ticks: 10,
    },
    Gesture {
        name: "панель раскладок у верхнего края",
        window: Some(DRY_RUN_WINDOW),
        to: (960, 12),
        hold_ticks: 15,
    },
    Gesture {
        name: "привязка к правому верхнему углу",
        window: Some(DRY_RUN_WINDOW),
        to: (1910, 60),
        hold_ticks: 10,
    },
    Gesture {
        name: "перетаскивание без привязки",
        window: Some(DRY_RUN_WINDOW),
        to: (400, 300),
        hold_ticks: 10,
    },
    Gesture {
        name: "перетаскивание без активного окна",
        window: None,
        to: (8, 540),
        hold_ticks: 10,
    },
];

const START: (i32, i32) = (960, 540);
const MOVE_TICKS: i32 = 8;
const IDLE_TICKS: usize = 5;

struct Frame {
    label: Option<&'static str>,
    sample: Sample,
}

/// Эмуляция указателя без X-сервера: по кругу проигрывает набор жестов
/// на виртуальном экране 1920x1080.
pub struct DryRunSampler {
    frames: Vec<Frame>,
    cursor: usize,
    current: usize,
}

impl DryRunSampler {
    pub fn new() -> Self {
        let frames = GESTURES.iter().flat_map(Self::gesture_frames).collect();
        Self {
            frames,
            cursor: 0,
            current: 0,
        }
    }

    fn gesture_frames(gesture: &Gesture) -> Vec<Frame> {
        let held = |x, y| Sample {
            x,
            y,
            button_held: true,
            active_window: gesture.window,
        };
        let (tx, ty) = gesture.to;

        let mut frames = Vec::new();
        for step in 0..=MOVE_TICKS {
            let x = START.0 + (tx - START.0) * step / MOVE_TICKS;
            let y = START.1 + (ty - START.1) * step / MOVE_TICKS;
            frames.push(Frame {
                label: (step == 0).then_some(gesture.name),
                sample: held(x, y),
            });
        }
        for _ in 0..gesture.hold_ticks {
            frames.push(Frame {
                label: None,
                sample: held(tx, ty),
            });
        }
        for _ in 0..IDLE_TICKS {
            frames.push(Frame {
                label: None,
                sample: Sample::released(tx, ty),
            });
        }
        frames
    }

    pub fn cycle_len(&self) -> usize {
        self.frames.len()
    }
}

impl Default for DryRunSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PointerSampler for DryRunSampler {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn screen(&self) -> Screen {
        Screen::new(1920, 1080)
    }

    async fn probe(&mut self) -> Result<()> {
        info!(
            "Dry-run режим - сэмплер проигрывает {} жестов ({} тиков за цикл)",
            GESTURES.len(),
            self.cycle_len()
        );
        Ok(())
    }

    async fn poll(&mut self) -> Result<Sample> {
        let sample = self.frames[self.cursor].sample;
        if let Some(label) = self.frames[self.cursor].label {
            info!("Dry-run: эмулируем жест: {}", label);
        }
        self.current = self.cursor;
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(sample)
    }

    async fn active_window(&mut self) -> Result<Option<WindowId>> {
        Ok(self.frames[self.current].sample.active_window)
    }
}
