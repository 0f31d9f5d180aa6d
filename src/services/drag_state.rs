//! Drag state machine: the only stateful part of the detector.
//!
//! The whole state is one value (`MachineState`) advanced by the pure
//! function [`transition`]. Time comes in as an argument, so hold-time and
//! grace-period behaviour is tested without sleeping.

use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{ProtectedSet, Sample, Screen, SnapEvent, TickEvents, WindowId};
use crate::zones::{Zone, ZoneClassifier};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::info;

/// Временные пороги автомата (миллисекунды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DragTimings {
    /// Удержание для `top` - панель раскладок должна открываться мгновенно
    pub top_hold_ms: u64,
    /// Удержание для боковых краёв и углов
    pub edge_hold_ms: u64,
    pub grace_period_ms: u64,
}

impl Default for DragTimings {
    fn default() -> Self {
        Self {
            top_hold_ms: 0,
            edge_hold_ms: 100,
            grace_period_ms: 500,
        }
    }
}

impl DragTimings {
    pub fn hold_for(&self, zone: Zone) -> Duration {
        match zone {
            Zone::Top => Duration::from_millis(self.top_hold_ms),
            _ => Duration::from_millis(self.edge_hold_ms),
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// Где находится указатель относительно зон в рамках сессии.
/// "Активирована без зоны" здесь просто не выражается.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Outside,
    Pending { zone: Zone, since: Instant },
    Active { zone: Zone },
}

impl Occupancy {
    pub fn zone(&self) -> Option<Zone> {
        match *self {
            Occupancy::Outside => None,
            Occupancy::Pending { zone, .. } | Occupancy::Active { zone } => Some(zone),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// Захватывается при нажатии и больше не перечитывается: UI, укравший
    /// фокус во время перетаскивания, не должен подменить окно.
    pub window: WindowId,
    pub occupancy: Occupancy,
}

impl DragSession {
    fn new(window: WindowId) -> Self {
        Self {
            window,
            occupancy: Occupancy::Outside,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Кнопка зажата над защищённым окном: до отпускания сессия не начнётся
    Suppressed,
    Dragging(DragSession),
}

/// Последняя покинутая активированная зона. Переживает сессии.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceMemory {
    pub zone: Zone,
    pub left_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineState {
    pub phase: DragPhase,
    pub grace: Option<GraceMemory>,
}

/// Неизменяемые входы автомата: геометрия, тайминги, защищённые окна.
#[derive(Debug, Clone)]
pub struct DragContext {
    classifier: ZoneClassifier,
    timings: DragTimings,
    protected: ProtectedSet,
}

impl DragContext {
    pub fn new(classifier: ZoneClassifier, timings: DragTimings, protected: ProtectedSet) -> Self {
        Self {
            classifier,
            timings,
            protected,
        }
    }

    pub fn from_config(config: &Config, screen: Screen) -> Result<Self> {
        let classifier = ZoneClassifier::new(config.zones, screen)?;
        let protected = ProtectedSet::parse(&config.protected)?;
        info!("Защищённых окон: {} ({})", protected.len(), protected);
        Ok(Self::new(classifier, config.timing, protected))
    }

    pub fn classifier(&self) -> &ZoneClassifier {
        &self.classifier
    }

    pub fn protected(&self) -> &ProtectedSet {
        &self.protected
    }

    fn within_grace(&self, grace: Option<&GraceMemory>, zone: Zone, now: Instant) -> bool {
        grace.is_some_and(|g| {
            g.zone == zone && now.saturating_duration_since(g.left_at) < self.timings.grace_period()
        })
    }

    fn track(
        &self,
        mut session: DragSession,
        sample: &Sample,
        now: Instant,
        grace: &mut Option<GraceMemory>,
        events: &mut TickEvents,
    ) -> DragSession {
        let (x, y) = (sample.x, sample.y);
        let raw = self.classifier.classify(x, y);

        // Гистерезис действует только на уже активированную зону
        let zone = match session.occupancy {
            Occupancy::Active { zone } if raw != Some(zone) && self.classifier.retains(zone, x, y) => {
                Some(zone)
            }
            _ => raw,
        };

        let window_id = session.window;
        let mut entered_now = false;

        if zone != session.occupancy.zone() {
            if let Occupancy::Active { zone: left } = session.occupancy {
                debug_if_enabled!("Выход из зоны {} в ({}, {})", left, x, y);
                events.push(SnapEvent::ZoneLeave { x, y });
                *grace = Some(GraceMemory { zone: left, left_at: now });
            }

            session.occupancy = match zone {
                None => Occupancy::Outside,
                Some(zone) if self.within_grace(grace.as_ref(), zone, now) => {
                    debug_if_enabled!("Повторный вход в {} в пределах grace-периода", zone);
                    events.push(SnapEvent::ZoneEnter { zone, x, y, window_id });
                    entered_now = true;
                    Occupancy::Active { zone }
                }
                Some(zone) => Occupancy::Pending { zone, since: now },
            };
        }

        let occupancy = session.occupancy;
        match occupancy {
            Occupancy::Pending { zone, since }
                if now.saturating_duration_since(since) >= self.timings.hold_for(zone) =>
            {
                info!("Зона {} активирована для окна {}", zone, window_id);
                events.push(SnapEvent::ZoneEnter { zone, x, y, window_id });
                session.occupancy = Occupancy::Active { zone };
            }
            Occupancy::Active { zone: Zone::Top } if !entered_now => {
                events.push(SnapEvent::DragPosition {
                    zone: Zone::Top,
                    x,
                    y,
                    window_id,
                });
            }
            _ => {}
        }

        session
    }

    fn finish(
        &self,
        session: DragSession,
        sample: &Sample,
        now: Instant,
        grace: &mut Option<GraceMemory>,
    ) -> SnapEvent {
        match session.occupancy {
            Occupancy::Active { zone } => {
                info!("Привязка окна {} к зоне {}", session.window, zone);
                // Отпускание тоже считается выходом из зоны: повторное нажатие
                // у того же края сразу после привязки не ждёт удержания
                *grace = Some(GraceMemory { zone, left_at: now });
                SnapEvent::SnapApply {
                    zone,
                    x: sample.x,
                    y: sample.y,
                    window_id: session.window,
                }
            }
            Occupancy::Outside | Occupancy::Pending { .. } => {
                debug_if_enabled!("Перетаскивание окна {} завершено без привязки", session.window);
                SnapEvent::DragEnd
            }
        }
    }
}

/// Один шаг автомата: `(состояние, сэмпл, время) -> (состояние, события)`.
pub fn transition(
    ctx: &DragContext,
    state: MachineState,
    sample: &Sample,
    now: Instant,
) -> (MachineState, TickEvents) {
    let MachineState { phase, mut grace } = state;
    let mut events = TickEvents::new();

    let phase = match phase {
        DragPhase::Idle if sample.button_held => match sample.active_window {
            Some(window) if !ctx.protected.is_protected(window) => {
                info!("Начало перетаскивания окна {} в ({}, {})", window, sample.x, sample.y);
                let session = ctx.track(DragSession::new(window), sample, now, &mut grace, &mut events);
                DragPhase::Dragging(session)
            }
            Some(window) => {
                debug_if_enabled!("Окно {} защищено - перетаскивание игнорируется", window);
                DragPhase::Suppressed
            }
            // WM мог ещё не обновить _NET_ACTIVE_WINDOW: ждём следующего сэмпла
            None => {
                debug_if_enabled!("Кнопка зажата, активное окно пока неизвестно");
                DragPhase::Idle
            }
        },
        DragPhase::Idle => DragPhase::Idle,
        DragPhase::Suppressed if sample.button_held => DragPhase::Suppressed,
        DragPhase::Suppressed => DragPhase::Idle,
        DragPhase::Dragging(session) if sample.button_held => {
            DragPhase::Dragging(ctx.track(session, sample, now, &mut grace, &mut events))
        }
        DragPhase::Dragging(session) => {
            events.push(ctx.finish(session, sample, now, &mut grace));
            DragPhase::Idle
        }
    };

    (MachineState { phase, grace }, events)
}

/// Владелец состояния автомата для цикла опроса.
#[derive(Debug)]
pub struct DragMachine {
    context: DragContext,
    state: MachineState,
}

impl DragMachine {
    pub fn new(context: DragContext) -> Self {
        Self {
            context,
            state: MachineState::default(),
        }
    }

    pub fn advance(&mut self, sample: &Sample, now: Instant) -> TickEvents {
        let state = std::mem::take(&mut self.state);
        let (next, events) = transition(&self.context, state, sample, now);
        self.state = next;
        events
    }

    #[cfg(test)]
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn context(&self) -> &DragContext {
        &self.context
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state.phase, DragPhase::Dragging(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneGeometry;

    const WINDOW: WindowId = WindowId(0x100);
    const PROTECTED: WindowId = WindowId(0x1a00003);

    /// Автомат с экраном 1920x1080 и виртуальным временем в миллисекундах
    struct Script {
        machine: DragMachine,
        base: Instant,
    }

    impl Script {
        fn new() -> Self {
            Self::with_timings(DragTimings::default())
        }

        fn with_timings(timings: DragTimings) -> Self {
            let classifier =
                ZoneClassifier::new(ZoneGeometry::default(), Screen::new(1920, 1080)).unwrap();
            let context = DragContext::new(classifier, timings, ProtectedSet::new([PROTECTED]));
            Self {
                machine: DragMachine::new(context),
                base: Instant::now(),
            }
        }

        fn at(&mut self, ms: u64, sample: Sample) -> Vec<SnapEvent> {
            let now = self.base + Duration::from_millis(ms);
            self.machine.advance(&sample, now).into_vec()
        }

        fn held(&mut self, ms: u64, x: i32, y: i32) -> Vec<SnapEvent> {
            self.at(ms, Sample::pressed(x, y, WINDOW))
        }

        fn release(&mut self, ms: u64, x: i32, y: i32) -> Vec<SnapEvent> {
            self.at(ms, Sample::released(x, y))
        }
    }

    fn enter(zone: Zone, x: i32, y: i32) -> SnapEvent {
        SnapEvent::ZoneEnter { zone, x, y, window_id: WINDOW }
    }

    fn apply(zone: Zone, x: i32, y: i32) -> SnapEvent {
        SnapEvent::SnapApply { zone, x, y, window_id: WINDOW }
    }

    #[test]
    fn test_left_edge_snap_scenario() {
        let mut s = Script::new();
        assert!(s.held(0, 960, 900).is_empty());
        assert!(s.machine.is_dragging());

        assert!(s.held(30, 10, 500).is_empty());
        assert!(s.held(90, 10, 500).is_empty());
        assert_eq!(s.held(180, 10, 500), vec![enter(Zone::Left, 10, 500)]);

        assert_eq!(s.release(210, 10, 500), vec![apply(Zone::Left, 10, 500)]);
        assert!(!s.machine.is_dragging());
    }

    #[test]
    fn test_protected_window_produces_no_events() {
        let mut s = Script::new();
        assert!(s.at(0, Sample::pressed(960, 900, PROTECTED)).is_empty());
        assert!(s.at(30, Sample::pressed(10, 500, PROTECTED)).is_empty());
        assert!(s.at(300, Sample::pressed(10, 500, PROTECTED)).is_empty());
        assert!(s.at(330, Sample::released(10, 500)).is_empty());
        assert_eq!(s.machine.state().phase, DragPhase::Idle);
    }

    #[test]
    fn test_focus_change_mid_press_does_not_start_session() {
        let mut s = Script::new();
        assert!(s.at(0, Sample::pressed(960, 900, PROTECTED)).is_empty());
        // Окно стало допустимым, но кнопку так и не отпускали
        assert!(s.held(30, 10, 500).is_empty());
        assert!(s.held(300, 10, 500).is_empty());
        assert!(s.release(330, 10, 500).is_empty());
    }

    #[test]
    fn test_session_waits_for_known_active_window() {
        let mut s = Script::new();
        assert!(s.at(0, Sample::new(960, 900, true)).is_empty());
        assert!(!s.machine.is_dragging());

        // Окно стало известно на следующем тике - сессия начинается с него
        let mut events = Vec::new();
        for tick in 1..=9 {
            events.extend(s.held(tick * 30, 10, 500));
        }
        assert!(s.machine.is_dragging());
        assert_eq!(events, vec![enter(Zone::Left, 10, 500)]);
        assert_eq!(s.release(300, 10, 500), vec![apply(Zone::Left, 10, 500)]);
    }

    #[test]
    fn test_unknown_window_until_release_produces_no_events() {
        let mut s = Script::new();
        assert!(s.at(0, Sample::new(10, 500, true)).is_empty());
        assert!(s.at(300, Sample::new(10, 500, true)).is_empty());
        assert!(s.release(330, 10, 500).is_empty());
    }

    #[test]
    fn test_locked_window_survives_focus_steal() {
        let mut s = Script::new();
        s.held(0, 960, 900);
        // UI раскладок забрал фокус - сессия продолжает ссылаться на 0x100
        let other = WindowId(0x2800003);
        assert_eq!(
            s.at(10, Sample::pressed(960, 10, other)),
            vec![enter(Zone::Top, 960, 10)]
        );
        assert_eq!(s.at(40, Sample::released(960, 10)), vec![apply(Zone::Top, 960, 10)]);
    }

    #[test]
    fn test_top_zone_scenario() {
        let mut s = Script::new();
        s.held(0, 960, 900);
        assert_eq!(s.held(30, 960, 20), vec![enter(Zone::Top, 960, 20)]);
        assert_eq!(
            s.held(60, 960, 45),
            vec![SnapEvent::DragPosition { zone: Zone::Top, x: 960, y: 45, window_id: WINDOW }]
        );
        assert_eq!(s.release(90, 960, 45), vec![apply(Zone::Top, 960, 45)]);
    }

    #[test]
    fn test_release_before_hold_time_ends_drag() {
        let mut s = Script::new();
        s.held(0, 960, 900);
        assert!(s.held(30, 10, 500).is_empty());
        assert!(s.held(60, 10, 500).is_empty());
        assert_eq!(s.release(90, 10, 500), vec![SnapEvent::DragEnd]);
    }

    #[test]
    fn test_leaving_unactivated_zone_is_silent() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        assert!(s.held(50, 960, 500).is_empty());
        // Таймер перезапускается при повторном входе
        assert!(s.held(80, 10, 500).is_empty());
        assert!(s.held(150, 10, 500).is_empty());
        assert_eq!(s.held(180, 10, 500), vec![enter(Zone::Left, 10, 500)]);
    }

    #[test]
    fn test_motionless_pointer_is_idempotent() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        assert_eq!(s.held(100, 10, 500), vec![enter(Zone::Left, 10, 500)]);
        for tick in 1..20 {
            assert!(s.held(100 + tick * 30, 10, 500).is_empty());
        }

        let mut s = Script::new();
        assert_eq!(s.held(0, 960, 10), vec![enter(Zone::Top, 960, 10)]);
        for tick in 1..20 {
            let events = s.held(tick * 30, 960, 10);
            assert!(matches!(events.as_slice(), [SnapEvent::DragPosition { .. }]));
        }
    }

    #[test]
    fn test_hysteresis_keeps_activated_zone() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        s.held(100, 10, 500);

        // 30 + 15: всё, что левее 45, ещё "left"
        assert!(s.held(130, 44, 500).is_empty());
        assert!(s.held(160, 35, 500).is_empty());
        assert_eq!(s.held(190, 45, 500), vec![SnapEvent::ZoneLeave { x: 45, y: 500 }]);
        assert_eq!(s.release(220, 45, 500), vec![SnapEvent::DragEnd]);
    }

    #[test]
    fn test_hysteresis_does_not_apply_before_activation() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        // Не активирована - отход на 40px означает выход из зоны
        assert!(s.held(50, 40, 500).is_empty());
        assert!(s.held(200, 40, 500).is_empty());
        assert_eq!(s.release(230, 40, 500), vec![SnapEvent::DragEnd]);
    }

    #[test]
    fn test_moving_between_zones() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        s.held(100, 10, 500);
        // Из left в нижний левый угол: сначала уход, затем новое удержание
        assert_eq!(s.held(130, 40, 1075), vec![SnapEvent::ZoneLeave { x: 40, y: 1075 }]);
        assert!(s.held(160, 40, 1075).is_empty());
        assert_eq!(s.held(230, 40, 1075), vec![enter(Zone::BottomLeft, 40, 1075)]);
        assert_eq!(s.release(260, 40, 1075), vec![apply(Zone::BottomLeft, 40, 1075)]);
    }

    #[test]
    fn test_grace_period_reentry_is_immediate() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        s.held(100, 10, 500);
        assert_eq!(s.held(130, 300, 500), vec![SnapEvent::ZoneLeave { x: 300, y: 500 }]);
        // Возврат через 300 мс (< 500) - без удержания
        assert_eq!(s.held(430, 10, 500), vec![enter(Zone::Left, 10, 500)]);
        assert_eq!(s.release(460, 10, 500), vec![apply(Zone::Left, 10, 500)]);
    }

    #[test]
    fn test_grace_period_expired_requires_hold() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        s.held(100, 10, 500);
        s.held(130, 300, 500);
        assert!(s.held(630, 10, 500).is_empty());
        assert!(s.held(700, 10, 500).is_empty());
        assert_eq!(s.held(730, 10, 500), vec![enter(Zone::Left, 10, 500)]);
    }

    #[test]
    fn test_grace_period_only_for_same_zone() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        s.held(100, 10, 500);
        s.held(130, 960, 500);
        assert!(s.held(160, 1910, 500).is_empty());
        assert_eq!(s.held(260, 1910, 500), vec![enter(Zone::Right, 1910, 500)]);
    }

    #[test]
    fn test_grace_period_spans_sessions() {
        let mut s = Script::new();
        s.held(0, 10, 500);
        s.held(100, 10, 500);
        assert_eq!(s.release(120, 10, 500), vec![apply(Zone::Left, 10, 500)]);

        // Новое нажатие у того же края сразу после привязки
        assert_eq!(s.held(300, 10, 600), vec![enter(Zone::Left, 10, 600)]);
        assert_eq!(s.release(320, 10, 600), vec![apply(Zone::Left, 10, 600)]);
    }

    #[test]
    fn test_custom_top_hold_time() {
        let mut s = Script::with_timings(DragTimings {
            top_hold_ms: 50,
            ..DragTimings::default()
        });
        s.held(0, 960, 900);
        assert!(s.held(30, 960, 20).is_empty());
        assert_eq!(s.held(80, 960, 20), vec![enter(Zone::Top, 960, 20)]);
    }

    /// Детерминированный xorshift, чтобы не тянуть rand ради одного теста
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, bound: u64) -> u64 {
            self.next() % bound
        }
    }

    #[test]
    fn test_lifecycle_properties_on_random_walks() {
        let points = [
            (960, 540),
            (10, 500),
            (40, 500),
            (960, 10),
            (960, 60),
            (10, 60),
            (1910, 60),
            (10, 1075),
            (1910, 1075),
            (1910, 500),
            (1880, 500),
        ];

        for seed in 1..40u64 {
            let mut rng = XorShift(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let mut s = Script::new();
            let mut ms = 0;
            let mut held = false;
            let mut eligible_press = false;
            let mut completed_sessions = 0;
            let mut terminal_events = 0;
            let mut active: Option<Zone> = None;

            for _ in 0..400 {
                ms += 10 + rng.below(60);
                let (x, y) = points[rng.below(points.len() as u64) as usize];
                let press = rng.below(10) < 8;
                let window = if rng.below(6) == 0 { PROTECTED } else { WINDOW };

                if press && !held {
                    eligible_press = window != PROTECTED;
                }
                if !press && held && eligible_press {
                    completed_sessions += 1;
                }
                held = press;

                let sample = if press {
                    Sample::pressed(x, y, window)
                } else {
                    Sample::released(x, y)
                };

                for event in s.at(ms, sample) {
                    match event {
                        SnapEvent::ZoneEnter { zone, .. } => {
                            assert!(active.is_none(), "seed {}: двойная активация", seed);
                            active = Some(zone);
                        }
                        SnapEvent::ZoneLeave { .. } => {
                            assert!(active.take().is_some(), "seed {}: выход без входа", seed);
                        }
                        SnapEvent::DragPosition { .. } => assert_eq!(active, Some(Zone::Top)),
                        SnapEvent::SnapApply { zone, .. } => {
                            assert_eq!(active.take(), Some(zone));
                            terminal_events += 1;
                        }
                        SnapEvent::DragEnd => {
                            assert!(active.is_none());
                            terminal_events += 1;
                        }
                        SnapEvent::Error { .. } => unreachable!(),
                    }
                }
            }

            assert_eq!(terminal_events, completed_sessions, "seed {}", seed);
        }
    }
}
