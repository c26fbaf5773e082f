//! Transient toast notifications.
//!
//! Fire-and-forget: every notification is appended, shown for
//! [`TOAST_VISIBLE_FOR`], faded for [`TOAST_FADE_FOR`], then dropped. There is
//! no queueing, deduplication or rate limiting; several toasts simply stack.

use std::{
    fmt,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

pub const TOAST_VISIBLE_FOR: Duration = Duration::from_millis(3000);
pub const TOAST_FADE_FOR: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Danger,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Danger => "danger",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub notification: Notification,
    pub created_at: Instant,
    pub phase: ToastPhase,
}

impl Toast {
    /// Opacity in `0.0..=1.0` for renderers that animate the fade.
    pub fn opacity(&self, now: Instant) -> f32 {
        match self.phase {
            ToastPhase::Visible => 1.0,
            ToastPhase::Fading => {
                let faded = now
                    .saturating_duration_since(self.created_at)
                    .saturating_sub(TOAST_VISIBLE_FOR);
                1.0 - (faded.as_secs_f32() / TOAST_FADE_FOR.as_secs_f32()).min(1.0)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct NotificationCenter {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification, now: Instant) -> u64 {
        self.next_id += 1;
        self.toasts.push(Toast {
            id: self.next_id,
            notification,
            created_at: now,
            phase: ToastPhase::Visible,
        });
        self.next_id
    }

    /// Advances every toast's lifecycle to `now` and drops the finished ones.
    pub fn tick(&mut self, now: Instant) {
        self.toasts.retain_mut(|toast| {
            let age = now.saturating_duration_since(toast.created_at);
            if age >= TOAST_VISIBLE_FOR + TOAST_FADE_FOR {
                return false;
            }
            if age >= TOAST_VISIBLE_FOR {
                toast.phase = ToastPhase::Fading;
            }
            true
        });
    }

    /// Starts the fade early, as the close button does.
    pub fn dismiss(&mut self, id: u64, now: Instant) {
        if let Some(toast) = self.toasts.iter_mut().find(|toast| toast.id == id) {
            if toast.phase == ToastPhase::Visible {
                toast.created_at = now.checked_sub(TOAST_VISIBLE_FOR).unwrap_or(now);
                toast.phase = ToastPhase::Fading;
            }
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// When the next phase change is due, for scheduling a repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.toasts
            .iter()
            .map(|toast| match toast.phase {
                ToastPhase::Visible => toast.created_at + TOAST_VISIBLE_FOR,
                ToastPhase::Fading => toast.created_at + TOAST_VISIBLE_FOR + TOAST_FADE_FOR,
            })
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toast(message: &str) -> Notification {
        Notification::new(NotificationLevel::Info, message)
    }

    #[test]
    fn toast_hides_after_visible_window_then_is_removed_after_fade() {
        let start = Instant::now();
        let mut center = NotificationCenter::new();
        center.push(toast("Cache cleared!"), start);

        center.tick(start + Duration::from_millis(2999));
        assert_eq!(center.toasts()[0].phase, ToastPhase::Visible);

        center.tick(start + Duration::from_millis(3000));
        assert_eq!(center.toasts()[0].phase, ToastPhase::Fading);

        center.tick(start + Duration::from_millis(3499));
        assert_eq!(center.toasts().len(), 1);

        center.tick(start + Duration::from_millis(3500));
        assert!(center.is_empty());
    }

    #[test]
    fn identical_notifications_stack() {
        let start = Instant::now();
        let mut center = NotificationCenter::new();
        let first = center.push(toast("Network error."), start);
        let second = center.push(toast("Network error."), start + Duration::from_millis(10));
        assert_ne!(first, second);
        assert_eq!(center.toasts().len(), 2);

        center.tick(start + Duration::from_millis(3505));
        assert_eq!(center.toasts().len(), 1);
        assert_eq!(center.toasts()[0].id, second);
    }

    #[test]
    fn dismiss_starts_fade_immediately() {
        let start = Instant::now() + Duration::from_secs(10);
        let mut center = NotificationCenter::new();
        let id = center.push(toast("Please enter a question."), start);

        let clicked = start + Duration::from_millis(200);
        center.dismiss(id, clicked);
        assert_eq!(center.toasts()[0].phase, ToastPhase::Fading);
        assert_eq!(center.next_deadline(), Some(clicked + TOAST_FADE_FOR));

        center.tick(clicked + TOAST_FADE_FOR);
        assert!(center.is_empty());
    }

    #[test]
    fn opacity_falls_during_fade() {
        let start = Instant::now();
        let mut center = NotificationCenter::new();
        center.push(toast("x"), start);
        let midway = start + TOAST_VISIBLE_FOR + Duration::from_millis(250);
        center.tick(midway);
        let opacity = center.toasts()[0].opacity(midway);
        assert!((opacity - 0.5).abs() < 0.01, "opacity was {opacity}");
    }
}
