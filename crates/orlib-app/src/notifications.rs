use std::time::{Duration, Instant};

use egui::{self, Color32};
use orlib_module_host::FaultRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Transient toast in the dashboard's corner.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: String,
    pub detail: Option<String>,
    pub kind: NoticeKind,
    pub created: Instant,
    pub duration: Duration,
}

impl Notice {
    pub fn new(title: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            title: title.into(),
            detail: None,
            kind,
            created: Instant::now(),
            duration: Duration::from_secs(5),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// A module failure that stays on screen until dismissed.
#[derive(Debug, Clone)]
pub struct ErrorDialog {
    id: u64,
    pub heading: String,
    pub body: String,
}

#[derive(Default, Debug)]
pub struct Notifications {
    pub queue: Vec<Notice>,
    dialogs: Vec<ErrorDialog>,
    next_dialog: u64,
}

impl Notifications {
    pub fn info(&mut self, title: impl Into<String>) {
        self.queue.push(Notice::new(title, NoticeKind::Info));
    }

    pub fn warning(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        self.queue
            .push(Notice::new(title, NoticeKind::Warning).with_detail(detail));
    }

    /// Raise a dialog for a fault reported by the launch controller.
    pub fn fault(&mut self, problem_title: &str, fault: &FaultRecord) {
        let mut body = fault.message.clone();
        if let Some(cause) = &fault.cause {
            body.push('\n');
            body.push_str(cause);
        }
        self.next_dialog += 1;
        self.dialogs.push(ErrorDialog {
            id: self.next_dialog,
            heading: format!("{problem_title} stopped ({} failure)", fault.stage),
            body,
        });
        self.queue.push(Notice::new(
            format!("{problem_title} was closed after an error"),
            NoticeKind::Error,
        ));
    }

    pub fn dialogs(&self) -> &[ErrorDialog] {
        &self.dialogs
    }

    pub fn dismiss(&mut self, id: u64) {
        self.dialogs.retain(|dialog| dialog.id != id);
    }

    fn clear_finished(&mut self) {
        let now = Instant::now();
        self.queue
            .retain(|notice| now.duration_since(notice.created) < notice.duration);
    }

    pub fn paint(&mut self, ctx: &egui::Context) {
        self.paint_dialogs(ctx);
        self.clear_finished();
        let screen = ctx.input(|i| i.screen_rect());
        let layer = egui::LayerId::new(egui::Order::Tooltip, egui::Id::new("toasts"));
        let painter = ctx.layer_painter(layer);
        let mut y = 12.0;

        for notice in self.queue.iter() {
            let (bg, accent) = colors_for(notice.kind);
            let width = 320.0;
            let mut height = 48.0;
            if notice.detail.is_some() {
                height += 16.0;
            }

            let rect = egui::Rect::from_min_max(
                egui::pos2(screen.max.x - 12.0 - width, screen.min.y + y),
                egui::pos2(screen.max.x - 12.0, screen.min.y + y + height),
            );
            painter.rect(
                rect,
                12.0,
                Color32::from_rgba_unmultiplied(bg.r(), bg.g(), bg.b(), 200),
                egui::Stroke::new(1.0, accent),
            );
            painter.text(
                rect.min + egui::vec2(12.0, 10.0),
                egui::Align2::LEFT_TOP,
                &notice.title,
                egui::FontId::proportional(14.0),
                Color32::WHITE,
            );
            if let Some(detail) = &notice.detail {
                painter.text(
                    rect.min + egui::vec2(12.0, 30.0),
                    egui::Align2::LEFT_TOP,
                    detail,
                    egui::FontId::proportional(12.0),
                    Color32::LIGHT_GRAY,
                );
            }

            y += height + 8.0;
        }
    }

    fn paint_dialogs(&mut self, ctx: &egui::Context) {
        let mut dismissed = Vec::new();
        for (index, dialog) in self.dialogs.iter().enumerate() {
            let offset = 24.0 * index as f32;
            egui::Window::new(dialog.heading.as_str())
                .id(egui::Id::new(("fault-dialog", dialog.id)))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(offset, offset))
                .show(ctx, |ui| {
                    ui.colored_label(colors_for(NoticeKind::Error).1, dialog.body.as_str());
                    ui.add_space(8.0);
                    if ui.button("Dismiss").clicked() {
                        dismissed.push(dialog.id);
                    }
                });
        }
        for id in dismissed {
            self.dismiss(id);
        }
    }
}

fn colors_for(kind: NoticeKind) -> (Color32, Color32) {
    match kind {
        NoticeKind::Info => (
            Color32::from_rgb(32, 56, 112),
            Color32::from_rgb(64, 128, 255),
        ),
        NoticeKind::Warning => (
            Color32::from_rgb(64, 48, 0),
            Color32::from_rgb(240, 200, 64),
        ),
        NoticeKind::Error => (
            Color32::from_rgb(72, 24, 24),
            Color32::from_rgb(240, 96, 96),
        ),
    }
}

#[cfg(test)]
mod tests {
    use orlib_module_host::{FaultStage, SessionId};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn faults_open_dialogs_until_dismissed() {
        let mut notifications = Notifications::default();
        let fault = FaultRecord::new("p4", FaultStage::Runtime, "division by zero")
            .with_session(SessionId(3))
            .with_cause("panicked at solver.rs:10");
        notifications.fault("Monitoring", &fault);
        notifications.fault("Monitoring", &fault);

        let dialogs = notifications.dialogs();
        assert_eq!(dialogs.len(), 2);
        assert_eq!(dialogs[0].heading, "Monitoring stopped (runtime failure)");
        assert_eq!(dialogs[0].body, "division by zero\npanicked at solver.rs:10");
        assert_eq!(notifications.queue.len(), 2);

        let first = dialogs[0].id;
        notifications.dismiss(first);
        assert_eq!(notifications.dialogs().len(), 1);
        assert_ne!(notifications.dialogs()[0].id, first);
    }
}
