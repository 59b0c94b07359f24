use egui::{Context, ViewportBuilder, ViewportCommand, ViewportId};

use crate::controller::LaunchController;
use crate::session::SessionId;

/// Viewport used for a session's window. Stable for the life of the session.
pub fn viewport_id(session: SessionId) -> ViewportId {
    ViewportId::from_hash_of(("orlib-problem", session.0))
}

impl LaunchController {
    /// Draw every open problem window as its own viewport.
    ///
    /// Call once per dashboard frame. Windows whose viewport was closed by
    /// the user, or that asked to close, are closed through the controller;
    /// a window that faults while drawing is torn down and reported on
    /// [`LaunchController::faults`].
    pub fn present(&self, ctx: &Context) {
        for (session, window) in self.live_windows() {
            let viewport = viewport_id(session);
            let (title, size, focus) = {
                let mut handle = window.lock();
                if handle.is_closed() {
                    continue;
                }
                (
                    handle.title().to_string(),
                    handle.initial_size(),
                    handle.take_focus_request(),
                )
            };
            if focus {
                ctx.send_viewport_cmd_to(viewport, ViewportCommand::Focus);
            }

            let builder = ViewportBuilder::default()
                .with_title(title)
                .with_inner_size(size);
            let (close_requested, drawn) = ctx.show_viewport_immediate(viewport, builder, |ctx, _class| {
                let close_requested = ctx.input(|input| input.viewport().close_requested());
                let drawn = self.dispatch(session, |window| {
                    window.ui(ctx);
                    window.wants_close()
                });
                (close_requested, drawn)
            });

            // A fault has already removed the session.
            if let Some(Ok(wants_close)) = drawn {
                if close_requested || wants_close {
                    self.close_session(session);
                }
            }
        }
    }
}
