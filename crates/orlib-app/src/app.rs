use crossbeam_channel::Receiver;
use eframe::{App, Frame};
use orlib_module_host::{FaultRecord, LaunchController, LaunchError, LaunchOutcome};
use tracing::{info, warn};

use crate::launcher::Launcher;
use crate::notifications::Notifications;

/// The dashboard window: a launcher grid over the launch controller.
pub struct DashboardApp {
    controller: LaunchController,
    faults: Receiver<FaultRecord>,
    launcher: Launcher,
    notifications: Notifications,
}

impl DashboardApp {
    pub fn new(controller: LaunchController) -> Self {
        let faults = controller.faults();
        Self {
            controller,
            faults,
            launcher: Launcher,
            notifications: Notifications::default(),
        }
    }

    fn title_of(&self, id: &str) -> String {
        self.controller
            .registry()
            .get(id)
            .map(|descriptor| descriptor.title.clone())
            .unwrap_or_else(|_| id.to_string())
    }

    fn launch(&mut self, id: &str) {
        match self.controller.launch(id) {
            Ok(LaunchOutcome::Opened(session)) => {
                info!(problem = %id, %session, "problem launched from dashboard");
            }
            Ok(LaunchOutcome::Focused(_)) => {
                self.notifications
                    .info(format!("{} is already open", self.title_of(id)));
            }
            // Reported through the fault channel.
            Err(LaunchError::Fault(_)) => {}
            Err(err) => {
                warn!(problem = %id, "launch rejected: {err}");
                self.notifications
                    .warning(format!("{} is unavailable", self.title_of(id)), err.to_string());
            }
        }
    }

    fn drain_faults(&mut self) {
        while let Ok(fault) = self.faults.try_recv() {
            let title = self.title_of(&fault.id);
            self.notifications.fault(&title, &fault);
        }
    }
}

impl App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let mut launched = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let controller = &self.controller;
                launched = self
                    .launcher
                    .ui(ui, controller.registry(), |id| controller.is_active(id));
            });
        });
        if let Some(id) = launched {
            self.launch(&id);
        }

        self.controller.present(ctx);
        self.drain_faults();
        self.notifications.paint(ctx);
    }

    fn on_exit(&mut self) {
        let closed = self.controller.close_all();
        info!(closed, "dashboard closing");
    }
}
