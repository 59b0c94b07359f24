use egui::{self, Color32, RichText};
use orlib_module_db::{ModuleDescriptor, ModuleRegistry, ModuleStatus};

const COLUMNS: usize = 2;

/// Card grid listing every available problem, in registry order.
#[derive(Debug, Default, Clone, Copy)]
pub struct Launcher;

impl Launcher {
    /// Draw the grid and return the id of the problem whose button was
    /// pressed this frame. `is_open` marks problems that already have a
    /// window.
    pub fn ui(
        &self,
        ui: &mut egui::Ui,
        registry: &ModuleRegistry,
        is_open: impl Fn(&str) -> bool,
    ) -> Option<String> {
        ui.vertical_centered(|ui| {
            ui.heading("Operational Research Problems Library");
            ui.label(RichText::new("Choose a problem to open its solver.").weak());
            ui.add_space(12.0);
        });

        let mut launched = None;
        let descriptors: Vec<&ModuleDescriptor> = registry.list_available().collect();
        for row in descriptors.chunks(COLUMNS) {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing = egui::vec2(12.0, 12.0);
                for descriptor in row {
                    if self.card(ui, descriptor, is_open(&descriptor.id)) {
                        launched = Some(descriptor.id.clone());
                    }
                }
            });
            ui.add_space(10.0);
        }
        launched
    }

    fn card(&self, ui: &mut egui::Ui, descriptor: &ModuleDescriptor, open: bool) -> bool {
        let mut clicked = false;
        egui::Frame::group(ui.style())
            .rounding(8.0)
            .inner_margin(egui::Margin::same(12.0))
            .show(ui, |ui| {
                ui.set_width(300.0);
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&descriptor.title).strong());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            status_badge(ui, descriptor.status);
                        });
                    });
                    if let Some(description) = &descriptor.description {
                        ui.add_space(6.0);
                        ui.label(RichText::new(description).weak().size(13.0));
                    }
                    ui.add_space(10.0);
                    let label = if open { "Focus" } else { "Launch" };
                    let button = ui.add_enabled(
                        descriptor.is_selectable(),
                        egui::Button::new(label).min_size(egui::vec2(140.0, 28.0)),
                    );
                    let button = if descriptor.is_selectable() {
                        button
                    } else {
                        button.on_disabled_hover_text("This problem is not finished yet.")
                    };
                    clicked = button.clicked();
                });
            });
        clicked
    }
}

fn status_badge(ui: &mut egui::Ui, status: ModuleStatus) {
    let color = match status {
        ModuleStatus::Complete => Color32::from_rgb(64, 200, 96),
        ModuleStatus::Incomplete => Color32::from_rgb(240, 200, 64),
        ModuleStatus::Unavailable => Color32::GRAY,
    };
    ui.label(RichText::new(status.label()).color(color).small());
}
