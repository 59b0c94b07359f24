//! Minimal ORLib problem module: a two-variable production plan.
//!
//! Builds both as a `cdylib` loadable by the dashboard and as an `rlib` the
//! dashboard links in as its `builtin:hello` module.

use orlib_module_sdk::prelude::*;

/// Maximise `3x + 2y` subject to `x + y <= capacity`, `x <= 3`, `x, y >= 0`.
#[derive(Debug, Clone)]
pub struct HelloProblem {
    capacity: f64,
    x: f64,
    y: f64,
    closing: bool,
}

impl Default for HelloProblem {
    fn default() -> Self {
        Self {
            capacity: 4.0,
            x: 0.0,
            y: 0.0,
            closing: false,
        }
    }
}

impl HelloProblem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objective(&self) -> f64 {
        3.0 * self.x + 2.0 * self.y
    }

    pub fn is_feasible(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x <= 3.0 && self.x + self.y <= self.capacity
    }

    /// Optimal plan for the current capacity. The `x` column has the better
    /// ratio, so fill it first.
    pub fn solve(&mut self) {
        self.x = self.capacity.clamp(0.0, 3.0);
        self.y = (self.capacity - self.x).max(0.0);
    }
}

impl ProblemWindow for HelloProblem {
    fn title(&self) -> String {
        "Sample Problem".into()
    }

    fn initial_size(&self) -> [f32; 2] {
        [420.0, 280.0]
    }

    fn ui(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Production plan");
            ui.label("maximise 3x + 2y  subject to  x + y <= capacity, x <= 3");
            ui.add(egui::Slider::new(&mut self.capacity, 0.0..=10.0).text("capacity"));
            ui.add(egui::Slider::new(&mut self.x, 0.0..=10.0).text("x"));
            ui.add(egui::Slider::new(&mut self.y, 0.0..=10.0).text("y"));
            ui.separator();
            if self.is_feasible() {
                ui.label(format!("objective: {:.2}", self.objective()));
            } else {
                ui.colored_label(egui::Color32::LIGHT_RED, "plan is infeasible");
            }
            ui.horizontal(|ui| {
                if ui.button("Solve").clicked() {
                    self.solve();
                }
                if ui.button("Close").clicked() {
                    self.closing = true;
                }
                if ui.button("Simulate crash").clicked() {
                    panic!("sample problem crashed on request");
                }
            });
        });
    }

    fn wants_close(&self) -> bool {
        self.closing
    }
}

export_problem!(HelloWindow => HelloProblem::new());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_fills_the_better_column_first() {
        let mut problem = HelloProblem::new();
        problem.solve();
        assert_eq!((problem.x, problem.y), (3.0, 1.0));
        assert_eq!(problem.objective(), 11.0);
        assert!(problem.is_feasible());

        problem.capacity = 2.0;
        problem.solve();
        assert_eq!((problem.x, problem.y), (2.0, 0.0));
    }

    #[test]
    fn exported_entry_point_builds_the_window() {
        let window = HelloWindow();
        assert_eq!(window.title(), "Sample Problem");
        assert_eq!(ORLIB_MODULE_ABI, orlib_module_sdk::ORLIB_MODULE_ABI_VERSION);
    }
}
