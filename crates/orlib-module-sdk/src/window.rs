/// Capability every hosted problem window provides.
///
/// The dashboard never inherits from or inspects the concrete window type: it
/// constructs the window through an entry point, calls [`show`](Self::show)
/// once, draws it every frame through [`ui`](Self::ui) and finally calls
/// [`close`](Self::close). A window that wants to go away on its own reports
/// it through [`wants_close`](Self::wants_close).
///
/// All calls made by the host run behind its fault boundary, so a panic in
/// any of these methods ends the window's session instead of the dashboard.
pub trait ProblemWindow: Send {
    /// Title shown in the window's title bar.
    fn title(&self) -> String;

    /// Called once after construction, before the first frame.
    fn show(&mut self) {}

    /// Called when the dashboard brings an already open window to the front.
    fn focus(&mut self) {}

    /// Draw one frame of the window's contents.
    fn ui(&mut self, ctx: &egui::Context);

    /// Begin releasing resources. Work that outlives this call, such as a
    /// solver thread being joined, is reported through
    /// [`close_finished`](Self::close_finished).
    fn close(&mut self) {}

    /// Polled after [`close`](Self::close) until it returns `true` or the
    /// host's close timeout runs out; the window is dropped after that.
    fn close_finished(&self) -> bool {
        true
    }

    /// Polled after every frame; returning `true` closes the window.
    fn wants_close(&self) -> bool {
        false
    }

    fn initial_size(&self) -> [f32; 2] {
        [960.0, 640.0]
    }
}
