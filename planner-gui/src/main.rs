mod app;
mod app_bar;

use app::PlannerApp;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Equipment Planner")
            .with_inner_size([960.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Equipment Planner",
        options,
        Box::new(|cc| Ok(Box::new(PlannerApp::new(cc)))),
    )
}
