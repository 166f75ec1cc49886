mod app;
mod color;
mod state;
mod ui;

use app::RustyEconApp;
use eframe::egui;
use rusty_econ::config::ViewerConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match ViewerConfig::from_env(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring configuration: {e:#}");
            ViewerConfig::default()
        }
    };
    let [width, height] = config.window_size;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Econ – Economic Indicators",
        options,
        Box::new(move |_cc| Ok(Box::new(RustyEconApp::new(&config)))),
    )
}
