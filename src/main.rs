use table_editor::app::App;
use table_editor::config::{default_webview_data_dir, load_default_config, AppConfig};
use table_editor::logging;

fn main() {
    let (config, config_error) = match load_default_config() {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::init(&config.log_filter);
    if let Some(err) = config_error {
        tracing::warn!("using default config: {err:#}");
    }

    let webview_data_dir =
        default_webview_data_dir().expect("should resolve and create WebView2 data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Table Editor"))
                .with_data_directory(webview_data_dir),
        )
        .launch(App);
}
