//! Tuple UI entry point.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = tuple_ui::config::load_config()?;

    // Logs go to stderr so they never interleave with the console pane.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("tuple_ui={}", config.logging.level).parse()?)
                .add_directive(format!("tuple_ui_exec={}", config.logging.level).parse()?)
                .add_directive(format!("tuple_ui_core={}", config.logging.level).parse()?),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), program = %config.cli.program.display(), "Starting Tuple UI");

    let app = tuple_ui::Application::new(config);
    app.run()
}
