use anyhow::Context;
use newsletter_api::{
    application::Application,
    settings::Settings,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("newsletter_api".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber).context("Failed to set up telemetry")?;

    let settings = Settings::load().context("Failed to read configuration")?;
    tracing::info!(
        env = settings.application.env().as_str(),
        address = %settings.application.address(),
        database = %settings.database.path,
        "Starting newsletter API"
    );

    let application = Application::builder_from_settings(settings).build()?;
    application
        .migrate()
        .await
        .context("Failed to migrate the database")?;
    application.run_until_stopped().await?;

    Ok(())
}
