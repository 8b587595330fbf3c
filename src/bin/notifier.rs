use mylist::{app, config::NotifierConfig, notifier};
use sqlx::postgres::PgPoolOptions;

/// One-shot run invoked by the external scheduler: query tasks due tomorrow,
/// email opted-in owners, exit. A store failure exits non-zero so the
/// platform retries the whole run.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    app::init_tracing("notifier=debug,mylist=debug");

    let config = NotifierConfig::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await?;

    let mailer = notifier::SmtpMailer::new(&config.smtp)?;
    let summary = notifier::run(&db, &mailer).await?;

    tracing::info!(sent = summary.sent, failed = summary.failed, "notifier run complete");
    Ok(())
}
