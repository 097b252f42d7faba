use anyhow::{bail, Context};
use push_service::{EventKind, Notification, PushConfig, PushEvent, PushNotifications};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(title), Some(body)) = (args.next(), args.next()) else {
        bail!("usage: push-service <title> <body> <token>...");
    };
    let tokens: Vec<String> = args.collect();
    if tokens.is_empty() {
        bail!("at least one device token is required");
    }

    let config = PushConfig::from_env().context("failed to load push configuration")?;
    let mut push = PushNotifications::new(config);

    push.subscribe(EventKind::Warning, |event| {
        if let PushEvent::Warning { message } = event {
            tracing::warn!("{}", message);
        }
    });
    push.subscribe(EventKind::Push, |event| {
        if let Some(payload) = event.payload() {
            tracing::info!(capability = %payload.capability, token = %payload.token, "push sent");
        }
    });
    push.subscribe(EventKind::Error, |event| {
        if let PushEvent::Error { error, payload } = event {
            tracing::error!(capability = %payload.capability, token = %payload.token, "push failed: {}", error);
        }
    });

    push.prepare().context("failed to prepare push notifications")?;

    tracing::info!(
        "Sending to {} tokens (dry_run: {})",
        tokens.len(),
        push.is_dry_run()
    );

    let message_ids = push
        .push_notification(&tokens, &Notification::new(title, body))
        .await;

    for id in &message_ids {
        println!("{}", id);
    }

    push.release();
    Ok(())
}
