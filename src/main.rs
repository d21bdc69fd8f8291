use std::sync::Arc;

use line_agent::config::AppConfig;
use line_agent::providers::Providers;
use line_agent::routes::app_routes;
use line_agent::schedule::spawn_push_schedule;
use line_agent::service::LineBotService;

#[tokio::main]
async fn main() -> line_agent::error::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export LINE_AGENT_SECRET_PROVIDER=mock");
        eprintln!("  export LINE_AGENT_SHEETS_PROVIDER=mock");
        eprintln!("  export LINE_AGENT_LINE_PROVIDER=mock");
        std::process::exit(1);
    });

    let providers = Providers::from_config(&config)?;
    let service = Arc::new(LineBotService::new(&providers, config.ranges.clone()));

    eprintln!("🤖 LINE Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Name: {}", config.name);
    eprintln!(
        "   Providers: secrets={} sheets={} line={} signature={}",
        config.providers.secrets,
        config.providers.sheets,
        config.providers.line,
        config.providers.signature,
    );
    eprintln!("   Webhook: http://0.0.0.0:{}/webhook", config.port);
    eprintln!("   Push:    http://0.0.0.0:{}/push", config.port);

    // ── Push Schedule ─────────────────────────────────────────────────────
    let _schedule_handle = match &config.push_schedule {
        Some(schedule) => {
            eprintln!("   Push schedule: {} (UTC)", schedule);
            Some(spawn_push_schedule(Arc::clone(&service), schedule.clone()))
        }
        None => {
            eprintln!("   Push schedule: disabled (POST /push only)");
            None
        }
    };

    // ── HTTP Server ───────────────────────────────────────────────────────
    let app = app_routes(service, config.name.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "LINE Agent server started");
    axum::serve(listener, app).await?;

    Ok(())
}
