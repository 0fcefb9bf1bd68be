mod config;

use anyhow::Context as _;
use clap::Parser as _;
use config::{ChatConfig, Cli, Command, ServeConfig};
use roastbot::{
    AppState,
    adapter::RelayClient,
    build_cors_layer, build_metrics_layer_and_handle, build_metrics_router, build_router,
    chat::{self, ChatSession},
    mode::Mode,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("roastbot=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Logs go to stderr so they don't interleave with the chat transcript on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve(config) => serve(config.validate()?).await,
        Command::Chat(config) => chat_loop(config.validate()?).await,
    }
}

#[instrument(skip(config))]
async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    info!("Starting roastbot relay with config: {:?}", config);

    let app_state = AppState::new(config.relay_settings(), config.pool());
    let cors = build_cors_layer(&config.allowed_origins).context("Invalid --allowed-origin")?;
    let mut router = build_router(app_state).layer(cors);

    if config.metrics {
        let (prometheus_layer, handle) =
            build_metrics_layer_and_handle(config.metrics_prefix.clone());
        router = router.layer(prometheus_layer);

        let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
        let metrics_listener = TcpListener::bind(&metrics_addr)
            .await
            .with_context(|| format!("Failed to bind metrics listener to {metrics_addr}"))?;
        info!("Metrics listening on {}", metrics_addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, build_metrics_router(handle)).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {bind_addr}"))?;
    info!("Relay listening on {}", bind_addr);

    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
}

async fn chat_loop(config: ChatConfig) -> anyhow::Result<()> {
    let client = RelayClient::new(config.relay_url.clone())
        .timeout(Duration::from_secs(config.timeout_secs));
    let mode = if config.roast { Mode::Roast } else { Mode::Normal };
    let mut session = ChatSession::new(client, mode);

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Talking to {} in {} mode. /help for commands.",
        config.relay_url,
        session.mode()
    );

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match chat::Command::parse(&line) {
            chat::Command::Send(message) => {
                if let Some(reply) = session.send(&message).await {
                    println!("{reply}");
                }
            }
            chat::Command::SetMode(mode) => {
                session.set_mode(mode);
                println!("Switched to {mode} mode.");
            }
            chat::Command::Toggle => {
                let mode = session.toggle_mode();
                println!("Switched to {mode} mode.");
            }
            chat::Command::Clear => {
                session.clear();
                println!("Conversation cleared.");
            }
            chat::Command::History => println!("{}", session.render_transcript()),
            chat::Command::Help => println!("{}", chat::HELP),
            chat::Command::Quit => break,
            chat::Command::Unknown(command) => {
                println!("Unknown command {command}. /help for commands.");
            }
        }
    }

    Ok(())
}
