use std::{process::ExitCode, sync::Arc};

use paris::{error, info, warn};
use ring_light_control::{
    backend::{ChannelBackend, StaticDisplayEnumerator},
    engine::SettingsSyncEngine,
    engine_config::EngineConfig,
    persistence::JsonFileSettingsPersistence,
    ui_event::UiEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::LinesStream, StreamExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let config = EngineConfig::load_or_default().await;
    if config.displays.is_empty() {
        warn!("no displays configured, the overlay will have nothing to drive");
    }

    let (backend, mut commands) = ChannelBackend::new();
    // stands in for the overlay process: every backend call is logged as JSON
    let overlay_handler = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            match serde_json::to_string(&command) {
                Ok(json) => info!("overlay <- {}", json),
                Err(err) => error!("failed to encode backend command: {}", err),
            }
        }
    });

    let persistence = Arc::new(JsonFileSettingsPersistence::in_config_dir()?);
    info!("settings file: {}", persistence.path().display());

    let engine = SettingsSyncEngine::new(
        &config,
        Arc::new(StaticDisplayEnumerator::new(&config.displays)),
        persistence,
        Arc::new(backend),
    );

    // the sequence logs its own failure; without settings there is nothing to edit
    if engine.bootstrap().await.is_err() {
        overlay_handler.abort();
        return Ok(ExitCode::FAILURE);
    }

    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            line = lines.next() => match line {
                Some(Ok(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let result = match UiEvent::parse(&line) {
                        Ok(event) => event.dispatch(&engine).await,
                        Err(err) => Err(err),
                    };
                    match result {
                        Ok(Some(mapping)) => match serde_json::to_string(&mapping) {
                            Ok(json) => println!("{}", json),
                            Err(err) => error!("failed to encode settings: {}", err),
                        },
                        Ok(None) => {}
                        Err(err) => warn!("{:#}", err),
                    }
                }
                Some(Err(err)) => {
                    error!("failed to read ui events: {}", err);
                    break;
                }
                None => break,
            },
            _ = &mut ctrl_c => break,
        }
    }

    engine.shutdown();
    overlay_handler.abort();
    Ok(ExitCode::SUCCESS)
}
