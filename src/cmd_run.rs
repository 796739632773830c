//! `webdsl run`: replay a script against an HTML page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{info, warn};
use webdsl_config::Config;
use webdsl_dom::{Point, StaticDocument};
use webdsl_engine::{EngineEvent, EngineOptions, ExecutionEngine};
use webdsl_protocols::RunState;
use webdsl_relay::{Backend, BrowserExtension, HttpBackend, MemoryBackend, PageChannel, SharedDom};

use crate::console::Console;

/// Where `run` takes its script from.
pub(crate) enum ScriptSource {
    File(PathBuf),
    Store,
    /// The stored script, continuing the run in the stored execution status.
    Resume,
}

pub(crate) async fn handle_run(
    config: &Config,
    page: &Path,
    source: ScriptSource,
    offline: bool,
    pointer: Option<Point>,
) -> anyhow::Result<()> {
    let doc = StaticDocument::from_file(page)
        .with_context(|| format!("Failed to load page {}", page.display()))?;
    info!("Loaded page {} ({} elements)", page.display(), doc.element_count());
    let dom: SharedDom = Arc::new(parking_lot::Mutex::new(doc));

    let backend: Arc<dyn Backend> = if offline {
        Arc::new(MemoryBackend::new().with_selection_endpoint(config.backend.selection_endpoint.clone()))
    } else {
        Arc::new(HttpBackend::from_config(&config.backend)?)
    };

    let console = Arc::new(Console::new());
    let contexts = BrowserExtension::new(dom, backend)
        .configure(config)
        .label_prompt(console.clone())
        .launch();
    if let Some(point) = pointer {
        contexts.relay().pointer_down(point).await?;
    }

    let channel: Arc<dyn PageChannel> = Arc::new(contexts.page_bridge());
    let engine = ExecutionEngine::new(channel, EngineOptions::from(&config.engine));

    let mut events = engine.subscribe();
    let resumed = match source {
        ScriptSource::File(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            engine.load_script(text)?;
            None
        }
        ScriptSource::Store => {
            engine.load_from_store().await.context("Failed to fetch the stored script")?;
            None
        }
        ScriptSource::Resume => engine
            .resume_from_store()
            .await
            .context("Failed to resume the stored run")?,
    };
    match resumed {
        Some(state) => info!("Resumed stored run ({})", state),
        None => {
            engine.start();
        }
    }
    let outcome = loop {
        let snapshot = tokio::select! {
            event = events.recv() => {
                if let Ok(event) = event {
                    print_event(&event);
                }
                continue;
            }
            snapshot = engine.wait_until_settled() => snapshot,
        };
        while let Ok(event) = events.try_recv() {
            print_event(&event);
        }

        match snapshot.state {
            RunState::WaitingForUser => {
                let answer = console.ask("Press Enter to continue, q to abort:").await?;
                if matches!(answer.as_deref(), Some("q") | None) {
                    warn!("Run aborted by user");
                    engine.reset();
                    break Err(anyhow!("aborted at line {}", snapshot.cursor.current_line + 1));
                }
                engine.confirm();
            }
            RunState::Errored => {
                let reason = engine
                    .log()
                    .last()
                    .map(|record| record.to_string())
                    .unwrap_or_else(|| "unknown failure".to_string());
                break Err(anyhow!("script failed at {}", reason));
            }
            RunState::Completed | RunState::Idle | RunState::Running => break Ok(()),
        }
    };

    contexts.shutdown().await;
    outcome?;
    info!("Script completed");
    Ok(())
}

fn print_event(event: &EngineEvent) {
    if let EngineEvent::Stepped(record) = event {
        println!("{}", record);
    }
}
