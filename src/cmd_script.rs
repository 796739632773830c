//! `webdsl script` and `webdsl catalog`: the stored script and command
//! catalog on the backend.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use webdsl_config::Config;
use webdsl_dom::StaticDocument;
use webdsl_engine::ScriptStore;
use webdsl_protocols::Script;
use webdsl_relay::{BrowserExtension, ExtensionContexts, HttpBackend, PageChannel};

use crate::cli::ScriptAction;

/// Store calls still go page -> relay -> broker, here over an empty page.
fn connect(config: &Config) -> anyhow::Result<(ScriptStore, ExtensionContexts)> {
    let backend = Arc::new(HttpBackend::from_config(&config.backend)?);
    let dom = Arc::new(parking_lot::Mutex::new(StaticDocument::parse("")));
    let contexts = BrowserExtension::new(dom, backend).configure(config).launch();
    let channel: Arc<dyn PageChannel> = Arc::new(contexts.page_bridge());
    Ok((ScriptStore::new(channel), contexts))
}

pub(crate) async fn handle_script_command(config: &Config, action: ScriptAction) -> anyhow::Result<()> {
    let (store, contexts) = connect(config)?;
    let result = match action {
        ScriptAction::Show => show(&store).await,
        ScriptAction::Save { file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            store.save_script(&Script::new(text)).await?;
            info!("Saved {} to the backend", file.display());
            Ok(())
        }
        ScriptAction::Clear => store.clear_script().await.map_err(Into::into),
        ScriptAction::Add { name, args } => match store.add_command(&name, &args).await {
            Ok(script) => {
                println!("{}", script.text());
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
    };
    contexts.shutdown().await;
    result
}

async fn show(store: &ScriptStore) -> anyhow::Result<()> {
    let script = store.load_script().await?;
    println!("{}", script.text());
    Ok(())
}

pub(crate) async fn handle_catalog(config: &Config) -> anyhow::Result<()> {
    let (store, contexts) = connect(config)?;
    let catalog = store.command_catalog().await;
    contexts.shutdown().await;

    for command in catalog?.iter() {
        if command.parameter_names.is_empty() {
            println!("{}", command.name);
        } else {
            println!("{} <{}>", command.name, command.parameter_names.join("> <"));
        }
    }
    Ok(())
}
