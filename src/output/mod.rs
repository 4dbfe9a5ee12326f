pub mod boot;
pub mod commands;
pub mod dot;

use crate::core::generator::{GeneratorOptions, Topology};
use crate::core::routing::Command;
use crate::core::Storage;
use crate::utils::error::{Result, TopologyError};
use serde::Serialize;

pub use boot::{boot_descriptor, BootDescriptor, DEFAULT_BASE_APP_PORT};
pub use commands::{app_command_document, start_order, top_level_document, RunParams};
pub use dot::export_dot;

/// One rendered file, path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: String,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub run: RunParams,
    pub base_app_port: u16,
    pub dot: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            run: RunParams::default(),
            base_app_port: DEFAULT_BASE_APP_PORT,
            dot: false,
        }
    }
}

fn pretty<T: Serialize + ?Sized>(path: String, value: &T) -> Result<OutputFile> {
    let mut contents = serde_json::to_string_pretty(value)?;
    contents.push('\n');
    Ok(OutputFile { path, contents })
}

/// Renders every document in memory. Nothing is written here, so a failure
/// leaves no partial output behind.
pub fn render(
    topology: &Topology,
    generator: &GeneratorOptions,
    options: &RenderOptions,
) -> Result<Vec<OutputFile>> {
    let mut files = Vec::new();

    for app in topology.system.apps() {
        let routing = topology
            .routing
            .get(&app.name)
            .ok_or_else(|| TopologyError::ApplicationNotFound(app.name.clone()))?;
        for command in Command::ALL {
            let doc = app_command_document(app, routing, command, &options.run)?;
            files.push(pretty(format!("data/{}_{}.json", app.name, command), &doc)?);
        }
        if options.dot {
            files.push(OutputFile {
                path: format!("{}.dot", app.name),
                contents: export_dot(app),
            });
        }
    }

    for command in Command::ALL {
        let doc = top_level_document(topology, command, generator);
        files.push(pretty(format!("{}.json", command), &doc)?);
    }

    let boot = boot_descriptor(&topology.system, options.base_app_port)?;
    files.push(pretty("boot.json".to_string(), &boot)?);

    tracing::debug!("Rendered {} output files", files.len());
    Ok(files)
}

/// Writes rendered files through `storage`. Refuses to touch an output
/// directory that already exists.
///
/// # Errors
///
/// Returns `TopologyError::OutputExists` if the root is present. If any write
/// fails the root is removed again before the error is returned, so a failed
/// run leaves nothing behind.
pub async fn write_all<S: Storage>(storage: &S, files: &[OutputFile]) -> Result<usize> {
    if storage.exists("").await? {
        return Err(TopologyError::OutputExists(storage.root().to_string()));
    }
    for file in files {
        if let Err(e) = storage.write_file(&file.path, file.contents.as_bytes()).await {
            tracing::warn!(
                "Writing {} failed, removing partial output under {}",
                file.path,
                storage.root()
            );
            if let Err(cleanup) = storage.remove_root().await {
                tracing::error!("Could not remove partial output: {}", cleanup);
            }
            return Err(e);
        }
    }
    Ok(files.len())
}
