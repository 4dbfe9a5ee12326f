//! Keeps the module level trigger's link list in step with the producers
//! registered across the whole system.

use crate::core::system::System;
use crate::domain::conf::MltConf;
use crate::domain::model::SourceId;
use crate::utils::error::{Result, TopologyError};

/// Name of the trigger decision module inside the decision application.
pub const DECISION_MODULE: &str = "mlt";

/// Replaces the link list with every MLT-eligible source id in the system,
/// sorted, keeping all other configuration fields. Returns the link count.
///
/// Running it twice without registry changes leaves the configuration
/// unchanged.
pub fn synchronize(system: &mut System, decision_app: &str) -> Result<usize> {
    let links: Vec<SourceId> = system.mlt_eligible_source_ids().into_iter().collect();
    tracing::info!("Adding {} links to {}.links", links.len(), DECISION_MODULE);
    tracing::debug!(
        "Links: {}",
        links
            .iter()
            .map(SourceId::raw_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let count = links.len();
    let graph = &mut system.app_mut(decision_app)?.graph;
    let old = graph.conf_of::<MltConf>(DECISION_MODULE)?.clone();
    graph.reset_module_conf(DECISION_MODULE, MltConf { links, ..old })?;
    Ok(count)
}

/// Removes one source id from the link list.
///
/// # Errors
///
/// Returns `TopologyError::LinkNotFound` if the id is not linked; the
/// configuration is left untouched in that case.
pub fn remove_link(system: &mut System, source_id: &SourceId, decision_app: &str) -> Result<()> {
    let graph = &mut system.app_mut(decision_app)?.graph;
    if !graph
        .conf_of::<MltConf>(DECISION_MODULE)?
        .links
        .contains(source_id)
    {
        return Err(TopologyError::LinkNotFound(source_id.raw_str()));
    }

    tracing::info!("Removing {} from {}.links", source_id, DECISION_MODULE);
    graph.update_module_conf::<MltConf, _>(DECISION_MODULE, |conf| {
        conf.links.retain(|link| link != source_id)
    })
}
