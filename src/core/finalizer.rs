use crate::core::system::System;
use crate::core::wiring::{fragments_to, WiringReport, FRAGMENT};
use crate::domain::conf::TrbConf;
use crate::domain::model::{Direction, PortRef};
use crate::utils::error::Result;

/// Attaches each collector's consolidated fragment input and rewrites its
/// configuration with the final producer map.
///
/// Must run after every producer application has been wired. The fragment
/// input endpoint is flagged `toposort` so it is emitted after the
/// producer-side endpoints.
pub fn finalize_collectors(
    system: &mut System,
    report: &WiringReport,
    connection_prefix: Option<&str>,
) -> Result<()> {
    let map = report.producer_map(connection_prefix);

    for collector in system.collectors() {
        tracing::info!(
            "Finalizing {} in {} with {} fragment sources",
            collector.module,
            collector.app,
            map.len()
        );

        let graph = &mut system.app_mut(&collector.app)?.graph;
        graph.add_endpoint_with_order(
            &fragments_to(&collector.app),
            Some(PortRef::new(&collector.module, "data_fragment_all")),
            FRAGMENT,
            Direction::In,
            true,
        )?;

        // 只重算 map，其餘欄位沿用
        let old = graph.conf_of::<TrbConf>(&collector.module)?.clone();
        graph.reset_module_conf(
            &collector.module,
            TrbConf {
                map: map.clone(),
                ..old
            },
        )?;
    }

    Ok(())
}
