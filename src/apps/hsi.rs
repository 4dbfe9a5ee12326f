use crate::apps::endpoints::NetworkEndpoints;
use crate::core::system::Application;
use crate::domain::conf::{HsiReadoutConf, QueueToNetworkConf};
use crate::domain::model::PortRef;
use crate::utils::error::Result;

pub const HSI_EVENT_ENDPOINT: &str = "hsievent";
pub const HSI_EVENT_QUEUE: &str = "hsievent_q_to_net";
pub const HSI_EVENT_QUEUE_CAPACITY: usize = 100;

pub(crate) fn hsievent_sender(endpoints: &NetworkEndpoints) -> Result<QueueToNetworkConf> {
    Ok(QueueToNetworkConf {
        msg_type: "dunedaq::dfmessages::HSIEvent".to_string(),
        msg_module_name: "HSIEventNQ".to_string(),
        address: endpoints.address(HSI_EVENT_ENDPOINT)?.to_string(),
        ipm_plugin_type: "ZmqSender".to_string(),
        stype: "msgpack".to_string(),
    })
}

/// Application reading HSI events from hardware and sending them to the
/// `hsievent` network endpoint.
pub fn hsi_app(
    endpoints: &NetworkEndpoints,
    app_name: &str,
    host: &str,
    conf: HsiReadoutConf,
) -> Result<Application> {
    endpoints.require(&[HSI_EVENT_ENDPOINT])?;
    tracing::info!("Generating HSI readout application {} on {}", app_name, host);

    let mut app = Application::new(app_name, host);
    app.graph.add_module("hsir", conf)?;
    app.graph.add_module("qton_hsievent", hsievent_sender(endpoints)?)?;
    app.graph.connect_modules(
        &PortRef::new("hsir", "hsievent_sink"),
        &PortRef::new("qton_hsievent", "input"),
        "HSIEvent",
        HSI_EVENT_QUEUE,
        HSI_EVENT_QUEUE_CAPACITY,
    )?;

    Ok(app)
}
