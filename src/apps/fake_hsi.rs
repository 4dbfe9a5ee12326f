use crate::apps::endpoints::NetworkEndpoints;
use crate::apps::hsi::{hsievent_sender, HSI_EVENT_ENDPOINT, HSI_EVENT_QUEUE, HSI_EVENT_QUEUE_CAPACITY};
use crate::core::system::Application;
use crate::domain::conf::{FakeHsiConf, NetworkToQueueConf};
use crate::domain::model::PortRef;
use crate::utils::error::Result;
use crate::utils::validation::validate_positive_number;
use serde::{Deserialize, Serialize};

pub const TIME_SYNC_QUEUE: &str = "time_sync_from_netq";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeHsiOptions {
    pub clock_speed_hz: u64,
    pub data_rate_slowdown_factor: u64,
    pub event_period_ns: u64,
    pub mean_signal_multiplicity: u32,
    pub signal_emulation_mode: u32,
    pub enabled_signals: u32,
}

impl Default for FakeHsiOptions {
    fn default() -> Self {
        Self {
            clock_speed_hz: 50_000_000,
            data_rate_slowdown_factor: 1,
            event_period_ns: 20,
            mean_signal_multiplicity: 0,
            signal_emulation_mode: 0,
            enabled_signals: 0b0000_0001,
        }
    }
}

/// Application emulating HSI events. Listens to every `timesync*` endpoint
/// and sends events to `hsievent`.
pub fn fake_hsi_app(
    endpoints: &NetworkEndpoints,
    app_name: &str,
    host: &str,
    options: &FakeHsiOptions,
) -> Result<Application> {
    endpoints.require(&[HSI_EVENT_ENDPOINT])?;
    validate_positive_number(
        "hsi.emulator.data_rate_slowdown_factor",
        options.data_rate_slowdown_factor,
        1,
    )?;
    tracing::info!("Generating fake HSI application {} on {}", app_name, host);

    let mut app = Application::new(app_name, host);
    let graph = &mut app.graph;

    graph.add_module(
        "fhsig",
        FakeHsiConf {
            clock_frequency: options.clock_speed_hz / options.data_rate_slowdown_factor,
            event_period_ns: options.event_period_ns,
            mean_signal_multiplicity: options.mean_signal_multiplicity,
            signal_emulation_mode: options.signal_emulation_mode,
            enabled_signals: options.enabled_signals,
        },
    )?;
    graph.add_module("qton_hsievent", hsievent_sender(endpoints)?)?;
    graph.connect_modules(
        &PortRef::new("fhsig", "hsievent_sink"),
        &PortRef::new("qton_hsievent", "input"),
        "HSIEvent",
        HSI_EVENT_QUEUE,
        HSI_EVENT_QUEUE_CAPACITY,
    )?;

    let time_sync_source = PortRef::new("fhsig", "time_sync_source");
    for (idx, (name, address)) in endpoints.matching("timesync").into_iter().enumerate() {
        let module = format!("ntoq_timesync_{}", idx);
        tracing::debug!("Receiving time sync from {} ({})", name, address);
        graph.add_module(
            &module,
            NetworkToQueueConf {
                msg_type: "dunedaq::dfmessages::TimeSync".to_string(),
                msg_module_name: "TimeSyncNQ".to_string(),
                address: address.to_string(),
                ipm_plugin_type: "ZmqReceiver".to_string(),
            },
        )?;
        graph.connect_modules(
            &PortRef::new(&module, "output"),
            &time_sync_source,
            "TimeSync",
            TIME_SYNC_QUEUE,
            HSI_EVENT_QUEUE_CAPACITY,
        )?;
    }

    Ok(app)
}
