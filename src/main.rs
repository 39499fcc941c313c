//! Gardlink firmware entry point (ESP-IDF targets only).
//!
//! Boot order: ESP-IDF patches and logger, Wi-Fi station, controller
//! init from static config, MQTT connect + subscriptions, then the
//! cooperative control loop until a `reset` verb arrives.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use gardlink::adapters::mqtt::MqttTransport;
use gardlink::adapters::time::MonotonicClock;
use gardlink::adapters::wifi;
use gardlink::app::Step;
use gardlink::app::controller::Controller;
use gardlink::config::ControllerConfig;
use gardlink::drivers::hw_init;

/// Idle sleep between loop iterations; the controller gates its own work
/// on the 1000 ms poll interval, this only bounds busy-spinning.
const LOOP_SLEEP_MS: u64 = 50;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Gardlink v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Keep the handle alive for the process lifetime; dropping it tears
    // the station down.
    let _wifi = wifi::connect(peripherals.modem, sys_loop, nvs)?;

    let config = ControllerConfig::default();
    let clock = MonotonicClock::new();

    let mut controller = match Controller::init(&config, clock.now()) {
        Ok(c) => c,
        Err(e) => {
            error!("FATAL: controller init failed: {e}");
            return Err(e.into());
        }
    };

    let mut transport = MqttTransport::connect(
        &config.broker_url,
        controller.client_name(),
        &controller.command_topics(),
    )?;
    controller.announce_ready(&mut transport);

    info!("entering control loop");
    loop {
        match controller.tick(clock.now(), &mut transport) {
            Step::Continue => std::thread::sleep(Duration::from_millis(LOOP_SLEEP_MS)),
            Step::Reset => {
                info!("reset requested over MQTT");
                hw_init::request_reset();
                return Ok(());
            }
        }
    }
}
