//! Wi-Fi station bring-up.
//!
//! Credentials are baked in at build time via `GARDLINK_WIFI_SSID` /
//! `GARDLINK_WIFI_PASS`; the garden controller has no provisioning UI.

use anyhow::{Context, bail};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::info;

/// Connect as a station and block until an IP lease is held.
pub fn connect(
    modem: Modem,
    sys_loop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> anyhow::Result<BlockingWifi<EspWifi<'static>>> {
    let ssid = option_env!("GARDLINK_WIFI_SSID").unwrap_or("");
    let pass = option_env!("GARDLINK_WIFI_PASS").unwrap_or("");
    if ssid.is_empty() {
        bail!("no Wi-Fi SSID baked in; set GARDLINK_WIFI_SSID at build time");
    }

    let mut wifi = BlockingWifi::wrap(
        EspWifi::new(modem, sys_loop.clone(), Some(nvs)).context("Wi-Fi driver init failed")?,
        sys_loop,
    )
    .context("Wi-Fi event wrapper failed")?;

    let auth = if pass.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: ssid.try_into().map_err(|_| anyhow::anyhow!("SSID too long"))?,
        password: pass
            .try_into()
            .map_err(|_| anyhow::anyhow!("password too long"))?,
        auth_method: auth,
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("Wi-Fi started, connecting to '{ssid}'");
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("Wi-Fi up: {:?}", wifi.wifi().sta_netif().get_ip_info()?);

    Ok(wifi)
}
