//! One-shot hardware peripheral access.
//!
//! Configures GPIO directions and the I2C master using raw ESP-IDF sys
//! calls, and funnels every pin read/write in the firmware through one
//! place.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: real GPIO/I2C driver calls.
//! On host/test: an in-memory pin-level table with injection functions so
//! device logic can be exercised without hardware.

use core::fmt;

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during peripheral setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    I2cInitFailed(i32),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={rc})"),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn gpio_config_output(pin: u8, initial_high: bool) -> Result<(), HwInitError> {
    // SAFETY: raw IDF GPIO calls; called from the single-threaded init path.
    unsafe {
        let rc = gpio_reset_pin(pin as i32);
        if rc != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(rc));
        }
        let rc = gpio_set_direction(pin as i32, gpio_mode_t_GPIO_MODE_OUTPUT);
        if rc != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(rc));
        }
    }
    gpio_write(pin, initial_high);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_config_input(pin: u8) -> Result<(), HwInitError> {
    // SAFETY: see gpio_config_output.
    unsafe {
        let rc = gpio_reset_pin(pin as i32);
        if rc != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(rc));
        }
        let rc = gpio_set_direction(pin as i32, gpio_mode_t_GPIO_MODE_INPUT);
        if rc != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(rc));
        }
        let rc = gpio_set_pull_mode(pin as i32, gpio_pull_mode_t_GPIO_PULLDOWN_ONLY);
        if rc != ESP_OK {
            return Err(HwInitError::GpioConfigFailed(rc));
        }
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: u8, high: bool) {
    // SAFETY: gpio_set_level is safe for configured pins; errors here mean
    // a miswired pin table and are not recoverable at runtime.
    unsafe {
        let _ = gpio_set_level(pin as i32, u32::from(high));
    }
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: u8) -> bool {
    // SAFETY: plain level read.
    unsafe { gpio_get_level(pin as i32) != 0 }
}

// ── GPIO (host simulation) ────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const SIM_PIN_COUNT: usize = 64;

#[cfg(not(target_os = "espidf"))]
static SIM_PINS: [AtomicBool; SIM_PIN_COUNT] =
    [const { AtomicBool::new(false) }; SIM_PIN_COUNT];

#[cfg(not(target_os = "espidf"))]
pub fn gpio_config_output(pin: u8, initial_high: bool) -> Result<(), HwInitError> {
    gpio_write(pin, initial_high);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_config_input(_pin: u8) -> Result<(), HwInitError> {
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: u8, high: bool) {
    SIM_PINS[pin as usize % SIM_PIN_COUNT].store(high, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: u8) -> bool {
    SIM_PINS[pin as usize % SIM_PIN_COUNT].load(Ordering::Relaxed)
}

/// Test hook: drive a simulated input pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_pin(pin: u8, high: bool) {
    gpio_write(pin, high);
}

/// Test hook: observe a simulated output pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_pin(pin: u8) -> bool {
    gpio_read(pin)
}

// ── I2C master ────────────────────────────────────────────────

/// I2C transaction timeout. Generous because the weather-station cable run
/// is long; a stuck bus returns an error rather than blocking the loop.
#[cfg(target_os = "espidf")]
const I2C_TIMEOUT_TICKS: u32 = 20;

/// Multiple links may share the bus; only the first caller installs the
/// driver.
static I2C_INSTALLED: AtomicBool = AtomicBool::new(false);

#[cfg(target_os = "espidf")]
pub fn i2c_master_init(scl: u8, sda: u8, freq_hz: u32) -> Result<(), HwInitError> {
    if I2C_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    let cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: sda as i32,
        scl_io_num: scl as i32,
        sda_pullup_en: true,
        scl_pullup_en: true,
        __bindgen_anon_1: i2c_config_t__bindgen_ty_1 {
            master: i2c_config_t__bindgen_ty_1__bindgen_ty_1 { clk_speed: freq_hz },
        },
        ..Default::default()
    };
    // SAFETY: one-shot driver install on port 0 during init.
    unsafe {
        let rc = i2c_param_config(0, &cfg);
        if rc != ESP_OK {
            return Err(HwInitError::I2cInitFailed(rc));
        }
        let rc = i2c_driver_install(0, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0);
        if rc != ESP_OK {
            return Err(HwInitError::I2cInitFailed(rc));
        }
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn i2c_write(addr: u8, bytes: &[u8]) -> Result<(), i32> {
    // SAFETY: write transaction on the installed port-0 driver.
    let rc = unsafe {
        i2c_master_write_to_device(0, addr, bytes.as_ptr(), bytes.len(), I2C_TIMEOUT_TICKS)
    };
    if rc == ESP_OK { Ok(()) } else { Err(rc) }
}

#[cfg(target_os = "espidf")]
pub fn i2c_read(addr: u8, buf: &mut [u8]) -> Result<(), i32> {
    // SAFETY: read transaction on the installed port-0 driver.
    let rc = unsafe {
        i2c_master_read_from_device(0, addr, buf.as_mut_ptr(), buf.len(), I2C_TIMEOUT_TICKS)
    };
    if rc == ESP_OK { Ok(()) } else { Err(rc) }
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_master_init(_scl: u8, _sda: u8, _freq_hz: u32) -> Result<(), HwInitError> {
    I2C_INSTALLED.store(true, Ordering::SeqCst);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_write(_addr: u8, _bytes: &[u8]) -> Result<(), i32> {
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_read(_addr: u8, buf: &mut [u8]) -> Result<(), i32> {
    buf.fill(0);
    Ok(())
}

// ── Reset ─────────────────────────────────────────────────────

/// Request a hardware reset. On the host this only logs, so tests can
/// exercise the reset path.
#[cfg(target_os = "espidf")]
pub fn request_reset() {
    // SAFETY: esp_restart does not return.
    unsafe { esp_restart() };
}

#[cfg(not(target_os = "espidf"))]
pub fn request_reset() {
    log::warn!("hw(sim): hardware reset requested");
}
