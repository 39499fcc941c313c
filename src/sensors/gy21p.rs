//! GY-21P weather-station breakout: SI7021 + BMP280 on one I2C bus.
//!
//! A forced read triggers a no-hold SI7021 conversion and a BMP280 forced
//! measurement, then waits [`SETTLE_MS`] for both to complete. That wait
//! blocks the whole cooperative loop by design and is the only blocking
//! delay in the firmware; it is bounded and small (the SI7021 datasheet
//! worst case at 12-bit resolution is ~20 ms).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: real bus transactions via `hw_init`.
//! On host/test: readings come from atomics with injection hooks.

use log::debug;

use crate::error::SensorError;
use crate::sensors::{EnvSensor, SensorKind};

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Conversion settling time per forced read, milliseconds.
pub const SETTLE_MS: u32 = 25;

#[cfg(target_os = "espidf")]
const SI7021_ADDR: u8 = 0x40;
#[cfg(target_os = "espidf")]
const SI7021_CMD_MEASURE_RH: u8 = 0xF5;
#[cfg(target_os = "espidf")]
const SI7021_CMD_READ_TEMP: u8 = 0xE0;

#[cfg(target_os = "espidf")]
const BMP280_ADDR: u8 = 0x76;
#[cfg(target_os = "espidf")]
const BMP280_REG_ID: u8 = 0xD0;
#[cfg(target_os = "espidf")]
const BMP280_REG_CALIB: u8 = 0x88;
#[cfg(target_os = "espidf")]
const BMP280_REG_CTRL_MEAS: u8 = 0xF4;
#[cfg(target_os = "espidf")]
const BMP280_REG_PRESS_MSB: u8 = 0xF7;
/// osrs_t = x1, osrs_p = x1, forced mode.
#[cfg(target_os = "espidf")]
const BMP280_CTRL_FORCED: u8 = 0x25;

// ── Host simulation hooks ─────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_PRESENT: AtomicBool = AtomicBool::new(true);
#[cfg(not(target_os = "espidf"))]
static SIM_FAIL_READS: AtomicBool = AtomicBool::new(false);
#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_MILLI_C: AtomicI32 = AtomicI32::new(21_500);
#[cfg(not(target_os = "espidf"))]
static SIM_RH_MILLI_PCT: AtomicU32 = AtomicU32::new(48_000);
#[cfg(not(target_os = "espidf"))]
static SIM_PRESSURE_PA: AtomicU32 = AtomicU32::new(101_325);

/// Test hook: make sensor construction succeed or fail.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_present(present: bool) {
    SIM_PRESENT.store(present, Ordering::Relaxed);
}

/// Test hook: make every forced read fail with a bus error.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_fail_reads(fail: bool) {
    SIM_FAIL_READS.store(fail, Ordering::Relaxed);
}

/// Test hook: inject the simulated environment.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_environment(milli_celsius: i32, milli_rh_pct: u32, pressure_pa: u32) {
    SIM_TEMP_MILLI_C.store(milli_celsius, Ordering::Relaxed);
    SIM_RH_MILLI_PCT.store(milli_rh_pct, Ordering::Relaxed);
    SIM_PRESSURE_PA.store(pressure_pa, Ordering::Relaxed);
}

// ── BMP280 calibration ────────────────────────────────────────

#[cfg(target_os = "espidf")]
#[derive(Debug, Clone, Copy, Default)]
struct Bmp280Calib {
    dig_t1: u16,
    dig_t2: i16,
    dig_t3: i16,
    dig_p1: u16,
    dig_p2: i16,
    dig_p3: i16,
    dig_p4: i16,
    dig_p5: i16,
    dig_p6: i16,
    dig_p7: i16,
    dig_p8: i16,
    dig_p9: i16,
}

#[cfg(target_os = "espidf")]
impl Bmp280Calib {
    fn from_raw(raw: &[u8; 24]) -> Self {
        let u = |i: usize| u16::from_le_bytes([raw[i], raw[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([raw[i], raw[i + 1]]);
        Self {
            dig_t1: u(0),
            dig_t2: s(2),
            dig_t3: s(4),
            dig_p1: u(6),
            dig_p2: s(8),
            dig_p3: s(10),
            dig_p4: s(12),
            dig_p5: s(14),
            dig_p6: s(16),
            dig_p7: s(18),
            dig_p8: s(20),
            dig_p9: s(22),
        }
    }
}

// ── Sensor ────────────────────────────────────────────────────

pub struct Gy21p {
    cached: String,
    #[cfg(target_os = "espidf")]
    calib: Bmp280Calib,
}

impl Gy21p {
    /// Probe both chips and read the BMP280 calibration block.
    #[cfg(target_os = "espidf")]
    pub fn new(scl: u8, sda: u8) -> Result<Self, SensorError> {
        hw_init::i2c_master_init(scl, sda, crate::pins::I2C_FREQ_HZ)
            .map_err(|_| SensorError::NotResponding)?;

        // SI7021 probe: address a temperature readout; NAK = absent.
        let mut tmp = [0u8; 2];
        hw_init::i2c_write(SI7021_ADDR, &[SI7021_CMD_READ_TEMP])
            .and_then(|()| hw_init::i2c_read(SI7021_ADDR, &mut tmp))
            .map_err(SensorError::BusError)?;

        // BMP280 probe via chip-id register (0x58).
        let mut id = [0u8; 1];
        hw_init::i2c_write(BMP280_ADDR, &[BMP280_REG_ID])
            .and_then(|()| hw_init::i2c_read(BMP280_ADDR, &mut id))
            .map_err(SensorError::BusError)?;
        if id[0] != 0x58 {
            return Err(SensorError::NotResponding);
        }

        let mut raw = [0u8; 24];
        hw_init::i2c_write(BMP280_ADDR, &[BMP280_REG_CALIB])
            .and_then(|()| hw_init::i2c_read(BMP280_ADDR, &mut raw))
            .map_err(SensorError::BusError)?;

        Ok(Self {
            cached: String::new(),
            calib: Bmp280Calib::from_raw(&raw),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(_scl: u8, _sda: u8) -> Result<Self, SensorError> {
        if !SIM_PRESENT.load(Ordering::Relaxed) {
            return Err(SensorError::NotResponding);
        }
        Ok(Self {
            cached: String::new(),
        })
    }

    #[cfg(target_os = "espidf")]
    fn measure(&mut self) -> Result<String, SensorError> {
        // Kick off both conversions, then wait once for the slower chip.
        hw_init::i2c_write(SI7021_ADDR, &[SI7021_CMD_MEASURE_RH]).map_err(SensorError::BusError)?;
        hw_init::i2c_write(BMP280_ADDR, &[BMP280_REG_CTRL_MEAS, BMP280_CTRL_FORCED])
            .map_err(SensorError::BusError)?;
        std::thread::sleep(std::time::Duration::from_millis(u64::from(SETTLE_MS)));

        // SI7021: RH result, then the temperature from the same conversion.
        let mut rh_raw = [0u8; 2];
        hw_init::i2c_read(SI7021_ADDR, &mut rh_raw).map_err(SensorError::BusError)?;
        let rh_code = u16::from_be_bytes(rh_raw);
        let rh_pct = (125.0 * f32::from(rh_code) / 65536.0 - 6.0).clamp(0.0, 100.0);

        let mut t_raw = [0u8; 2];
        hw_init::i2c_write(SI7021_ADDR, &[SI7021_CMD_READ_TEMP])
            .and_then(|()| hw_init::i2c_read(SI7021_ADDR, &mut t_raw))
            .map_err(SensorError::BusError)?;
        let t_code = u16::from_be_bytes(t_raw);
        let temp_c = 175.72 * f32::from(t_code) / 65536.0 - 46.85;
        if !(-40.0..=85.0).contains(&temp_c) {
            return Err(SensorError::OutOfRange);
        }

        // BMP280: 20-bit pressure + 20-bit temperature, Bosch compensation.
        let mut burst = [0u8; 6];
        hw_init::i2c_write(BMP280_ADDR, &[BMP280_REG_PRESS_MSB])
            .and_then(|()| hw_init::i2c_read(BMP280_ADDR, &mut burst))
            .map_err(SensorError::BusError)?;
        let adc_p =
            (i32::from(burst[0]) << 12) | (i32::from(burst[1]) << 4) | (i32::from(burst[2]) >> 4);
        let adc_t =
            (i32::from(burst[3]) << 12) | (i32::from(burst[4]) << 4) | (i32::from(burst[5]) >> 4);
        let pressure_pa = self.compensate_pressure(adc_t, adc_p)?;

        Ok(format_value(temp_c, rh_pct, pressure_pa as f32 / 100.0))
    }

    /// Bosch BMP280 integer compensation (datasheet §3.11.3, 32-bit variant).
    #[cfg(target_os = "espidf")]
    fn compensate_pressure(&self, adc_t: i32, adc_p: i32) -> Result<u32, SensorError> {
        let c = &self.calib;

        let var1 = ((adc_t >> 3) - (i32::from(c.dig_t1) << 1)) * i32::from(c.dig_t2) >> 11;
        let var2 = (((adc_t >> 4) - i32::from(c.dig_t1))
            * ((adc_t >> 4) - i32::from(c.dig_t1))
            >> 12)
            * i32::from(c.dig_t3)
            >> 14;
        let t_fine = var1 + var2;

        let mut var1 = i64::from(t_fine) - 128_000;
        let mut var2 = var1 * var1 * i64::from(c.dig_p6);
        var2 += (var1 * i64::from(c.dig_p5)) << 17;
        var2 += i64::from(c.dig_p4) << 35;
        var1 = ((var1 * var1 * i64::from(c.dig_p3)) >> 8) + ((var1 * i64::from(c.dig_p2)) << 12);
        var1 = ((1i64 << 47) + var1) * i64::from(c.dig_p1) >> 33;
        if var1 == 0 {
            return Err(SensorError::OutOfRange);
        }
        let mut p: i64 = 1_048_576 - i64::from(adc_p);
        p = (((p << 31) - var2) * 3125) / var1;
        let var1 = (i64::from(c.dig_p9) * (p >> 13) * (p >> 13)) >> 25;
        let var2 = (i64::from(c.dig_p8) * p) >> 19;
        p = ((p + var1 + var2) >> 8) + (i64::from(c.dig_p7) << 4);
        Ok((p >> 8) as u32)
    }

    #[cfg(not(target_os = "espidf"))]
    fn measure(&mut self) -> Result<String, SensorError> {
        if SIM_FAIL_READS.load(Ordering::Relaxed) {
            return Err(SensorError::BusError(-1));
        }
        let t = SIM_TEMP_MILLI_C.load(Ordering::Relaxed) as f32 / 1000.0;
        let rh = SIM_RH_MILLI_PCT.load(Ordering::Relaxed) as f32 / 1000.0;
        let p = SIM_PRESSURE_PA.load(Ordering::Relaxed) as f32 / 100.0;
        Ok(format_value(t, rh, p))
    }
}

impl EnvSensor for Gy21p {
    fn kind(&self) -> SensorKind {
        SensorKind::Gy21p
    }

    fn read(&mut self, force: bool) -> Result<String, SensorError> {
        if force || self.cached.is_empty() {
            let value = self.measure()?;
            debug!("GY-21P: {value}");
            self.cached = value;
        }
        Ok(self.cached.clone())
    }
}

/// `t:<celsius> h:<rh%> p:<hPa>`, one decimal each.
fn format_value(temp_c: f32, rh_pct: f32, hpa: f32) -> String {
    format!("t:{temp_c:.1} h:{rh_pct:.1} p:{hpa:.1}")
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    // One test: the sim hooks are process-global, so the scenarios run in
    // sequence instead of racing under the parallel test runner.
    #[test]
    fn forced_and_cached_reads() {
        sim_set_fail_reads(false);
        sim_set_present(true);
        sim_set_environment(23_400, 51_200, 100_360);

        let mut s = Gy21p::new(5, 4).unwrap();
        let first = s.read(true).unwrap();
        assert_eq!(first, "t:23.4 h:51.2 p:1003.6");

        // Forced read fails, cached read still serves the old value.
        sim_set_fail_reads(true);
        assert!(s.read(true).is_err());
        assert_eq!(s.read(false).unwrap(), first);
        sim_set_fail_reads(false);
    }
}
