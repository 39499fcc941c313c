//! GPIO / peripheral pin assignments for the Gardlink garden board.
//!
//! Single source of truth — configuration defaults and drivers reference
//! this module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pump MOSFETs (IRLZ44N low-side switches)
// ---------------------------------------------------------------------------

/// Digital output: tomato-bed pump MOSFET gate (active HIGH).
pub const PUMP_TOMATOES_GPIO: u8 = 12;
/// Digital output: cucumber-bed pump MOSFET gate (active HIGH).
pub const PUMP_CUCUMBERS_GPIO: u8 = 14;

// ---------------------------------------------------------------------------
// Digital inputs
// ---------------------------------------------------------------------------

/// Rain-barrel float switch — HIGH = water present. Spare header on the
/// board; not wired into the default link table.
pub const BARREL_FLOAT_GPIO: u8 = 13;

// ---------------------------------------------------------------------------
// I2C bus (weather-station sensors)
// ---------------------------------------------------------------------------

pub const I2C_SCL_GPIO: u8 = 5;
pub const I2C_SDA_GPIO: u8 = 4;

/// I2C bus clock. The GY-21P breakout is specified up to 400 kHz; 100 kHz
/// leaves margin for the long cable run to the weather station.
pub const I2C_FREQ_HZ: u32 = 100_000;
