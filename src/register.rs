//! Low-level register map and bit encodings for the LTR-303
//!
//! Everything here is a pure function of the configuration so the byte values
//! can be checked without a bus.

use crate::{Exposure, Gain};

/// Default I2C address of the LTR-303
pub const I2C_ADDRESS: u8 = 0x29;

// Register addresses
pub(crate) const ALS_CONTR: u8 = 0x80;
pub(crate) const ALS_MEAS_RATE: u8 = 0x85;
pub(crate) const PART_ID: u8 = 0xA0;
pub(crate) const MANUFAC_ID: u8 = 0x05;
pub(crate) const ALS_DATA_CH1_0: u8 = 0x88;
#[allow(dead_code)]
pub(crate) const ALS_DATA_CH1_1: u8 = 0x89;
pub(crate) const ALS_DATA_CH0_0: u8 = 0x8A;
#[allow(dead_code)]
pub(crate) const ALS_DATA_CH0_1: u8 = 0x8B;
pub(crate) const ALS_STATUS: u8 = 0x8C;

/// Value the part-ID register must hold
pub const EXPECTED_PART_ID: u8 = 0xA0;
/// Value the manufacturer-ID register must hold
pub const EXPECTED_MANUFAC_ID: u8 = 0x05;

const CONTR_SW_RESET: u8 = 0x02;
const CONTR_ACTIVE_MODE: u8 = 0x01;

const STATUS_DATA_INVALID: u8 = 0x80;
const STATUS_DATA_READY: u8 = 0x04;

/// Data register update period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum MeasurementRate {
    /// 50ms between updates
    Ms50 = 0b000,
    /// 100ms between updates
    Ms100 = 0b001,
    /// 200ms between updates
    Ms200 = 0b010,
    /// 500ms between updates (power-on default)
    Ms500 = 0b011,
}

impl MeasurementRate {
    /// Update period in milliseconds
    pub fn millis(self) -> u16 {
        match self {
            MeasurementRate::Ms50 => 50,
            MeasurementRate::Ms100 => 100,
            MeasurementRate::Ms200 => 200,
            MeasurementRate::Ms500 => 500,
        }
    }
}

/// Decoded ALS_STATUS register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Status {
    /// False when the sensor flags the current sample as invalid
    pub data_valid: bool,
    /// True if the data registers hold a sample that has not been read yet
    pub data_ready: bool,
}

impl Status {
    /// Decode a raw status byte
    pub fn from_register(status: u8) -> Self {
        Self {
            data_valid: status & STATUS_DATA_INVALID == 0,
            data_ready: status & STATUS_DATA_READY != 0,
        }
    }
}

/// ALS_CONTR byte for the given gain, software reset and active mode bits
pub fn control_byte(gain: Gain, reset: bool, active: bool) -> u8 {
    let mut contr = (gain as u8) << 2;
    if reset {
        contr |= CONTR_SW_RESET;
    }
    if active {
        contr |= CONTR_ACTIVE_MODE;
    }
    contr
}

/// ALS_MEAS_RATE byte for the given exposure
///
/// The update interval is picked so it never undercuts the integration time.
pub fn measurement_byte(exposure: Exposure) -> u8 {
    ((exposure as u8) << 3) | exposure.measurement_rate() as u8
}
