//! # LTR-303 Ambient Light Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the Lite-On LTR-303 ambient light sensor,
//! built using the [`embedded-hal`] traits for I2C communication.
//!
//! The LTR-303 provides:
//! - A combined visible + IR channel (CH0) and an IR-only channel (CH1)
//! - Programmable gain (1x to 96x)
//! - Programmable integration time (50ms to 400ms)
//! - I2C interface (address 0x29)
//!
//! ## Features
//!
//! - **Periodic measurement** with data-ready polling
//! - **Approximate lux** from the combined channel, compensated for gain and exposure
//! - **Automatic gain control**, one ladder step per sample
//! - **Connection check** with human-readable diagnostics on any [`core::fmt::Write`]
//! - **Numeric error codes** compatible with the classic two-wire error table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ltr303::{Config, Exposure, Gain, Ltr303};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! let mut sensor = Ltr303::new(i2c);
//!
//! let config = Config::default()
//!     .with_gain(Gain::Gain4x)
//!     .with_exposure(Exposure::Ms200)
//!     .with_auto_gain(true);
//! sensor.init(config).unwrap();
//!
//! // Poll until a fresh sample arrives
//! match sensor.approximate_lux() {
//!     Ok(Some(reading)) if reading.valid => {
//!         // reading.lux holds the illuminance
//!     }
//!     Ok(_) => { /* gain changed or sample flagged invalid, try again */ }
//!     Err(e) => { /* e.code() gives the numeric error code */ }
//! }
//! # }
//! ```
//!
//! ## Logging
//!
//! Enable the `defmt-03` feature to get `defmt` log records and `defmt::Format`
//! implementations for the public types.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

use core::fmt::{self, Write};

use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource};

mod register;

pub use register::{
    control_byte, measurement_byte, MeasurementRate, Status, EXPECTED_MANUFAC_ID,
    EXPECTED_PART_ID, I2C_ADDRESS,
};
use register::{
    ALS_CONTR, ALS_DATA_CH0_0, ALS_DATA_CH1_0, ALS_MEAS_RATE, ALS_STATUS, MANUFAC_ID, PART_ID,
};

/// Counts per second at 1x gain to lux
pub const LUX_SCALE: f64 = 4.86979166667;

/// Combined-channel count above which auto-gain lowers the gain
pub const AUTO_GAIN_OVEREXPOSED_THRESHOLD: u16 = 60_000;

/// Combined-channel count below which auto-gain raises the gain
pub const AUTO_GAIN_UNDEREXPOSED_THRESHOLD: u16 = 1_000;

/// ALS gain settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Gain {
    /// 1x gain (1 lux to 64k lux)
    Gain1x = 0b000,
    /// 2x gain (0.5 lux to 32k lux)
    Gain2x = 0b001,
    /// 4x gain (0.25 lux to 16k lux)
    Gain4x = 0b010,
    /// 8x gain (0.125 lux to 8k lux)
    Gain8x = 0b011,
    /// 48x gain (0.02 lux to 1.3k lux)
    Gain48x = 0b110,
    /// 96x gain (0.01 lux to 600 lux)
    Gain96x = 0b111,
}

impl Gain {
    /// Amplification factor applied by this setting
    pub fn compensation(self) -> f64 {
        match self {
            Gain::Gain1x => 1.0,
            Gain::Gain2x => 2.0,
            Gain::Gain4x => 4.0,
            Gain::Gain8x => 8.0,
            Gain::Gain48x => 48.0,
            Gain::Gain96x => 96.0,
        }
    }

    /// Next lower rung of the gain ladder, `None` at 1x
    pub fn step_down(self) -> Option<Gain> {
        match self {
            Gain::Gain1x => None,
            Gain::Gain2x => Some(Gain::Gain1x),
            Gain::Gain4x => Some(Gain::Gain2x),
            Gain::Gain8x => Some(Gain::Gain4x),
            Gain::Gain48x => Some(Gain::Gain8x),
            Gain::Gain96x => Some(Gain::Gain48x),
        }
    }

    /// Next higher rung of the gain ladder, `None` at 96x
    pub fn step_up(self) -> Option<Gain> {
        match self {
            Gain::Gain1x => Some(Gain::Gain2x),
            Gain::Gain2x => Some(Gain::Gain4x),
            Gain::Gain4x => Some(Gain::Gain8x),
            Gain::Gain8x => Some(Gain::Gain48x),
            Gain::Gain48x => Some(Gain::Gain96x),
            Gain::Gain96x => None,
        }
    }
}

/// ALS integration time settings
///
/// The discriminants are the register codes, which are not in time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Exposure {
    /// 50ms integration time
    Ms50 = 0b001,
    /// 100ms integration time (power-on default)
    Ms100 = 0b000,
    /// 150ms integration time
    Ms150 = 0b100,
    /// 200ms integration time
    Ms200 = 0b010,
    /// 250ms integration time
    Ms250 = 0b101,
    /// 300ms integration time
    Ms300 = 0b110,
    /// 350ms integration time
    Ms350 = 0b111,
    /// 400ms integration time
    Ms400 = 0b011,
}

impl Exposure {
    /// Integration time in milliseconds
    pub fn millis(self) -> u16 {
        match self {
            Exposure::Ms50 => 50,
            Exposure::Ms100 => 100,
            Exposure::Ms150 => 150,
            Exposure::Ms200 => 200,
            Exposure::Ms250 => 250,
            Exposure::Ms300 => 300,
            Exposure::Ms350 => 350,
            Exposure::Ms400 => 400,
        }
    }

    /// Integration time as a fraction of a second
    pub fn compensation(self) -> f64 {
        match self {
            Exposure::Ms50 => 0.05,
            Exposure::Ms100 => 0.1,
            Exposure::Ms150 => 0.15,
            Exposure::Ms200 => 0.2,
            Exposure::Ms250 => 0.25,
            Exposure::Ms300 => 0.3,
            Exposure::Ms350 => 0.35,
            Exposure::Ms400 => 0.4,
        }
    }

    /// Shortest data register update period that fits this integration time
    pub fn measurement_rate(self) -> MeasurementRate {
        match self {
            Exposure::Ms50 => MeasurementRate::Ms50,
            Exposure::Ms100 => MeasurementRate::Ms100,
            Exposure::Ms150 | Exposure::Ms200 => MeasurementRate::Ms200,
            Exposure::Ms250 | Exposure::Ms300 | Exposure::Ms350 | Exposure::Ms400 => {
                MeasurementRate::Ms500
            }
        }
    }
}

/// Sensor configuration applied by [`Ltr303::init`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Config {
    /// Initial gain; auto-gain may change it later
    pub gain: Gain,
    /// Integration time
    pub exposure: Exposure,
    /// Adjust the gain from the combined channel count on every lux reading
    pub auto_gain: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain: Gain::Gain1x,
            exposure: Exposure::Ms100,
            auto_gain: false,
        }
    }
}

impl Config {
    /// Set the initial gain
    pub fn with_gain(self, gain: Gain) -> Self {
        Self { gain, ..self }
    }

    /// Set the integration time
    pub fn with_exposure(self, exposure: Exposure) -> Self {
        Self { exposure, ..self }
    }

    /// Enable or disable automatic gain control
    pub fn with_auto_gain(self, auto_gain: bool) -> Self {
        Self { auto_gain, ..self }
    }
}

/// Raw channel counts of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RawReading {
    /// CH0, visible + IR
    pub visible_and_ir: u16,
    /// CH1, IR only
    pub ir: u16,
    /// Validity bit reported by the sensor alongside this sample
    pub valid: bool,
}

/// Approximate illuminance
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct LuxReading {
    /// Illuminance in lux
    pub lux: f64,
    /// False if the sensor flagged the underlying sample as invalid
    pub valid: bool,
}

/// Outcome of one auto-gain step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AutoGain {
    /// Count is within bounds, keep the gain
    Ok,
    /// Count is out of bounds; switch to this gain and discard the sample
    Retry(Gain),
    /// Count is out of bounds but the gain is already at the end of the ladder
    Saturated,
}

impl AutoGain {
    /// Decide the next gain for a combined channel count
    pub fn evaluate(gain: Gain, visible_and_ir: u16) -> Self {
        let next = if visible_and_ir > AUTO_GAIN_OVEREXPOSED_THRESHOLD {
            gain.step_down()
        } else if visible_and_ir < AUTO_GAIN_UNDEREXPOSED_THRESHOLD {
            gain.step_up()
        } else {
            return AutoGain::Ok;
        };

        match next {
            Some(gain) => AutoGain::Retry(gain),
            None => AutoGain::Saturated,
        }
    }
}

/// Numeric error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    /// No error
    Success = 0,
    /// Data too long to fit in the transmit buffer
    DataTooLong = 1,
    /// NACK received on transmit of the address
    AddressNack = 2,
    /// NACK received on transmit of data
    DataNack = 3,
    /// Any other bus error
    Other = 4,
    /// Bus timeout
    Timeout = 5,
    /// Fewer bytes received than requested
    ShortRead = 6,
    /// No new measurement available yet
    NoNewData = 7,
}

impl ErrorCode {
    /// Look up a numeric code, `None` if it is not defined
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(ErrorCode::Success),
            1 => Some(ErrorCode::DataTooLong),
            2 => Some(ErrorCode::AddressNack),
            3 => Some(ErrorCode::DataNack),
            4 => Some(ErrorCode::Other),
            5 => Some(ErrorCode::Timeout),
            6 => Some(ErrorCode::ShortRead),
            7 => Some(ErrorCode::NoNewData),
            _ => None,
        }
    }

    /// Human-readable description
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::DataTooLong => "I2C data too long to fit in transmit buffer",
            ErrorCode::AddressNack => "I2C received NACK on transmit of address",
            ErrorCode::DataNack => "I2C received NACK on transmit of data",
            ErrorCode::Other => "I2C other error",
            ErrorCode::Timeout => "I2C timeout",
            ErrorCode::ShortRead => "I2C received fewer bytes than requested",
            ErrorCode::NoNewData => "No new measurement available",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), *self as u8)
    }
}

/// Text for a numeric error code, "Unknown error" for undefined codes
pub fn error_text(code: u8) -> &'static str {
    ErrorCode::from_u8(code).map_or("Unknown error", ErrorCode::as_str)
}

/// All possible errors in this crate
#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    I2c(E),
    /// The data registers hold no sample that has not been read yet
    NoNewData,
}

impl<E: i2c::Error> Error<E> {
    /// Numeric code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::I2c(e) => match e.kind() {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => ErrorCode::AddressNack,
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => ErrorCode::DataNack,
                _ => ErrorCode::Other,
            },
            Error::NoNewData => ErrorCode::NoNewData,
        }
    }
}

/// High-level LTR-303 driver
pub struct Ltr303<I2C> {
    i2c: I2C,
    address: u8,
    config: Config,
    // Always match what was last written to ALS_CONTR / ALS_MEAS_RATE
    gain_compensation: f64,
    exposure_compensation: f64,
    // Validity bit from the last status read
    data_valid: bool,
}

impl<I2C, E> Ltr303<I2C>
where
    I2C: I2c<Error = E>,
    E: i2c::Error,
{
    /// Create a new driver instance on the default address
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, I2C_ADDRESS)
    }

    /// Create a new driver instance on a custom address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        let config = Config::default();
        Self {
            i2c,
            address,
            config,
            gain_compensation: config.gain.compensation(),
            exposure_compensation: config.exposure.compensation(),
            data_valid: false,
        }
    }

    /// Apply `config` and start periodic measurement
    ///
    /// Probes the address, resets the sensor, programs the integration time and
    /// switches to active mode. Stops at the first failing step.
    pub fn init(&mut self, config: Config) -> Result<(), Error<E>> {
        self.config = config;

        self.probe()?;
        self.reset()?;
        self.write_measurement_rate()?;
        self.start_periodic_measurement()?;

        #[cfg(feature = "defmt-03")]
        defmt::debug!("LTR-303 initialized: {}", self.config);

        Ok(())
    }

    /// Put the sensor into active mode
    pub fn start_periodic_measurement(&mut self) -> Result<(), Error<E>> {
        self.write_control(self.config.gain, false, true)
    }

    /// Put the sensor into stand-by mode
    pub fn end_periodic_measurement(&mut self) -> Result<(), Error<E>> {
        self.write_control(self.config.gain, false, false)
    }

    /// Software reset, leaves the sensor in stand-by
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_control(self.config.gain, true, false)
    }

    /// Check that an LTR-303 answers on the bus
    ///
    /// Diagnostics are written to `diag`. The sensor is left in active mode; a
    /// failure to restart measurement is reported to `diag` but does not make
    /// the check fail, since the chip identity was already confirmed.
    pub fn is_connected<W: Write>(&mut self, diag: &mut W) -> bool {
        if let Err(e) = self.probe() {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("LTR-303 probe failed: {}", e.code());
            let _ = write!(diag, "LTR303 did not respond: {}\r\n", e.code());
            return false;
        }

        // Not all registers are readable during periodic measurement
        if let Err(e) = self.reset() {
            let _ = write!(diag, "LTR303 reset failed: {}\r\n", e.code());
        }

        let manufac_id = self.read_register(MANUFAC_ID).unwrap_or(0);
        if manufac_id != EXPECTED_MANUFAC_ID {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("LTR-303 unknown manufacturer ID {=u8:#x}", manufac_id);
            let _ = write!(
                diag,
                "LTR303 returned unknown manufacturer ID: 0x{:02X}\r\n",
                manufac_id
            );
            return false;
        }

        let part_id = self.read_register(PART_ID).unwrap_or(0);
        if part_id != EXPECTED_PART_ID {
            #[cfg(feature = "defmt-03")]
            defmt::warn!("LTR-303 unknown part ID {=u8:#x}", part_id);
            let _ = write!(
                diag,
                "LTR303 returned unknown part number: 0x{:02X}\r\n",
                part_id
            );
            return false;
        }

        match self.start_periodic_measurement() {
            Ok(()) => {
                let _ = write!(diag, "LTR303 connected\r\n");
            }
            Err(e) => {
                let _ = write!(
                    diag,
                    "LTR303 failed to restart periodic measurement: {}\r\n",
                    e.code()
                );
            }
        }
        true
    }

    /// Get the manufacturer and part ID
    pub fn get_device_id(&mut self) -> Result<(u8, u8), Error<E>> {
        let manufac_id = self.read_register(MANUFAC_ID)?;
        let part_id = self.read_register(PART_ID)?;
        Ok((manufac_id, part_id))
    }

    /// Read and decode the status register
    pub fn status(&mut self) -> Result<Status, Error<E>> {
        match self.read_register(ALS_STATUS) {
            Ok(status) => {
                let status = Status::from_register(status);
                self.data_valid = status.data_valid;
                Ok(status)
            }
            Err(e) => {
                self.data_valid = false;
                Err(e)
            }
        }
    }

    /// Read both channels if a new sample is available
    ///
    /// Returns [`Error::NoNewData`] without touching the data registers if the
    /// sample has already been read. CH1 is read before CH0 so both belong to
    /// the same sample.
    pub fn get_raw_counts(&mut self) -> Result<RawReading, Error<E>> {
        if !self.status()?.data_ready {
            return Err(Error::NoNewData);
        }

        let ir = self.read_u16(ALS_DATA_CH1_0)?;
        let visible_and_ir = self.read_u16(ALS_DATA_CH0_0)?;

        Ok(RawReading {
            visible_and_ir,
            ir,
            valid: self.data_valid,
        })
    }

    /// Read a new sample and convert it to approximate lux
    ///
    /// Returns `Ok(None)` when auto-gain changed the gain and the sample must
    /// be taken again.
    pub fn approximate_lux(&mut self) -> Result<Option<LuxReading>, Error<E>> {
        let raw = self.get_raw_counts()?;

        if self.config.auto_gain {
            if let AutoGain::Retry(_) = self.apply_auto_gain(raw.visible_and_ir)? {
                return Ok(None);
            }
        }

        Ok(Some(LuxReading {
            lux: self.counts_to_lux(raw.visible_and_ir),
            valid: self.data_valid,
        }))
    }

    /// Run one auto-gain step and program the new gain if it changed
    pub fn apply_auto_gain(&mut self, visible_and_ir: u16) -> Result<AutoGain, Error<E>> {
        let step = AutoGain::evaluate(self.config.gain, visible_and_ir);
        if let AutoGain::Retry(gain) = step {
            #[cfg(feature = "defmt-03")]
            defmt::debug!(
                "LTR-303 auto-gain {} -> {} (count {})",
                self.config.gain,
                gain,
                visible_and_ir
            );
            self.write_control(gain, false, true)?;
        }
        Ok(step)
    }

    /// Compensate a combined channel count for the current gain and exposure
    pub fn counts_to_lux(&self, visible_and_ir: u16) -> f64 {
        f64::from(visible_and_ir) / self.gain_compensation / self.exposure_compensation * LUX_SCALE
    }

    /// Current configuration, including any gain picked by auto-gain
    pub fn config(&self) -> Config {
        self.config
    }

    /// Current gain
    pub fn gain(&self) -> Gain {
        self.config.gain
    }

    /// Current integration time
    pub fn exposure(&self) -> Exposure {
        self.config.exposure
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.i2c
    }

    // Zero-length write, only checks for an ACK
    fn probe(&mut self) -> Result<(), Error<E>> {
        self.i2c.write(self.address, &[]).map_err(Error::I2c)
    }

    fn write_control(&mut self, gain: Gain, reset: bool, active: bool) -> Result<(), Error<E>> {
        self.write_register(ALS_CONTR, control_byte(gain, reset, active))?;
        self.config.gain = gain;
        self.gain_compensation = gain.compensation();
        Ok(())
    }

    fn write_measurement_rate(&mut self) -> Result<(), Error<E>> {
        let exposure = self.config.exposure;
        self.write_register(ALS_MEAS_RATE, measurement_byte(exposure))?;
        self.exposure_compensation = exposure.compensation();
        Ok(())
    }

    // Helper methods for register access
    fn read_register(&mut self, address: u8) -> Result<u8, Error<E>> {
        let mut buffer = [0u8; 1];
        self.i2c
            .write_read(self.address, &[address], &mut buffer)
            .map_err(Error::I2c)?;
        Ok(buffer[0])
    }

    // Low byte first
    fn read_u16(&mut self, address: u8) -> Result<u16, Error<E>> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[address], &mut buffer)
            .map_err(Error::I2c)?;
        Ok(u16::from_le_bytes(buffer))
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &[address, value])
            .map_err(Error::I2c)
    }
}
