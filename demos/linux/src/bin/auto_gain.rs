//! Automatic gain control example
//!
//! This example demonstrates how to:
//! - Check that the LTR-303 is connected
//! - Start periodic measurement with auto-gain enabled
//! - Poll for approximate lux, skipping samples discarded by a gain change

use core::fmt;

use embedded_hal::delay::DelayNs;
use linux_embedded_hal::{Delay, I2cdev};
use ltr303::{error_text, Config, Error, Exposure, Gain, Ltr303};

/// Forwards connection diagnostics to stdout
struct Stdout;

impl fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print!("{}", s);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut delay = Delay;

    let mut sensor = Ltr303::new(i2c);

    if !sensor.is_connected(&mut Stdout) {
        return Err("LTR-303 not found on /dev/i2c-1".into());
    }

    let config = Config::default()
        .with_gain(Gain::Gain1x)
        .with_exposure(Exposure::Ms100)
        .with_auto_gain(true);
    if let Err(e) = sensor.init(config) {
        let code = e.code() as u8;
        return Err(format!("init failed: {} ({})", error_text(code), code).into());
    }

    println!("Sensor initialized with automatic gain control");
    println!("Press Ctrl+C to exit\n");

    loop {
        delay.delay_ms(config.exposure.millis().into());

        match sensor.approximate_lux() {
            Ok(Some(reading)) if reading.valid => {
                println!("Lux: {:10.2} | Gain: {:?}", reading.lux, sensor.gain());
            }
            Ok(Some(reading)) => {
                println!("Lux: {:10.2} | Gain: {:?} (invalid)", reading.lux, sensor.gain());
            }
            Ok(None) => println!("Gain changed to {:?}, resampling", sensor.gain()),
            Err(Error::NoNewData) => {}
            Err(e) => println!("Read failed: {}", e.code()),
        }
    }
}
