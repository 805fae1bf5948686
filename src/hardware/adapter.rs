//! Raw-signal adapters.
//!
//! Drivers below this layer only know pulse widths and ADC fractions. The adapters
//! here turn those into the units the monitor works in, applying the ultrasonic
//! calibration divisor so that it lives in exactly one place.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::capabilities::{Potentiometer, Rangefinder};

/// Theoretical echo time per centimeter of distance (µs/cm) at room temperature.
pub const THEORETICAL_ULTRASONIC_DIVISOR: f64 = 58.0;

/// Low-level trigger-and-time primitive of an ultrasonic module.
#[async_trait]
pub trait EchoTimer: Send + Sync {
    /// Fire the trigger and return the echo pulse width in microseconds.
    async fn measure_echo_us(&self) -> Result<f64>;
}

/// Low-level ADC channel.
#[async_trait]
pub trait AdcChannel: Send + Sync {
    /// Sample the channel as a fraction of full scale, 0.0 to 1.0.
    async fn read_fraction(&self) -> Result<f64>;
}

/// Rangefinder built on an [`EchoTimer`] and a calibration divisor.
pub struct EchoRangefinder<E> {
    echo: E,
    divisor: f64,
}

impl<E: EchoTimer> EchoRangefinder<E> {
    /// Create a rangefinder dividing echo time (µs) by `divisor` to get cm.
    ///
    /// The divisor is validated with the rest of the configuration at startup.
    pub fn new(echo: E, divisor: f64) -> Self {
        Self { echo, divisor }
    }
}

#[async_trait]
impl<E: EchoTimer> Rangefinder for EchoRangefinder<E> {
    async fn read_distance_cm(&self) -> Result<f64> {
        let pulse_us = self.echo.measure_echo_us().await?;
        if !pulse_us.is_finite() || pulse_us <= 0.0 {
            return Err(anyhow!("no usable echo (pulse width {pulse_us} us)"));
        }
        Ok(round2(pulse_us / self.divisor))
    }
}

/// Potentiometer wired to an [`AdcChannel`].
pub struct AdcPotentiometer<A> {
    channel: A,
}

impl<A: AdcChannel> AdcPotentiometer<A> {
    /// Wrap an ADC channel.
    pub fn new(channel: A) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl<A: AdcChannel> Potentiometer for AdcPotentiometer<A> {
    async fn read_percentage(&self) -> Result<f64> {
        let fraction = self.channel.read_fraction().await?;
        if !fraction.is_finite() {
            return Err(anyhow!("ADC returned {fraction}"));
        }
        Ok(round2(fraction.clamp(0.0, 1.0) * 100.0))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEcho(f64);

    #[async_trait]
    impl EchoTimer for FixedEcho {
        async fn measure_echo_us(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    struct FixedAdc(f64);

    #[async_trait]
    impl AdcChannel for FixedAdc {
        async fn read_fraction(&self) -> Result<f64> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn echo_is_divided_by_calibration() {
        let sensor = EchoRangefinder::new(FixedEcho(790.0), 79.0);
        assert_eq!(sensor.read_distance_cm().await.unwrap(), 10.0);

        let theoretical = EchoRangefinder::new(FixedEcho(580.0), THEORETICAL_ULTRASONIC_DIVISOR);
        assert_eq!(theoretical.read_distance_cm().await.unwrap(), 10.0);
    }

    #[tokio::test]
    async fn distance_is_rounded_to_hundredths() {
        let sensor = EchoRangefinder::new(FixedEcho(1000.0), 79.0);
        assert_eq!(sensor.read_distance_cm().await.unwrap(), 12.66);
    }

    #[tokio::test]
    async fn missing_echo_is_a_fault() {
        for pulse in [0.0, -3.0, f64::NAN] {
            let sensor = EchoRangefinder::new(FixedEcho(pulse), 79.0);
            assert!(sensor.read_distance_cm().await.is_err());
        }
    }

    #[tokio::test]
    async fn adc_fraction_becomes_percentage() {
        let pot = AdcPotentiometer::new(FixedAdc(0.123_456));
        assert_eq!(pot.read_percentage().await.unwrap(), 12.35);

        let pinned = AdcPotentiometer::new(FixedAdc(1.02));
        assert_eq!(pinned.read_percentage().await.unwrap(), 100.0);
    }

    #[tokio::test]
    async fn adc_nan_is_a_fault() {
        let pot = AdcPotentiometer::new(FixedAdc(f64::NAN));
        assert!(pot.read_percentage().await.is_err());
    }
}
