//! ESP-IDF implementations of the capability traits.
//!
//! Only built for `target_os = "espidf"`.

use alloc::sync::Arc;
use core::borrow::Borrow;
use core::time::Duration;

use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_svc::hal::gpio::ADCPin;
use esp_idf_svc::hal::ledc::LedcDriver;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use super::{AnalogInput, Clock, HalError, PeriodicTrigger, PulseOutput};

/// Oneshot ADC channel.
pub struct EspAnalog<'d, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'d, T::Adc>>,
{
    channel: AdcChannelDriver<'d, T, M>,
}

impl<'d, T, M> EspAnalog<'d, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'d, T::Adc>>,
{
    pub fn new(channel: AdcChannelDriver<'d, T, M>) -> Self {
        Self { channel }
    }
}

impl<'d, T, M> AnalogInput for EspAnalog<'d, T, M>
where
    T: ADCPin,
    M: Borrow<AdcDriver<'d, T::Adc>>,
{
    #[inline]
    fn read(&mut self) -> Result<u16, HalError> {
        self.channel.read_raw().map_err(|_| HalError::AnalogRead)
    }
}

/// LEDC channel configured with 12-bit resolution.
pub struct EspPulse<'d> {
    driver: LedcDriver<'d>,
}

impl<'d> EspPulse<'d> {
    pub fn new(driver: LedcDriver<'d>) -> Self {
        Self { driver }
    }
}

impl<'d> PulseOutput for EspPulse<'d> {
    #[inline]
    fn set_level(&mut self, level: u16) -> Result<(), HalError> {
        self.driver
            .set_duty(level as u32)
            .map_err(|_| HalError::PulseOutput)
    }

    fn enable(&mut self, on: bool) -> Result<(), HalError> {
        // ledc_stop leaves the pin at idle level 0
        let result = if on { self.driver.enable() } else { self.driver.disable() };
        result.map_err(|_| HalError::PulseOutput)
    }
}

/// Shortest period handed to `esp_timer_start_periodic`.
///
/// esp_timer raises shorter periodic requests to its own minimum, so the
/// trigger clamps explicitly and reports the period it really uses.
pub const MIN_PERIOD_US: u64 = 50;

/// esp_timer periodic trigger (task dispatch).
///
/// esp_timer periodic timers reload from the previous alarm, so the rate
/// stays fixed even when a callback runs long.
pub struct EspTrigger {
    service: EspTaskTimerService,
    callback: Arc<dyn Fn() + Send + Sync>,
    timer: Option<EspTimer<'static>>,
}

impl EspTrigger {
    /// `callback` runs on every firing.
    pub fn new(service: EspTaskTimerService, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            service,
            callback: Arc::new(callback),
            timer: None,
        }
    }
}

impl PeriodicTrigger for EspTrigger {
    fn arm(&mut self, period_us: u64) -> Result<u64, HalError> {
        if self.timer.is_none() {
            let callback = Arc::clone(&self.callback);
            let timer = self
                .service
                .timer(move || callback())
                .map_err(|_| HalError::Timer)?;
            self.timer = Some(timer);
        }

        let granted_us = period_us.max(MIN_PERIOD_US);
        match &self.timer {
            Some(timer) => timer
                .every(Duration::from_micros(granted_us))
                .map(|_| granted_us)
                .map_err(|_| HalError::Timer),
            None => Err(HalError::Timer),
        }
    }

    fn disarm(&mut self) -> Result<(), HalError> {
        match &self.timer {
            Some(timer) => timer.cancel().map(|_| ()).map_err(|_| HalError::Timer),
            None => Ok(()),
        }
    }
}

/// esp_timer_get_time()
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

impl Clock for EspClock {
    #[inline]
    fn now_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time is always safe to call
        unsafe { esp_idf_svc::sys::esp_timer_get_time() as u64 }
    }
}
