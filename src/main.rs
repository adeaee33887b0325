//! RustVoiceRecorder - firmware entry point
//!
//! 1. Bring up logging and peripherals
//! 2. Capture runs from an esp_timer callback, playback on the main task
//! 3. Enter the input loop (never returns)

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("{}", env!("VERSION_STRING"));
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!(
        "{}: firmware image, build for an espidf target to run it",
        env!("VERSION_STRING")
    );
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::sync::{Arc, Mutex, MutexGuard};

    use esp_idf_svc::hal::adc::attenuation::DB_11;
    use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
    use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{PinDriver, Pull};
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::ledc::config::TimerConfig;
    use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::timer::EspTaskTimerService;

    use embedded_hal::digital::OutputPin;
    use rust_voice_recorder::config::{
        CAPACITY, CONFIG, DISPLAY_HEIGHT, DISPLAY_WIDTH, PWM_FREQUENCY_HZ,
    };
    use rust_voice_recorder::display::{OledPresenter, RenderSnapshot, LINE_STATE};
    use rust_voice_recorder::hal::esp::{EspAnalog, EspClock, EspPulse, EspTrigger};
    use rust_voice_recorder::hal::{AnalogInput, PinConfig, Ssd1306, SSD1306_ADDR};
    use rust_voice_recorder::{
        CaptureControl, CaptureController, InputLoop, PlaybackController, PulseOutput, Shared,
        StatusPresenter,
    };

    /// Session state, capture buffer, faults and RT log.
    static SHARED: Shared<CAPACITY> = Shared::new();

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        // A panic elsewhere must not take the recorder down with it
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Presenter shared by the timer callback and the main task.
    struct SharedPresenter<P>(Arc<Mutex<P>>);

    impl<P> Clone for SharedPresenter<P> {
        fn clone(&self) -> Self {
            Self(Arc::clone(&self.0))
        }
    }

    impl<P: StatusPresenter> StatusPresenter for SharedPresenter<P> {
        fn show_text(&mut self, line: u8, text: &str) {
            lock(&self.0).show_text(line, text);
        }

        fn show_waveform(&mut self, snapshot: &RenderSnapshot<'_>) {
            lock(&self.0).show_waveform(snapshot);
        }
    }

    /// Main-loop handle to the capture controller living behind the timer.
    struct SharedCapture<C>(Arc<Mutex<Option<C>>>);

    impl<C: CaptureControl> CaptureControl for SharedCapture<C> {
        fn start_capture(&mut self) -> bool {
            lock(&self.0).as_mut().is_some_and(|capture| capture.start_capture())
        }
    }

    type CaptureSlot<A, L, P> =
        Arc<Mutex<Option<CaptureController<'static, CAPACITY, A, EspTrigger, L, EspClock, P>>>>;

    /// Build the capture controller with a trigger whose callback ticks it.
    fn wire_capture<A, L, P>(
        adc: A,
        led: L,
        presenter: P,
        service: EspTaskTimerService,
    ) -> SharedCapture<CaptureController<'static, CAPACITY, A, EspTrigger, L, EspClock, P>>
    where
        A: AnalogInput + Send + 'static,
        L: OutputPin + Send + 'static,
        P: StatusPresenter + Send + 'static,
    {
        let slot: CaptureSlot<A, L, P> = Arc::new(Mutex::new(None));

        let tick_slot = Arc::clone(&slot);
        let trigger = EspTrigger::new(service, move || {
            if let Some(capture) = lock(&tick_slot).as_mut() {
                capture.on_tick();
            }
        });

        *lock(&slot) = Some(CaptureController::new(
            &SHARED, CONFIG, adc, trigger, led, EspClock, presenter,
        ));
        SharedCapture(slot)
    }

    pub fn run() -> Result<(), EspError> {
        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        // Same per-chip selection as PinConfig::default()
        #[cfg(not(feature = "esp32p4"))]
        let (mic_pin, pwm_pin, record_pin, play_pin, record_led_pin, play_led_pin, sda, scl) = (
            pins.gpio1, pins.gpio10, pins.gpio5, pins.gpio6, pins.gpio13, pins.gpio11,
            pins.gpio14, pins.gpio15,
        );
        #[cfg(feature = "esp32p4")]
        let (mic_pin, pwm_pin, record_pin, play_pin, record_led_pin, play_led_pin, sda, scl) = (
            pins.gpio16, pins.gpio10, pins.gpio5, pins.gpio6, pins.gpio13, pins.gpio11,
            pins.gpio7, pins.gpio8,
        );
        log::info!("pin map: {:?}", PinConfig::default());

        // Microphone: ADC1, 11 dB attenuation for the full 0-3.3 V swing
        let adc = AdcDriver::new(peripherals.adc1)?;
        let adc_config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let mic = EspAnalog::new(AdcChannelDriver::new(adc, mic_pin, &adc_config)?);

        // Audio out: LEDC, 12-bit duty (WRAP = 4095)
        let pwm_timer = LedcTimerDriver::new(
            peripherals.ledc.timer0,
            &TimerConfig::new()
                .frequency(Hertz(PWM_FREQUENCY_HZ))
                .resolution(Resolution::Bits12),
        )?;
        let pwm = LedcDriver::new(peripherals.ledc.channel0, pwm_timer, pwm_pin)?;
        let mut audio_out = EspPulse::new(pwm);
        // Start silent: pin low until a playback enables it
        if let Err(err) = audio_out.enable(false) {
            log::warn!("audio output not silenced at boot ({}), continuing", err);
        }

        let mut record_button = PinDriver::input(record_pin)?;
        record_button.set_pull(Pull::Up)?;
        let mut play_button = PinDriver::input(play_pin)?;
        play_button.set_pull(Pull::Up)?;

        let mut record_led = PinDriver::output(record_led_pin)?;
        record_led.set_low()?;
        let mut play_led = PinDriver::output(play_led_pin)?;
        play_led.set_low()?;

        let i2c = I2cDriver::new(
            peripherals.i2c0,
            sda,
            scl,
            &I2cConfig::new().baudrate(Hertz(400_000)),
        )?;
        let panel = match Ssd1306::new(SSD1306_ADDR, DISPLAY_WIDTH as u8, DISPLAY_HEIGHT as u8) {
            Ok(panel) => panel,
            Err(err) => {
                log::error!("display geometry rejected: {}", err);
                return Ok(());
            }
        };
        let mut oled = OledPresenter::new(i2c, panel);
        if let Err(err) = oled.init() {
            log::warn!("display init failed ({}), continuing without it", err);
        }

        let mut presenter = SharedPresenter(Arc::new(Mutex::new(oled)));
        presenter.show_text(LINE_STATE, "Ready");

        let capture = wire_capture(mic, record_led, presenter.clone(), EspTaskTimerService::new()?);
        let playback = PlaybackController::new(&SHARED, CONFIG, audio_out, play_led, EspClock, presenter);

        let mut input = InputLoop::new(
            &SHARED,
            CONFIG,
            capture,
            playback,
            record_button,
            play_button,
            FreeRtos,
        );
        input.run()
    }
}
