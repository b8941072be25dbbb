use defmt::*;
use embassy_executor::task;
use embassy_time::{Duration, Ticker};
use satnogs_rotator::config::{
    AS5601_ADDRESS, GEAR_RATIO_AZ, GEAR_RATIO_EL, I2C_MUX_ADDRESS, SENSOR_READ_TIMEOUT_MS,
    SENSOR_SAMPLE_PERIOD_MS, TC74_ADDRESS, TEMPERATURE_PERIOD_MS,
};
use satnogs_rotator::{Axis, PositionEstimator, RotatorError};

use crate::drivers::{As5601, EndStops, I2cBus, I2cMux, MotorFaults, SensorError, Tc74};
use crate::ipc::{with_control, HEARTBEAT};

/// Everything hanging off the sensor I²C bus.
struct SensorHead {
    i2c: I2cBus,
    mux: I2cMux,
    encoder: As5601,
    thermometer: Tc74,
}

impl SensorHead {
    fn new(i2c: I2cBus) -> Self {
        let timeout = Duration::from_millis(SENSOR_READ_TIMEOUT_MS);
        Self {
            i2c,
            mux: I2cMux::new(I2C_MUX_ADDRESS, timeout),
            encoder: As5601::new(AS5601_ADDRESS, timeout),
            thermometer: Tc74::new(TC74_ADDRESS, timeout),
        }
    }

    async fn init(&mut self) {
        if let Err(e) = self.mux.deselect(&mut self.i2c).await {
            warn!("I2C mux reset failed: {:?}", e);
        }
        for axis in [Axis::Azimuth, Axis::Elevation] {
            match self.diagnostics(axis).await {
                Ok(()) => {}
                Err(e) => warn!("{:?} encoder not responding: {:?}", axis, e),
            }
        }
        if let Err(e) = self.thermometer.wake_up(&mut self.i2c).await {
            warn!("TC74 wake-up failed: {:?}", e);
        }
    }

    async fn diagnostics(&mut self, axis: Axis) -> Result<(), SensorError> {
        self.mux.select(&mut self.i2c, axis).await?;
        let diag = self.encoder.diagnostics(&mut self.i2c).await?;
        info!(
            "{:?} encoder: magnet {:?}, agc {}, magnitude {}",
            axis, diag.status, diag.agc, diag.magnitude
        );
        Ok(())
    }

    async fn sample(&mut self, axis: Axis) -> Result<satnogs_rotator::RawSample, SensorError> {
        self.mux.select(&mut self.i2c, axis).await?;
        self.encoder.read_raw(&mut self.i2c).await
    }
}

#[task]
pub async fn sensor_task(i2c: I2cBus, end_stops: EndStops, faults: MotorFaults) {
    info!(
        "Sensor task started - sampling at {}ms intervals",
        SENSOR_SAMPLE_PERIOD_MS
    );
    let mut head = SensorHead::new(i2c);
    head.init().await;

    let mut az = PositionEstimator::new(GEAR_RATIO_AZ);
    let mut el = PositionEstimator::new(GEAR_RATIO_EL);
    let dt = SENSOR_SAMPLE_PERIOD_MS as f32 / 1000.0;
    let temperature_every = (TEMPERATURE_PERIOD_MS / SENSOR_SAMPLE_PERIOD_MS) as u32;

    let mut ticker = Ticker::every(Duration::from_millis(SENSOR_SAMPLE_PERIOD_MS));
    let mut cycle = 0u32;
    let mut read_errors = 0u32;
    let mut anomalies = 0u32;
    let mut faulted = false;

    loop {
        ticker.next().await;
        HEARTBEAT.beat();
        cycle = cycle.wrapping_add(1);

        for (axis, estimator) in [(Axis::Azimuth, &mut az), (Axis::Elevation, &mut el)] {
            match head.sample(axis).await {
                Ok(sample) => {
                    let (position, status) = estimator.update_sample(sample);
                    with_control(|c| {
                        c.axis_mut(axis).record_input(position, dt);
                        if !status.is_ok() {
                            c.rotator.raise(RotatorError::SENSOR);
                        }
                    });
                    if !status.is_ok() {
                        anomalies += 1;
                        if anomalies % 100 == 1 {
                            warn!("{:?} magnet anomaly #{}: {:?}", axis, anomalies, status);
                        }
                    }
                }
                Err(e) => {
                    read_errors += 1;
                    if read_errors % 100 == 1 {
                        warn!("{:?} encoder read error #{}: {:?}", axis, read_errors, e);
                    }
                }
            }
        }

        let fault_az = faults.is_faulted(Axis::Azimuth);
        let fault_el = faults.is_faulted(Axis::Elevation);
        if (fault_az || fault_el) && !faulted {
            error!("Motor driver fault: az={} el={}", fault_az, fault_el);
        }
        faulted = fault_az || fault_el;
        with_control(|c| {
            c.rotator.switch_az = end_stops.is_triggered(Axis::Azimuth);
            c.rotator.switch_el = end_stops.is_triggered(Axis::Elevation);
            c.rotator.fault_az = fault_az;
            c.rotator.fault_el = fault_el;
            if faulted {
                c.rotator.raise(RotatorError::MOTOR);
            }
        });

        if cycle % temperature_every == 0 {
            match head.thermometer.read_temperature(&mut head.i2c).await {
                Ok(Some(t)) => with_control(|c| c.rotator.inside_temperature = t),
                Ok(None) => debug!("TC74 conversion pending"),
                Err(e) => {
                    read_errors += 1;
                    warn!("TC74 read error #{}: {:?}", read_errors, e);
                }
            }
        }
    }
}
