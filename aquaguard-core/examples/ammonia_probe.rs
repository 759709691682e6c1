//! Ammonia probe walkthrough
//!
//! Calibrates a simulated ammonia electrode against three standards, then
//! samples a pond whose pH drifts upward until free ammonia turns toxic.
//!
//! Run with: cargo run --example ammonia_probe

use aquaguard_core::time::{FixedTime, TimeSource};
use aquaguard_core::{
    AlarmEvent, AuxQuantity, Command, CommandResponse, MemoryCalibrationStore, Measurement, Probe,
    ProbeConfig, ProbeResult, Publisher, RawSample, SampleSource, SensorKind, Standard,
};

/// Nernstian electrode in a solution of known total ammonia
struct Pond {
    total_ammonia: f32,
    ph: f32,
    temperature: f32,
}

impl SampleSource for Pond {
    fn read_raw(&mut self) -> ProbeResult<RawSample> {
        Ok(RawSample {
            signal: 200.0 - 58.5 * self.total_ammonia.log10(),
            timestamp: 0,
        })
    }

    fn read_temperature(&mut self) -> ProbeResult<f32> {
        Ok(self.temperature)
    }

    fn read_auxiliary(&mut self, quantity: AuxQuantity) -> Option<f32> {
        match quantity {
            AuxQuantity::Ph => Some(self.ph),
            _ => None,
        }
    }
}

struct Console;

impl Publisher for Console {
    fn publish(&mut self, m: &Measurement) {
        let free = m.speciation.map(|s| s.free_ammonia).unwrap_or(f32::NAN);
        println!(
            "t={:>6}s  total={:.3} mg/L  free NH3={:.4} mg/L  score={}  valid={}",
            m.timestamp / 1000,
            m.computed_value,
            free,
            m.quality_score,
            m.valid
        );
    }

    fn publish_alarm(&mut self, alarm: &AlarmEvent) {
        println!(
            "          ALARM {} value={:.3} threshold={:.3}",
            alarm.kind.name(),
            alarm.value,
            alarm.threshold
        );
    }
}

fn main() {
    let mut clock = FixedTime::new(0);
    let pond = Pond {
        total_ammonia: 1.0,
        ph: 7.0,
        temperature: 25.0,
    };
    let mut probe = Probe::new(
        ProbeConfig::for_sensor(SensorKind::Ammonia),
        pond,
        MemoryCalibrationStore::new(),
        Console,
    );

    println!("== calibration ==");
    let standards = [
        Standard::new("1 mg/L", 1.0),
        Standard::new("10 mg/L", 10.0),
        Standard::new("100 mg/L", 100.0),
    ];
    if let Err(err) = probe.request_calibration(&standards, clock.now()) {
        eprintln!("calibration rejected: {}", err);
        return;
    }
    for standard in &standards {
        probe.source_mut().total_ammonia = standard.expected_value;
        clock.advance(30_000);
        let _ = probe.confirm_stable(clock.now());
        clock.advance(1_000);
        probe.tick(clock.now());
    }
    if let CommandResponse::Status(status) = probe.handle(Command::Status, clock.now()) {
        println!("last calibration: {:?}", status.last_calibration);
    }

    println!("== monitoring ==");
    probe.source_mut().total_ammonia = 1.0;
    for step in 0..10 {
        probe.source_mut().ph = 7.0 + 0.3 * step as f32;
        clock.advance(60_000);
        probe.tick(clock.now());
    }
}
