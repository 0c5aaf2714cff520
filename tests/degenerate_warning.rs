//! A configuration with no true alternatives runs, reports power 0, and says so in the log.

use fdrsim::{run_configuration, BaseNoise, Config, Shape};
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_logged(cfg: &Config) -> (fdrsim::ConfigurationRun, String) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let noise = BaseNoise::zeros(cfg.n_reps, cfg.m);
    let run = tracing::subscriber::with_default(subscriber, || {
        run_configuration(cfg, &noise, false).unwrap()
    });
    (run, captured.text())
}

#[test]
fn all_null_configuration_warns_and_reports_zero_power() {
    let cfg = Config::new(8, 1.0, Shape::Equal, 5.0).with_reps(20);
    assert!(cfg.is_degenerate());

    let (run, log) = run_logged(&cfg);
    assert!(run.config.is_degenerate());
    assert!(run.rows.iter().all(|r| r.mean_power == 0.0 && r.m0 == 8));
    assert!(log.contains("WARN"), "log: {log}");
    assert!(log.contains("no true alternatives"), "log: {log}");
}

#[test]
fn ordinary_configuration_does_not_warn() {
    let cfg = Config::new(8, 0.5, Shape::Equal, 5.0).with_reps(20);
    assert!(!cfg.is_degenerate());

    let (_, log) = run_logged(&cfg);
    assert!(!log.contains("no true alternatives"), "log: {log}");
}
