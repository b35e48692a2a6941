//! Sample readout command implementation

use indicatif::{ProgressBar, ProgressStyle};
use thermolog_core::ds1922::MissionTimeline;

use super::Session;

/// Read the logged samples and print them in chronological order
pub fn run_data(
    session: &mut Session,
    max_count: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !session.registers_valid() {
        session.read_configuration()?;
    }

    let timeline = MissionTimeline::from_registers(session.registers())
        .ok_or("The logger holds no mission (mission timestamp not set)")?;
    if timeline.is_empty() {
        println!("No samples logged");
        return Ok(());
    }
    if timeline.wrapped() {
        log::info!(
            "Log rolled over, oldest sample at position {}",
            timeline.oldest_index()
        );
    }

    let pb = ProgressBar::new(timeline.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples ({eta})")?
            .progress_chars("#>-"),
    );

    let log = session.read_samples_with_progress(max_count.unwrap_or(usize::MAX), |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    })?;
    pb.finish_and_clear();

    if session.calibration().is_none() {
        log::info!("Samples are not calibrated");
    }

    let samples = timeline.arrange(&log);
    if samples.len() < log.len() {
        log::warn!(
            "{} samples have no valid time and are skipped",
            log.len() - samples.len()
        );
    }
    println!("# {} samples, one every {} s", samples.len(), timeline.interval_secs());
    for sample in &samples {
        println!(
            "{}\t{:.3}",
            sample.timestamp.format("%Y-%m-%d %H:%M:%S"),
            sample.celsius
        );
    }
    Ok(())
}
