//! Directory batch command.
//!
//! Sweeps a directory for images and runs each through the engine, one at a
//! time, writing the extracted text next to the source images.

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::models::{CandidateStatus, SelectedFile};
use crate::relay::OcrRelay;
use crate::tracker::{TrackerEvent, UploadTracker};
use crate::utils::has_image_extension;

/// Process every image in a directory.
pub async fn cmd_batch(
    settings: &Settings,
    dir: &Path,
    langs: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let relay = OcrRelay::new(settings)?;
    let languages = langs.unwrap_or(&settings.languages);
    let output_dir = output.unwrap_or(dir);

    let mut images: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();
    images.sort();

    if images.is_empty() {
        println!("No images found in {}", dir.display());
        return Ok(());
    }

    println!(
        "{} Found {} image(s) to process",
        style("→").cyan(),
        images.len()
    );
    std::fs::create_dir_all(output_dir)?;

    let progress = ProgressBar::new(images.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut fresh_time = Duration::ZERO;

    // The queue cap bounds how much image data sits in memory at once, so
    // the sweep runs in queue-sized batches.
    for chunk in images.chunks(settings.queue_capacity) {
        let mut tracker = UploadTracker::new(settings.queue_capacity);

        let mut batch = Vec::new();
        for path in chunk {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("image.png")
                .to_string();
            batch.push(SelectedFile {
                name,
                content_type: None,
                bytes: std::fs::read(path)?,
            });
        }

        let report = tracker.admit(batch)?;
        for skip in &report.skipped {
            progress.println(format!("  {} {}", style("!").yellow(), skip));
        }

        let (tx, mut rx) = mpsc::channel::<TrackerEvent>(32);
        let bar = progress.clone();
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    TrackerEvent::CandidateStarted { name, .. } => {
                        bar.set_message(name);
                    }
                    TrackerEvent::CandidateCompleted { .. } => {
                        bar.inc(1);
                    }
                    TrackerEvent::CandidateFailed { name, error, .. } => {
                        bar.println(format!("  {} {}: {}", style("✗").red(), name, error));
                        bar.inc(1);
                    }
                    _ => {}
                }
            }
        });

        let summary = tracker.process_all(&relay, languages, tx).await;
        let _ = printer.await;

        completed += summary.completed;
        failed += summary.failed;
        if let Some(average) = summary.average {
            fresh_time += average * summary.completed as u32;
        }

        for candidate in tracker.candidates() {
            if let CandidateStatus::Completed { text, .. } = &candidate.status {
                let stem = candidate
                    .name
                    .rsplit_once('.')
                    .map(|(stem, _)| stem)
                    .unwrap_or(&candidate.name);
                let out_path = output_dir.join(format!("{}_ocr.txt", stem));
                std::fs::write(&out_path, text)?;
            }
        }
    }

    progress.finish_and_clear();

    println!(
        "{} {} completed, {} failed",
        style("✓").green(),
        completed,
        failed
    );
    if completed > 0 {
        println!(
            "  Average processing time: {:.2}s",
            (fresh_time / completed as u32).as_secs_f64()
        );
    }
    println!("  Results saved to {}", output_dir.display());

    Ok(())
}
