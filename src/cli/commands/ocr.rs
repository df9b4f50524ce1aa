//! One-shot OCR command.

use std::path::Path;
use std::time::Instant;

use console::style;

use crate::config::Settings;
use crate::relay::OcrRelay;

/// Extract text from a single image file or URL.
pub async fn cmd_ocr(
    settings: &Settings,
    input: &str,
    langs: Option<&str>,
    details: bool,
) -> anyhow::Result<()> {
    let relay = OcrRelay::new(settings)?;
    let languages = langs.unwrap_or(&settings.languages);

    println!("{} Processing: {}", style("→").cyan(), input);

    let started = Instant::now();
    let result = if input.starts_with("http://") || input.starts_with("https://") {
        relay.submit_url(input, languages).await
    } else {
        relay.submit_path(Path::new(input), languages).await
    };
    let elapsed = started.elapsed();

    match result {
        Ok(output) => {
            println!(
                "  {} {} lines in {:.2}s",
                style("✓").green(),
                output.details.len(),
                elapsed.as_secs_f64()
            );
            println!();
            println!("{}", output.text);

            if details {
                println!();
                for line in &output.details {
                    let [x1, y1, x2, y2] = line.bbox;
                    println!(
                        "  [{:.0},{:.0},{:.0},{:.0}] {}",
                        x1, y1, x2, y2, line.text
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            Err(e.into())
        }
    }
}
