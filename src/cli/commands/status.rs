//! Engine status command.

use console::style;

use crate::config::Settings;
use crate::models::DeviceReport;
use crate::relay::OcrRelay;

/// Show engine address and device report.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    let relay = OcrRelay::new(settings)?;

    println!("Engine:  {}", relay.base_url());

    match relay.device_info().await {
        Ok(report) => {
            let mode = if report.is_gpu { "GPU" } else { "CPU" };
            println!(
                "Device:  {} {}",
                report.device,
                style(format!("[{}]", mode)).dim()
            );
            println!("{} Engine reachable", style("✓").green());
        }
        Err(e) => {
            let fallback = DeviceReport::cpu_fallback();
            println!("Device:  {}", fallback.device);
            println!("{} Engine not reachable: {}", style("✗").red(), e);
        }
    }

    Ok(())
}
