use anyhow::Result;
use chrono::Utc;
use rebounce_core::AppCore;

use crate::commands::schedule;
use crate::daemon::DashboardWatch;

pub async fn run(core: &AppCore) -> Result<()> {
    let settings = core.storage.settings.load()?;

    println!("Dashboard:         {}", core.client.base_url());
    let watch = DashboardWatch::new(core.client.base_url());
    let state = if watch.reachable().await { "up" } else { "down" };
    println!("Reachability:      {state}");

    match core.storage.marker.get()? {
        Some(marker) => {
            let elapsed = marker.elapsed_seconds(Utc::now().timestamp_millis());
            let platform = if marker.platform_id.is_empty() {
                "(unset)"
            } else {
                marker.platform_id.as_str()
            };
            println!("Pending restart:   platform {platform}, requested {elapsed:.0}s ago");
        }
        None => println!("Pending restart:   none"),
    }

    schedule::print_schedule(&settings);
    Ok(())
}
