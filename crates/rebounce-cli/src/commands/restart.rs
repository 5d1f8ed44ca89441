use anyhow::Result;
use rebounce_core::AppCore;

use crate::cli::RestartArgs;

pub async fn run(core: &AppCore, args: RestartArgs) -> Result<()> {
    let settings = core.storage.settings.load()?;
    let origin_session = args.session.unwrap_or_default();
    let platform_id = args.platform.unwrap_or(settings.platform_id);

    // Acknowledge before the call: once the dashboard acts, the core (and
    // anything riding on it) is already going down.
    println!("Restarting the core via {}", core.client.base_url());
    core.orchestrator
        .request_restart(&origin_session, &platform_id)
        .await?;

    if origin_session.is_empty() {
        println!("Restart request accepted.");
    } else {
        println!("Restart request accepted; {origin_session} will be notified on completion.");
    }
    Ok(())
}
