use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use rebounce_core::{AppCore, resolve_timezone};
use rebounce_models::{AppSettings, Trigger};

use crate::cli::{ScheduleAction, SetArgs};

pub async fn run(core: &AppCore, action: ScheduleAction) -> Result<()> {
    match action {
        ScheduleAction::Set(args) => set(core, args).await,
        ScheduleAction::Enable => {
            let settings = core.orchestrator.enable_recurring().await?;
            println!("Recurring restart enabled.");
            print_schedule(&settings);
            Ok(())
        }
        ScheduleAction::Disable => {
            let settings = core.orchestrator.disable_recurring().await?;
            println!("Recurring restart disabled.");
            print_schedule(&settings);
            Ok(())
        }
        ScheduleAction::Show => {
            let settings = core.storage.settings.load()?;
            print_schedule(&settings);
            Ok(())
        }
        ScheduleAction::Clear => {
            let settings = core.orchestrator.configure_recurring(Trigger::None).await?;
            println!("Recurring trigger cleared.");
            print_schedule(&settings);
            Ok(())
        }
    }
}

async fn set(core: &AppCore, args: SetArgs) -> Result<()> {
    let trigger = if let Some(expression) = args.cron {
        Trigger::Cron { expression }
    } else if let Some(time) = args.daily {
        Trigger::daily_from_hhmm(&time)?
    } else if let Some(seconds) = args.every {
        Trigger::Interval { seconds }
    } else {
        bail!("one of --cron, --daily or --every is required");
    };

    if let Some(timezone) = args.timezone {
        if !timezone.trim().is_empty() && resolve_timezone(&timezone).is_none() {
            eprintln!(
                "Warning: unknown timezone {timezone:?}, triggers will run in host-local time"
            );
        }
        core.storage.settings.modify(|s| s.timezone = timezone)?;
    }

    let settings = core.orchestrator.configure_recurring(trigger).await?;
    println!("Recurring trigger set: {}", settings.trigger);
    if !settings.restart_switch {
        println!("The switch is off; enable it with `rebounce schedule enable`.");
    }
    print_next_fire(&settings);
    Ok(())
}

pub fn print_schedule(settings: &AppSettings) {
    let state = if settings.restart_switch {
        "enabled"
    } else {
        "disabled"
    };
    println!("Recurring restart: {state}");
    println!("Trigger:           {}", settings.trigger);
    if settings.timezone.trim().is_empty() {
        println!("Timezone:          host-local");
    } else {
        println!("Timezone:          {}", settings.timezone);
    }
    print_next_fire(settings);
}

fn print_next_fire(settings: &AppSettings) {
    if settings.trigger.is_none() {
        return;
    }
    let tz = resolve_timezone(&settings.timezone);
    match settings.trigger.next_fire_at(Utc::now(), tz) {
        Some(at) => println!("Next fire:         {}", format_fire_time(at, tz)),
        None => println!("Next fire:         never"),
    }
}

fn format_fire_time(at: DateTime<Utc>, tz: Option<Tz>) -> String {
    match tz {
        Some(tz) => at
            .with_timezone(&tz)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string(),
        None => at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_fire_time_in_configured_zone() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap();
        let formatted = format_fire_time(at, resolve_timezone("Asia/Shanghai"));
        assert!(
            formatted.starts_with("2024-05-02 03:00:00"),
            "got {formatted}"
        );
    }
}
