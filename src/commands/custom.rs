use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use scal_core::ScalConfig;
use scal_core::custom::{CustomEventDraft, CustomKind, display_order};

use super::open_store;
use crate::CustomCommand;

pub fn run(config: &ScalConfig, command: CustomCommand) -> Result<()> {
    let store = open_store(config)?;

    match command {
        CustomCommand::List => {
            let now = Utc::now().with_timezone(&config.tz());
            let events = display_order(store.custom_events(), now);

            if events.is_empty() {
                println!("{}", "No custom events".dimmed());
                return Ok(());
            }

            for event in events {
                let time = event
                    .time
                    .map(|t| t.format("%-I:%M %p").to_string())
                    .unwrap_or_else(|| "all-day".to_string());
                let kind = match event.kind {
                    CustomKind::Assignment => "📝",
                    CustomKind::Event => "🗓",
                };

                println!(
                    "{} {} {:>8} {} {}",
                    event.id.dimmed(),
                    event.display_date(now.date_naive()).format("%a %b %-d"),
                    time,
                    kind,
                    event.name
                );
                if event.repeat.as_str() != "none" {
                    println!("{}", format!("    repeats {}", event.repeat.as_str()).dimmed());
                }
            }
        }
        CustomCommand::Add {
            name,
            date,
            time,
            course,
            kind,
            repeat,
            description,
        } => {
            let draft = CustomEventDraft {
                name,
                description: description.unwrap_or_default(),
                course_name: course.unwrap_or_default(),
                kind,
                date,
                time: time.unwrap_or_default(),
                repeat,
            };
            let event = store.add_custom_event(&draft)?;
            println!("{} Added {} {}", "✓".green(), event.name, event.id.dimmed());
        }
        CustomCommand::Remove { id } => {
            if store.remove_custom_event(&id)? {
                println!("{} Removed {}", "✓".green(), id);
            } else {
                anyhow::bail!("No custom event with id '{id}'");
            }
        }
    }

    Ok(())
}
