use std::time::Duration;

use crate::cli::commands::WatchArgs;
use crate::cli::output::{event_to_json, format_event};
use crate::io::store::NoteStore;
use crate::sync::{Clock, SyncError, SyncInstance, WidgetEvent};

use super::Workspace;

/// Parse `1280x720`
fn parse_viewport(s: &str) -> Result<(i64, i64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid viewport '{}' (expected WIDTHxHEIGHT)", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid viewport '{}' (expected WIDTHxHEIGHT)", s))
    };
    Ok((parse(w)?, parse(h)?))
}

fn print_events(events: &[WidgetEvent], json: bool) -> Result<(), serde_json::Error> {
    for event in events {
        if json {
            println!("{}", serde_json::to_string(&event_to_json(event))?);
        } else {
            println!("{}", format_event(event));
        }
    }
    Ok(())
}

/// Load once and fit the cache to the viewport. Returns the events that
/// bring an empty surface up to date.
fn start<S: NoteStore, C: Clock>(
    instance: &mut SyncInstance<S, C>,
    width: i64,
    height: i64,
) -> Result<Vec<WidgetEvent>, SyncError> {
    let mut events = instance.load()?;
    events.extend(instance.fit_viewport(width, height));
    Ok(events)
}

/// Follow the store until interrupted, printing one line per widget event.
pub fn cmd_watch(ws: &Workspace, args: WatchArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (width, height) = match args.viewport.as_deref() {
        Some(v) => parse_viewport(v)?,
        None => (
            ws.config.display.viewport_width,
            ws.config.display.viewport_height,
        ),
    };

    let mut instance = ws.unloaded_instance();
    print_events(&start(&mut instance, width, height)?, json)?;
    tracing::info!(width, height, "watching for changes");

    let interval = Duration::from_millis(args.interval.max(10));
    loop {
        let events = instance.tick();
        print_events(&events, json)?;
        std::thread::sleep(interval);
    }
}
