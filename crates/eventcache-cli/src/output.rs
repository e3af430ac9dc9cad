//! Output formatting for the CLI.

use serde::Serialize;

use eventcache_core::{Event, EventImage};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{}", msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("error: {}", msg);
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(e) => self.error(&format!("Failed to encode output: {}", e)),
        }
    }

    pub fn events(&self, heading: &str, events: &[Event]) {
        if self.json {
            self.json(events);
            return;
        }
        println!("{}", heading);
        if events.is_empty() {
            println!("  (no events)");
            return;
        }
        for event in events {
            println!("  {:<8} {:<14} {}", event.id, event.formatted_date(), event.title);
        }
    }

    pub fn event(&self, event: &Event, base_url: &str) {
        if self.json {
            self.json(event);
            return;
        }
        println!("{}", event.title);
        println!("  id:       {}", event.id);
        println!("  when:     {}", event.formatted_datetime());
        if !event.location.is_empty() {
            println!("  where:    {}", event.location);
        }
        if !event.image.is_empty() {
            println!("  image:    {}", event.image_url(base_url));
        }
        if !event.description.is_empty() {
            println!();
            println!("  {}", event.description);
        }
    }

    pub fn images(&self, images: &[EventImage]) {
        if self.json {
            self.json(images);
            return;
        }
        for image in images {
            println!("  {:<30} {}", image.path, image.caption);
        }
    }
}
