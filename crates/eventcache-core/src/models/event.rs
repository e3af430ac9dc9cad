use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Calendar date as `YYYY-MM-DD`.
    pub date: String,
    /// Local start time as `HH:MM`.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    /// Path of the image relative to the backend root.
    #[serde(default)]
    pub image: String,
}

impl Event {
    /// "Mar 5, 2024"; falls back to the raw date when it does not parse.
    pub fn formatted_date(&self) -> String {
        match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
            Ok(date) => date.format("%b %-d, %Y").to_string(),
            Err(_) => self.date.chars().take(10).collect(),
        }
    }

    /// "Mar 5, 2024 / 18:30" as shown on the detail view
    pub fn formatted_datetime(&self) -> String {
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|_| self.time.clone());
        if time.is_empty() {
            self.formatted_date()
        } else {
            format!("{} / {}", self.formatted_date(), time)
        }
    }

    pub fn image_url(&self, base_url: &str) -> String {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.image.trim_start_matches('/')
        )
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            location: self.location.clone(),
            image: self.image.clone(),
        }
    }
}

/// Event fields as submitted by the create and edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventImage {
    pub path: String,
    #[serde(default)]
    pub caption: String,
}
