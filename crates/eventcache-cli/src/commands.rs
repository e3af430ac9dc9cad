//! Command line arguments shared by one-shot runs and the shell.

use clap::{Args, Subcommand};

use eventcache_core::EventDraft;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show recently added events
    Recent,

    /// Search events by title or description
    Search {
        /// Search term (several words are joined with spaces); without one,
        /// every event matches
        term: Vec<String>,
    },

    /// Show the details of one event
    Show { id: String },

    /// Create a new event
    Create(CreateArgs),

    /// Edit an existing event
    Edit {
        id: String,

        #[command(flatten)]
        fields: EventFields,
    },

    /// Delete an event
    Delete { id: String },

    /// List images that can be attached to an event
    Images,

    /// Start an interactive session
    Shell,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    /// Date as YYYY-MM-DD
    #[arg(long)]
    pub date: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Time as HH:MM
    #[arg(long, default_value = "")]
    pub time: String,

    #[arg(long, default_value = "")]
    pub location: String,

    /// Image path as listed by `images`
    #[arg(long, default_value = "")]
    pub image: String,
}

/// Optional event fields; unset ones keep their current value.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFields {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Date as YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// Time as HH:MM
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Image path as listed by `images`
    #[arg(long)]
    pub image: Option<String>,
}

impl EventFields {
    pub fn apply(self, draft: &mut EventDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(time) = self.time {
            draft.time = time;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
        if let Some(image) = self.image {
            draft.image = image;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl CreateArgs {
    pub fn into_draft(self) -> EventDraft {
        EventDraft {
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            image: self.image,
        }
    }
}
