//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::entry::{TravelEntry, Weather};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Human-readable location label
    #[arg(short, long)]
    pub address: String,

    /// Latitude of the location
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude of the location
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Reference to the associated photo
    #[arg(short, long, default_value = "")]
    pub image: String,

    /// Entry id (generated when omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Creation timestamp in epoch milliseconds (now when omitted)
    #[arg(long)]
    pub created_at: Option<f64>,

    /// Optional fields
    #[command(flatten)]
    pub details: EntryDetails,
}

impl AddCommand {
    /// Build the entry described by these arguments.
    #[must_use]
    pub fn to_entry(&self) -> TravelEntry {
        let mut entry = TravelEntry::new(
            self.image.clone(),
            self.address.clone(),
            self.latitude,
            self.longitude,
        );
        if let Some(id) = &self.id {
            entry.id.clone_from(id);
        }
        if let Some(created_at) = self.created_at {
            entry.created_at = created_at;
        }
        self.details.apply(&mut entry);
        entry
    }
}

/// Optional entry fields shared by `add` and `update`.
#[derive(Debug, Default, Args)]
pub struct EntryDetails {
    /// Entry title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Temperature at the location
    #[arg(long, allow_negative_numbers = true)]
    pub temperature: Option<f64>,

    /// Relative humidity at the location
    #[arg(long)]
    pub humidity: Option<f64>,

    /// Weather conditions, e.g. "sunny"
    #[arg(long)]
    pub conditions: Option<String>,
}

impl EntryDetails {
    /// Apply every field that was given to `entry`, leaving the rest alone.
    pub fn apply(&self, entry: &mut TravelEntry) {
        if let Some(title) = &self.title {
            entry.title = Some(title.clone());
        }
        if let Some(notes) = &self.notes {
            entry.notes = Some(notes.clone());
        }
        if !self.tags.is_empty() {
            entry.tags = Some(self.tags.clone());
        }
        if self.temperature.is_some() || self.humidity.is_some() || self.conditions.is_some() {
            entry.weather = Some(Weather::new(
                self.temperature,
                self.humidity,
                self.conditions.as_deref(),
            ));
        }
    }
}

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Id of the entry to replace
    pub id: String,

    /// New location label
    #[arg(short, long)]
    pub address: Option<String>,

    /// New latitude
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// New longitude
    #[arg(long, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// New photo reference
    #[arg(short, long)]
    pub image: Option<String>,

    /// Optional fields to replace
    #[command(flatten)]
    pub details: EntryDetails,
}

impl UpdateCommand {
    /// Apply the requested changes to a copy of `existing`.
    #[must_use]
    pub fn apply_to(&self, existing: &TravelEntry) -> TravelEntry {
        let mut entry = existing.clone();
        if let Some(address) = &self.address {
            entry.address.clone_from(address);
        }
        if let Some(latitude) = self.latitude {
            entry.latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            entry.longitude = longitude;
        }
        if let Some(image) = &self.image {
            entry.image_uri.clone_from(image);
        }
        self.details.apply(&mut entry);
        entry
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Maximum number of entries to show
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Only show entries with this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in titles, notes, addresses and tags
    pub query: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
