//! Command-line interface definitions and dispatch.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::client::{FogBugzClient, PeopleFilter};
use crate::models::{check_field_name, CaseFields};

/// Query a FogBugz installation from the command line.
///
/// Connection settings are read from `FOGBUGZ_*` environment variables
/// (or a `.env` file).
#[derive(Parser, Debug)]
#[command(name = "fogline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Output formats for decoded records.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML document
    Yaml,
    /// Pretty-printed JSON
    Json,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for cases
    Search {
        /// Search text, as typed in the FogBugz search box
        query: String,

        /// Maximum number of cases
        #[arg(long)]
        max: Option<u32>,

        /// Columns to return (comma-separated)
        #[arg(long, value_delimiter = ',')]
        cols: Option<Vec<String>>,
    },

    /// Open a new case
    NewCase {
        /// Case title
        #[arg(long)]
        title: String,

        /// Project name
        #[arg(long)]
        project: Option<String>,

        /// Area name
        #[arg(long)]
        area: Option<String>,

        /// Fix-for milestone name
        #[arg(long)]
        fix_for: Option<String>,

        /// Category name
        #[arg(long)]
        category: Option<String>,

        /// Priority
        #[arg(long)]
        priority: Option<String>,

        /// Text of the opening event
        #[arg(long)]
        event: Option<String>,

        /// Any other case field, as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// List entities of one kind
    List {
        /// What to list
        #[arg(value_enum)]
        entity: Entity,
    },

    /// Show the user's settings
    Settings,

    /// Show a working schedule
    Schedule {
        /// Person id (defaults to the logged-on user)
        #[arg(long)]
        person: Option<i64>,
    },
}

/// Entities that `list` can show.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// Projects
    Projects,
    /// Areas
    Areas,
    /// Fix-for milestones
    FixFors,
    /// Case categories
    Categories,
    /// Priorities
    Priorities,
    /// People (normal users)
    People,
    /// Case statuses
    Statuses,
    /// Mailboxes
    Mailboxes,
    /// Saved and built-in filters
    Filters,
    /// Wikis
    Wikis,
    /// Wiki templates
    Templates,
    /// Discussion groups
    DiscussionGroups,
}

/// Parses a `key=value` case field.
fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    let key = key.trim();
    check_field_name(key).map_err(|e| e.to_string())?;
    Ok((key.to_string(), value.to_string()))
}

/// Serializes `value` in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to encode YAML")?,
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to encode JSON")?
        }
    };
    Ok(rendered)
}

impl Commands {
    /// Runs the subcommand and returns its rendered output.
    pub async fn run(&self, client: &FogBugzClient, format: OutputFormat) -> Result<String> {
        match self {
            Commands::Search { query, max, cols } => {
                let cols: Option<Vec<&str>> =
                    cols.as_ref().map(|c| c.iter().map(String::as_str).collect());
                let cases = client.search(query, cols.as_deref(), *max).await?;
                render(&cases, format)
            }
            Commands::NewCase { .. } => {
                let fields = self.case_fields();
                let case = client.new_case(&fields, None).await?;
                render(&case, format)
            }
            Commands::List { entity } => {
                let records = match entity {
                    Entity::Projects => client.projects(false, None).await?,
                    Entity::Areas => client.areas(false, None, None).await?,
                    Entity::FixFors => client.fix_fors(None, None).await?,
                    Entity::Categories => client.categories().await?,
                    Entity::Priorities => client.priorities().await?,
                    Entity::People => client.people(PeopleFilter::new()).await?,
                    Entity::Statuses => client.statuses(None, false).await?,
                    Entity::Mailboxes => client.mailboxes().await?,
                    Entity::Filters => client.filters().await?,
                    Entity::Wikis => client.wikis().await?,
                    Entity::Templates => client.templates().await?,
                    Entity::DiscussionGroups => client.discussion_groups().await?,
                };
                render(&records, format)
            }
            Commands::Settings => render(&client.settings(None).await?, format),
            Commands::Schedule { person } => {
                render(&client.working_schedule(*person).await?, format)
            }
        }
    }

    /// Collects the case fields of a `new-case` invocation.
    fn case_fields(&self) -> CaseFields {
        let Commands::NewCase {
            title,
            project,
            area,
            fix_for,
            category,
            priority,
            event,
            fields: extra,
        } = self
        else {
            return CaseFields::new();
        };

        let mut fields = CaseFields::new().title(title);
        let named = [
            ("sProject", project),
            ("sArea", area),
            ("sFixFor", fix_for),
            ("sCategory", category),
            ("sPriority", priority),
            ("sEvent", event),
        ];
        for (key, value) in named {
            if let Some(value) = value {
                fields = fields.field(key, value);
            }
        }
        for (key, value) in extra {
            fields = fields.field(key, value);
        }
        fields
    }
}
