//! Case columns, case creation fields and entity selectors.

use crate::command::{Command, IntoParam};
use crate::error::FoglineError;

/// Every column a case can return. Used when the caller asks for none.
pub const CASE_COLUMNS: &[&str] = &[
    "ixBug",
    "fOpen",
    "sTitle",
    "sLatestTextSummary",
    "ixBugEventLatestText",
    "ixProject",
    "sProject",
    "ixArea",
    "sArea",
    "ixGroup",
    "ixPersonAssignedTo",
    "sPersonAssignedTo",
    "sEmailAssignedTo",
    "ixPersonOpenedBy",
    "ixPersonResolvedBy",
    "ixPersonClosedBy",
    "ixPersonLastEditedBy",
    "ixStatus",
    "sStatus",
    "ixPriority",
    "sPriority",
    "ixFixFor",
    "sFixFor",
    "dtFixFor",
    "sVersion",
    "sComputer",
    "hrsOrigEst",
    "hrsCurrEst",
    "hrsElapsed",
    "c",
    "sCustomerEmail",
    "ixMailbox",
    "ixCategory",
    "sCategory",
    "dtOpened",
    "dtResolved",
    "dtClosed",
    "ixBugEventLatest",
    "dtLastUpdated",
    "fReplied",
    "fForwarded",
    "sTicket",
    "ixDiscussTopic",
    "dtDue",
    "sReleaseNotes",
    "ixBugEventLastView",
    "dtLastView",
    "ixRelatedBugs",
    "sScoutDescription",
    "sScoutMessage",
    "fScoutStopReporting",
    "fSubscribed",
    "events",
];

/// Joins the requested columns, appending `ixBug` when missing.
///
/// Cases are keyed by `ixBug`, so it is always requested.
pub(crate) fn case_columns(cols: Option<&[&str]>) -> String {
    let cols = cols.unwrap_or(CASE_COLUMNS);
    let mut joined = cols.join(",");
    if !cols.contains(&"ixBug") {
        if !joined.is_empty() {
            joined.push(',');
        }
        joined.push_str("ixBug");
    }
    joined
}

/// Parameters the client sets itself. Case fields cannot override them.
const RESERVED_PARAMS: &[&str] = &["cmd", "token", "cols"];

/// Checks that `name` can be sent as a case field.
///
/// Field names are ASCII identifiers (`sTitle`, `ixPersonAssignedTo`) and
/// must not collide with the command's own parameters.
///
/// # Errors
///
/// Returns `FoglineError::Validation` for empty, non-identifier or reserved names.
pub fn check_field_name(name: &str) -> Result<(), FoglineError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(FoglineError::validation(format!(
            "invalid case field name {:?}",
            name
        )));
    }
    if RESERVED_PARAMS.contains(&name) {
        return Err(FoglineError::validation(format!(
            "{:?} is set by the client and cannot be a case field",
            name
        )));
    }
    Ok(())
}

/// Identifies an entity either by id or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The entity's numeric id (`ixProject`, `ixArea`, ...).
    Id(i64),
    /// The entity's name (`sProject`, `sArea`, ...).
    Name(String),
}

impl Selector {
    /// Adds `ix{entity}` or `s{entity}` to the command.
    pub(crate) fn apply(&self, command: Command, entity: &str) -> Command {
        match self {
            Selector::Id(id) => command.with(&format!("ix{}", entity), *id),
            Selector::Name(name) => command.with(&format!("s{}", entity), name),
        }
    }
}

impl From<i64> for Selector {
    fn from(id: i64) -> Self {
        Selector::Id(id)
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Name(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Name(name)
    }
}

/// Fields for a new case, sent as-is alongside the `new` command.
///
/// ```ignore
/// let fields = CaseFields::new()
///     .title("Printer on fire")
///     .project("Sample Project")
///     .field("sPriority", 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFields {
    fields: Vec<(String, String)>,
}

impl CaseFields {
    /// Creates an empty field list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an arbitrary case field, e.g. `sCustomerEmail`.
    #[must_use]
    pub fn field(mut self, name: &str, value: impl IntoParam) -> Self {
        let value = value.into_param();
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
        self
    }

    /// Sets the case title.
    #[must_use]
    pub fn title(self, title: &str) -> Self {
        self.field("sTitle", title)
    }

    /// Sets the project by name.
    #[must_use]
    pub fn project(self, project: &str) -> Self {
        self.field("sProject", project)
    }

    /// Sets the area by name.
    #[must_use]
    pub fn area(self, area: &str) -> Self {
        self.field("sArea", area)
    }

    /// Sets the fix-for milestone by name.
    #[must_use]
    pub fn fix_for(self, fix_for: &str) -> Self {
        self.field("sFixFor", fix_for)
    }

    /// Sets the category by name.
    #[must_use]
    pub fn category(self, category: &str) -> Self {
        self.field("sCategory", category)
    }

    /// Sets the priority.
    #[must_use]
    pub fn priority(self, priority: impl IntoParam) -> Self {
        self.field("sPriority", priority)
    }

    /// Sets the text of the opening event.
    #[must_use]
    pub fn event(self, text: &str) -> Self {
        self.field("sEvent", text)
    }

    /// Returns the value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no field has been set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copies the fields onto a command.
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::Validation` if any field name fails
    /// [`check_field_name`]; the command is not modified.
    pub(crate) fn apply(&self, mut command: Command) -> Result<Command, FoglineError> {
        for (key, _) in &self.fields {
            check_field_name(key)?;
        }
        for (key, value) in &self.fields {
            command.set(key, value);
        }
        Ok(command)
    }
}
