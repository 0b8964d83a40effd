//! HTTP client for the FogBugz XML API.
//!
//! This module provides [`FogBugzClient`], which discovers the command
//! endpoint, manages the session token and exposes one method per API
//! command.
//!
//! # Retry Logic
//!
//! Read-only commands (`list*`, `view*`, `search`) and the capability probe
//! are retried on transient failures:
//! - HTTP 429 (rate limit): Exponential backoff starting at 100ms
//! - HTTP 502/503/504: Retry after 500ms
//! - Timeouts and connection failures: Retry after 100ms
//!
//! Commands with side effects (`logon`, `new`, `startWork`, ...) are sent once.
//!
//! # Security
//!
//! Tokens and passwords are never logged. Error bodies are sanitized
//! before they are returned.

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::command::{Command, IntoParam};
use crate::config::Config;
use crate::decode::{expand_nested, merge_flags, Response};
use crate::error::{codes, FoglineError};
use crate::models::{case_columns, ApiInfo, CaseFields, Record, RecordSet, Selector, Session, API_VERSION};

/// Path of the capability probe document.
const PROBE_PATH: &str = "/api.xml";

/// Maximum number of attempts for retryable requests.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Initial delay for exponential backoff (milliseconds).
const INITIAL_BACKOFF_MS: u64 = 100;

/// Delay before retrying after a server error (milliseconds).
const SERVER_ERROR_DELAY_MS: u64 = 500;

/// Maximum length of an HTTP error body carried in an error.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Client for one FogBugz installation.
///
/// Holds the session; `logon` and `logoff` need `&mut self`, every other
/// command takes `&self`. There is no internal locking.
///
/// # Example
///
/// ```ignore
/// let config = Config::new("bugs.example.com")?;
/// let mut client = FogBugzClient::connect(&config).await?;
/// client.logon("ada@example.com", "secret").await?;
///
/// let cases = client.search("assignedto:me", None, Some(10)).await?;
/// for (id, case) in &cases {
///     println!("{}: {:?}", id, case.get("sTitle"));
/// }
///
/// client.logoff().await?;
/// ```
pub struct FogBugzClient {
    /// The underlying HTTP client.
    http: Client,

    /// Command endpoint (`https://host/api.asp?`).
    endpoint: Url,

    /// Request timeout, reported in timeout errors.
    timeout: Duration,

    /// Whether read-only commands are retried.
    retry_reads: bool,

    session: Session,
}

impl FogBugzClient {
    /// Connects to the installation described by `config`.
    ///
    /// Fetches `/api.xml` to discover the API version and command endpoint.
    ///
    /// # Errors
    ///
    /// - `FoglineError::ProtocolVersion` if the server's minimum API version
    ///   is newer than [`API_VERSION`]
    /// - `FoglineError::MalformedResponse` if the probe document is not valid
    /// - transport errors if the server cannot be reached
    pub async fn connect(config: &Config) -> Result<Self, FoglineError> {
        let http = Self::build_http(config)?;
        let base = Url::parse(&config.base_url())
            .map_err(|e| FoglineError::invalid_config(format!("invalid host: {}", e)))?;

        let info = Self::probe(&http, &base, config.timeout, config.retry_reads).await?;
        if !info.is_supported() {
            return Err(FoglineError::ProtocolVersion {
                required: info.minversion,
                supported: API_VERSION,
            });
        }

        let session = Session::new(&config.host, config.use_ssl, &info, config.token());
        let endpoint = base.join(&session.api_url).map_err(|e| {
            FoglineError::malformed(format!("invalid endpoint {:?}: {}", session.api_url, e))
        })?;

        tracing::info!(
            host = %config.host,
            api_version = info.version,
            api_minversion = info.minversion,
            endpoint = %endpoint,
            "Connected to FogBugz"
        );

        Ok(Self {
            http,
            endpoint,
            timeout: config.timeout,
            retry_reads: config.retry_reads,
            session,
        })
    }

    fn build_http(config: &Config) -> Result<Client, FoglineError> {
        let mut builder = Client::builder().timeout(config.timeout);
        if config.accept_invalid_certs {
            tracing::warn!(
                host = %config.host,
                "TLS certificate validation is disabled for this connection"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().map_err(FoglineError::HttpClient)
    }

    /// Fetches and parses the capability probe document.
    async fn probe(
        http: &Client,
        base: &Url,
        timeout: Duration,
        retry: bool,
    ) -> Result<ApiInfo, FoglineError> {
        let url = base
            .join(PROBE_PATH)
            .map_err(|e| FoglineError::invalid_config(format!("invalid host: {}", e)))?;
        let attempts = if retry { MAX_RETRY_ATTEMPTS } else { 1 };

        let body =
            with_retry(PROBE_PATH, attempts, "", || Self::probe_inner(http, &url, timeout)).await?;

        let response = Response::parse(&body)?;
        let url = response
            .text("url")
            .ok_or_else(|| FoglineError::malformed("api.xml has no <url> element"))?;

        Ok(ApiInfo {
            version: response.integer("version"),
            minversion: response.integer("minversion"),
            url,
        })
    }

    /// Fetches the probe document once, without retry.
    async fn probe_inner(http: &Client, url: &Url, timeout: Duration) -> Result<String, FoglineError> {
        let response = http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| map_send_error(e, timeout, PROBE_PATH))?;
        read_body(response, "").await
    }

    /// Returns the session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the current token (empty when logged out).
    pub fn token(&self) -> &str {
        self.session.token()
    }

    /// Returns true if a token is held.
    pub fn is_logged_on(&self) -> bool {
        self.session.is_logged_on()
    }

    /// Sends a command as-is and returns the response body.
    ///
    /// Read-only commands are retried when retries are enabled.
    async fn send(&self, command: &Command) -> Result<String, FoglineError> {
        let attempts = if self.retry_reads && command.is_idempotent() {
            MAX_RETRY_ATTEMPTS
        } else {
            1
        };
        let token = self.session.token();

        with_retry(command.name(), attempts, token, || self.send_inner(command)).await
    }

    /// Sends a command once, without retry.
    async fn send_inner(&self, command: &Command) -> Result<String, FoglineError> {
        tracing::debug!(cmd = command.name(), "Sending FogBugz command");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(command.encode())
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout, command.name()))?;

        let body = read_body(response, self.session.token()).await?;

        // The logon response carries the new token.
        if command.name() != "logon" {
            tracing::trace!(cmd = command.name(), body = %body, "FogBugz response");
        }
        Ok(body)
    }

    /// Sends a command with the session token and returns the checked body.
    async fn execute(&self, mut command: Command) -> Result<String, FoglineError> {
        command.set_token(self.session.token());
        let body = self.send(&command).await?;
        Response::parse(&body)?.check()?;
        Ok(body)
    }

    /// Runs a list command.
    async fn list(
        &self,
        command: Command,
        element: &str,
        name_field: &str,
    ) -> Result<RecordSet, FoglineError> {
        let body = self.execute(command).await?;
        let response = Response::parse(&body)?;
        response.records(element, name_field)
    }

    /// Runs a view command, returning the first record.
    async fn view(
        &self,
        command: Command,
        element: &str,
        name_field: &str,
    ) -> Result<Option<Record>, FoglineError> {
        let set = self.list(command, element, name_field).await?;
        Ok(first(set))
    }

    /// Runs a creation command, returning the new id from `id_tag`.
    async fn create(&self, command: Command, id_tag: &str) -> Result<i64, FoglineError> {
        let body = self.execute(command).await?;
        let response = Response::parse(&body)?;
        Ok(response.integer(id_tag))
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Logs on and stores the returned token in the session.
    ///
    /// # Errors
    ///
    /// - `FoglineError::Authentication` for bad credentials (code 1)
    /// - `FoglineError::AmbiguousUser` when several accounts match (code 2)
    /// - `FoglineError::Api` for any other server error
    ///
    /// The session token is left unchanged on error.
    pub async fn logon(&mut self, email: &str, password: &str) -> Result<String, FoglineError> {
        let command = Command::new("logon")
            .with("email", email)
            .with("password", password);
        let body = self.send(&command).await?;
        let response = Response::parse(&body)?;

        let errors = response.errors();
        if let Some(error) = errors.first() {
            let message = error.message.clone();
            let err = match error.code {
                Some(codes::BAD_CREDENTIALS) => FoglineError::Authentication {
                    code: codes::BAD_CREDENTIALS,
                    message,
                },
                Some(codes::AMBIGUOUS_USER) => FoglineError::AmbiguousUser {
                    message,
                    candidates: response.texts("person"),
                },
                Some(code) => FoglineError::api(code, message),
                None => FoglineError::malformed(format!(
                    "error element without a numeric code: {}",
                    message
                )),
            };
            tracing::warn!(email, error = %err, "Logon failed");
            return Err(err);
        }

        let token = response
            .text("token")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FoglineError::malformed("logon response has no token"))?;

        self.session.set_token(token.clone());
        tracing::info!(email, "Logged on");
        Ok(token)
    }

    /// Logs off and clears the session token.
    ///
    /// The token is kept if the request fails.
    pub async fn logoff(&mut self) -> Result<(), FoglineError> {
        self.execute(Command::new("logoff")).await?;
        self.session.clear_token();
        tracing::info!("Logged off");
        Ok(())
    }

    // ========================================================================
    // Projects, areas and fix-fors
    // ========================================================================

    /// Lists the saved and built-in filters, keyed by filter name.
    ///
    /// Each record holds the filter's attributes (`type`, `sFilter`, ...)
    /// and its `name`.
    pub async fn filters(&self) -> Result<RecordSet, FoglineError> {
        let body = self.execute(Command::new("listFilters")).await?;
        let response = Response::parse(&body)?;
        Ok(response.attributed("filter"))
    }

    /// Lists projects, keyed by name.
    ///
    /// * `write_only` - only projects the user can create cases in
    /// * `project_id` - restrict to one project
    pub async fn projects(
        &self,
        write_only: bool,
        project_id: Option<i64>,
    ) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listProjects")
            .with_flag("fWrite", write_only)
            .with_opt("ixProject", project_id);
        self.list(command, "project", "sProject").await
    }

    /// Returns one project by id or name.
    pub async fn project(&self, project: impl Into<Selector>) -> Result<Option<Record>, FoglineError> {
        let selector: Selector = project.into();
        let command = selector.apply(Command::new("viewProject"), "Project");
        self.view(command, "project", "sProject").await
    }

    /// Creates a project and returns its id.
    pub async fn new_project(
        &self,
        name: &str,
        primary_contact: i64,
        allow_public_submit: bool,
        group: i64,
        inbox: bool,
    ) -> Result<i64, FoglineError> {
        let command = Command::new("newProject")
            .with("sProject", name)
            .with("ixPersonPrimaryContact", primary_contact)
            .with("fAllowPublicSubmit", allow_public_submit)
            .with("ixGroup", group)
            .with("fInbox", inbox);
        self.create(command, "ixProject").await
    }

    /// Lists areas, keyed by name.
    pub async fn areas(
        &self,
        write_only: bool,
        project_id: Option<i64>,
        area_id: Option<i64>,
    ) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listAreas")
            .with_flag("fWrite", write_only)
            .with_opt("ixProject", project_id)
            .with_opt("ixArea", area_id);
        self.list(command, "area", "sArea").await
    }

    /// Returns one area by id, or by name within `project_id`.
    pub async fn area(
        &self,
        area: impl Into<Selector>,
        project_id: Option<i64>,
    ) -> Result<Option<Record>, FoglineError> {
        let selector: Selector = area.into();
        let command = selector
            .apply(Command::new("viewArea"), "Area")
            .with_opt("ixProject", project_id);
        self.view(command, "area", "sArea").await
    }

    /// Creates an area in a project and returns its id.
    ///
    /// Without a primary contact the project's contact is used.
    pub async fn new_area(
        &self,
        project_id: i64,
        name: &str,
        primary_contact: Option<i64>,
    ) -> Result<i64, FoglineError> {
        let command = Command::new("newArea")
            .with("ixProject", project_id)
            .with("sArea", name)
            .with("ixPersonPrimaryContact", primary_contact.unwrap_or(-1));
        self.create(command, "ixArea").await
    }

    /// Lists fix-for milestones, keyed by name.
    pub async fn fix_fors(
        &self,
        project_id: Option<i64>,
        fix_for_id: Option<i64>,
    ) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listFixFors")
            .with_opt("ixProject", project_id)
            .with_opt("ixFixFor", fix_for_id);
        self.list(command, "fixfor", "sFixFor").await
    }

    /// Returns one fix-for by id, or by name within `project_id`.
    pub async fn fix_for(
        &self,
        fix_for: impl Into<Selector>,
        project_id: Option<i64>,
    ) -> Result<Option<Record>, FoglineError> {
        let selector: Selector = fix_for.into();
        let command = selector
            .apply(Command::new("viewFixFor"), "FixFor")
            .with_opt("ixProject", project_id);
        self.view(command, "fixfor", "sFixFor").await
    }

    /// Creates a fix-for and returns its id.
    ///
    /// * `project_id` - owning project; `None` creates a global fix-for
    /// * `release` - release date as the server expects it, e.g. `2024-06-01T00:00:00Z`
    pub async fn new_fix_for(
        &self,
        name: &str,
        assignable: bool,
        project_id: Option<i64>,
        release: Option<&str>,
    ) -> Result<i64, FoglineError> {
        let command = Command::new("newFixFor")
            .with("sFixFor", name)
            .with("fAssignable", assignable)
            .with("ixProject", project_id.unwrap_or(-1))
            .with_opt("dtRelease", release);
        self.create(command, "ixFixFor").await
    }

    // ========================================================================
    // Categories, priorities, statuses and mailboxes
    // ========================================================================

    /// Lists categories, keyed by name.
    pub async fn categories(&self) -> Result<RecordSet, FoglineError> {
        self.list(Command::new("listCategories"), "category", "sCategory")
            .await
    }

    /// Returns one category.
    pub async fn category(&self, category_id: i64) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("viewCategory").with("ixCategory", category_id);
        self.view(command, "category", "sCategory").await
    }

    /// Lists priorities, keyed by name.
    pub async fn priorities(&self) -> Result<RecordSet, FoglineError> {
        self.list(Command::new("listPriorities"), "priority", "sPriority")
            .await
    }

    /// Returns one priority.
    pub async fn priority(&self, priority_id: i64) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("viewPriority").with("ixPriority", priority_id);
        self.view(command, "priority", "sPriority").await
    }

    /// Lists statuses, keyed by name.
    pub async fn statuses(
        &self,
        category_id: Option<i64>,
        resolved_only: bool,
    ) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listStatuses")
            .with_opt("ixCategory", category_id)
            .with_flag("fResolved", resolved_only);
        self.list(command, "status", "sStatus").await
    }

    /// Returns one status.
    pub async fn status(&self, status_id: i64) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("viewStatus").with("ixStatus", status_id);
        self.view(command, "status", "sStatus").await
    }

    /// Lists the mailboxes the user can see, keyed by id.
    pub async fn mailboxes(&self) -> Result<RecordSet, FoglineError> {
        self.list(Command::new("listMailboxes"), "mailbox", "ixMailbox")
            .await
    }

    /// Returns one mailbox.
    pub async fn mailbox(&self, mailbox_id: i64) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("viewMailbox").with("ixMailbox", mailbox_id);
        self.view(command, "mailbox", "ixMailbox").await
    }

    // ========================================================================
    // People
    // ========================================================================

    /// Lists people, keyed by full name.
    pub async fn people(&self, filter: PeopleFilter) -> Result<RecordSet, FoglineError> {
        let command = filter.apply(Command::new("listPeople"));
        self.list(command, "person", "sFullName").await
    }

    /// Returns one person by id or email.
    ///
    /// The email takes precedence when both are given. With neither, the
    /// server returns the logged-on user.
    pub async fn person(
        &self,
        person_id: Option<i64>,
        email: Option<&str>,
    ) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("viewPerson")
            .with_opt("ixPerson", person_id)
            .with_opt("sEmail", email);
        self.view(command, "person", "sFullName").await
    }

    /// Creates a person and returns their id.
    pub async fn new_person(
        &self,
        email: &str,
        full_name: &str,
        kind: PersonKind,
        active: bool,
    ) -> Result<i64, FoglineError> {
        let command = Command::new("newPerson")
            .with("sEmail", email)
            .with("sFullname", full_name)
            .with("nType", kind)
            .with("fActive", active);
        self.create(command, "ixPerson").await
    }

    /// Returns a person's working schedule with the work-day flags merged
    /// in as boolean fields.
    ///
    /// Without `person_id` the logged-on user's schedule is returned.
    pub async fn working_schedule(
        &self,
        person_id: Option<i64>,
    ) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("listWorkingSchedule").with_opt("ixPerson", person_id);
        let Some(mut schedule) = self.view(command, "workingSchedule", "ixPerson").await? else {
            return Ok(None);
        };
        merge_flags(&mut schedule, "rgWorkDays")?;
        Ok(Some(schedule))
    }

    /// Returns the user's settings (time zone offset, locale, ...).
    pub async fn settings(&self, person_id: Option<i64>) -> Result<Record, FoglineError> {
        let command = Command::new("viewSettings").with_opt("ixPerson", person_id);
        let body = self.execute(command).await?;
        let response = Response::parse(&body)?;
        response
            .children_of("settings")
            .ok_or_else(|| FoglineError::malformed("response has no <settings> element"))
    }

    // ========================================================================
    // Cases
    // ========================================================================

    /// Searches for cases, keyed by case number.
    ///
    /// * `query` - search text, as typed in the search box
    /// * `cols` - columns to return; `None` requests [`CASE_COLUMNS`](crate::models::CASE_COLUMNS).
    ///   `ixBug` is always added.
    /// * `max` - maximum number of cases
    ///
    /// Each case's `events` column is decoded into a record set keyed by
    /// `ixBugEvent`.
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::Validation` if the query is blank.
    pub async fn search(
        &self,
        query: &str,
        cols: Option<&[&str]>,
        max: Option<u32>,
    ) -> Result<RecordSet, FoglineError> {
        if query.trim().is_empty() {
            return Err(FoglineError::validation("search query cannot be empty"));
        }
        let command = Command::new("search")
            .with("q", query)
            .with("cols", case_columns(cols))
            .with_opt("max", max);
        let mut cases = self.list(command, "case", "ixBug").await?;
        for case in cases.values_mut() {
            expand_nested(case, "events", "event", "ixBugEvent")?;
        }
        Ok(cases)
    }

    /// Creates a case and returns it.
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::Validation` if no field is set, or if a field
    /// name is not an identifier or would replace `cmd`, `token` or `cols`.
    pub async fn new_case(
        &self,
        fields: &CaseFields,
        cols: Option<&[&str]>,
    ) -> Result<Option<Record>, FoglineError> {
        if fields.is_empty() {
            return Err(FoglineError::validation(
                "a new case needs at least one field",
            ));
        }
        let command = fields.apply(Command::new("new").with("cols", case_columns(cols)))?;
        let Some(mut case) = self.view(command, "case", "ixBug").await? else {
            return Ok(None);
        };
        expand_nested(&mut case, "events", "event", "ixBugEvent")?;
        Ok(Some(case))
    }

    /// Starts the stopwatch on a case.
    pub async fn start_work(&self, case_id: i64) -> Result<(), FoglineError> {
        self.execute(Command::new("startWork").with("ixBug", case_id))
            .await
            .map(drop)
    }

    /// Stops the stopwatch.
    pub async fn stop_work(&self) -> Result<(), FoglineError> {
        self.execute(Command::new("stopWork")).await.map(drop)
    }

    /// Lists source control check-ins for a case, keyed by check-in id.
    pub async fn checkins(&self, case_id: i64) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listCheckins").with("ixBug", case_id);
        self.list(command, "checkin", "ixCVS").await
    }

    // ========================================================================
    // Wikis and discussion groups
    // ========================================================================

    /// Lists wikis, keyed by id.
    pub async fn wikis(&self) -> Result<RecordSet, FoglineError> {
        self.list(Command::new("listWikis"), "wiki", "ixWiki").await
    }

    /// Lists the articles of a wiki, keyed by page id.
    pub async fn articles(&self, wiki_id: i64) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listArticles").with("ixWiki", wiki_id);
        self.list(command, "article", "ixWikiPage").await
    }

    /// Returns one wiki article.
    pub async fn article(&self, page_id: i64) -> Result<Option<Record>, FoglineError> {
        let command = Command::new("viewArticle").with("ixWikiPage", page_id);
        self.view(command, "wikipage", "sBody").await
    }

    /// Lists the revisions of a wiki page, keyed by revision number.
    pub async fn revisions(&self, page_id: i64) -> Result<RecordSet, FoglineError> {
        let command = Command::new("listRevisions").with("ixWikiPage", page_id);
        self.list(command, "revision", "nRevision").await
    }

    /// Lists wiki templates, keyed by id.
    pub async fn templates(&self) -> Result<RecordSet, FoglineError> {
        self.list(Command::new("listTemplates"), "template", "ixTemplate")
            .await
    }

    /// Lists readable discussion groups, keyed by id.
    pub async fn discussion_groups(&self) -> Result<RecordSet, FoglineError> {
        self.list(Command::new("listDiscussGroups"), "discussion", "ixDiscussGroup")
            .await
    }
}

/// Runs `f` up to `max_attempts` times while it fails with a retryable error.
///
/// `secret` is redacted from logged error messages.
async fn with_retry<T, F, Fut>(
    operation: &str,
    max_attempts: u32,
    secret: &str,
    f: F,
) -> Result<T, FoglineError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FoglineError>>,
{
    let mut delay = Duration::from_millis(INITIAL_BACKOFF_MS);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempts < max_attempts => {
                let actual_delay = if e.is_rate_limit() {
                    e.retry_after().unwrap_or(delay)
                } else if matches!(e, FoglineError::ServiceUnavailable { .. }) {
                    Duration::from_millis(SERVER_ERROR_DELAY_MS)
                } else {
                    delay
                };

                tracing::debug!(
                    operation,
                    attempt = attempts,
                    max_attempts,
                    delay_ms = actual_delay.as_millis() as u64,
                    error = %e.sanitized_display(secret),
                    "Retrying after transient error"
                );

                tokio::time::sleep(actual_delay).await;

                if e.is_rate_limit() {
                    delay *= 2;
                }
            }
            Err(e) => {
                if attempts > 1 {
                    tracing::debug!(operation, attempts, "All retry attempts exhausted");
                }
                return Err(e);
            }
        }
    }
}

/// Converts a send failure, singling out timeouts.
fn map_send_error(e: reqwest::Error, timeout: Duration, operation: &str) -> FoglineError {
    if e.is_timeout() {
        return FoglineError::timeout(timeout, operation);
    }
    FoglineError::Http(e)
}

/// Returns the body of a successful response, or the matching error.
async fn read_body(response: reqwest::Response, secret: &str) -> Result<String, FoglineError> {
    let status = response.status();
    if !status.is_success() {
        return Err(handle_http_error(status, response, secret).await);
    }
    response.text().await.map_err(FoglineError::Http)
}

/// Classifies HTTP-level errors for retry handling.
async fn handle_http_error(
    status: StatusCode,
    response: reqwest::Response,
    secret: &str,
) -> FoglineError {
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let body = truncate(&FoglineError::sanitize_message(&body, secret));

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            tracing::warn!("Rate limited by FogBugz server");
            FoglineError::RateLimited { retry_after }
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            tracing::warn!(status = %status, "FogBugz server temporarily unavailable");
            FoglineError::ServiceUnavailable { status }
        }
        _ => FoglineError::HttpStatus { status, body },
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_LEN) {
        Some((cut, _)) => format!("{}...[truncated]", &body[..cut]),
        None => body.to_string(),
    }
}

fn first(set: RecordSet) -> Option<Record> {
    set.into_iter().next().map(|(_, record)| record)
}

/// Which kinds of account `listPeople` returns.
///
/// Defaults to normal users only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeopleFilter {
    normal: bool,
    community: bool,
    virtual_users: bool,
}

impl Default for PeopleFilter {
    fn default() -> Self {
        Self {
            normal: true,
            community: false,
            virtual_users: false,
        }
    }
}

impl PeopleFilter {
    /// Normal users only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also includes community users.
    #[must_use]
    pub fn with_community(mut self) -> Self {
        self.community = true;
        self
    }

    /// Also includes virtual users.
    #[must_use]
    pub fn with_virtual(mut self) -> Self {
        self.virtual_users = true;
        self
    }

    /// Excludes normal users.
    #[must_use]
    pub fn without_normal(mut self) -> Self {
        self.normal = false;
        self
    }

    fn apply(&self, command: Command) -> Command {
        command
            .with("fIncludeNormal", self.normal)
            .with_flag("fIncludeCommunity", self.community)
            .with_flag("fIncludeVirtual", self.virtual_users)
    }
}

/// Account type for [`FogBugzClient::new_person`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonKind {
    /// Regular user.
    Normal,
    /// Administrator.
    Administrator,
    /// Community user.
    Community,
    /// Virtual user.
    Virtual,
}

impl IntoParam for PersonKind {
    fn into_param(self) -> String {
        let code = match self {
            PersonKind::Normal => 0,
            PersonKind::Administrator => 1,
            PersonKind::Community => 2,
            PersonKind::Virtual => 3,
        };
        code.to_string()
    }
}
