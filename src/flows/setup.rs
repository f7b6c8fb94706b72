//! Source setup wizard: Select → Connect → Finish.

use tracing::info;
use uuid::Uuid;

use crate::api::{ApiError, Gateway, NewSource, SourceCreated, SourceCredentials};
use crate::store::SessionStore;
use crate::wizard::{Advance, Field, StepSpec, Wizard};

use super::sources::SourceDirectory;

/// Catalog badge shown next to a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Sample,
    PrivatePreview,
}

impl Badge {
    pub fn label(self) -> &'static str {
        match self {
            Badge::Sample => "SAMPLE",
            Badge::PrivatePreview => "PRIVATE PREVIEW",
        }
    }
}

/// A connectable data-source type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceKind {
    pub id: &'static str,
    pub name: &'static str,
    pub badge: Option<Badge>,
}

const fn kind(id: &'static str, name: &'static str) -> SourceKind {
    SourceKind {
        id,
        name,
        badge: None,
    }
}

const fn badged(id: &'static str, name: &'static str, badge: Badge) -> SourceKind {
    SourceKind {
        id,
        name,
        badge: Some(badge),
    }
}

pub static SOURCE_CATALOG: [SourceKind; 22] = [
    badged("b2b-saas", "B2B SaaS", Badge::Sample),
    badged("b2c-ecommerce", "B2C eCommerce", Badge::Sample),
    kind("athena", "Amazon Athena"),
    kind("redshift", "Amazon Redshift"),
    kind("clickhouse", "Clickhouse"),
    kind("databricks", "Databricks"),
    badged("dremio", "Dremio", Badge::PrivatePreview),
    kind("dynamodb", "DynamoDB"),
    kind("elasticsearch", "Elasticsearch"),
    kind("firebolt", "Firebolt"),
    badged("firestore", "Firestore", Badge::PrivatePreview),
    kind("bigquery", "Google BigQuery"),
    kind("mongodb", "MongoDB"),
    kind("mysql", "MySQL"),
    badged("oracle", "Oracle", Badge::PrivatePreview),
    kind("palantir", "Palantir Foundry"),
    kind("postgres", "PostgreSQL"),
    kind("rockset", "Rockset"),
    kind("s3", "S3"),
    kind("sql-server", "SQL Server"),
    kind("snowflake", "Snowflake"),
    kind("trino", "Trino"),
];

pub fn find_kind(id: &str) -> Option<&'static SourceKind> {
    SOURCE_CATALOG.iter().find(|k| k.id == id)
}

pub const ACCOUNT: Field = Field::new("account", "Account");
pub const WAREHOUSE: Field = Field::new("warehouse", "Warehouse");
pub const DATABASE: Field = Field::new("database", "Database");
pub const USERNAME: Field = Field::new("username", "Username");
pub const ROLE: Field = Field::new("role", "Role");
pub const NAME: Field = Field::new("name", "Name");

/// Step 2 inputs in display order
pub const CONNECT_FIELDS: [Field; 5] = [ACCOUNT, WAREHOUSE, DATABASE, USERNAME, ROLE];

pub const DEFAULT_ROLE: &str = "DEFAULT";
pub const DEFAULT_PORT: u16 = 5432;

static SETUP_STEPS: [StepSpec; 3] = [
    StepSpec::new("Select").needs_selection(),
    StepSpec::new("Connect").require(&[ACCOUNT, WAREHOUSE, DATABASE, USERNAME]),
    StepSpec::new("Finish").require(&[NAME]),
];

pub struct SetupFlow {
    wizard: Wizard<&'static SourceKind, SourceCreated>,
    slug_suffix: String,
}

impl Default for SetupFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupFlow {
    pub fn new() -> Self {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(5).collect();
        Self::with_slug_suffix(suffix)
    }

    pub fn with_slug_suffix(suffix: impl Into<String>) -> Self {
        Self {
            wizard: Wizard::new(&SETUP_STEPS),
            slug_suffix: suffix.into(),
        }
    }

    pub fn wizard(&self) -> &Wizard<&'static SourceKind, SourceCreated> {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard<&'static SourceKind, SourceCreated> {
        &mut self.wizard
    }

    pub fn selected(&self) -> Option<&'static SourceKind> {
        self.wizard.selection().copied()
    }

    /// Step 1: picking a source moves straight to Connect
    pub fn select_source(&mut self, kind: &'static SourceKind) -> Advance {
        let previous = self.selected().map(|k| k.name);
        let draft = self.wizard.draft_mut();
        draft.set_default(ROLE.name, DEFAULT_ROLE);
        // Follow the source name until the user types their own
        if draft.value(NAME.name).is_none() || draft.value(NAME.name) == previous {
            draft.set(NAME.name, kind.name);
        }
        self.wizard.select_and_advance(kind)
    }

    /// Read-only slug shown on the Finish step
    pub fn slug(&self) -> Option<String> {
        self.selected().map(|k| format!("{}-{}", k.id, self.slug_suffix))
    }

    /// `POST /sources` body built from the draft
    pub fn request(&self) -> Option<NewSource> {
        let kind = self.selected()?;
        let draft = self.wizard.draft();
        let value = |f: Field| draft.value(f.name).unwrap_or_default().to_string();
        Some(NewSource {
            name: draft.value(NAME.name).unwrap_or(kind.name).to_string(),
            source_type: kind.id.to_string(),
            slug: self.slug(),
            credentials: SourceCredentials {
                account: value(ACCOUNT),
                database: value(DATABASE),
                username: value(USERNAME),
                password: String::new(),
                port: DEFAULT_PORT,
                warehouse: value(WAREHOUSE),
                role: value(ROLE),
            },
        })
    }

    /// Continue / Finish. On the terminal step this creates the source.
    pub async fn proceed(
        &mut self,
        gateway: &dyn Gateway,
        directory: &mut SourceDirectory,
        store: &mut SessionStore,
    ) -> Advance {
        let outcome = self.wizard.advance();
        if outcome != Advance::Submit {
            return outcome;
        }
        let Some(request) = self.request() else {
            return outcome;
        };
        if !self.wizard.begin_submit() {
            return outcome;
        }

        info!(source_type = %request.source_type, name = %request.name, "creating source");
        let result = directory
            .create(gateway, store, &request)
            .await
            .map_err(submit_error);
        self.wizard.finish_submit(result);
        outcome
    }

    pub fn back(&mut self) -> bool {
        self.wizard.retreat()
    }

    pub fn cancel(&mut self) {
        self.wizard.cancel();
    }

    /// Text of the success modal once the source is connected
    pub fn success_message(&self) -> Option<String> {
        if !self.wizard.is_complete() {
            return None;
        }
        let name = self.selected().map(|k| k.name).unwrap_or("Source");
        Some(format!(
            "{name} has been successfully configured and connected to your iNitro workspace."
        ))
    }
}

fn submit_error(err: ApiError) -> String {
    match err {
        ApiError::Network { message } => format!("Network error while saving source: {message}"),
        other => format!("Failed to save source: {other}"),
    }
}
