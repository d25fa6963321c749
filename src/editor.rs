//! Validated insert, update and delete of emission records

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    config::ValidationConfig,
    errors::{EditError, FieldError},
    models::{EmissionRecord, Imo},
    store::{EmissionStore, InsertOutcome},
    validation::{self, FormData},
};

/// Requested mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

impl Action {
    pub fn parse(value: &str) -> Option<Action> {
        match value.trim() {
            "insert" => Some(Action::Insert),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            _ => None,
        }
    }
}

/// A mutation that reached the store and succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Inserted(Imo),
    Updated(Imo),
    Deleted(Imo),
}

/// Where the caller goes after a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum NextView {
    /// Detail page of a freshly created record
    ShowRecord { imo: Imo },
    /// Listing annotated with a deletion notice
    ListWithNotice { deleted: Imo },
    /// Stay on the form with the outcome message
    Form,
}

impl Applied {
    pub fn imo(&self) -> Imo {
        match self {
            Applied::Inserted(imo) | Applied::Updated(imo) | Applied::Deleted(imo) => *imo,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Applied::Inserted(_) => "✔ IMO inserted successfully".to_string(),
            Applied::Updated(_) => "✔ IMO updated successfully".to_string(),
            Applied::Deleted(imo) => format!("✔ IMO {imo} deleted"),
        }
    }

    pub fn next_view(&self) -> NextView {
        match self {
            Applied::Inserted(imo) => NextView::ShowRecord { imo: *imo },
            Applied::Updated(_) => NextView::Form,
            Applied::Deleted(imo) => NextView::ListWithNotice { deleted: *imo },
        }
    }
}

/// User-facing result of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<(String, String)>,
}

impl From<&Result<Applied, EditError>> for Outcome {
    fn from(result: &Result<Applied, EditError>) -> Self {
        match result {
            Ok(applied) => Outcome {
                success: true,
                message: applied.message(),
                field_errors: Vec::new(),
            },
            Err(e) => Outcome {
                success: false,
                message: e.user_message(),
                field_errors: match e {
                    EditError::Validation(errors) => errors
                        .iter()
                        .map(|f| (f.field.to_string(), f.message.clone()))
                        .collect(),
                    _ => Vec::new(),
                },
            },
        }
    }
}

/// Applies form submissions to an [`EmissionStore`]
#[derive(Debug, Clone, Default)]
pub struct RecordEditor {
    validation: ValidationConfig,
}

impl RecordEditor {
    pub fn new(validation: ValidationConfig) -> Self {
        Self { validation }
    }

    /// Validate `form` and perform `action`.
    ///
    /// `key` is the record being edited; when present it overrides the `imo`
    /// field of the form. Delete needs only the key and is satisfied when the
    /// record is absent afterwards, whether or not it existed.
    pub async fn apply<S>(
        &self,
        store: &S,
        form: &FormData,
        action: Action,
        key: Option<Imo>,
    ) -> Result<Applied, EditError>
    where
        S: EmissionStore + ?Sized,
    {
        let result = self.apply_inner(store, form, action, key).await;
        match &result {
            Ok(applied) => info!("Applied {:?} for IMO {}", action, applied.imo()),
            Err(EditError::Validation(errors)) => {
                debug!("Rejected {:?}: {} invalid field(s)", action, errors.len())
            }
            Err(e @ (EditError::Conflict(_) | EditError::NotFound(_))) => {
                warn!("{:?} not applied: {}", action, e)
            }
            Err(EditError::DataStore(e)) => error!("{:?} failed in data store: {}", action, e),
        }
        result
    }

    async fn apply_inner<S>(
        &self,
        store: &S,
        form: &FormData,
        action: Action,
        key: Option<Imo>,
    ) -> Result<Applied, EditError>
    where
        S: EmissionStore + ?Sized,
    {
        match action {
            Action::Delete => {
                let imo = match key {
                    Some(imo) => imo,
                    None => Self::form_imo(form)?,
                };
                store.delete_record(imo).await?;
                Ok(Applied::Deleted(imo))
            }
            Action::Insert => {
                let record = self.validated(form, key)?;
                match store.insert_record(&record).await? {
                    InsertOutcome::Inserted => Ok(Applied::Inserted(record.imo)),
                    InsertOutcome::Duplicate => Err(EditError::Conflict(record.imo)),
                }
            }
            Action::Update => {
                let record = self.validated(form, key)?;
                match store.update_record(record.imo, &record).await? {
                    0 => Err(EditError::NotFound(record.imo)),
                    _ => Ok(Applied::Updated(record.imo)),
                }
            }
        }
    }

    fn validated(&self, form: &FormData, key: Option<Imo>) -> Result<EmissionRecord, EditError> {
        let mut form = form.clone();
        if let Some(imo) = key {
            form.set("imo", imo.to_string());
        }
        validation::validate(&form, &self.validation).map_err(EditError::Validation)
    }

    fn form_imo(form: &FormData) -> Result<Imo, EditError> {
        let raw = form.get("imo").ok_or_else(|| {
            EditError::Validation(vec![FieldError::new("imo", "This field is required.")])
        })?;
        Imo::try_from(raw)
            .map_err(|e| EditError::Validation(vec![FieldError::new("imo", e.to_string())]))
    }
}
