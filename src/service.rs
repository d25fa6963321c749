//! Page-level operations behind the emissions and chart views

use serde::Serialize;
use tracing::{error, warn};

use crate::{
    cache::ChoiceCache,
    charts::{self, ChartPage},
    config::AppConfig,
    editor::{Action, Applied, NextView, Outcome, RecordEditor},
    errors::{EditError, EmissionsError, FieldError},
    models::{AggregateRow, Choice, Column, EfficiencyMetric, EmissionRecord, FuelMetric, Imo},
    pager::{paginate, Page},
    store::{EmissionStore, Window},
    validation::FormData,
};

/// One page of the emissions listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsPage {
    pub page: Page,
    pub order_by: Column,
    pub rows: Vec<EmissionRecord>,
    pub notice: Option<String>,
}

/// One page of per-group statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationPage {
    pub page: Page,
    pub group_by: Column,
    pub rows: Vec<AggregateRow>,
}

/// Detail form state; `record` is empty when creating a new one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionDetail {
    pub record: Option<EmissionRecord>,
    pub notice: Option<String>,
    pub type_choices: Vec<Choice>,
}

/// Result of a form submission and where to go next
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub outcome: Outcome,
    pub next: NextView,
}

/// Emissions views over an [`EmissionStore`]
pub struct EmissionsService<S> {
    store: S,
    choices: ChoiceCache,
    editor: RecordEditor,
    page_size: u32,
}

impl<S: EmissionStore> EmissionsService<S> {
    pub fn new(store: S, choices: ChoiceCache, editor: RecordEditor, page_size: u32) -> Self {
        Self {
            store,
            choices,
            editor,
            page_size,
        }
    }

    pub fn from_config(store: S, config: &AppConfig) -> Self {
        Self::new(
            store,
            ChoiceCache::new(config.cache.choices_ttl),
            RecordEditor::new(config.validation.clone()),
            config.listing.page_size,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records of `requested_page` sorted by `order_by` (unknown names sort by
    /// `imo`). `deleted` adds a deletion notice.
    pub async fn emissions_page(
        &self,
        requested_page: i64,
        order_by: Option<&str>,
        deleted: Option<&str>,
    ) -> Result<EmissionsPage, EmissionsError> {
        let order_by = Column::parse_or_default(order_by);
        let total = self.store.count_records().await?;
        let page = paginate(total, requested_page, self.page_size);
        let rows = self
            .store
            .fetch_page(
                order_by,
                Window {
                    offset: page.offset,
                    limit: page.limit,
                },
            )
            .await?;

        Ok(EmissionsPage {
            page,
            order_by,
            rows,
            notice: deleted
                .filter(|d| !d.trim().is_empty())
                .map(|d| format!("✔ IMO {} deleted", d.trim())),
        })
    }

    /// Existing record for `imo`, or a blank form when `imo` is `None`
    pub async fn emission_detail(
        &self,
        imo: Option<Imo>,
        inserted: bool,
    ) -> Result<EmissionDetail, EmissionsError> {
        let type_choices = self.choices.get_choices(&self.store, Column::Type).await?;

        let Some(imo) = imo else {
            return Ok(EmissionDetail {
                record: None,
                notice: None,
                type_choices,
            });
        };

        let record = self
            .store
            .fetch_record(imo)
            .await?
            .ok_or(EmissionsError::NotFound(imo))?;

        Ok(EmissionDetail {
            record: Some(record),
            notice: inserted.then(|| format!("✔ IMO {imo} inserted")),
            type_choices,
        })
    }

    /// Apply a submitted form. Never fails; every error becomes an unsuccessful
    /// [`Outcome`] that keeps the caller on the form.
    pub async fn submit(
        &self,
        form: &FormData,
        action: Option<&str>,
        key: Option<Imo>,
    ) -> Submission {
        let Some(action) = action.and_then(Action::parse) else {
            warn!("Submission with unknown action {:?}", action);
            let result: Result<Applied, EditError> = Err(EditError::Validation(vec![FieldError::new(
                "action",
                "Select insert, update or delete.",
            )]));
            return Submission {
                outcome: Outcome::from(&result),
                next: NextView::Form,
            };
        };

        let result = self.editor.apply(&self.store, form, action, key).await;
        Submission {
            outcome: Outcome::from(&result),
            next: match &result {
                Ok(applied) => applied.next_view(),
                Err(_) => NextView::Form,
            },
        }
    }

    /// Statistics per distinct value of `group_by` (unknown names group by
    /// ship type), paged by group
    pub async fn aggregation_page(
        &self,
        requested_page: i64,
        group_by: Option<&str>,
    ) -> Result<AggregationPage, EmissionsError> {
        let group_by = group_by.and_then(Column::parse).unwrap_or(Column::Type);
        let total = self.store.count_groups(group_by).await?;
        let page = paginate(total, requested_page, self.page_size);
        let rows = self
            .store
            .fetch_aggregates(
                group_by,
                Some(Window {
                    offset: page.offset,
                    limit: page.limit,
                }),
            )
            .await?;

        Ok(AggregationPage {
            page,
            group_by,
            rows,
        })
    }

    pub async fn choices(&self, column: Column) -> Result<Vec<Choice>, EmissionsError> {
        self.choices
            .get_choices(&self.store, column)
            .await
            .map_err(|e| {
                error!("Failed to load choices for {}: {}", column, e);
                EmissionsError::from(e)
            })
    }

    pub async fn visual(&self) -> Result<ChartPage, EmissionsError> {
        let rows = self.store.fetch_aggregates(Column::Type, None).await?;
        Ok(charts::visual_page(&rows))
    }

    pub async fn fuel_performance(
        &self,
        y_axis: Option<&str>,
    ) -> Result<ChartPage, EmissionsError> {
        let metric = FuelMetric::parse_or_default(y_axis);
        let rows = self.store.fuel_performance(metric).await?;
        Ok(charts::fuel_performance_page(&rows, metric))
    }

    pub async fn verifiers_ranking(&self) -> Result<ChartPage, EmissionsError> {
        let rows = self.store.verifier_ranking().await?;
        Ok(charts::verifier_ranking_page(&rows))
    }

    pub async fn built_year_efficiency(
        &self,
        y_axis: Option<&str>,
    ) -> Result<ChartPage, EmissionsError> {
        let metric = EfficiencyMetric::parse_or_default(y_axis);
        let rows = self.store.built_year_percentiles(metric).await?;
        Ok(charts::built_year_page(&rows, metric))
    }
}
