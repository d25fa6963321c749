//! Chart assembly from aggregate rows
//!
//! Produces plotly-compatible figure documents. Every trace keeps its arrays
//! aligned by source row index.

use serde::Serialize;

use crate::models::{
    AggregateRow, BuiltYearRow, Choice, EfficiencyMetric, FuelMetric, FuelPerformanceRow,
    VerifierRankRow,
};

const HEIGHT: u32 = 700;
const WIDTH: u32 = 1000;
/// Largest bubble diameter in pixels
const BUBBLE_SIZE_MAX: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizeref: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar {
        x: Vec<String>,
        y: Vec<Option<f64>>,
        name: String,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<i64>,
    },
    Box {
        x: Vec<Option<f64>>,
        name: String,
        marker: Marker,
    },
    Scatter {
        x: Vec<Option<f64>>,
        y: Vec<Option<f64>>,
        mode: &'static str,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        marker: Option<Marker>,
    },
}

impl Trace {
    /// Length of every data array in the trace
    pub fn len(&self) -> usize {
        match self {
            Trace::Bar { x, .. } => x.len(),
            Trace::Pie { labels, .. } => labels.len(),
            Trace::Box { x, .. } => x.len(),
            Trace::Scatter { x, .. } => x.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every data array of the trace has the same length
    pub fn is_aligned(&self) -> bool {
        match self {
            Trace::Bar { x, y, .. } => x.len() == y.len(),
            Trace::Pie { labels, values } => labels.len() == values.len(),
            Trace::Box { .. } => true,
            Trace::Scatter { x, y, marker, .. } => {
                x.len() == y.len()
                    && marker
                        .as_ref()
                        .and_then(|m| m.size.as_ref())
                        .map_or(true, |s| s.len() == x.len())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Axis {
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<&'static str>,
}

impl Axis {
    fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            axis_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl Layout {
    fn sized(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            height: Some(HEIGHT),
            width: Some(WIDTH),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// Selection input offered next to a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dropdown {
    pub id: &'static str,
    pub label: &'static str,
    pub options: Vec<Choice>,
}

/// Figures plus the descriptive text shown around them
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct ChartPage {
    pub title: String,
    pub description: String,
    pub interaction: String,
    pub selected_metrics: String,
    pub chosen_metrics: String,
    pub figures: Vec<Figure>,
    pub dropdowns: Vec<Dropdown>,
}

fn group_key(row: &AggregateRow) -> String {
    row.group_key.clone().unwrap_or_default()
}

/// Grouped bar of max, min and average EEDI per ship type
pub fn eedi_bar(rows: &[AggregateRow]) -> Figure {
    let categories: Vec<String> = rows.iter().map(group_key).collect();
    let series = [
        ("Max EEDI", rows.iter().map(|r| r.max).collect::<Vec<_>>()),
        ("Min EEDI", rows.iter().map(|r| r.min).collect()),
        ("Average EEDI", rows.iter().map(|r| r.avg).collect()),
    ];

    Figure {
        data: series
            .into_iter()
            .map(|(name, y)| Trace::Bar {
                x: categories.clone(),
                y,
                name: name.to_string(),
            })
            .collect(),
        layout: Layout {
            xaxis: Some(Axis::titled("Ship Type")),
            yaxis: Some(Axis::titled("EEDI values")),
            barmode: Some("group"),
            ..Layout::sized("Max, Min and Average EEDI per Ship Type")
        },
    }
}

/// Share of ships per ship type
pub fn ship_count_pie(rows: &[AggregateRow]) -> Figure {
    Figure {
        data: vec![Trace::Pie {
            labels: rows.iter().map(group_key).collect(),
            values: rows.iter().map(|r| r.count).collect(),
        }],
        layout: Layout::sized("# of Ships per Ship Type"),
    }
}

fn eedi_box(title: &str, name: &str, color: &str, x: Vec<Option<f64>>) -> Figure {
    Figure {
        data: vec![Trace::Box {
            x,
            name: name.to_string(),
            marker: Marker {
                color: Some(color.to_string()),
                ..Default::default()
            },
        }],
        layout: Layout::sized(title),
    }
}

/// Distribution of the per-type max, min and average EEDI
pub fn eedi_boxes(rows: &[AggregateRow]) -> Vec<Figure> {
    vec![
        eedi_box(
            "Distribution Overview of Max EEDI",
            "Max EEDI",
            "indianred",
            rows.iter().map(|r| r.max).collect(),
        ),
        eedi_box(
            "Distribution Overview of Min EEDI",
            "Min EEDI",
            "royalblue",
            rows.iter().map(|r| r.min).collect(),
        ),
        eedi_box(
            "Distribution Overview of Average EEDI",
            "Average EEDI",
            "lightseagreen",
            rows.iter().map(|r| r.avg).collect(),
        ),
    ]
}

/// Bar, pie and box charts over per-type EEDI statistics
pub fn visual_page(rows: &[AggregateRow]) -> ChartPage {
    let mut figures = vec![eedi_bar(rows), ship_count_pie(rows)];
    figures.extend(eedi_boxes(rows));
    ChartPage {
        title: "EEDI per Ship Type".to_string(),
        figures,
        ..Default::default()
    }
}

/// Split rows into one series per distinct label, in order of first appearance
fn series_by_label<'a, T>(rows: &'a [T], label: impl Fn(&T) -> &str) -> Vec<(String, Vec<&'a T>)> {
    let mut series: Vec<(String, Vec<&T>)> = Vec::new();
    for row in rows {
        let key = label(row);
        match series.iter_mut().find(|(name, _)| name == key) {
            Some((_, members)) => members.push(row),
            None => series.push((key.to_string(), vec![row])),
        }
    }
    series
}

/// Bubble chart of average fuel consumption against `metric`
///
/// Bubble area follows the log of the ship count; one trace per rollup label.
pub fn fuel_performance_figure(rows: &[FuelPerformanceRow], metric: FuelMetric) -> Figure {
    let max_size = rows
        .iter()
        .map(|r| r.scaled_count)
        .fold(0.0_f64, f64::max);
    let sizeref = if max_size > 0.0 {
        2.0 * max_size / (BUBBLE_SIZE_MAX * BUBBLE_SIZE_MAX)
    } else {
        1.0
    };

    let data = series_by_label(rows, |r| r.label.as_str())
        .into_iter()
        .map(|(name, members)| Trace::Scatter {
            x: members.iter().map(|r| r.fuel_consumption).collect(),
            y: members.iter().map(|r| r.metric).collect(),
            mode: "markers",
            name,
            marker: Some(Marker {
                size: Some(members.iter().map(|r| r.scaled_count).collect()),
                sizemode: Some("area"),
                sizeref: Some(sizeref),
                ..Default::default()
            }),
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            xaxis: Some(Axis {
                title: "Average fuel consumption".to_string(),
                axis_type: Some("log"),
            }),
            yaxis: Some(Axis::titled(metric.title())),
            legend_title: Some("Value of Bubbles".to_string()),
            ..Layout::sized(format!(
                "Average fuel consumption vs {} per Ship Type and Ship Engine \
                 (with Subtotal for each Type and Engine)",
                metric.title()
            ))
        },
    }
}

pub fn fuel_metric_dropdown() -> Dropdown {
    let mut options = vec![Choice::new(FuelMetric::Eedi.expression(), "Select here")];
    options.extend(
        FuelMetric::ALL
            .iter()
            .map(|m| Choice::new(m.expression(), m.label())),
    );
    Dropdown {
        id: "y_axis",
        label: "Performance Metrics & Ship Features",
        options,
    }
}

pub fn fuel_performance_page(rows: &[FuelPerformanceRow], metric: FuelMetric) -> ChartPage {
    ChartPage {
        title: "Fuel Consumption vs Performance Metrics/Ship Features of each Ship Type and Engine"
            .to_string(),
        description: "We compared fuel consumption of every ship type and engine with their \
             features and different maritime performance metrics. This is so that we can \
             understand if there are any correlations between different performance metrics \
             or ship features with fuel consumption. Size of the bubbles are determined by \
             natural logarithm of ship count, ensuring the relative importance by ship type \
             is captured."
            .to_string(),
        interaction: "To select different performance metrics or ship features, use the \
             dropdown below. You can focus on the information of a particular ship type by \
             hovering over the bubbles displayed."
            .to_string(),
        selected_metrics: "Current Selected Performance Metrics & Ship Features:".to_string(),
        chosen_metrics: metric.title().to_string(),
        figures: vec![fuel_performance_figure(rows, metric)],
        dropdowns: vec![fuel_metric_dropdown()],
    }
}

/// Line per verifier of monthly rank by average EEDI
pub fn verifier_ranking_figure(rows: &[VerifierRankRow]) -> Figure {
    let data = series_by_label(rows, |r| r.verifier_name.as_str())
        .into_iter()
        .map(|(name, members)| Trace::Scatter {
            x: members.iter().map(|r| Some(r.month_actual as f64)).collect(),
            y: members.iter().map(|r| Some(r.rank as f64)).collect(),
            mode: "lines",
            name,
            marker: None,
        })
        .collect();

    Figure {
        data,
        layout: Layout {
            title: Some("Longitudinal Tracking of Average EEDI for Accredited Vessels by Verifier".to_string()),
            xaxis: Some(Axis::titled("Issue Month")),
            yaxis: Some(Axis::titled("Rank against other verifiers")),
            legend_title: Some("Verifiers Name".to_string()),
            ..Default::default()
        },
    }
}

pub fn verifier_ranking_page(rows: &[VerifierRankRow]) -> ChartPage {
    ChartPage {
        title: "Ranking Verifiers based on EEDI".to_string(),
        description: "We ranked verifiers based on the average EEDI of all their certified \
             ships, tracked across post issuance months."
            .to_string(),
        interaction: "Remove any verifier from the graph by clicking on their names. Reselect \
             to add their rank back to the graph. Verifiers that are not selected will have a \
             grey font instead of black."
            .to_string(),
        figures: vec![verifier_ranking_figure(rows)],
        ..Default::default()
    }
}

/// Grouped bar of 25th and 75th percentiles of `metric` per build year
pub fn built_year_figure(rows: &[BuiltYearRow], metric: EfficiencyMetric) -> Figure {
    let years: Vec<String> = rows
        .iter()
        .map(|r| r.year_built.map(|y| y.to_string()).unwrap_or_default())
        .collect();

    Figure {
        data: vec![
            Trace::Bar {
                x: years.clone(),
                y: rows.iter().map(|r| r.percentile_25).collect(),
                name: "25th Percentile".to_string(),
            },
            Trace::Bar {
                x: years,
                y: rows.iter().map(|r| r.percentile_75).collect(),
                name: "75th Percentile".to_string(),
            },
        ],
        layout: Layout {
            xaxis: Some(Axis::titled("Year Built")),
            yaxis: Some(Axis::titled(metric.title())),
            barmode: Some("group"),
            ..Layout::sized(format!(
                "25th and 75th Percentiles of {} for all ship based on year built",
                metric.title()
            ))
        },
    }
}

pub fn efficiency_metric_dropdown() -> Dropdown {
    let mut options = vec![Choice::new(EfficiencyMetric::Eedi.column(), "Select here")];
    options.extend(
        EfficiencyMetric::ALL
            .iter()
            .map(|m| Choice::new(m.column(), m.title())),
    );
    Dropdown {
        id: "y_axis",
        label: "Efficiency Metrics",
        options,
    }
}

pub fn built_year_page(rows: &[BuiltYearRow], metric: EfficiencyMetric) -> ChartPage {
    ChartPage {
        title: "Measuring Efficiency of Ships Built in Different Years".to_string(),
        description: "We computed the 25th and 75th percentile values of various reported \
             efficiency metrics, segmented across year of vessel build. Said metrics include: \
             EEDI, C02 transport, CO2 distance and Fuel consumption."
            .to_string(),
        interaction: "To select different metrics, use the dropdown below. You can view both \
             percentiles or focus on one percentile by hovering over the bars displayed."
            .to_string(),
        selected_metrics: "Current Selected Efficiency Metrics:".to_string(),
        chosen_metrics: metric.title().to_string(),
        figures: vec![built_year_figure(rows, metric)],
        dropdowns: vec![efficiency_metric_dropdown()],
    }
}
