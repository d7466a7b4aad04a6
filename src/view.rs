// src/view.rs
use serde::Serialize;

use crate::{
    chart::{figure, points, ChartSettings, Figure, Theme},
    config::{DashboardDefaults, YearRange},
    data::{ContractRecord, ContractTable},
    query::{query, Filters},
};

/// Everything the page needs after a control changes.
#[derive(Debug, Clone, Serialize)]
pub struct ViewModel {
    pub filters: Filters,
    pub rows: Vec<ContractRecord>,
    pub figure: Figure,
}

/// Recompute the chart for `filters`. Pure: the table is only read and nothing
/// is cached between calls.
pub fn compute_view(table: &ContractTable, filters: &Filters, settings: &ChartSettings) -> ViewModel {
    let rows = query(table, filters);
    let figure = figure(points(&rows, settings), &filters.city, &Theme::default());
    ViewModel {
        filters: filters.clone(),
        rows,
        figure,
    }
}

impl From<&DashboardDefaults> for Filters {
    fn from(d: &DashboardDefaults) -> Self {
        Filters::new(d.city.clone(), d.min_year, d.entities.iter().cloned())
    }
}

/// Options and initial values of the three controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    pub city: CitySelector,
    pub year: YearSlider,
    pub entities: EntityChecklist,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySelector {
    pub options: Vec<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSlider {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub value: i32,
    pub marks: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityChecklist {
    pub options: Vec<String>,
    pub value: Vec<String>,
}

impl Controls {
    pub fn new(table: &ContractTable, defaults: &DashboardDefaults, years: &YearRange) -> Self {
        let marks = (years.min..=years.max)
            .step_by(years.mark_step.max(1) as usize)
            .collect();
        Self {
            city: CitySelector {
                options: table.cities().to_vec(),
                value: defaults.city.clone(),
            },
            year: YearSlider {
                min: years.min,
                max: years.max,
                step: 1,
                value: defaults.min_year.max(years.min).min(years.max),
                marks,
            },
            entities: EntityChecklist {
                options: table.entities().to_vec(),
                value: defaults.entities.clone(),
            },
        }
    }
}
