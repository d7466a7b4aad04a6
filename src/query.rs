// src/query.rs
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
};
use tracing::debug;

use crate::data::{ContractRecord, ContractTable};

/// The three dashboard controls: city selector, year slider, entity checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub city: String,
    pub min_year: i32,
    pub entities: BTreeSet<String>,
}

impl Filters {
    pub fn new<I, S>(city: impl Into<String>, min_year: i32, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            city: city.into(),
            min_year,
            entities: entities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, r: &ContractRecord) -> bool {
        r.city == self.city && r.year >= self.min_year && self.entities.contains(&r.entity)
    }
}

/// Grouping key of the aggregate table. Floats order by `total_cmp`.
#[derive(Debug, Clone, Copy)]
struct GroupKey<'a> {
    entity: &'a str,
    city: &'a str,
    spending_destination: &'a str,
    year: i32,
    population: f64,
    contracts_per_100k: f64,
}

impl<'a> GroupKey<'a> {
    fn of(r: &'a ContractRecord) -> Self {
        Self {
            entity: &r.entity,
            city: &r.city,
            spending_destination: &r.spending_destination,
            year: r.year,
            population: positive_zero(r.population),
            contracts_per_100k: positive_zero(r.contracts_per_100k),
        }
    }

    fn into_record(self, contract_count: i64) -> ContractRecord {
        ContractRecord {
            entity: self.entity.to_string(),
            city: self.city.to_string(),
            spending_destination: self.spending_destination.to_string(),
            year: self.year,
            population: self.population,
            contracts_per_100k: self.contracts_per_100k,
            contract_count,
        }
    }
}

// -0.0 and 0.0 must land in the same group
fn positive_zero(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

impl Ord for GroupKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.entity
            .cmp(other.entity)
            .then_with(|| self.city.cmp(other.city))
            .then_with(|| self.spending_destination.cmp(other.spending_destination))
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| self.population.total_cmp(&other.population))
            .then_with(|| self.contracts_per_100k.total_cmp(&other.contracts_per_100k))
    }
}

impl PartialOrd for GroupKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GroupKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey<'_> {}

/// Group records by (entity, city, spending_destination, year, population,
/// contracts_per_100k) and sum `contract_count` per group.
/// Rows come back sorted by that key; no key appears twice.
pub fn aggregate<'a, I>(records: I) -> Vec<ContractRecord>
where
    I: IntoIterator<Item = &'a ContractRecord>,
{
    let mut groups: BTreeMap<GroupKey<'a>, i64> = BTreeMap::new();
    for r in records {
        let total = groups.entry(GroupKey::of(r)).or_insert(0);
        *total = total.saturating_add(r.contract_count);
    }
    groups
        .into_iter()
        .map(|(key, count)| key.into_record(count))
        .collect()
}

/// Aggregate the table and keep the rows selected by `filters`.
///
/// Never fails: an unknown city, an empty entity set or a year past the data
/// all give an empty result.
pub fn query(table: &ContractTable, filters: &Filters) -> Vec<ContractRecord> {
    if filters.entities.is_empty() {
        return Vec::new();
    }
    // filters only read grouping-key columns, so they select whole groups
    // and can run before the grouping
    let rows = aggregate(table.records().iter().filter(|r| filters.matches(r)));
    debug!(
        city = %filters.city,
        min_year = filters.min_year,
        entities = filters.entities.len(),
        rows = rows.len(),
        "query"
    );
    rows
}
