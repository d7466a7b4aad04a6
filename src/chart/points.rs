// src/chart/points.rs
use serde::{Deserialize, Serialize};

use super::format::thousands;
use crate::data::ContractRecord;

/// Tunables of the point mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Marker size is `contract_count / size_divisor`.
    pub size_divisor: f64,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self { size_divisor: 10.0 }
    }
}

/// Per-point render attributes, one entry per aggregate row, column-wise as
/// the renderer consumes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointSet {
    pub x: Vec<i32>,
    pub y: Vec<i64>,
    pub text: Vec<String>,
    pub size: Vec<f64>,
    pub color: Vec<i64>,
    pub hover: Vec<String>,
}

impl PointSet {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

pub fn points(rows: &[ContractRecord], settings: &ChartSettings) -> PointSet {
    let mut set = PointSet {
        x: Vec::with_capacity(rows.len()),
        y: Vec::with_capacity(rows.len()),
        text: Vec::with_capacity(rows.len()),
        size: Vec::with_capacity(rows.len()),
        color: Vec::with_capacity(rows.len()),
        hover: Vec::with_capacity(rows.len()),
    };
    for r in rows {
        set.x.push(r.year);
        set.y.push(r.contract_count);
        set.text.push(r.spending_destination.clone());
        set.size.push(r.contract_count as f64 / settings.size_divisor);
        set.color.push(r.contract_count);
        set.hover.push(hover_text(r));
    }
    set
}

/// Labeled multi-line hover string for one point.
pub fn hover_text(r: &ContractRecord) -> String {
    format!(
        "<b>Ciudad</b>: {}<br>\
         <b>Entidad</b>: {}<br>\
         <b>Destino del gasto</b>: {}<br>\
         <b>Año</b>: {}<br>\
         <b>Población</b>: {}<br>\
         <b>Contratos/100k hab.</b>: {}<br>\
         <b>No. de contratos</b>: {}<br>",
        r.city,
        r.entity,
        r.spending_destination,
        r.year,
        thousands(r.population),
        thousands(r.contracts_per_100k),
        thousands(r.contract_count as f64),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::record;

    #[test]
    fn test_empty_rows_give_empty_set() {
        let set = points(&[], &ChartSettings::default());
        assert!(set.is_empty());
        assert_eq!(set, PointSet::default());
    }

    #[test]
    fn test_point_attributes() {
        let rows = vec![
            record("ICA_NAL", "Bogotá", "Inv", 2001, 15),
            record("MADR", "Bogotá", "Fun", 2010, 250),
        ];
        let set = points(&rows, &ChartSettings::default());
        assert_eq!(set.len(), 2);
        assert_eq!(set.x, vec![2001, 2010]);
        assert_eq!(set.y, vec![15, 250]);
        assert_eq!(set.color, vec![15, 250]);
        assert_eq!(set.size, vec![1.5, 25.0]);
        assert_eq!(set.text, vec!["Inv", "Fun"]);
        assert_eq!(set.hover.len(), 2);
    }

    #[test]
    fn test_size_divisor_is_configurable() {
        let rows = vec![record("ICA_NAL", "Bogotá", "Inv", 2001, 40)];
        let set = points(&rows, &ChartSettings { size_divisor: 4.0 });
        assert_eq!(set.size, vec![10.0]);
    }

    #[test]
    fn test_hover_text() {
        let mut r = record("ICA_NAL", "Colombia, Bogotá, Bogotá", "Inv", 2001, 1520);
        r.population = 7_412_566.0;
        r.contracts_per_100k = 20.5;
        assert_eq!(
            hover_text(&r),
            "<b>Ciudad</b>: Colombia, Bogotá, Bogotá<br>\
             <b>Entidad</b>: ICA_NAL<br>\
             <b>Destino del gasto</b>: Inv<br>\
             <b>Año</b>: 2001<br>\
             <b>Población</b>: 7,412,566<br>\
             <b>Contratos/100k hab.</b>: 20<br>\
             <b>No. de contratos</b>: 1,520<br>"
        );
    }
}
