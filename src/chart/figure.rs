// src/chart/figure.rs
use serde::Serialize;

use super::points::PointSet;

/// Fixed look of the bubble chart.
#[derive(Debug, Clone)]
pub struct Theme {
    pub title_prefix: String,
    pub background: String,
    pub title_color: String,
    pub title_size: u32,
    pub axis_color: String,
    pub axis_line_color: String,
    pub marker_line_color: String,
    pub marker_line_width: u32,
    pub colorscale: String,
    pub font_family: String,
    pub font_size: u32,
    pub font_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            title_prefix: "Contratos (fun: funcionamiento - Inv: Inversión - ND: No Disponible): "
                .into(),
            background: "#010915".into(),
            title_color: "yellow".into(),
            title_size: 20,
            axis_color: "silver".into(),
            axis_line_color: "white".into(),
            marker_line_color: "MediumPurple".into(),
            marker_line_width: 2,
            colorscale: "HSV".into(),
            font_family: "sans-serif".into(),
            font_size: 12,
            font_color: "white".into(),
        }
    }
}

/// plotly.js figure: `{ "data": [...], "layout": {...} }`.
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<ScatterTrace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub x: Vec<i32>,
    pub y: Vec<i64>,
    pub text: Vec<String>,
    pub textposition: &'static str,
    pub mode: &'static str,
    pub marker: Marker,
    pub hoverinfo: &'static str,
    pub hovertext: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub size: Vec<f64>,
    pub color: Vec<i64>,
    pub colorscale: String,
    pub showscale: bool,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: String,
    pub width: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    pub size: u32,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: AxisTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick0: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtick: Option<f64>,
    pub color: String,
    pub showline: bool,
    pub showgrid: bool,
    pub linecolor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linewidth: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub orientation: &'static str,
    pub bgcolor: String,
    pub x: f64,
    pub y: f64,
    pub xanchor: &'static str,
    pub yanchor: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub plot_bgcolor: String,
    pub paper_bgcolor: String,
    pub title: Title,
    pub hovermode: &'static str,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub legend: Legend,
    pub font: Font,
}

/// Wrap a point set in a single-trace bubble chart titled with `city`.
pub fn figure(points: PointSet, city: &str, theme: &Theme) -> Figure {
    let trace = ScatterTrace {
        kind: "scatter",
        x: points.x,
        y: points.y,
        text: points.text,
        textposition: "top center",
        mode: "markers+text",
        marker: Marker {
            size: points.size,
            color: points.color,
            colorscale: theme.colorscale.clone(),
            showscale: false,
            line: Line {
                color: theme.marker_line_color.clone(),
                width: theme.marker_line_width,
            },
        },
        hoverinfo: "text",
        hovertext: points.hover,
    };

    let layout = Layout {
        plot_bgcolor: theme.background.clone(),
        paper_bgcolor: theme.background.clone(),
        title: Title {
            text: format!("{}{}", theme.title_prefix, city),
            x: 0.5,
            y: 0.96,
            xanchor: "center",
            yanchor: "top",
            font: Some(Font {
                family: None,
                size: theme.title_size,
                color: theme.title_color.clone(),
            }),
        },
        hovermode: "x",
        xaxis: Axis {
            title: AxisTitle {
                text: "<b>Año</b>".into(),
            },
            tick0: Some(0.0),
            dtick: Some(1.0),
            color: theme.axis_color.clone(),
            showline: true,
            showgrid: false,
            linecolor: theme.axis_line_color.clone(),
            linewidth: Some(1),
        },
        yaxis: Axis {
            title: AxisTitle {
                text: "<b>No. de contratos</b>".into(),
            },
            tick0: None,
            dtick: None,
            color: theme.axis_color.clone(),
            showline: false,
            showgrid: true,
            linecolor: theme.axis_line_color.clone(),
            linewidth: None,
        },
        legend: Legend {
            orientation: "h",
            bgcolor: theme.background.clone(),
            x: 0.5,
            y: 1.25,
            xanchor: "center",
            yanchor: "top",
        },
        font: Font {
            family: Some(theme.font_family.clone()),
            size: theme.font_size,
            color: theme.font_color.clone(),
        },
    };

    Figure {
        data: vec![trace],
        layout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::points::{points, ChartSettings};
    use crate::data::tests::record;
    use serde_json::json;

    #[test]
    fn test_figure_json_shape() {
        let rows = vec![record("ICA_NAL", "Bogotá", "Inv", 2001, 15)];
        let fig = figure(points(&rows, &ChartSettings::default()), "Bogotá", &Theme::default());
        let v = serde_json::to_value(&fig).unwrap();

        let trace = &v["data"][0];
        assert_eq!(trace["type"], "scatter");
        assert_eq!(trace["mode"], "markers+text");
        assert_eq!(trace["x"], json!([2001]));
        assert_eq!(trace["y"], json!([15]));
        assert_eq!(trace["marker"]["size"], json!([1.5]));
        assert_eq!(trace["marker"]["colorscale"], "HSV");
        assert_eq!(trace["marker"]["line"]["color"], "MediumPurple");
        assert_eq!(trace["hoverinfo"], "text");

        let layout = &v["layout"];
        assert_eq!(layout["plot_bgcolor"], "#010915");
        assert_eq!(
            layout["title"]["text"],
            "Contratos (fun: funcionamiento - Inv: Inversión - ND: No Disponible): Bogotá"
        );
        assert_eq!(layout["xaxis"]["dtick"], json!(1.0));
        assert!(layout["yaxis"].get("dtick").is_none());
        assert!(layout["title"]["font"].get("family").is_none());
    }

    #[test]
    fn test_empty_point_set_keeps_one_empty_trace() {
        let fig = figure(PointSet::default(), "Bogotá", &Theme::default());
        assert_eq!(fig.data.len(), 1);
        assert!(fig.data[0].x.is_empty());
        assert!(fig.data[0].hovertext.is_empty());
    }
}
