//! The declarative chart option consumed by an ECharts-compatible widget. Only the parts of the
//! option vocabulary that the dashboard uses are modelled; absent fields are not serialized.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOption {
    pub title: Title,
    pub tooltip: Tooltip,
    pub legend: Legend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<Axis>,
    pub series: Vec<Series>,
    /// A fixed palette; series take colors from it by position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    #[default]
    Item,
    Axis,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub trigger: Trigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Legend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,
    /// Which series are initially visible, keyed by series name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<BTreeMap<String, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisType {
    Category,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AxisData {
    Labels(Vec<String>),
    Numbers(Vec<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_gap: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AxisData>,
}

impl Axis {
    pub fn value() -> Self {
        Self {
            axis_type: AxisType::Value,
            boundary_gap: None,
            data: None,
        }
    }

    pub fn category(data: AxisData) -> Self {
        Self {
            axis_type: AxisType::Category,
            boundary_gap: None,
            data: Some(data),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesType {
    Pie,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesData {
    Slices(Vec<PieSlice>),
    Values(Vec<f64>),
    Points(Vec<(u32, f64)>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Slices(v) => v.len(),
            SeriesData::Values(v) => v.len(),
            SeriesData::Points(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    pub shadow_blur: u32,
    pub shadow_offset_x: u32,
    pub shadow_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Emphasis {
    pub item_style: ItemStyle,
}

/// An empty `areaStyle` object switches a line series to an area chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaStyle {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_style: Option<AreaStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emphasis: Option<Emphasis>,
    pub data: SeriesData,
}

impl Series {
    pub fn line(name: impl Into<String>, data: SeriesData) -> Self {
        Self {
            name: name.into(),
            series_type: SeriesType::Line,
            radius: None,
            area_style: None,
            emphasis: None,
            data,
        }
    }
}
