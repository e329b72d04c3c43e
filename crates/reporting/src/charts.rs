//! Plotly chart pages.
//!
//! Figures are plain Plotly JSON specs rendered client-side; pages load
//! plotly.js from the CDN and embed the spec inline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tradeagg_core::{ClientRanking, Result, WeeklyAggregate};
use tracing::debug;

/// plotly.js bundle referenced by every page.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// A single Plotly figure.
#[derive(Debug, Clone)]
pub struct Figure {
    title: String,
    traces: Vec<Value>,
    layout: Value,
}

impl Figure {
    fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            layout: json!({ "title": { "text": title } }),
            title,
            traces: Vec::new(),
        }
    }

    /// Vertical bars, one per label.
    pub fn bar(title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Self {
        let mut fig = Self::new(title);
        fig.traces.push(json!({ "type": "bar", "x": labels, "y": values }));
        fig
    }

    /// Horizontal bars, largest on top.
    pub fn horizontal_bar(title: impl Into<String>, labels: Vec<String>, values: Vec<f64>) -> Self {
        let mut fig = Self::new(title);
        fig.traces.push(json!({
            "type": "bar",
            "orientation": "h",
            "x": values,
            "y": labels,
        }));
        fig.layout["yaxis"] = json!({ "categoryorder": "total ascending", "type": "category" });
        fig
    }

    /// One line with markers per series, x values are dates.
    pub fn lines(title: impl Into<String>, series: &BTreeMap<String, BTreeMap<NaiveDate, f64>>) -> Self {
        let mut fig = Self::new(title);
        for (name, points) in series {
            let x: Vec<String> = points.keys().map(|d| d.to_string()).collect();
            let y: Vec<f64> = points.values().copied().collect();
            fig.traces.push(json!({
                "type": "scatter",
                "mode": "lines+markers",
                "name": name,
                "x": x,
                "y": y,
            }));
        }
        fig
    }

    /// Label both axes.
    pub fn with_axis_titles(mut self, x: &str, y: &str) -> Self {
        self.layout["xaxis"]["title"] = json!({ "text": x });
        self.layout["yaxis"]["title"] = json!({ "text": y });
        self
    }

    /// Figure title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of traces.
    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Plotly `{data, layout}` spec.
    pub fn to_json(&self) -> Value {
        json!({ "data": self.traces, "layout": self.layout })
    }

    /// `<div>` plus inline script; the page must load [`PLOTLY_CDN`].
    pub fn to_html_fragment(&self, div_id: &str) -> String {
        // "</" inside a script block would close it early.
        let spec = self.to_json().to_string().replace("</", "<\\/");
        format!(
            "<div id=\"{id}\" style=\"width:100%;height:480px;\"></div>\n\
             <script>(function(){{var f={spec};Plotly.newPlot(\"{id}\",f.data,f.layout,{{responsive:true}});}})();</script>",
            id = escape_html(div_id),
        )
    }

    /// A complete standalone page.
    pub fn to_html_page(&self) -> String {
        format!(
            "<html><head><meta charset='utf-8'><title>{title}</title>\
             <script src=\"{PLOTLY_CDN}\"></script></head><body>\n{body}\n</body></html>\n",
            title = escape_html(&self.title),
            body = self.to_html_fragment("figure"),
        )
    }

    /// Write [`Self::to_html_page`] to `path`, creating parent directories.
    pub fn write_html(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_html_page())?;
        debug!(
            path = %path.display(),
            title = self.title(),
            traces = self.trace_count(),
            "wrote chart page"
        );
        Ok(())
    }
}

/// Minimal escaping for text placed in HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Weekly total volume per client type.
pub fn weekly_volume_figure(aggs: &[WeeklyAggregate]) -> Figure {
    let mut series: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for agg in aggs {
        *series
            .entry(agg.client_type.clone())
            .or_default()
            .entry(agg.week_start_date)
            .or_insert(0.0) += agg.total_volume;
    }
    Figure::lines("Weekly Total Volume by Client Type", &series)
        .with_axis_titles("week_start_date", "total_volume")
}

/// Ranking as horizontal bars.
pub fn top_clients_figure(rows: &[ClientRanking], client_type: &str) -> Figure {
    let title = format!("Top-{} {} Clients by Total Volume", rows.len(), capitalize(client_type));
    Figure::horizontal_bar(
        title,
        rows.iter().map(|r| r.user_id.clone()).collect(),
        rows.iter().map(|r| r.total_volume).collect(),
    )
    .with_axis_titles("Total Volume", "user_id")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
