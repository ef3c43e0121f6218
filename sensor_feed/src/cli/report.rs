use chrono::SecondsFormat;

use crate::{
    chart::build_datasets,
    cli::commands::OutputFormat,
    models::{metric::MetricSpec, point::Series, state::View},
};

/// One line per series: label, unit, point count and covered time range.
pub fn summary_lines(series: &[Series], specs: &[MetricSpec]) -> Vec<String> {
    series
        .iter()
        .map(|s| {
            let spec = specs.iter().find(|spec| spec.name == s.metric());
            let label = spec.map_or(s.metric(), MetricSpec::label);
            let unit = spec
                .and_then(|spec| spec.unit.as_deref())
                .map(|unit| format!(" [{unit}]"))
                .unwrap_or_default();
            let range = s
                .time_range()
                .map(|(first, last)| {
                    format!(
                        "{} .. {}",
                        first.to_rfc3339_opts(SecondsFormat::Secs, true),
                        last.to_rfc3339_opts(SecondsFormat::Secs, true)
                    )
                })
                .unwrap_or_default();
            format!("{label}{unit}: {} points, {range}", s.len())
        })
        .collect()
}

/// Renders what the terminal should show for a settled cycle.
///
/// `Ok(text)` goes to stdout for a chart and to stderr for everything else.
pub fn render(
    view: &View<'_>,
    specs: &[MetricSpec],
    format: OutputFormat,
) -> Result<String, serde_json::Error> {
    let text = match (view, format) {
        (View::Chart { series }, OutputFormat::Summary) => summary_lines(series, specs).join("\n"),
        (View::Chart { series }, OutputFormat::Json) => {
            serde_json::to_string_pretty(&build_datasets(series, specs))?
        }
        (View::NoData, _) => "Connected, but no data points were returned.".to_string(),
        (View::ConnectionFailed { message }, _) => format!("Error: {message}"),
        (View::Spinner { attempt }, _) => format!("Loading (attempt {})...", attempt + 1),
        (View::Placeholder, _) => "No data fetched yet.".to_string(),
    };
    Ok(text)
}
