use crate::{
    cli::commands::FetchArgs, config::FeedConfig, errors::Error, models::metric::MetricSpec,
};

/// Resolves a comma-separated metric list against the configured specs.
///
/// Names already configured keep their presentation; new names get a bare
/// [`MetricSpec::named`]. Blank entries are skipped.
pub fn select_metrics(raw: &str, configured: &[MetricSpec]) -> Result<Vec<MetricSpec>, Error> {
    let selected: Vec<MetricSpec> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            configured
                .iter()
                .find(|spec| spec.name == name)
                .cloned()
                .unwrap_or_else(|| MetricSpec::named(name))
        })
        .collect();

    if selected.is_empty() {
        return Err(Error::Config(format!("no metric names in {raw:?}")));
    }
    Ok(selected)
}

/// Layers `fetch` flags over an already loaded config.
pub fn apply_fetch_args(config: &mut FeedConfig, args: &FetchArgs) -> Result<(), Error> {
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(metrics) = &args.metrics {
        config.metrics = select_metrics(metrics, &config.metrics)?;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.retry.max_attempts = max_attempts;
    }
    if let Some(base_delay_ms) = args.base_delay_ms {
        config.retry.base_delay_ms = base_delay_ms;
    }
    if let Some(max_delay_ms) = args.max_delay_ms {
        config.retry.max_delay_ms = max_delay_ms;
    }
    if args.reference_date.is_some() {
        config.reference_date = args.reference_date;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::metric::AxisSide;

    #[test]
    fn known_metrics_keep_their_presentation() {
        let configured = FeedConfig::default().metrics;
        let selected = select_metrics(" humidity , battery,", &configured).unwrap();

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0], MetricSpec::humidity());
        assert_eq!(selected[1], MetricSpec::named("battery"));
        assert_eq!(selected[1].axis, AxisSide::Left);
    }

    #[test]
    fn empty_metric_list_is_rejected() {
        assert!(matches!(select_metrics(" , ", &[]), Err(Error::Config(_))));
    }

    #[test]
    fn flags_override_config() {
        let mut config = FeedConfig::default();
        let args = FetchArgs {
            endpoint: Some("http://10.0.0.5:8000/api/information/".into()),
            metrics: Some("temperature".into()),
            max_attempts: Some(1),
            reference_date: NaiveDate::from_ymd_opt(2025, 10, 23),
            ..FetchArgs::default()
        };

        apply_fetch_args(&mut config, &args).unwrap();

        assert_eq!(config.endpoint, "http://10.0.0.5:8000/api/information/");
        assert_eq!(config.metrics, vec![MetricSpec::temperature()]);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.base_delay_ms, 1_000);
        assert_eq!(config.reference_date, NaiveDate::from_ymd_opt(2025, 10, 23));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn absent_flags_change_nothing() {
        let mut config = FeedConfig::default();
        apply_fetch_args(&mut config, &FetchArgs::default()).unwrap();
        assert_eq!(config, FeedConfig::default());
    }
}
