use anyhow::{Context, Result, bail};
use clap::Parser;

use zone_scout::utils::time_utils::epoch_ms_to_utc;
use zone_scout::{Candle, CandleSeries, Cli, NoPatternMemory, Timeframe, ZONES, ZoneBuilder};

fn main() -> Result<()> {
    // A. Init Logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    if args.inputs.is_empty() {
        bail!("no candle inputs; pass at least one --input TF=PATH");
    }

    // C. Load candles per timeframe
    let mut series_by_timeframe = Vec::with_capacity(args.inputs.len());
    for spec in &args.inputs {
        let (timeframe, path) = parse_input_spec(spec)?;
        let candles = read_candles(path)?;
        let series = CandleSeries::from_candles(Some(timeframe), &candles);
        match (series.timestamps_ms.first(), series.last_timestamp_ms()) {
            (Some(&first), Some(last)) => log::info!(
                "loaded {} candles for {} from {} ({} .. {} UTC)",
                series.len(),
                timeframe,
                path,
                epoch_ms_to_utc(first),
                epoch_ms_to_utc(last)
            ),
            _ => log::warn!("no usable candles for {} in {}", timeframe, path),
        }
        series_by_timeframe.push(series);
    }

    // D. Run the pipeline
    let mut config = ZONES.clone();
    config.top_n = args.top.or(config.top_n);

    let mut builder = ZoneBuilder::new(config)?;
    if let Some(path) = &args.volume {
        let candles = read_candles(path)?;
        log::info!("loaded {} candles for the volume profile from {}", candles.len(), path);
        builder = builder.with_volume_series(CandleSeries::from_candles(None, &candles));
    }

    let report = builder.build(&series_by_timeframe, &NoPatternMemory);
    log::info!(
        "{} merged zone(s) across {} timeframe(s)",
        report.merged.len(),
        report.per_timeframe.len()
    );

    // E. Emit the report
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}

fn parse_input_spec(spec: &str) -> Result<(Timeframe, &str)> {
    let (label, path) = spec
        .split_once('=')
        .with_context(|| format!("input '{spec}' is not of the form TF=PATH"))?;
    let timeframe = Timeframe::from_label(label)
        .with_context(|| format!("unknown timeframe label '{label}' in input '{spec}'"))?;
    Ok((timeframe, path))
}

fn read_candles(path: &str) -> Result<Vec<Candle>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read candle file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse candles in {path}"))
}
