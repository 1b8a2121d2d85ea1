use super::VERSION;
use chrono::prelude::*;
use clap::{App, Arg};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{
    min_and_max, TimeCounts, VersionCounts, MAJOR_V1, MAJOR_V2, MC_CAPABLE, NON_MC_CAPABLE,
};

/// Captions of the three charts, in output order.
pub const CHART_TITLES: [&str; 3] = [
    "Device count in a rolling 28-day window by OS version",
    "Device count in a rolling 28-day window by major OS version",
    "Device count in a rolling 28-day window by multicontainer capability",
];

/// Takes the CLI arguments that control the loading and plotting of the
/// fleet score spreadsheet.
pub fn parse_cli() -> (PathBuf, PathBuf) {
    let arg_xlsin = Arg::with_name("fleetscore_file")
        .help("xls spreadsheet with the fleet score sheets")
        .required(true)
        .index(1);
    let arg_outdir = Arg::with_name("output_directory")
        .help("directory for the svg files, defaults to the spreadsheet directory")
        .short("o")
        .long("outdir")
        .takes_value(true);
    let cli_args = App::new("versionplot")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot OS version distribution time series")
        .arg(arg_xlsin)
        .arg(arg_outdir)
        .get_matches();
    let xlsin = PathBuf::from(cli_args.value_of("fleetscore_file").unwrap_or_default());
    let outdir = match cli_args.value_of("output_directory") {
        Some(p) => PathBuf::from(p),
        None => xlsin.parent().map(PathBuf::from).unwrap_or_default(),
    };
    return (xlsin, outdir);
}

/// Output paths of the three charts, named after the spreadsheet stem.
pub fn chart_paths(xlsin: &Path, outdir: &Path) -> [PathBuf; 3] {
    let stem = xlsin
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fleetscores".to_string());
    [
        outdir.join(format!("{}_by_version.svg", stem)),
        outdir.join(format!("{}_by_major_version.svg", stem)),
        outdir.join(format!("{}_by_mc_capability.svg", stem)),
    ]
}

/// Point markers drawn on top of highlighted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    None,
    Circle,
    Triangle,
    Cross,
}

const MARKER_CYCLE: [Marker; 4] = [Marker::None, Marker::Circle, Marker::Triangle, Marker::Cross];

/// Which series get the heavy labeled style, and the marker cycle
/// handed out to them.
pub struct PlotConfig {
    pub highlights: Vec<String>,
    pub markers: Vec<Marker>,
}

impl PlotConfig {
    pub fn new(highlights: &[&str]) -> PlotConfig {
        PlotConfig {
            highlights: highlights.iter().map(|s| s.to_string()).collect(),
            markers: MARKER_CYCLE.to_vec(),
        }
    }

    fn is_highlight(&self, key: &str) -> bool {
        self.highlights.iter().any(|h| h == key)
    }
}

/// Walks the mapping once and hands the next marker in the cycle to each
/// highlighted key, so a key keeps its marker across all three charts.
pub fn assign_markers(counts: &VersionCounts, config: &PlotConfig) -> HashMap<String, Marker> {
    let mut assigned = HashMap::new();
    if config.markers.is_empty() {
        return assigned;
    }
    let mut next = 0;
    for (key, _) in counts.iter() {
        if config.is_highlight(key) {
            assigned.insert(key.to_string(), config.markers[next % config.markers.len()]);
            next += 1;
        }
    }
    assigned
}

/// Renders the three charts: per OS version, by major version and by
/// multicontainer capability. All share the x range of the full series.
pub fn plot_counts(
    counts: &VersionCounts,
    config: &PlotConfig,
    paths: &[PathBuf; 3],
) -> Result<(), Box<dyn std::error::Error>> {
    let template = match counts.iter().next() {
        Some((_, series)) if !series.is_empty() => series,
        _ => return Err("no series to plot".into()),
    };
    let (xmin, xmax) = min_and_max(&template.time[..]);
    let xmax = if xmin == xmax {
        xmax + chrono::Duration::days(1)
    } else {
        xmax
    };
    let markers = assign_markers(counts, config);

    let mut by_version: Vec<(&str, &TimeCounts)> = Vec::new();
    let mut by_major: Vec<(&str, &TimeCounts)> = Vec::new();
    let mut by_capability: Vec<(&str, &TimeCounts)> = Vec::new();
    for (key, series) in counts.iter() {
        if key == MAJOR_V1 || key == MAJOR_V2 {
            by_major.push((key, series));
        } else if key == MC_CAPABLE || key == NON_MC_CAPABLE {
            by_capability.push((key, series));
        } else {
            by_version.push((key, series));
        }
    }

    let groups = [by_version, by_major, by_capability];
    for ((path, title), group) in paths.iter().zip(CHART_TITLES.iter()).zip(groups.iter()) {
        draw_chart(path, title, group, (xmin, xmax), config, &markers)?;
    }
    Ok(())
}

/// Draws one chart to svg: highlighted series as heavy solid lines with
/// legend entries and markers, the rest as thin unlabeled dashes.
fn draw_chart(
    path: &Path,
    title: &str,
    series: &[(&str, &TimeCounts)],
    xspan: (NaiveDate, NaiveDate),
    config: &PlotConfig,
    markers: &HashMap<String, Marker>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (xmin, xmax) = xspan;
    let ymax = series.iter().fold(0, |m, (_, s)| m.max(s.max_count()));
    let ymax = ymax + ymax / 20 + 1;
    let root = SVGBackend::new(path, (1800, 1200)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(title, ("sans-serif", 40))
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d((xmin..xmax).monthly(), 0i64..ymax)?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(2))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 24))
        .y_desc("Count")
        .x_label_formatter(&|x: &NaiveDate| x.format("%Y %b").to_string())
        .draw()?;

    let mut labeled = false;
    for (idx, &(key, counts)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        let points: Vec<(NaiveDate, i64)> = counts
            .time
            .iter()
            .zip(counts.count.iter())
            .map(|(&t, &n)| (t, n))
            .collect();
        if config.is_highlight(key) {
            chart
                .draw_series(LineSeries::new(
                    points.iter().copied(),
                    color.stroke_width(3),
                ))?
                .label(key)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3))
                });
            labeled = true;
            match markers.get(key).copied().unwrap_or(Marker::None) {
                Marker::None => {}
                Marker::Circle => {
                    chart.draw_series(
                        points.iter().map(|&c| Circle::new(c, 4, color.filled())),
                    )?;
                }
                Marker::Triangle => {
                    chart.draw_series(
                        points.iter().map(|&c| TriangleMarker::new(c, 5, color.filled())),
                    )?;
                }
                Marker::Cross => {
                    chart.draw_series(
                        points.iter().map(|&c| Cross::new(c, 4, color.stroke_width(2))),
                    )?;
                }
            }
        } else {
            chart.draw_series(DashedLineSeries::new(
                points.iter().copied(),
                6,
                4,
                color.stroke_width(1),
            ))?;
        }
    }
    if labeled {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .label_font(("sans-serif", 24))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()?;
    }
    root.present()?;
    Ok(())
}
