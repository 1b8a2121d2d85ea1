use std::path::Path;

use versionplot::plot::{chart_paths, parse_cli, plot_counts, PlotConfig};
use versionplot::workbook::XlsFleetBook;
use versionplot::{load_counts, MAJOR_V1, MAJOR_V2, MC_CAPABLE, NON_MC_CAPABLE};

/// Versions called out with heavy lines, legend entries and markers.
const HIGHLIGHT_VERSIONS: [&str; 14] = [
    MAJOR_V1,
    MAJOR_V2,
    "2.15.1",
    "2.13.6",
    "2.12.7",
    "2.12.6",
    "2.12.5",
    "2.12.3",
    "2.9.7",
    "2.7.5",
    "2.3.0",
    "2.2.0",
    MC_CAPABLE,
    NON_MC_CAPABLE,
];

fn main() {
    let (xlsin, outdir) = parse_cli();
    println!(
        "read fleet scores from {} and plot to {}",
        xlsin.display(),
        outdir.display()
    );
    if let Err(e) = run(&xlsin, &outdir) {
        eprintln!("versionplot: {}", e);
        std::process::exit(1);
    }
}

fn run(xlsin: &Path, outdir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut book = XlsFleetBook::open(xlsin)?;
    let counts = load_counts(&mut book)?;
    println!("aggregated {} series over the date sheets", counts.len());
    let config = PlotConfig::new(&HIGHLIGHT_VERSIONS);
    let paths = chart_paths(xlsin, outdir);
    plot_counts(&counts, &config, &paths)?;
    for path in &paths {
        println!("wrote {}", path.display());
    }
    Ok(())
}
