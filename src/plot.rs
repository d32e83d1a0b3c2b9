/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Scatter plots of timing logs.

use anyhow::{Context, Result, anyhow, ensure};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::timing_log::TimingLog;

/// The default size of the images, in pixels.
pub const DEFAULT_SIZE: (u32, u32) = (1024, 768);

const TIME_DESC: &str = "time(s)";

/// Image formats for plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ImageFormat {
    /// Portable Network Graphics.
    #[default]
    Png,
    /// Scalable Vector Graphics.
    Svg,
}

impl ImageFormat {
    /// The file extension of the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}

/// The quantity on the horizontal axis of a scatter plot; the vertical
/// axis is always the elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abscissa {
    /// Number of nodes.
    Nodes,
    /// Number of edges.
    Edges,
    /// Number of nodes plus number of edges.
    Model,
}

impl Abscissa {
    /// All abscissae, in the order in which plots are rendered.
    pub const ALL: [Abscissa; 3] = [Abscissa::Nodes, Abscissa::Edges, Abscissa::Model];

    /// The stem of the image file.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Abscissa::Nodes => "time_vs_nodes",
            Abscissa::Edges => "time_vs_edges",
            Abscissa::Model => "time_vs_model",
        }
    }

    /// The description of the horizontal axis.
    pub fn x_desc(&self) -> &'static str {
        match self {
            Abscissa::Nodes => "number of nodes",
            Abscissa::Edges => "number of edges",
            Abscissa::Model => "number of nodes + number of edges",
        }
    }

    /// The chart caption, if any.
    pub fn caption(&self) -> Option<&'static str> {
        match self {
            Abscissa::Nodes => None,
            Abscissa::Edges => Some("time(s) x #edges"),
            Abscissa::Model => Some("time(s) x #nodes+#edges"),
        }
    }

    /// Returns the `(x, time)` points of this scatter plot.
    pub fn points(&self, log: &TimingLog) -> Vec<(f64, f64)> {
        let xs = match self {
            Abscissa::Nodes => log.nodes(),
            Abscissa::Edges => log.edges(),
            Abscissa::Model => log.model(),
        };
        xs.iter().zip(log.eff()).map(|(&x, &y)| (x as f64, y)).collect()
    }
}

/// Returns a range containing all values, enlarged by 5% on each side.
///
/// Degenerate ranges (a single value, or all values equal) are widened so
/// that the point ends up in the middle of the axis.
pub fn axis_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });
    if min > max {
        return 0.0..1.0;
    }
    let pad = if max > min {
        (max - min) * 0.05
    } else if min != 0.0 {
        min.abs() * 0.5
    } else {
        1.0
    };
    (min - pad)..(max + pad)
}

fn draw_scatter<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    abscissa: Abscissa,
    points: &[(f64, f64)],
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let x_range = axis_range(points.iter().map(|&(x, _)| x));
    let y_range = axis_range(points.iter().map(|&(_, y)| y));

    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(20)
        .set_label_area_size(LabelAreaPosition::Left, 80)
        .set_label_area_size(LabelAreaPosition::Bottom, 60);
    if let Some(caption) = abscissa.caption() {
        builder.caption(caption, ("sans-serif", 30));
    }
    let mut chart = builder.build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc(abscissa.x_desc())
        .y_desc(TIME_DESC)
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&point| Circle::new(point, 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Renders a scatter plot of the elapsed times of `log` against `abscissa`
/// into `path`.
pub fn render_scatter(
    path: impl AsRef<Path>,
    format: ImageFormat,
    size: (u32, u32),
    log: &TimingLog,
    abscissa: Abscissa,
) -> Result<()> {
    let path = path.as_ref();
    let points = abscissa.points(log);
    let result = match format {
        ImageFormat::Png => {
            draw_scatter(BitMapBackend::new(path, size).into_drawing_area(), abscissa, &points)
        }
        ImageFormat::Svg => {
            draw_scatter(SVGBackend::new(path, size).into_drawing_area(), abscissa, &points)
        }
    };
    result.map_err(|e| anyhow!("Could not draw {}: {}", path.display(), e))
}

/// Renders the three scatter plots of `log` into `out_dir`, returning the
/// paths of the images.
///
/// # Errors
///
/// If the log is empty, or if an image cannot be drawn.
pub fn render_scatters(
    out_dir: impl AsRef<Path>,
    format: ImageFormat,
    size: (u32, u32),
    log: &TimingLog,
) -> Result<Vec<PathBuf>> {
    ensure!(!log.is_empty(), "The timing log contains no complete record");
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create the directory {}", out_dir.display()))?;

    let mut paths = Vec::with_capacity(Abscissa::ALL.len());
    for abscissa in Abscissa::ALL {
        let path = out_dir
            .join(abscissa.file_stem())
            .with_extension(format.extension());
        log::info!("Plotting {} against time to {}", abscissa.x_desc(), path.display());
        render_scatter(&path, format, size, log, abscissa)?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points() -> Result<()> {
        let log = TimingLog::parse("a_b_100_d_4\n2.5\nx\ny\na_b_10_d_3\n0.5\nx\ny\n")?;
        assert_eq!(Abscissa::Nodes.points(&log), vec![(100.0, 2.5), (10.0, 0.5)]);
        assert_eq!(Abscissa::Edges.points(&log), vec![(200.0, 2.5), (15.0, 0.5)]);
        assert_eq!(Abscissa::Model.points(&log), vec![(300.0, 2.5), (25.0, 0.5)]);
        Ok(())
    }

    #[test]
    fn test_labels() {
        assert_eq!(Abscissa::Nodes.caption(), None);
        assert_eq!(Abscissa::Edges.caption(), Some("time(s) x #edges"));
        assert_eq!(Abscissa::Model.x_desc(), "number of nodes + number of edges");
    }

    #[test]
    fn test_axis_range() {
        let range = axis_range([0.0, 10.0]);
        assert!((range.start + 0.5).abs() < 1e-9);
        assert!((range.end - 10.5).abs() < 1e-9);

        let range = axis_range([4.0]);
        assert!(range.start < 4.0 && range.end > 4.0);
        assert!((range.start + range.end - 8.0).abs() < 1e-9);

        assert_eq!(axis_range([0.0, 0.0]), -1.0..1.0);
        assert_eq!(axis_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(axis_range([f64::NAN]), 0.0..1.0);
    }

    #[test]
    fn test_render_svg() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let out_dir = dir.path().join("plots");
        let log = TimingLog::parse("a_b_100_d_4\n2.5\nx\ny\na_b_10_d_3\n0.5\nx\ny\n")?;
        let paths = render_scatters(&out_dir, ImageFormat::Svg, DEFAULT_SIZE, &log)?;
        assert_eq!(
            paths,
            vec![
                out_dir.join("time_vs_nodes.svg"),
                out_dir.join("time_vs_edges.svg"),
                out_dir.join("time_vs_model.svg"),
            ]
        );

        let nodes = std::fs::read_to_string(&paths[0])?;
        assert!(nodes.contains("number of nodes"));
        assert!(nodes.contains(TIME_DESC));
        assert!(!nodes.contains("time(s) x #"));

        let edges = std::fs::read_to_string(&paths[1])?;
        assert!(edges.contains("time(s) x #edges"));
        assert!(edges.contains("number of edges"));

        let model = std::fs::read_to_string(&paths[2])?;
        assert!(model.contains("time(s) x #nodes+#edges"));
        assert!(model.contains("number of nodes + number of edges"));
        Ok(())
    }

    #[test]
    fn test_render_png() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = TimingLog::parse("a_b_100_d_4\n2.5\nx\ny\n")?;
        let paths = render_scatters(dir.path(), ImageFormat::Png, (320, 240), &log)?;
        assert_eq!(paths.len(), 3);
        for path in paths {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
            // PNG signature
            assert_eq!(&std::fs::read(&path)?[..4], b"\x89PNG");
        }
        Ok(())
    }

    #[test]
    fn test_empty_log() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let log = TimingLog::parse("a_b_10_d_2\n0.5\n")?;
        let err = render_scatters(dir.path(), ImageFormat::Svg, DEFAULT_SIZE, &log).unwrap_err();
        assert!(err.to_string().contains("no complete record"));
        assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
        Ok(())
    }
}
