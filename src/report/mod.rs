//! Output artefacts built from an analysis: Markdown brief, daily CSV and SVG charts.

mod charts;
mod export;
mod markdown;

pub use charts::{plot_rolling, plot_timeseries};
pub use export::write_daily_csv;
pub use markdown::{fmt_number, render_markdown, trend_label, BriefContext};
