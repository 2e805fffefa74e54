// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, path::Path};

use anyhow::Result;
use serde::Deserialize;

/// Breakpoints sorted ascending; a coverage value takes the color of the greatest breakpoint not above it.
const BADGE_COLORS: [(f64, &str); 3] = [(0.0, "red"), (50.0, "#dfb317"), (90.0, "green")];

/// The subset of an istanbul `coverage-summary.json` that the badge needs.
#[derive(Debug, Deserialize)]
pub struct CoverageSummary {
    pub total: CoverageTotals,
}

#[derive(Debug, Deserialize)]
pub struct CoverageTotals {
    pub lines: CoverageMetric,
}

#[derive(Debug, Deserialize)]
pub struct CoverageMetric {
    pub pct: f64,
}

impl CoverageSummary {
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    #[must_use]
    pub fn total_line_coverage(&self) -> f64 {
        self.total.lines.pct
    }
}

/// Values below the lowest breakpoint (including NaN) take the lowest color.
#[must_use]
pub fn badge_color(coverage: f64) -> &'static str {
    let at_or_below = BADGE_COLORS.partition_point(|(breakpoint, _)| *breakpoint <= coverage);
    BADGE_COLORS[at_or_below.saturating_sub(1)].1
}

#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_coverage(coverage: f64) -> String {
    format!("{}%", coverage.trunc() as i64)
}

#[must_use]
pub fn render_badge(coverage: f64) -> String {
    let color = badge_color(coverage);
    let coverage = format_coverage(coverage);
    format!(
        r##"
<svg xmlns="http://www.w3.org/2000/svg"
     xmlns:xlink="http://www.w3.org/1999/xlink"
     width="96" height="20" role="img"
     aria-label="coverage: {coverage}">
  <title>coverage: {coverage}
  </title>
  <linearGradient id="s" x2="0" y2="100%">
    <stop offset="0" stop-color="#bbb" stop-opacity=".1"/>
    <stop offset="1" stop-opacity=".1"/>
  </linearGradient>
  <clipPath id="r">
    <rect width="96" height="20" rx="3" fill="#fff"/>
  </clipPath>
  <g clip-path="url(#r)">
    <rect width="61" height="20" fill="#555"/>
    <rect x="61" width="35" height="20" fill="{color}"/>
    <rect width="96" height="20" fill="url(#s)"/>
  </g>
  <g fill="#fff" text-anchor="middle" font-family="Verdana,Geneva,DejaVu Sans,sans-serif" text-rendering="geometricPrecision" font-size="110">
    <text aria-hidden="true" x="315" y="150" fill="#010101" fill-opacity=".3" transform="scale(.1)" textLength="510">coverage
    </text>
    <text x="315" y="140" transform="scale(.1)" fill="#fff" textLength="510">coverage
    </text>
    <text aria-hidden="true" x="775" y="150" fill="#010101" fill-opacity=".3" transform="scale(.1)" textLength="250">{coverage}
    </text>
    <text x="775" y="140" transform="scale(.1)" fill="#fff" textLength="250">{coverage}
    </text>
  </g>
</svg>
"##
    )
}
