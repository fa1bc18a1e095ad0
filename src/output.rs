//! Rendering of station records and lookup failures.
//!
//! Supports an aligned, color-coded terminal report and one-JSON-object-per
//! line output.

use std::io::Write;

use tracing::warn;
use unicode_width::UnicodeWidthStr;

use crate::error::LookupFailure;
use crate::record::{Metric, StationRecord};

/// Column the labels are right-justified to.
pub const LABEL_WIDTH: usize = 50;

/// Consumes finished records one at a time. Must not block indefinitely.
pub trait Presenter {
    fn render(&mut self, record: &StationRecord);
}

/// Receives one call per failed lookup.
pub trait ErrorSink {
    fn report(&mut self, failure: &LookupFailure);
}

/// Language of the report labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Chinese,
}

fn station_label(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "Name of the monitoring station",
        Locale::Chinese => "监测站点",
    }
}

fn aqi_label(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "Real-time air quality",
        Locale::Chinese => "实时空气质量",
    }
}

fn time_label(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "UTC time",
        Locale::Chinese => "UTC时间",
    }
}

fn metric_label(metric: Metric, locale: Locale) -> &'static str {
    let (en, zh) = match metric {
        Metric::CarbonMonoxide => ("Carbon Monoxyde", "一氧化碳"),
        Metric::NitrogenDioxide => ("Nitrogen Dioxide", "二氧化氮"),
        Metric::Ozone => ("Ozone", "臭氧"),
        Metric::Pm10 => ("PM10", "PM10"),
        Metric::Pm25 => ("PM2.5", "PM2.5"),
        Metric::SulphurDioxide => ("Sulphur Dioxide", "二氧化硫"),
        Metric::Wind => ("Wind", "气流"),
        Metric::Temperature => ("Temperature", "气温"),
        Metric::Rain => ("Rain (precipitation)", "降水"),
        Metric::Humidity => ("Relative Humidity", "相对湿度"),
        Metric::Dew => ("Dew", "露水"),
        Metric::Pressure => ("Atmostpheric Pressure", "气压"),
    };
    match locale {
        Locale::English => en,
        Locale::Chinese => zh,
    }
}

/// Upper AQI bound and 256-color code for each band; the last band catches
/// everything above.
const AQI_COLOR_CHART: [(f64, u8); 7] = [
    (0.0, 7),
    (50.0, 10),
    (100.0, 11),
    (150.0, 3),
    (200.0, 9),
    (300.0, 5),
    (500.0, 1),
];

/// Terminal color for an aggregate index value.
pub fn aqi_color(aqi: f64) -> u8 {
    AQI_COLOR_CHART[..AQI_COLOR_CHART.len() - 1]
        .iter()
        .find(|(bound, _)| aqi <= *bound)
        .map_or(AQI_COLOR_CHART[AQI_COLOR_CHART.len() - 1].1, |(_, fg)| *fg)
}

/// Left-pads `label` to `width` display columns, counting wide glyphs twice.
fn fill_left(label: &str, width: usize) -> String {
    let pad = width.saturating_sub(label.width());
    format!("{}{}", " ".repeat(pad), label)
}

/// Aligned `label: value` report, one block per record.
pub struct TerminalPresenter<W> {
    out: W,
    locale: Locale,
    color: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, locale: Locale, color: bool) -> Self {
        Self { out, locale, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, fg: u8, text: &str) -> String {
        if self.color {
            format!("\x1b[38;5;{fg}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn block(&self, record: &StationRecord) -> String {
        let fg = aqi_color(record.aqi.as_f64().unwrap_or(0.0));

        let mut rows = vec![
            (station_label(self.locale), record.station.clone()),
            (aqi_label(self.locale), record.aqi.to_string()),
        ];
        rows.extend(
            record
                .readings
                .iter()
                .map(|r| (metric_label(r.metric, self.locale), r.value.to_string())),
        );
        if let Some(time) = &record.time {
            rows.push((time_label(self.locale), time.clone()));
        }

        let mut block = String::new();
        for (label, value) in rows {
            let label = fill_left(label, LABEL_WIDTH);
            block.push_str(&format!(
                "{}: {}\n",
                self.paint(fg, &label),
                self.paint(fg, &value)
            ));
        }
        block.push('\n');
        block
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, record: &StationRecord) {
        let block = self.block(record);
        if let Err(e) = self.out.write_all(block.as_bytes()).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write report");
        }
    }
}

/// Writes each record as a single line of JSON.
pub struct JsonPresenter<W> {
    out: W,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn render(&mut self, record: &StationRecord) {
        let written = serde_json::to_writer(&mut self.out, record)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out));
        if let Err(e) = written {
            warn!(error = %e, "Failed to write record");
        }
    }
}

/// Writes `<program>: <failure>` lines.
pub struct LineSink<W> {
    program: String,
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(program: impl Into<String>, out: W) -> Self {
        Self {
            program: program.into(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ErrorSink for LineSink<W> {
    fn report(&mut self, failure: &LookupFailure) {
        if let Err(e) = writeln!(self.out, "{}: {}", self.program, failure) {
            warn!(error = %e, "Failed to write diagnostic");
        }
    }
}
