//! Slicer statistics
//!
//! PrusaSlicer and friends leave a summary in trailing comments. The
//! interesting ones are copied into the header of the generated program.

use std::fmt;
use std::io::BufRead;

use regex::Regex;

/// Values scraped from the source comments; `None` when absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrintStats {
    pub estimated_printing_time: Option<String>,
    pub total_filament_cost: Option<f64>,
    /// grams
    pub total_filament_used: Option<f64>,
}

/// Compiled patterns for [`PrintStats`]
#[derive(Debug, Clone)]
pub struct StatsScraper {
    time: Regex,
    cost: Regex,
    used: Regex,
}

impl StatsScraper {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            time: Regex::new(r";\s*estimated printing time \(normal mode\)\s*=\s*(.*)")?,
            cost: Regex::new(r";\s*total filament cost\s*=\s*(\d+\.?\d*)")?,
            used: Regex::new(r";\s*total filament used \[g\]\s*=\s*(\d+\.?\d*)")?,
        })
    }

    /// Fold one line into `stats`. Later lines override earlier ones.
    pub fn scan_line(&self, line: &str, stats: &mut PrintStats) {
        if let Some(captures) = self.time.captures(line) {
            if let Some(value) = captures.get(1) {
                stats.estimated_printing_time = Some(value.as_str().trim().to_string());
            }
        }
        if let Some(value) = number(&self.cost, line) {
            stats.total_filament_cost = Some(value);
        }
        if let Some(value) = number(&self.used, line) {
            stats.total_filament_used = Some(value);
        }
    }

    pub fn scrape(&self, text: &str) -> PrintStats {
        let mut stats = PrintStats::default();
        for line in text.lines() {
            self.scan_line(line, &mut stats);
        }
        stats
    }

    pub fn scrape_reader<R: BufRead>(&self, reader: R) -> std::io::Result<PrintStats> {
        let mut stats = PrintStats::default();
        for line in reader.lines() {
            self.scan_line(&line?, &mut stats);
        }
        Ok(stats)
    }
}

fn number(pattern: &Regex, line: &str) -> Option<f64> {
    pattern.captures(line)?.get(1)?.as_str().parse().ok()
}

/// Display helper printing `None` for missing values
pub struct OrNone<'a, T>(pub &'a Option<T>);

impl<T: fmt::Display> fmt::Display for OrNone<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = "\
G1 X10 Y10 E2
; filament used [mm] = 1234.5
; total filament used [g] = 12.34
; total filament cost = 0.87
; estimated printing time (normal mode) = 1h 2m 3s
";

    #[test]
    fn scrapes_slicer_summary() {
        let stats = StatsScraper::new().unwrap().scrape(FOOTER);

        assert_eq!(stats.estimated_printing_time.as_deref(), Some("1h 2m 3s"));
        assert_eq!(stats.total_filament_cost, Some(0.87));
        assert_eq!(stats.total_filament_used, Some(12.34));
    }

    #[test]
    fn missing_values_stay_none() {
        let stats = StatsScraper::new().unwrap().scrape("G1 X1\n; nothing here\n");
        assert_eq!(stats, PrintStats::default());
        assert_eq!(OrNone(&stats.total_filament_cost).to_string(), "None");
    }

    #[test]
    fn last_occurrence_wins() {
        let scraper = StatsScraper::new().unwrap();
        let stats = scraper
            .scrape_reader("; total filament cost = 1\n; total filament cost = 2.5\n".as_bytes())
            .unwrap();
        assert_eq!(stats.total_filament_cost, Some(2.5));
    }
}
