use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::Panel;
use crate::session::Report;

/// Write a panel as CSV: `period,<country>...`, empty cell for missing.
pub fn write_panel_csv(path: &Path, panel: &Panel) -> Result<()> {
    let file = std::fs::File::create(path).context("creating CSV file")?;
    write_panel(file, panel)?;
    log::info!("Exported {} to {}", panel.indicator(), path.display());
    Ok(())
}

fn write_panel<W: Write>(out: W, panel: &Panel) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["period".to_string()];
    header.extend(panel.countries().iter().cloned());
    writer.write_record(&header).context("writing CSV header")?;

    for (row, period) in panel.periods().iter().enumerate() {
        let mut record = vec![period.to_string()];
        record.extend(
            panel
                .row(row)
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row for {period}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

/// Write a whole report (analyses and notices) as pretty JSON.
pub fn write_report_json(path: &Path, report: &Report) -> Result<()> {
    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(file, report).context("serializing report")?;
    log::info!(
        "Exported report with {} analyses to {}",
        report.analyses.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;

    fn panel() -> Panel {
        Panel::from_columns(
            "FP.CPI.TOTL.ZG",
            vec!["2022".into(), "2021".into()],
            vec![
                ("DEU".into(), vec![Some(6.9), None]),
                ("FRA".into(), vec![Some(5.2), Some(1.6)]),
            ],
        )
    }

    #[test]
    fn panel_csv_leaves_missing_cells_empty() {
        let mut buf = Vec::new();
        write_panel(&mut buf, &panel()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "period,DEU,FRA\n2022,6.9,5.2\n2021,,1.6\n");
    }

    #[test]
    fn report_json_contains_notices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut report = Report::default();
        report.notices.push(NoticeKind::MissingIndicator {
            indicator: "SL.UEM.TOTL.ZS".into(),
        });
        write_report_json(&path, &report).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["notices"][0]["kind"], "missing_indicator");
        assert_eq!(json["notices"][0]["severity"], "Warning");
    }
}
