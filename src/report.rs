//! Text and CSV renderings of a schedule

use std::io;

use crate::error::Result;
use crate::schedule::{AmortizationSchedule, ScheduleSummary};

const CSV_HEADER: [&str; 8] = [
    "Period", "DueDate", "OpeningBalance", "Payment", "Interest", "Principal", "Insurance", "Balance",
];

/// Fixed-width table with thousands separators, one line per installment
pub fn render_table(schedule: &AmortizationSchedule) -> String {
    let with_dates = schedule.records.iter().any(|r| r.due_date.is_some());
    let due_column = |label: String| if with_dates { format!(" {:<10}", label) } else { String::new() };

    let mut lines = Vec::with_capacity(schedule.records.len() + 1);
    lines.push(format!(
        "{:<6}{} {:>15} {:>15} {:>15} {:>15} {:>15}",
        "Period",
        due_column("Due".to_string()),
        "Payment",
        "Interest",
        "Principal",
        "Insurance",
        "Balance"
    ));

    for record in &schedule.records {
        let due = record.due_date.map(|d| d.to_string()).unwrap_or_default();
        lines.push(format!(
            "{:<6}{} {:>15} {:>15} {:>15} {:>15} {:>15}",
            record.period,
            due_column(due),
            format_amount(record.payment),
            format_amount(record.interest),
            format_amount(record.principal),
            format_amount(record.insurance),
            format_amount(record.balance),
        ));
    }

    lines.iter().map(|line| format!("{}\n", line)).collect()
}

/// Short human-readable summary block
pub fn render_summary(summary: &ScheduleSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Installments:      {}\n", summary.payment_count));
    out.push_str(&format!("Initial payment:   {}\n", format_amount(summary.initial_payment)));
    out.push_str(&format!("Total interest:    {}\n", format_amount(summary.total_interest)));
    out.push_str(&format!("Total insurance:   {}\n", format_amount(summary.total_insurance)));
    out.push_str(&format!("Total paid:        {}\n", format_amount(summary.total_paid)));
    if let Some(rate) = summary.effective_annual_rate {
        out.push_str(&format!("Effective annual:  {:.4}%\n", rate * 100.0));
    }
    out
}

/// Write one CSV row per installment
pub fn write_csv<W: io::Write>(schedule: &AmortizationSchedule, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    for record in &schedule.records {
        wtr.write_record([
            record.period.to_string(),
            record.due_date.map(|d| d.to_string()).unwrap_or_default(),
            format!("{:.2}", record.opening_balance),
            format!("{:.2}", record.payment),
            format!("{:.2}", record.interest),
            format!("{:.2}", record.principal),
            format!("{:.2}", record.insurance),
            format!("{:.2}", record.balance),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Two decimals with comma thousands separators, e.g. `-1,234,567.89`
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // Values that round to zero print without a sign
    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{AmortizationMethod, LoanTerms, PaymentFrequency};
    use crate::schedule::build_schedule;
    use chrono::NaiveDate;

    fn schedule() -> AmortizationSchedule {
        let terms = LoanTerms::new(
            10_000.0,
            12.0,
            12,
            PaymentFrequency::Monthly,
            AmortizationMethod::LevelPayment,
        );
        build_schedule(&terms).unwrap()
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(888.487886), "888.49");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-1_000.0), "-1,000.00");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_amount(100_000.0), "100,000.00");
    }

    #[test]
    fn test_render_table() {
        let table = render_table(&schedule());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 13);
        assert!(lines[0].starts_with("Period"));
        assert!(!lines[0].contains("Due"));
        assert!(lines[1].starts_with("1 "));
        assert!(lines[1].contains("888.49"));
        assert!(lines[1].contains("100.00"));
        assert!(lines[12].trim_end().ends_with("0.00"));
    }

    #[test]
    fn test_render_table_with_dates() {
        let terms = LoanTerms::new(
            1_200.0,
            0.0,
            3,
            PaymentFrequency::Monthly,
            AmortizationMethod::DecliningBalance,
        )
        .with_first_payment_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        let table = render_table(&build_schedule(&terms).unwrap());
        assert!(table.lines().next().unwrap().contains("Due"));
        assert!(table.contains("2025-03-15"));
        assert!(table.ends_with('\n'));

        let widths: Vec<usize> = table.lines().map(str::len).collect();
        assert_eq!(widths.len(), 4);
        assert!(widths.iter().all(|&w| w == widths[0]));
    }

    #[test]
    fn test_write_csv() {
        let mut buf = Vec::new();
        write_csv(&schedule(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(
            lines[0],
            "Period,DueDate,OpeningBalance,Payment,Interest,Principal,Insurance,Balance"
        );
        assert!(lines[1].starts_with("1,,10000.00,888.49,100.00,788.49,0.00,"));
    }

    #[test]
    fn test_render_summary() {
        let text = render_summary(&schedule().summary());
        assert!(text.contains("Installments:      12"));
        assert!(text.contains("Effective annual:  12.6825%"));
    }
}
