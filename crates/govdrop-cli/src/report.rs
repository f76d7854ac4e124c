//! Markdown and CSV reports

use anyhow::Context;
use govdrop_core::{Dec, VoteOption};
use govdrop_distribution::{AddressDetail, AirdropResult, Holder, SupplyStats, SweepRun};
use govdrop_tally::{TallyComparison, TallyResult};
use std::io::Write;
use std::path::Path;

/// Minimal GitHub-flavoured Markdown table
#[derive(Clone, Debug, Default)]
pub struct MarkdownTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MarkdownTable {
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn append(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count().max(3)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let line = |cells: &[String]| {
            let padded: Vec<String> = (0..columns)
                .map(|i| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", cell, width = widths[i])
                })
                .collect();
            format!("| {} |\n", padded.join(" | "))
        };

        let mut out = line(&self.headers);
        let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format!("| {} |\n", separator.join(" | ")));
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out
    }
}

/// Amount with two decimals and thousands separators
pub fn human(amount: &Dec) -> String {
    let fixed = format!("{:.2}", amount);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Fraction rendered as a percentage
pub fn human_percent(fraction: &Dec) -> String {
    format!("{:.2}%", fraction * Dec::from_int(100))
}

pub fn tally_report(comparison: &TallyComparison) -> String {
    let mut out = format!(
        "Computed total voting power: {}\n",
        human(&comparison.total_voting_power)
    );
    match &comparison.yes_percent {
        Some(yes) => out.push_str(&format!("Yes percent: {}\n\n", human_percent(yes))),
        None => out.push_str("Yes percent: n/a\n\n"),
    }

    let mut table = MarkdownTable::new(&["", "Yes", "No", "NoWithVeto", "Abstain", "Total"]);
    for (source, result) in comparison.rows() {
        table.append(tally_row(source, &result));
    }
    out.push_str(&table.render());
    out
}

fn tally_row(source: &str, t: &TallyResult) -> Vec<String> {
    vec![
        source.to_string(),
        human(&t.yes),
        human(&t.no),
        human(&t.no_with_veto),
        human(&t.abstain),
        human(&t.total()),
    ]
}

/// One column per parameter set
pub fn distribution_report(runs: &[SweepRun]) -> String {
    let mut headers = vec![String::new()];
    headers.extend(runs.iter().map(|run| {
        format!(
            "yes ×{} / no ×{}",
            run.params.yes_votes_multiplier, run.params.no_votes_multiplier
        )
    }));
    let mut table = MarkdownTable::new(headers.as_slice());

    let row = |label: &str, cell: &dyn Fn(&AirdropResult) -> String| {
        let mut cells = vec![label.to_string()];
        cells.extend(runs.iter().map(|run| match &run.outcome {
            Ok(result) => cell(result),
            Err(_) => "-".to_string(),
        }));
        cells
    };

    let mut status = vec!["status".to_string()];
    status.extend(runs.iter().map(|run| match &run.outcome {
        Ok(_) => "ok".to_string(),
        Err(err) => err.to_string(),
    }));
    table.append(status);

    table.append(row("non-voters multiplier", &|r| format!("{:.6}", r.non_voters_multiplier)));
    table.append(row("addresses", &|r| r.addresses.len().to_string()));
    table.append(row("dust addresses", &|r| r.dust.addresses.to_string()));
    table.append(row("dust amount", &|r| human(&r.dust.amount)));

    let units: [(&str, fn(&AirdropResult) -> &SupplyStats); 2] =
        [("source", source_stats), ("destination", destination_stats)];
    for (unit, stats) in units {
        table.append(row(&format!("{} supply", unit), &|r| human(&stats(r).supply)));
        table.append(row(&format!("{} unstaked", unit), &|r| human(&stats(r).unstaked)));
        for option in VoteOption::ALL {
            table.append(row(&format!("{} {}", unit, option), &|r| {
                let s = stats(r);
                format!(
                    "{} ({})",
                    human(&s.vote(option)),
                    human_percent(&s.vote(option).checked_div(&s.supply).unwrap_or_default())
                )
            }));
        }
    }

    table.render()
}

fn source_stats(result: &AirdropResult) -> &SupplyStats {
    &result.source
}

fn destination_stats(result: &AirdropResult) -> &SupplyStats {
    &result.destination
}

pub fn top_holders_report(holders: &[Holder]) -> String {
    let mut table = MarkdownTable::new(&["Position", "Address", "Amount", "Supply %"]);
    for holder in holders {
        table.append(vec![
            holder.rank.to_string(),
            holder.address.clone(),
            human(&holder.amount),
            human_percent(&holder.share),
        ]);
    }
    table.render()
}

/// CSV header of the per-address detail
pub fn detail_header() -> Vec<String> {
    let mut header = vec!["address".to_string(), "factor".to_string()];
    for row in AddressDetail::ROWS {
        for column in ["source_amount", "multiplier", "bonus_malus", "destination_amount"] {
            header.push(format!("{}_{}", row, column));
        }
    }
    header.push("total".to_string());
    header
}

/// One row per address with the six bucket details and the total
pub fn write_detail<W: Write>(writer: W, result: &AirdropResult) -> anyhow::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(detail_header())?;

    let factor = result.params.conversion_factor.to_string();
    for (address, detail) in &result.addresses_detail {
        let mut record = vec![address.clone(), factor.clone()];
        for (_, bucket) in detail.rows() {
            record.push(bucket.source_amount.to_string());
            record.push(bucket.multiplier.to_string());
            record.push(bucket.bonus_malus.to_string());
            record.push(bucket.destination_amount.to_string());
        }
        record.push(detail.total.to_string());
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_detail_csv(path: &Path, result: &AirdropResult) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_detail(file, result).with_context(|| format!("writing {}", path.display()))
}
