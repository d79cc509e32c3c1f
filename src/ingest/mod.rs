//! CSV ingestion.
//!
//! Parses free-form CSV text (`Date,Sport,Selection,Stake,Odds,Result`,
//! header optional) into validated bet intents, deduplicates against the
//! existing ledger and the batch itself, sorts chronologically, and
//! feeds rows one at a time through the normal add-bet path. Row-level
//! failures never abort the batch; every message carries the 1-based
//! line number of the original input, header included.

pub mod dates;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::engine::{LedgerEngine, NewBet};
use crate::types::{BetResult, ImportReport, Ledger, LedgerError};

#[derive(Debug)]
struct ParsedRow {
    line_no: usize,
    date: NaiveDate,
    sport: String,
    selection: String,
    stake: Decimal,
    odds: i64,
    result: BetResult,
}

impl ParsedRow {
    fn signature(&self) -> String {
        row_signature(self.date, &self.selection, self.stake, self.odds)
    }
}

fn row_signature(date: NaiveDate, selection: &str, stake: Decimal, odds: i64) -> String {
    format!(
        "{date}|{}|{}|{odds}",
        selection.to_lowercase(),
        stake.normalize()
    )
}

/// Import a CSV batch into an account's ledger.
pub fn import(
    engine: &LedgerEngine,
    account_id: &str,
    csv_text: &str,
    today: NaiveDate,
) -> Result<ImportReport, LedgerError> {
    let mut report = ImportReport::default();

    let lines: Vec<(usize, &str)> = csv_text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .collect();

    let mut start = 0;
    if let Some((_, first)) = lines.first() {
        let lower = first.to_lowercase();
        if lower.contains("date") || lower.contains("sport") {
            start = 1;
        }
    }

    // Existing-ledger signatures for duplicate detection.
    let existing = engine.load_ledger(account_id)?;
    let mut seen = existing_signatures(&existing);

    let mut rows = Vec::new();
    for &(line_no, raw) in &lines[start..] {
        if raw.trim().is_empty() {
            continue;
        }
        match parse_row(line_no, raw) {
            Ok(row) => {
                let sig = row.signature();
                if seen.contains(&sig) {
                    report.warnings += 1;
                    report
                        .warning_messages
                        .push(format!("Line {line_no}: duplicate bet skipped ({sig})"));
                    continue;
                }
                seen.insert(sig);
                rows.push(row);
            }
            Err(msg) => {
                report.errors += 1;
                report.error_messages.push(msg);
            }
        }
    }

    // Oldest first, so balances accrue in true temporal order regardless
    // of the input order. Stable: same-day rows keep their input order.
    rows.sort_by_key(|r| r.date);

    for row in rows {
        let line_no = row.line_no;
        let outcome = engine.add_bet(
            account_id,
            NewBet {
                date: row.date,
                sport: row.sport,
                selection: row.selection,
                stake: row.stake,
                odds: row.odds,
                result: row.result,
                is_parlay: false,
                parlay_legs: Vec::new(),
            },
            today,
        );
        match outcome {
            Ok(_) => report.imported += 1,
            Err(e) => {
                report.errors += 1;
                report.error_messages.push(format!("Line {line_no}: {e}"));
            }
        }
    }

    report.new_balance = engine.load_ledger(account_id)?.account_balance;
    info!(
        account_id,
        imported = report.imported,
        errors = report.errors,
        warnings = report.warnings,
        balance = %report.new_balance,
        "CSV import finished"
    );
    Ok(report)
}

fn existing_signatures(ledger: &Ledger) -> std::collections::HashSet<String> {
    ledger
        .bets
        .iter()
        .map(|b| row_signature(b.date, &b.selection, b.stake, b.odds))
        .collect()
}

fn parse_row(line_no: usize, raw: &str) -> Result<ParsedRow, String> {
    let fields = split_fields(raw);
    if fields.len() < 6 {
        return Err(format!(
            "Line {line_no}: expected 6 fields (Date,Sport,Selection,Stake,Odds,Result), got {}",
            fields.len()
        ));
    }

    let date = dates::parse_flexible(&fields[0])
        .ok_or_else(|| format!("Line {line_no}: unrecognized date '{}'", fields[0]))?;

    let sport = fields[1].trim().to_string();
    let selection = fields[2].trim().to_string();
    if sport.is_empty() || selection.is_empty() {
        return Err(format!("Line {line_no}: sport and selection must not be empty"));
    }

    let stake = parse_stake(&fields[3])
        .ok_or_else(|| format!("Line {line_no}: invalid stake '{}'", fields[3]))?;
    let odds = parse_odds(&fields[4])
        .ok_or_else(|| format!("Line {line_no}: invalid odds '{}'", fields[4]))?;
    let result = normalize_result(&fields[5])
        .ok_or_else(|| format!("Line {line_no}: unrecognized result '{}'", fields[5]))?;

    Ok(ParsedRow {
        line_no,
        date,
        sport,
        selection,
        stake,
        odds,
        result,
    })
}

/// Split a CSV line on commas, honoring double-quoted fields (commas
/// inside quotes don't split; doubled quotes escape a quote).
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn parse_stake(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '+') && !c.is_whitespace())
        .collect();
    let stake: Decimal = cleaned.parse().ok()?;
    (stake > Decimal::ZERO).then_some(stake)
}

fn parse_odds(s: &str) -> Option<i64> {
    let cleaned: String = s
        .chars()
        .filter(|c| *c != '+' && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

/// Normalize the many spellings people use for results.
fn normalize_result(s: &str) -> Option<BetResult> {
    match s.trim().to_uppercase().as_str() {
        "W" | "WIN" | "WON" | "WINNING" => Some(BetResult::Win),
        "L" | "LOSS" | "LOSE" | "LOST" | "LOSING" => Some(BetResult::Loss),
        "P" | "PUSH" | "TIE" | "NO ACTION" => Some(BetResult::Push),
        "REFUND" | "REFUNDED" | "VOID" | "CANCELLED" | "CANCELED" => Some(BetResult::Refunded),
        "CASH OUT" | "CASHOUT" | "CASHED OUT" | "CASHED_OUT" => Some(BetResult::CashedOut),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
