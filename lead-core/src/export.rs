//! CSV export of lead listings

use crate::lead::Lead;
use chrono::SecondsFormat;

pub const LEAD_CSV_COLUMNS: [&str; 16] = [
    "ID",
    "Created At",
    "First Name",
    "Last Name",
    "Email",
    "Phone",
    "DNI",
    "Loan Amount",
    "Loan Period",
    "Loan Purpose",
    "Status",
    "Source",
    "Revenue",
    "Response Time (ms)",
    "Rejection Reason",
    "IP Address",
];

/// Render leads as CSV: every field quoted, rows joined with `\n`
pub fn leads_csv(leads: &[Lead]) -> String {
    let mut rows = Vec::with_capacity(leads.len() + 1);
    rows.push(csv_row(LEAD_CSV_COLUMNS.iter().map(|c| c.to_string())));
    rows.extend(leads.iter().map(|lead| csv_row(lead_fields(lead))));
    rows.join("\n")
}

fn lead_fields(lead: &Lead) -> [String; 16] {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        lead.id.to_string(),
        lead.created_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
        text(&lead.first_name),
        text(&lead.last_name),
        text(&lead.email),
        text(&lead.phone),
        text(&lead.dni),
        lead.loan_amount.to_string(),
        lead.loan_period.map(|p| p.to_string()).unwrap_or_default(),
        text(&lead.loan_purpose),
        lead.status.as_str().to_string(),
        text(&lead.source),
        lead.revenue.to_string(),
        lead.response_time_ms.map(|ms| ms.to_string()).unwrap_or_default(),
        text(&lead.rejection_reason),
        text(&lead.ip_address),
    ]
}

fn csv_row<I: IntoIterator<Item = String>>(fields: I) -> String {
    fields
        .into_iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
