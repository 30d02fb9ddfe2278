use std::collections::HashSet;

use serde::Serialize;

use crate::error::Result;

use super::fields::{self, invalid, Table};
use super::SCHEMA_VERSION;

pub const PROGRAMS_REQUIRED_HEADERS: &[&str] = &[
    "program_key",
    "program_name",
    "issuer",
    "source_url",
    "requires_activation",
    "cap_amount",
    "cap_period",
    "base_rate",
    "bonus_rate",
    "notes",
    "status",
    "last_verified",
];

pub const PROGRAM_QUARTERS_REQUIRED_HEADERS: &[&str] = &[
    "program_key",
    "start_date",
    "end_date",
    "category",
    "status",
    "last_verified",
];

#[derive(Debug, Clone, Serialize)]
pub struct ProgramsDocument {
    pub schema_version: u32,
    pub programs: Vec<Program>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramQuartersDocument {
    pub schema_version: u32,
    pub program_quarters: Vec<ProgramQuarter>,
}

/// A rotating or activated bonus program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub program_key: String,
    pub program_name: String,
    pub issuer: String,
    pub source_url: String,
    pub requires_activation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_period: Option<String>,
    pub base_rate: i64,
    pub bonus_rate: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,
}

/// One bonus category for one program over a date window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramQuarter {
    pub program_key: String,
    pub start_date: String,
    pub end_date: String,
    pub category: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verified: Option<String>,
}

pub fn build_programs_document(programs: Vec<Program>) -> ProgramsDocument {
    ProgramsDocument {
        schema_version: SCHEMA_VERSION,
        programs,
    }
}

pub fn build_program_quarters_document(entries: Vec<ProgramQuarter>) -> ProgramQuartersDocument {
    ProgramQuartersDocument {
        schema_version: SCHEMA_VERSION,
        program_quarters: entries,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let v = value.trim();
    (!v.is_empty()).then(|| v.to_string())
}

/// Parse the programs sheet, sorted by `program_key`.
pub fn parse_programs(csv_text: &str) -> Result<Vec<Program>> {
    let table = Table::parse(csv_text, "programs")?;
    table.require_headers(PROGRAMS_REQUIRED_HEADERS, "programs")?;

    let mut seen = HashSet::new();
    let mut programs = Vec::new();

    for (line, row) in table.rows() {
        let key = row.trimmed("program_key");
        let row_id = format!(
            "programs_row{}:{}",
            line,
            if key.is_empty() { "(missing program_key)" } else { key }
        );
        if key.is_empty() {
            return Err(invalid(&row_id, "program_key is blank."));
        }
        if !seen.insert(key.to_string()) {
            return Err(invalid(&row_id, format!("duplicate program_key '{}'.", key)));
        }

        let program = Program {
            program_key: key.to_string(),
            program_name: row.trimmed("program_name").to_string(),
            issuer: row.trimmed("issuer").to_string(),
            source_url: fields::validate_https(row.get("source_url"), "source_url", &row_id)?,
            requires_activation: fields::parse_bool(
                row.get("requires_activation"),
                "requires_activation",
                &row_id,
            )?,
            cap_amount: fields::parse_optional_int(row.get("cap_amount"), &row_id)?,
            cap_period: non_empty(&row.trimmed("cap_period").to_lowercase()),
            base_rate: fields::parse_number(row.get("base_rate"), "base_rate", &row_id)?.trunc()
                as i64,
            bonus_rate: fields::parse_number(row.get("bonus_rate"), "bonus_rate", &row_id)?.trunc()
                as i64,
            notes: non_empty(row.get("notes")),
            status: fields::parse_status(row.get("status"), &row_id)?,
            last_verified: non_empty(row.get("last_verified")),
        };

        if program.program_name.is_empty() {
            return Err(invalid(&row_id, "program_name is blank."));
        }
        if program.issuer.is_empty() {
            return Err(invalid(&row_id, "issuer is blank."));
        }

        programs.push(program);
    }

    programs.sort_by(|a, b| a.program_key.cmp(&b.program_key));
    Ok(programs)
}

/// Parse the program_quarters sheet, sorted by (key, start date, category).
pub fn parse_program_quarters(csv_text: &str) -> Result<Vec<ProgramQuarter>> {
    let table = Table::parse(csv_text, "program_quarters")?;
    table.require_headers(PROGRAM_QUARTERS_REQUIRED_HEADERS, "program_quarters")?;

    let mut entries = Vec::new();

    for (line, row) in table.rows() {
        let key = row.trimmed("program_key");
        let row_id = format!(
            "program_quarters_row{}:{}",
            line,
            if key.is_empty() { "(missing program_key)" } else { key }
        );
        if key.is_empty() {
            return Err(invalid(&row_id, "program_key is blank."));
        }

        let start = fields::validate_date(row.get("start_date"), "start_date", &row_id, None)?;
        let end = fields::validate_date(row.get("end_date"), "end_date", &row_id, None)?;
        let start_date = row.trimmed("start_date");
        let end_date = row.trimmed("end_date");
        if end < start {
            return Err(invalid(
                &row_id,
                format!("end_date {} is before start_date {}.", end_date, start_date),
            ));
        }

        let category = row.trimmed("category").to_lowercase();
        if category.is_empty() {
            return Err(invalid(&row_id, "category is blank."));
        }

        entries.push(ProgramQuarter {
            program_key: key.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            category,
            status: fields::parse_status(row.get("status"), &row_id)?,
            last_verified: non_empty(row.get("last_verified")),
        });
    }

    entries.sort_by(|a, b| {
        (&a.program_key, &a.start_date, &a.category).cmp(&(
            &b.program_key,
            &b.start_date,
            &b.category,
        ))
    });
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAMS_HEADER: &str = "program_key,program_name,issuer,source_url,requires_activation,cap_amount,cap_period,base_rate,bonus_rate,notes,status,last_verified";
    const QUARTERS_HEADER: &str = "program_key,start_date,end_date,category,status,last_verified";

    #[test]
    fn programs_are_sorted_and_empty_fields_dropped() {
        let csv = format!(
            "{}\n\
             freedom_5,Freedom 5%,Chase,https://chase.test/5,TRUE,1500,Quarter,1,5,,Verified,2024-04-01\n\
             discover_5,Discover 5%,Discover,https://discover.test/5,yes,,,1,5,Activate each quarter,draft,\n",
            PROGRAMS_HEADER
        );
        let programs = parse_programs(&csv).unwrap();

        assert_eq!(programs[0].program_key, "discover_5");
        assert_eq!(programs[0].cap_amount, None);
        assert_eq!(programs[0].notes.as_deref(), Some("Activate each quarter"));
        assert_eq!(programs[1].cap_period.as_deref(), Some("quarter"));
        assert_eq!(programs[1].status, "verified");

        let json = serde_json::to_value(build_programs_document(programs)).unwrap();
        let discover = &json["programs"][0];
        assert!(discover.get("cap_amount").is_none());
        assert!(discover.get("last_verified").is_none());
        assert_eq!(discover["bonus_rate"], 5);
    }

    #[test]
    fn programs_reject_plain_http_source() {
        let csv = format!(
            "{}\np,P,Bank,http://bank.test,no,,,1,5,,verified,\n",
            PROGRAMS_HEADER
        );
        let err = parse_programs(&csv).unwrap_err();
        assert!(err.message.contains("[programs_row2:p] source_url must start with https://"));
    }

    #[test]
    fn programs_missing_headers() {
        let err = parse_programs("program_key,program_name\n").unwrap_err();
        assert!(err.message.contains("programs missing required headers"));
    }

    #[test]
    fn quarters_validate_date_order_and_sort() {
        let csv = format!(
            "{}\n\
             freedom_5,2024-07-01,2024-09-30,Gas,verified,\n\
             freedom_5,2024-04-01,2024-06-30,restaurants,verified,2024-03-20\n\
             discover_5,2024-04-01,2024-06-30,grocery,draft,\n",
            QUARTERS_HEADER
        );
        let entries = parse_program_quarters(&csv).unwrap();
        let order: Vec<_> = entries
            .iter()
            .map(|e| (e.program_key.as_str(), e.start_date.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("discover_5", "2024-04-01"),
                ("freedom_5", "2024-04-01"),
                ("freedom_5", "2024-07-01"),
            ]
        );
        assert_eq!(entries[2].category, "gas");
        assert_eq!(entries[1].last_verified.as_deref(), Some("2024-03-20"));

        let backwards = format!(
            "{}\nfreedom_5,2024-09-30,2024-07-01,gas,verified,\n",
            QUARTERS_HEADER
        );
        let err = parse_program_quarters(&backwards).unwrap_err();
        assert!(err.message.contains("is before start_date"));
    }
}
