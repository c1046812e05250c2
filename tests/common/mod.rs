// Shared fixtures for the integration test binaries
#![allow(dead_code)]

use chrono::NaiveDate;
use sheetql_core::Value;
use sheetql_query::{MemoryDriver, MemorySheet};

pub const COMPANIES: &str = "companies.xlsx";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Company {
    pub name: String,
    pub ceo: String,
    pub employees: i64,
    pub start_date: Option<NaiveDate>,
    pub is_public: bool,
}

sheetql_core::record_shape!(Company {
    name: String,
    ceo: String,
    employees: i64,
    start_date: Option<NaiveDate>,
    is_public: bool,
});

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn date(y: i32, m: u32, d: u32) -> Value {
    NaiveDate::from_ymd_opt(y, m, d).map(Value::Date).unwrap_or(Value::Null)
}

pub fn companies_sheet() -> MemorySheet {
    MemorySheet::new(["Company Title", "CEO", "Employees", "StartDate", "IsPublic"])
        .with_row(vec![
            Value::from("ACME"),
            Value::from("Bugs Bunny"),
            Value::from(2500),
            date(1918, 11, 11),
            Value::from(true),
        ])
        .with_row(vec![
            Value::from("Paramount"),
            Value::from("Mickey Mouse"),
            Value::from(3100.0),
            Value::from("5/13/1924"),
            Value::from("false"),
        ])
        .with_row(vec![
            Value::from("Warner Bros"),
            Value::from("Daffy Duck"),
            Value::from("  400 "),
            Value::Null,
            Value::from(1),
        ])
}

pub fn companies_driver() -> MemoryDriver {
    MemoryDriver::new().with_sheet(COMPANIES, "Sheet1", companies_sheet())
}
