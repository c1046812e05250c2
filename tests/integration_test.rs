// End-to-end: query, translate, execute against the in-memory driver, materialize

mod common;

use chrono::NaiveDate;
use common::{companies_driver, init_tracing, Company, COMPANIES};
use sheetql_core::{DataType, Error, Row, Value};
use sheetql_query::{Expr, FilterExpr, MemoryDriver, MemorySheet, Query, Workbook};

fn company_query(workbook: &Workbook<MemoryDriver>) -> Query<Company> {
    workbook
        .default_worksheet::<Company>()
        .map_column("name", "Company Title")
        .map_column("ceo", "CEO")
        .map_column("employees", "Employees")
        .map_column("start_date", "StartDate")
        .map_column("is_public", "IsPublic")
}

#[test]
fn test_typed_records_with_column_mapping() -> anyhow::Result<()> {
    init_tracing();
    let workbook = Workbook::open(companies_driver(), COMPANIES)?;
    let companies = workbook.execute(&company_query(&workbook))?;

    assert_eq!(companies.len(), 3);
    assert_eq!(companies[0].name, "ACME");
    assert_eq!(companies[0].start_date, NaiveDate::from_ymd_opt(1918, 11, 11));
    assert!(companies[0].is_public);
    assert_eq!(companies[1].employees, 3100);
    assert_eq!(companies[1].start_date, NaiveDate::from_ymd_opt(1924, 5, 13));
    assert!(!companies[1].is_public);
    assert_eq!(companies[2].employees, 400);
    assert_eq!(companies[2].start_date, None);
    Ok(())
}

#[test]
fn test_filter_statement_uses_physical_column() -> anyhow::Result<()> {
    init_tracing();
    let driver = companies_driver();
    let workbook = Workbook::open(driver.clone(), COMPANIES)?;
    let query = company_query(&workbook).filter(|c| c.member("ceo").eq("Bugs Bunny"));
    workbook.execute(&query)?;

    let executed = driver.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].text, "SELECT * FROM [Sheet1$] WHERE [CEO] = ?");
    assert_eq!(executed[0].parameters[0].value, Value::from("Bugs Bunny"));
    assert_eq!(executed[0].parameters[0].data_type, DataType::Text);
    Ok(())
}

#[test]
fn test_lenient_schema_leaves_defaults() -> anyhow::Result<()> {
    #[derive(Debug, Default, PartialEq)]
    struct Person {
        name: String,
        age: i64,
        email: String,
    }
    sheetql_core::record_shape!(Person {
        name: String,
        age: i64,
        email: String,
    });

    let driver = MemoryDriver::new().with_sheet(
        "people.xlsx",
        "People",
        MemorySheet::new(["name", "age"]).with_row(vec![Value::from("Ada"), Value::from(36)]),
    );
    let workbook = Workbook::open(driver, "people.xlsx")?;
    let people = workbook.execute(&workbook.worksheet::<Person>("People"))?;
    assert_eq!(
        people,
        vec![Person {
            name: "Ada".to_string(),
            age: 36,
            email: String::new(),
        }]
    );
    Ok(())
}

#[test]
fn test_dynamic_rows() -> anyhow::Result<()> {
    let driver = MemoryDriver::new().with_sheet(
        "data.xls",
        "Data",
        MemorySheet::new(["A", "B"]).with_row(vec![Value::from("x"), Value::from("5")]),
    );
    let workbook = Workbook::open(driver, "data.xls")?;
    let rows: Vec<Row> = workbook.execute(&workbook.rows("Data"))?;

    let row = &rows[0];
    assert_eq!(row.column_names(), vec!["A", "B"]);
    assert_eq!(row.cell("B")?.as_number()?, 5.0);
    assert!(matches!(
        row.cell("A")?.as_number(),
        Err(Error::Conversion { .. })
    ));
    assert!(matches!(row.cell("C"), Err(Error::ColumnNotFound(_))));
    assert_eq!(row[0].as_text()?, "x");
    Ok(())
}

#[test]
fn test_projection_returns_aliased_rows() -> anyhow::Result<()> {
    let driver = companies_driver();
    let workbook = Workbook::open(driver.clone(), COMPANIES)?;
    let query = company_query(&workbook)
        .order_by_descending(|c| c.member("employees"))
        .select(|c| {
            Expr::new_record(vec![
                ("name", c.clone().member("name")),
                ("Employees", c.member("employees")),
            ])
        });
    let rows = workbook.execute(&query)?;

    assert_eq!(
        driver.executed()[0].text,
        "SELECT [Company Title] AS [name], [Employees] FROM [Sheet1$] ORDER BY [Employees] DESC"
    );
    assert_eq!(rows[0].column_names(), vec!["name", "Employees"]);
    assert_eq!(rows[0].cell("name")?.as_text()?, "ACME");
    Ok(())
}

#[test]
fn test_first_and_first_or_default() -> anyhow::Result<()> {
    let workbook = Workbook::open(companies_driver(), COMPANIES)?;
    let first = workbook.first(company_query(&workbook))?;
    assert_eq!(first.name, "ACME");

    let empty = MemoryDriver::new().with_sheet("empty.xlsx", "Sheet1", MemorySheet::new(["x"]));
    let workbook = Workbook::open(empty, "empty.xlsx")?;
    assert!(workbook.first_or_default(workbook.rows("Sheet1"))?.is_none());
    assert!(matches!(
        workbook.first(workbook.rows("Sheet1")),
        Err(Error::NoRows)
    ));
    Ok(())
}

#[test]
fn test_compiled_null_filters() -> anyhow::Result<()> {
    let workbook = Workbook::open(companies_driver(), COMPANIES)?;
    let query = company_query(&workbook)
        .filter(|c| c.clone().member("start_date").eq(Expr::null()).or(c.member("ceo").ne(Expr::null())));
    let translation = workbook.translate(&query)?;

    assert_eq!(
        translation.plan.text,
        "SELECT * FROM [Sheet1$] WHERE ([StartDate] IS NULL OR [CEO] IS NOT NULL)"
    );
    assert!(translation.plan.parameters.is_empty());
    assert!(matches!(translation.model.filter, Some(FilterExpr::Or(_, _))));
    Ok(())
}

#[test]
fn test_csv_workbook() -> anyhow::Result<()> {
    let driver = MemoryDriver::new().with_sheet(
        "exports/people.csv",
        "people.csv",
        MemorySheet::new(["Name", "Age"])
            .with_row(vec![Value::from("Ada"), Value::from("36")])
            .with_row(vec![Value::from("Alan"), Value::from("41")]),
    );
    let workbook = Workbook::open(driver.clone(), "exports/people.csv")?;
    let rows = workbook.execute(&workbook.default_worksheet::<Row>().take(1))?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].cell("Age")?.as_integer()?, 36);
    assert_eq!(driver.executed()[0].text, "SELECT TOP 1 * FROM [people.csv]");
    assert_eq!(
        workbook.dialect().connection_string(&workbook.file().path),
        Some(
            "Provider=Microsoft.Jet.OLEDB.4.0;Data Source=exports;Extended Properties=\"text;HDR=Yes;FMT=Delimited;\""
                .to_string()
        )
    );
    Ok(())
}

#[test]
fn test_unsupported_construct_never_executes() -> anyhow::Result<()> {
    let driver = companies_driver();
    let workbook = Workbook::open(driver.clone(), COMPANIES)?;
    let query = company_query(&workbook).filter(|c| c.member("name").call("trim", Vec::new()).eq("ACME"));

    match workbook.execute(&query) {
        Err(Error::UnsupportedQueryConstruct { construct }) => {
            assert_eq!(construct, "x.name.trim()");
        }
        other => panic!("unexpected result: {:?}", other.map(|v| v.len())),
    }
    assert!(driver.executed().is_empty());
    Ok(())
}

#[test]
fn test_two_properties_mapped_to_one_header() -> anyhow::Result<()> {
    #[derive(Debug, Default, PartialEq)]
    struct Listing {
        title: String,
        label: Option<String>,
    }
    sheetql_core::record_shape!(Listing {
        title: String,
        label: Option<String>,
    });

    let driver = MemoryDriver::new().with_sheet(
        "listings.xlsx",
        "Sheet1",
        MemorySheet::new(["Name"]).with_row(vec![Value::from("ACME")]),
    );
    let workbook = Workbook::open(driver, "listings.xlsx")?;
    let query = workbook
        .default_worksheet::<Listing>()
        .map_column("title", "Name")
        .map_column("label", "Name");
    let listings = workbook.execute(&query)?;

    assert_eq!(
        listings,
        vec![Listing {
            title: "ACME".to_string(),
            label: Some("ACME".to_string()),
        }]
    );
    Ok(())
}
