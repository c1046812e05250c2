mod common;

use common::{companies_driver, Company, COMPANIES};
use sheetql_query::Workbook;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_queries_share_a_workbook() {
    let driver = companies_driver();
    let workbook = Arc::new(Workbook::open(driver.clone(), COMPANIES).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let workbook = Arc::clone(&workbook);
            thread::spawn(move || {
                let query = workbook
                    .default_worksheet::<Company>()
                    .map_column("name", "Company Title")
                    .filter(move |c| c.member("employees").gt(i * 100));
                let translation = workbook.translate(&query).unwrap();
                let records = workbook.execute(&query).unwrap();
                (translation.plan, records.len())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (plan, count) = handle.join().unwrap();
        assert_eq!(plan.text, "SELECT * FROM [Sheet1$] WHERE [employees] > ?");
        assert_eq!(plan.parameters[0].value, sheetql_core::Value::from(i as i64 * 100));
        assert_eq!(count, 3);
    }
    assert_eq!(driver.executed().len(), 8);
}

#[test]
fn test_each_translation_numbers_its_own_parameters() {
    let workbook = Workbook::open(companies_driver(), COMPANIES).unwrap();
    let query = workbook
        .rows("Sheet1")
        .filter(|r| r.index("CEO").contains("Bugs"));

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let translation = workbook.translate(&query).unwrap();
                assert_eq!(translation.model.parameter_count(), 1);
                assert_eq!(translation.plan.parameters.len(), 1);
            });
        }
    });
}
