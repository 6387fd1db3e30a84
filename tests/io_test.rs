mod common;

use anyhow::Result;
use common::{date, test_ledger, Scenario};
use outlay::domain::ExpenseFilter;
use outlay::io::{Exporter, ImportOptions, Importer};

#[tokio::test]
async fn test_export_filtered_csv() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    Scenario::mixed_week(&ledger).await?;

    let filter = ExpenseFilter {
        categories: vec!["Food & Dining".into()],
        ..Default::default()
    };

    let mut buf = Vec::new();
    let count = Exporter::new(&ledger)
        .export_filtered_csv(&filter, &mut buf)
        .await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buf)?;
    assert_eq!(
        csv,
        "Date,Amount,Category,Description\n\
         2024-02-07,18.99,Food & Dining,Pizza\n\
         2024-02-03,12.50,Food & Dining,Groceries\n"
    );

    Ok(())
}

#[tokio::test]
async fn test_export_then_import_round_trip() -> Result<()> {
    let (source, _source_temp) = test_ledger().await?;
    Scenario::mixed_week(&source).await?;

    let mut buf = Vec::new();
    Exporter::new(&source)
        .export_filtered_csv(&ExpenseFilter::default(), &mut buf)
        .await?;

    let (target, _target_temp) = test_ledger().await?;
    Scenario::lunch_and_bus(&target).await?;

    let result = Importer::new(&target)
        .import_csv(buf.as_slice(), ImportOptions::default())
        .await?;
    assert!(result.errors.is_empty());
    assert!(result.replaced);
    assert_eq!(result.imported, 6);

    // The old rows are gone and display order matches the source exactly.
    assert_eq!(target.get_expenses().await?, source.get_expenses().await?);

    Ok(())
}

#[tokio::test]
async fn test_import_dry_run_writes_nothing() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    Scenario::lunch_and_bus(&ledger).await?;
    let before = ledger.get_expenses_with_ids().await?;

    let data = "Date,Amount,Category,Description\n2024-03-01,9.99,Shopping,Mug\n";
    let result = Importer::new(&ledger)
        .import_csv(data.as_bytes(), ImportOptions { dry_run: true })
        .await?;

    assert_eq!(result.imported, 1);
    assert!(!result.replaced);
    assert_eq!(ledger.get_expenses_with_ids().await?, before);

    Ok(())
}

#[tokio::test]
async fn test_import_with_bad_rows_leaves_table_unchanged() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    Scenario::lunch_and_bus(&ledger).await?;
    let before = ledger.get_expenses_with_ids().await?;

    let data = "Date,Amount,Category,Description\n\
                2024-03-01,9.99,Shopping,Mug\n\
                2024-03-02,zero,Shopping,Cup\n";
    let result = Importer::new(&ledger)
        .import_csv(data.as_bytes(), ImportOptions::default())
        .await?;

    assert!(!result.replaced);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line, 3);
    assert_eq!(ledger.get_expenses_with_ids().await?, before);
    assert_eq!(before[0].expense.date, date("2024-01-02"));

    Ok(())
}

#[tokio::test]
async fn test_import_rejects_amounts_beyond_the_limit() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    Scenario::lunch_and_bus(&ledger).await?;
    let before = ledger.get_expenses_with_ids().await?;

    let data = "Date,Amount,Category,Description\n\
                2024-03-01,92233720368547758.07,Housing,Castle\n\
                2024-03-01,92233720368547758.07,Housing,Second castle\n";
    let result = Importer::new(&ledger)
        .import_csv(data.as_bytes(), ImportOptions::default())
        .await?;

    assert!(!result.replaced);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].field.as_deref(), Some("Amount"));
    assert_eq!(ledger.get_expenses_with_ids().await?, before);

    Ok(())
}
