mod common;

use anyhow::Result;
use common::{date, test_ledger, Scenario};
use outlay::domain::Expense;
use outlay::storage::ExpenseStore;
use tempfile::TempDir;

fn sorted(mut expenses: Vec<Expense>) -> Vec<Expense> {
    expenses.sort_by(|a, b| {
        (a.date, a.amount_cents, &a.category, &a.description).cmp(&(
            b.date,
            b.amount_cents,
            &b.category,
            &b.description,
        ))
    });
    expenses
}

#[tokio::test]
async fn test_replace_all_of_load_all_keeps_the_record_set() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    Scenario::mixed_week(&ledger).await?;
    let store = ledger.store();

    let before_ids = store.load_all_with_ids().await?;
    let before = store.load_all().await?;

    let written = store.replace_all(&before).await?;
    assert_eq!(written, before.len());

    let after = store.load_all().await?;
    assert_eq!(sorted(after), sorted(before));

    // Fresh identifiers, all beyond the old ones.
    let max_old = before_ids.iter().map(|r| r.id).max().unwrap();
    let after_ids = store.load_all_with_ids().await?;
    assert!(after_ids.iter().all(|r| r.id > max_old));

    Ok(())
}

#[tokio::test]
async fn test_replace_all_with_nothing_clears_the_table() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    Scenario::lunch_and_bus(&ledger).await?;

    assert_eq!(ledger.replace_all(&[]).await?, 0);
    assert!(ledger.get_expenses().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_data_survives_reconnect() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("expenses.db");
    let path = db_path.to_str().unwrap();

    // Bare paths are accepted as well as sqlite: URLs.
    let store = ExpenseStore::connect(path).await?;
    let id = store
        .insert(&Expense::new(date("2024-05-01"), 899, "Shopping", "Umbrella"))
        .await?;
    store.close().await;

    let reopened = ExpenseStore::connect(&format!("sqlite://{}", path)).await?;
    let rows = reopened.load_all_with_ids().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);
    assert_eq!(rows[0].expense.description, "Umbrella");

    Ok(())
}

#[tokio::test]
async fn test_in_memory_store() -> Result<()> {
    let store = ExpenseStore::connect("sqlite::memory:").await?;

    store
        .insert(&Expense::new(date("2024-05-01"), 120, "Food & Dining", "Coffee"))
        .await?;
    store
        .insert(&Expense::new(date("2024-05-02"), 300, "Food & Dining", "Sandwich"))
        .await?;

    let expenses = store.load_all().await?;
    assert_eq!(expenses.len(), 2);
    assert_eq!(expenses[0].description, "Sandwich");

    let removed = store.delete_at_position(1).await?.unwrap();
    assert_eq!(removed.expense.description, "Coffee");
    assert!(store.delete_at_position(1).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_backend_failure_is_an_error_not_an_empty_table() -> Result<()> {
    let store = ExpenseStore::connect("sqlite::memory:").await?;
    store.close().await;

    assert!(store.load_all().await.is_err());
    assert!(store.load_all_with_ids().await.is_err());
    assert!(store
        .insert(&Expense::new(date("2024-05-01"), 100, "Other", "x"))
        .await
        .is_err());
    assert!(store.delete_by_id(1).await.is_err());
    assert!(store.replace_all(&[]).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_unreachable_database_fails_to_connect() {
    let temp_dir = TempDir::new().unwrap();
    let missing_dir = temp_dir.path().join("no-such-dir").join("expenses.db");
    let url = format!("sqlite://{}", missing_dir.display());

    assert!(ExpenseStore::connect(&url).await.is_err());
}
