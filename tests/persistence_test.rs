//! Postgres integration tests for the persistence gateway and save workflow.
//!
//! These need a reachable database. Set `TEST_DATABASE_URL` to run them;
//! without it each test skips cleanly.

use invoice_core::models::{Account, Client, InvoiceDocument, InvoiceStatus};
use invoice_core::services::{save, Database};
use invoice_core::store::{DraftStore, ItemEdit};
use invoice_core::AppError;
use serial_test::serial;
use uuid::Uuid;

async fn test_db() -> Option<Database> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping persistence test");
        return None;
    };
    let db = Database::new(&url, 5, 1).await.expect("Failed to connect");
    db.run_migrations().await.expect("Failed to migrate");
    Some(db)
}

async fn fresh_account(db: &Database) -> Account {
    db.create_account(
        "Test Business",
        &format!("{}@invoice.test", Uuid::new_v4()),
        "INV",
    )
    .await
    .expect("Failed to create account")
}

/// A document that passes validation: one client, one priced line.
fn save_ready_document(account: &Account) -> InvoiceDocument {
    let mut store = DraftStore::new_for_account(account);
    store.set_client(&Client {
        id: Uuid::new_v4(),
        name: "Test Client".to_string(),
        email: "client@invoice.test".to_string(),
        address: "1 Test Way".to_string(),
    });
    let item = store.document().items[0].id;
    store.update_item(item, ItemEdit::Description("Consulting".to_string()));
    store.update_item(item, ItemEdit::Quantity(2.0));
    store.update_item(item, ItemEdit::Rate(50.0));
    store.document().clone()
}

#[tokio::test]
#[serial]
async fn save_draft_persists_record_and_advances_counter() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;
    let document = save_ready_document(&account);

    let invoice_id = save::save_draft(&db, &account, &document)
        .await
        .expect("Failed to save draft");

    let record = db
        .get_invoice(invoice_id)
        .await
        .expect("Failed to fetch invoice")
        .expect("Missing invoice");
    assert_eq!(record.status, "draft");
    assert_eq!(record.invoice_number, "INV-0001");
    assert_eq!(record.subtotal, 100.0);
    assert_eq!(record.total, 100.0);
    assert_eq!(record.items.0.len(), 1);
    assert_eq!(record.view_count, 0);

    let account = db
        .get_account(account.account_id)
        .await
        .expect("Failed to fetch account")
        .expect("Missing account");
    assert_eq!(account.next_invoice_number, 2);
    assert_eq!(account.invoices_this_month, 1);
}

#[tokio::test]
#[serial]
async fn concurrent_saves_for_one_account_get_distinct_numbers() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;
    let doc_a = save_ready_document(&account);
    let doc_b = save_ready_document(&account);

    let (a, b) = tokio::join!(
        save::save_draft(&db, &account, &doc_a),
        save::save_draft(&db, &account, &doc_b),
    );
    let a = a.expect("First save failed");
    let b = b.expect("Second save failed");

    let number_a = db.get_invoice(a).await.unwrap().unwrap().invoice_number;
    let number_b = db.get_invoice(b).await.unwrap().unwrap().invoice_number;
    assert_ne!(number_a, number_b);

    let account = db
        .get_account(account.account_id)
        .await
        .unwrap()
        .expect("Missing account");
    assert_eq!(account.next_invoice_number, 3);
    assert_eq!(account.invoices_this_month, 2);
}

#[tokio::test]
#[serial]
async fn invalid_document_is_blocked_with_every_message() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;

    // No client, no description, zero amount.
    let store = DraftStore::new_for_account(&account);
    let document = store.document().clone();

    let err = save::save_draft(&db, &account, &document)
        .await
        .expect_err("Save should have been blocked");
    let messages = err.validation_messages().expect("Expected validation error");
    assert!(messages.len() >= 3);
    assert!(messages.contains(&"Please select a client".to_string()));

    // Nothing was written, nothing was counted.
    let account = db
        .get_account(account.account_id)
        .await
        .unwrap()
        .expect("Missing account");
    assert_eq!(account.next_invoice_number, 1);
    assert_eq!(account.invoices_this_month, 0);
}

#[tokio::test]
#[serial]
async fn update_draft_overwrites_without_touching_counter() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;
    let document = save_ready_document(&account);

    let invoice_id = save::save_draft(&db, &account, &document)
        .await
        .expect("Failed to save draft");

    // Edit the persisted copy: bump the rate and add a discount.
    let record = db.get_invoice(invoice_id).await.unwrap().unwrap();
    let mut store = DraftStore::new();
    store.load(record.into_document());
    let item = store.document().items[0].id;
    store.update_item(item, ItemEdit::Rate(75.0));
    store.set_discount_percent(10.0);

    save::update_draft(&db, invoice_id, store.document())
        .await
        .expect("Failed to update draft");

    let record = db.get_invoice(invoice_id).await.unwrap().unwrap();
    assert_eq!(record.subtotal, 150.0);
    assert_eq!(record.discount_amount, 15.0);
    assert_eq!(record.total, 135.0);

    let account = db
        .get_account(account.account_id)
        .await
        .unwrap()
        .expect("Missing account");
    assert_eq!(account.next_invoice_number, 2, "update must not renumber");
    assert_eq!(account.invoices_this_month, 1);
}

#[tokio::test]
#[serial]
async fn free_plan_quota_blocks_sixth_save() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;

    sqlx::query("UPDATE accounts SET invoices_this_month = 5 WHERE account_id = $1")
        .bind(account.account_id)
        .execute(db.pool())
        .await
        .expect("Failed to seed counter");
    let account = db
        .get_account(account.account_id)
        .await
        .unwrap()
        .expect("Missing account");
    let document = save_ready_document(&account);

    let err = save::save_draft(&db, &account, &document)
        .await
        .expect_err("Quota should block the save");
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
#[serial]
async fn first_view_of_sent_invoice_flips_status_and_stamps_time() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;
    let document = save_ready_document(&account);

    let invoice_id = save::save_draft(&db, &account, &document)
        .await
        .expect("Failed to save draft");
    db.set_status(invoice_id, InvoiceStatus::Sent)
        .await
        .expect("Failed to mark sent");

    let viewed = db
        .record_view(invoice_id)
        .await
        .unwrap()
        .expect("Missing invoice");
    assert_eq!(viewed.status, "viewed");
    assert_eq!(viewed.view_count, 1);
    assert!(viewed.viewed_at.is_some());
    let first_viewed_at = viewed.viewed_at;

    // Later views only bump the counter.
    let viewed_again = db
        .record_view(invoice_id)
        .await
        .unwrap()
        .expect("Missing invoice");
    assert_eq!(viewed_again.status, "viewed");
    assert_eq!(viewed_again.view_count, 2);
    assert_eq!(viewed_again.viewed_at, first_viewed_at);
}

#[tokio::test]
#[serial]
async fn list_invoices_returns_newest_first() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;

    let first = save::save_draft(&db, &account, &save_ready_document(&account))
        .await
        .expect("Failed to save first");
    let account = db
        .get_account(account.account_id)
        .await
        .unwrap()
        .expect("Missing account");
    let second = save::save_draft(&db, &account, &save_ready_document(&account))
        .await
        .expect("Failed to save second");

    let invoices = db
        .list_invoices(account.account_id, 20)
        .await
        .expect("Failed to list invoices");
    assert_eq!(invoices.len(), 2);
    assert_eq!(invoices[0].invoice_id, second);
    assert_eq!(invoices[1].invoice_id, first);
}

#[tokio::test]
#[serial]
async fn save_against_missing_account_rolls_back_cleanly() {
    let Some(db) = test_db().await else { return };
    let account = fresh_account(&db).await;
    let document = save_ready_document(&account);

    let mut ghost = account.clone();
    ghost.account_id = Uuid::new_v4();

    let err = save::save_draft(&db, &ghost, &document)
        .await
        .expect_err("Ghost account should not be savable");
    assert!(matches!(err, AppError::NotFound(_)));
}
