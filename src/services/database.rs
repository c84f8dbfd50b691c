//! Persistence gateway for invoice-core.
//!
//! Committing a new invoice and advancing the owning account's sequence
//! counter happen inside one transaction. The counter update takes the
//! account row lock, so two saves racing on the same account serialize and
//! cannot hand out the same invoice number or leave an orphaned record.

use crate::error::AppError;
use crate::models::{Account, InvoiceDocument, InvoiceRecord, InvoiceStatus};
use crate::services::metrics::{DB_QUERY_DURATION, INVOICES_TOTAL};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const INVOICE_COLUMNS: &str = "invoice_id, user_id, client_id, client_name, client_email, client_address, \
     invoice_number, issue_date, due_date, items, subtotal, discount_percent, discount_amount, \
     tax_rate, tax_amount, total, notes, template_id, status, view_count, viewed_at, created_at, updated_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Account Operations
    // -------------------------------------------------------------------------

    /// Create a business account with stock defaults.
    #[instrument(skip(self), fields(business_email = %business_email))]
    pub async fn create_account(
        &self,
        business_name: &str,
        business_email: &str,
        invoice_prefix: &str,
    ) -> Result<Account, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_account"])
            .start_timer();

        let account_id = Uuid::new_v4();
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (account_id, business_name, business_email, invoice_prefix)
            VALUES ($1, $2, $3, $4)
            RETURNING account_id, business_name, business_email, business_phone, business_address,
                invoice_prefix, currency, tax_rate, default_notes, plan,
                invoices_this_month, next_invoice_number, logo_url, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(business_name)
        .bind(business_email)
        .bind(invoice_prefix)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Account '{}' already exists",
                    business_email
                ))
            }
            _ => AppError::Database(anyhow::anyhow!("Failed to create account: {}", e)),
        })?;

        timer.observe_duration();

        info!(account_id = %account.account_id, "Account created");

        Ok(account)
    }

    /// Get an account by ID.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_account"])
            .start_timer();

        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, business_name, business_email, business_phone, business_address,
                invoice_prefix, currency, tax_rate, default_notes, plan,
                invoices_this_month, next_invoice_number, logo_url, created_at, updated_at
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to get account: {}", e)))?;

        timer.observe_duration();

        Ok(account)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Commit a validated document as a new draft record and advance the
    /// account's invoice sequence, all in one transaction.
    ///
    /// The sequence claim runs first and takes the account row lock, so
    /// concurrent saves for the same account serialize: each commit gets its
    /// own number, and a failed insert rolls the claim back with it. The
    /// number stamped on the record is the claimed one, which may differ
    /// from the preview number seeded onto the draft if another save landed
    /// since the session started.
    ///
    /// Quota is not checked here; that is the calling workflow's job.
    #[instrument(skip(self, document), fields(account_id = %account_id))]
    pub async fn create_invoice(
        &self,
        account_id: Uuid,
        document: &InvoiceDocument,
    ) -> Result<Uuid, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let client_id = document.client_id.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Document has no client selected"))
        })?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to begin save: {}", e)))?;

        let claimed: Option<(i64, String)> = sqlx::query_as(
            r#"
            UPDATE accounts
            SET next_invoice_number = next_invoice_number + 1,
                invoices_this_month = invoices_this_month + 1,
                updated_at = NOW()
            WHERE account_id = $1
            RETURNING next_invoice_number - 1, invoice_prefix
            "#,
        )
        .bind(account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::Database(anyhow::anyhow!("Failed to advance invoice sequence: {}", e))
        })?;

        let Some((sequence, prefix)) = claimed else {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Account {} not found",
                account_id
            )));
        };
        let invoice_number = crate::calc::invoice_number(&prefix, sequence);

        let invoice_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, user_id, client_id, client_name, client_email, client_address,
                invoice_number, issue_date, due_date, items, subtotal, discount_percent,
                discount_amount, tax_rate, tax_amount, total, notes, template_id, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, 'draft')
            "#,
        )
        .bind(invoice_id)
        .bind(account_id)
        .bind(client_id)
        .bind(&document.client_name)
        .bind(&document.client_email)
        .bind(&document.client_address)
        .bind(&invoice_number)
        .bind(document.issue_date)
        .bind(document.due_date)
        .bind(Json(&document.items))
        .bind(document.subtotal)
        .bind(document.discount_percent)
        .bind(document.discount_amount)
        .bind(document.tax_rate)
        .bind(document.tax_amount)
        .bind(document.total)
        .bind(&document.notes)
        .bind(document.template_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to commit save: {}", e)))?;

        timer.observe_duration();
        INVOICES_TOTAL.with_label_values(&["draft"]).inc();

        info!(
            invoice_id = %invoice_id,
            invoice_number = %invoice_number,
            "Draft invoice created"
        );

        Ok(invoice_id)
    }

    /// Overwrite an existing record's fields and refresh its update
    /// timestamp. Never touches the account counters.
    #[instrument(skip(self, document), fields(invoice_id = %invoice_id))]
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        document: &InvoiceDocument,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let client_id = document.client_id.ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Document has no client selected"))
        })?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = $2,
                client_name = $3,
                client_email = $4,
                client_address = $5,
                invoice_number = $6,
                issue_date = $7,
                due_date = $8,
                items = $9,
                subtotal = $10,
                discount_percent = $11,
                discount_amount = $12,
                tax_rate = $13,
                tax_amount = $14,
                total = $15,
                notes = $16,
                template_id = $17,
                status = $18,
                updated_at = NOW()
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(client_id)
        .bind(&document.client_name)
        .bind(&document.client_email)
        .bind(&document.client_address)
        .bind(&document.invoice_number)
        .bind(document.issue_date)
        .bind(document.due_date)
        .bind(Json(&document.items))
        .bind(document.subtotal)
        .bind(document.discount_percent)
        .bind(document.discount_amount)
        .bind(document.tax_rate)
        .bind(document.tax_amount)
        .bind(document.total)
        .bind(&document.notes)
        .bind(document.template_id.as_str())
        .bind(document.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to update invoice: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Invoice {} not found",
                invoice_id
            )));
        }

        info!(invoice_id = %invoice_id, "Invoice updated");

        Ok(())
    }

    /// Get an invoice record by ID.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<InvoiceRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, InvoiceRecord>(&format!(
            "SELECT {} FROM invoices WHERE invoice_id = $1",
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    /// List an account's invoices, newest first.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn list_invoices(
        &self,
        account_id: Uuid,
        page_size: i32,
    ) -> Result<Vec<InvoiceRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let limit = page_size.clamp(1, 100) as i64;
        let invoices = sqlx::query_as::<_, InvoiceRecord>(&format!(
            "SELECT {} FROM invoices WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            INVOICE_COLUMNS
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Count a view of the delivered invoice. The first view of a `sent`
    /// invoice flips it to `viewed` and stamps the view time; later views
    /// only bump the counter.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn record_view(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceRecord>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_view"])
            .start_timer();

        let invoice = sqlx::query_as::<_, InvoiceRecord>(&format!(
            r#"
            UPDATE invoices
            SET view_count = view_count + 1,
                viewed_at = CASE WHEN status = 'sent' THEN NOW() ELSE viewed_at END,
                status = CASE WHEN status = 'sent' THEN 'viewed' ELSE status END
            WHERE invoice_id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to record view: {}", e)))?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            if inv.status == "viewed" && inv.view_count == 1 {
                INVOICES_TOTAL.with_label_values(&["viewed"]).inc();
            }
        }

        Ok(invoice)
    }

    /// Move an invoice to a new lifecycle status.
    #[instrument(skip(self), fields(invoice_id = %invoice_id, status = status.as_str()))]
    pub async fn set_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_status"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2,
                updated_at = NOW()
            WHERE invoice_id = $1
            "#,
        )
        .bind(invoice_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow::anyhow!("Failed to set status: {}", e)))?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Invoice {} not found",
                invoice_id
            )));
        }

        INVOICES_TOTAL.with_label_values(&[status.as_str()]).inc();
        info!(invoice_id = %invoice_id, status = status.as_str(), "Invoice status changed");

        Ok(())
    }
}
