use crate::db::models::{Account, ProfileRecord, SaveOutcome, Session};
use crate::db::schema::SQLITE_INIT;
use crate::error::ProfileError;
use crate::service::ports::ProfileStore;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database and apply the bundled DDL.
pub async fn connect(database_url: &str) -> Result<SqlitePool, ProfileError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), ProfileError> {
    // sqlx::query runs one statement at a time
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ProfileError> {
    let ts = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
        .with_timezone(&Utc);
    Ok(ts)
}

/// Translate unique-index violations on `accounts` into domain errors.
fn map_account_conflict(e: sqlx::Error) -> ProfileError {
    if let sqlx::Error::Database(db) = &e
        && (db.is_unique_violation() || db.message().starts_with("UNIQUE constraint failed"))
    {
        let msg = db.message();
        if msg.contains("accounts.nickname") {
            return ProfileError::NicknameTaken;
        }
        if msg.contains("accounts.email") {
            return ProfileError::EmailTaken;
        }
    }
    e.into()
}

#[derive(Clone)]
pub struct AccountsStorage {
    pool: SqlitePool,
}

impl AccountsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, account: &Account) -> Result<(), ProfileError> {
        sqlx::query(
            r#"INSERT INTO accounts (email, nickname, password_hash, created_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(&account.email)
        .bind(&account.nickname)
        .bind(&account.password_hash)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_account_conflict)?;
        Ok(())
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>, ProfileError> {
        let row = sqlx::query(
            r#"SELECT email, nickname, password_hash, created_at
               FROM accounts WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_account).transpose()
    }

    pub async fn nickname_exists(&self, nickname: &str) -> Result<bool, ProfileError> {
        let rec: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM accounts WHERE nickname = ?")
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.is_some())
    }

    /// Single-column write; a concurrent password change is left intact.
    /// The nickname UNIQUE index turns a lost race into `NicknameTaken`.
    pub async fn update_nickname(&self, email: &str, nickname: &str) -> Result<(), ProfileError> {
        let done = sqlx::query("UPDATE accounts SET nickname = ? WHERE email = ?")
            .bind(nickname)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(map_account_conflict)?;

        if done.rows_affected() == 0 {
            return Err(ProfileError::AccountNotFound(email.to_string()));
        }
        Ok(())
    }

    pub async fn update_password_hash(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<(), ProfileError> {
        let done = sqlx::query("UPDATE accounts SET password_hash = ? WHERE email = ?")
            .bind(password_hash)
            .bind(email)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(ProfileError::AccountNotFound(email.to_string()));
        }
        Ok(())
    }

    pub async fn insert_session(&self, session: &Session) -> Result<(), ProfileError> {
        sqlx::query(
            r#"INSERT INTO sessions (token, email, created_at, expires_at)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(&session.token)
        .bind(&session.email)
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<Session>, ProfileError> {
        let row = sqlx::query(
            r#"SELECT token, email, created_at, expires_at
               FROM sessions WHERE token = ?"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_session).transpose()
    }

    pub async fn delete_session(&self, token: &str) -> Result<(), ProfileError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_account(row: SqliteRow) -> Result<Account, ProfileError> {
        let created_at: String = row.try_get("created_at")?;
        Ok(Account {
            email: row.try_get("email")?,
            nickname: row.try_get("nickname")?,
            password_hash: row.try_get("password_hash")?,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    fn row_to_session(row: SqliteRow) -> Result<Session, ProfileError> {
        let created_at: String = row.try_get("created_at")?;
        let expires_at: String = row.try_get("expires_at")?;
        Ok(Session {
            token: row.try_get("token")?,
            email: row.try_get("email")?,
            created_at: parse_timestamp(&created_at)?,
            expires_at: parse_timestamp(&expires_at)?,
        })
    }
}

#[derive(Clone)]
pub struct ProfilesStorage {
    pool: SqlitePool,
}

impl ProfilesStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<ProfileRecord>, ProfileError> {
        let row = sqlx::query(
            r#"SELECT email, url, version, updated_at
               FROM profiles WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_model).transpose()
    }

    /// Insert or overwrite inside one transaction, reporting the URL an
    /// overwrite replaced so the caller can drop the stale file.
    pub async fn upsert(&self, record: &ProfileRecord) -> Result<SaveOutcome, ProfileError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(String,)> =
            sqlx::query_as("SELECT url FROM profiles WHERE email = ?")
                .bind(&record.email)
                .fetch_optional(&mut *tx)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO profiles (email, url, version, updated_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT(email) DO UPDATE SET
                url = excluded.url,
                version = profiles.version + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.email)
        .bind(&record.url)
        .bind(record.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(match previous {
            None => SaveOutcome::Created,
            Some((previous_url,)) => SaveOutcome::Updated { previous_url },
        })
    }

    fn row_to_model(row: SqliteRow) -> Result<ProfileRecord, ProfileError> {
        let updated_at: String = row.try_get("updated_at")?;
        Ok(ProfileRecord {
            email: row.try_get("email")?,
            url: row.try_get("url")?,
            version: row.try_get("version")?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }
}

impl ProfileStore for ProfilesStorage {
    async fn find_by_email(&self, email: &str) -> Result<Option<ProfileRecord>, ProfileError> {
        ProfilesStorage::find_by_email(self, email).await
    }

    async fn save(&self, record: &ProfileRecord) -> Result<SaveOutcome, ProfileError> {
        self.upsert(record).await
    }
}
