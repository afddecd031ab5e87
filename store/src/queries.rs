//! SQL statements for the SQLite store.

pub const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    email         TEXT    NOT NULL UNIQUE,
    role          TEXT    NOT NULL DEFAULT 'student' CHECK (role IN ('student', 'staff', 'admin')),
    full_name     TEXT    NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    last_login    TEXT,
    created_at    TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

pub const CREATE_TRANSACTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id          INTEGER NOT NULL REFERENCES users(id),
    amount           INTEGER NOT NULL CHECK (amount > 0),
    type             TEXT    NOT NULL CHECK (type IN ('income', 'expense')),
    category         TEXT    NOT NULL,
    description      TEXT    NOT NULL DEFAULT '',
    transaction_date TEXT    NOT NULL,
    created_at       TEXT    NOT NULL
)
"#;

pub const CREATE_TRANSACTIONS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transactions_user_date
    ON transactions(user_id, transaction_date)
"#;

pub const FIND_ACTIVE_USER_BY_USERNAME: &str = r#"
SELECT id, username, email, full_name, password_hash, role, is_active, last_login
FROM users
WHERE username = ? AND is_active = 1
"#;

pub const IS_USER_ACTIVE: &str = r#"
SELECT is_active FROM users WHERE id = ?
"#;

pub const UPDATE_LAST_LOGIN: &str = r#"
UPDATE users SET last_login = ? WHERE id = ?
"#;

pub const INSERT_USER: &str = r#"
INSERT INTO users (username, password_hash, email, role, full_name, is_active)
VALUES (?, ?, ?, ?, ?, ?)
"#;

pub const USERNAME_OR_EMAIL_EXISTS: &str = r#"
SELECT 1 FROM users WHERE username = ? OR email = ? LIMIT 1
"#;

pub const SET_USER_ACTIVE: &str = r#"
UPDATE users SET is_active = ? WHERE username = ?
"#;

/// Binds: user_id, from, from, to, to, limit, offset. A negative limit means no limit.
pub const LIST_TRANSACTIONS: &str = r#"
SELECT id, user_id, amount, type, category, description, transaction_date, created_at
FROM transactions
WHERE user_id = ?
  AND (? IS NULL OR transaction_date >= ?)
  AND (? IS NULL OR transaction_date <= ?)
ORDER BY transaction_date DESC, created_at DESC, id DESC
LIMIT ? OFFSET ?
"#;

pub const GET_TRANSACTION: &str = r#"
SELECT id, user_id, amount, type, category, description, transaction_date, created_at
FROM transactions
WHERE id = ? AND user_id = ?
"#;

pub const INSERT_TRANSACTION: &str = r#"
INSERT INTO transactions (user_id, amount, type, category, description, transaction_date, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

pub const UPDATE_TRANSACTION: &str = r#"
UPDATE transactions
SET amount = ?, type = ?, category = ?, description = ?, transaction_date = ?
WHERE id = ? AND user_id = ?
"#;

pub const DELETE_TRANSACTION: &str = r#"
DELETE FROM transactions WHERE id = ? AND user_id = ?
"#;

/// Binds: user_id, from, from, to, to.
pub const TRANSACTION_STATS: &str = r#"
SELECT
    COALESCE(SUM(CASE WHEN type = 'income'  THEN amount ELSE 0 END), 0) AS total_income,
    COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0) AS total_expense
FROM transactions
WHERE user_id = ?
  AND (? IS NULL OR transaction_date >= ?)
  AND (? IS NULL OR transaction_date <= ?)
"#;

/// Binds: user_id, type, from, from, to, to.
pub const CATEGORY_TOTALS: &str = r#"
SELECT category, SUM(amount) AS total
FROM transactions
WHERE user_id = ? AND type = ?
  AND (? IS NULL OR transaction_date >= ?)
  AND (? IS NULL OR transaction_date <= ?)
GROUP BY category
ORDER BY total DESC, category ASC
"#;
