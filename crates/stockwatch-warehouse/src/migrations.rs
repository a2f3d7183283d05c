use ::duckdb::{params, Connection};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_statistics",
        sql: r#"
CREATE TABLE IF NOT EXISTS statistics (
    stat_date DATE NOT NULL,
    instrument_type TEXT NOT NULL,
    scope_kind TEXT NOT NULL,
    scope_id BIGINT NOT NULL,
    number_advance BIGINT NOT NULL,
    number_decline BIGINT NOT NULL,
    number_above_sma50 BIGINT NOT NULL,
    number_at_or_below_sma50 BIGINT NOT NULL,
    number_above_sma200 BIGINT NOT NULL,
    number_at_or_below_sma200 BIGINT NOT NULL,
    advance_decline_sum BIGINT NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY(stat_date, instrument_type, scope_kind, scope_id)
);
"#,
    },
    Migration {
        version: "0002_price_alerts",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS price_alert_ids START 1;

CREATE TABLE IF NOT EXISTS price_alerts (
    id BIGINT PRIMARY KEY,
    symbol TEXT NOT NULL,
    stock_exchange TEXT,
    alert_type TEXT,
    price TEXT NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0003_horizontal_lines",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS horizontal_line_ids START 1;

CREATE TABLE IF NOT EXISTS horizontal_lines (
    id BIGINT PRIMARY KEY,
    symbol TEXT NOT NULL,
    stock_exchange TEXT,
    price TEXT NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0004_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_price_alerts_symbol ON price_alerts(symbol, stock_exchange);
CREATE INDEX IF NOT EXISTS idx_horizontal_lines_symbol ON horizontal_lines(symbol, stock_exchange);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            tracing::debug!(version = migration.version, "applying migration");
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params![migration.version],
            )?;
        }
    }

    Ok(())
}

pub fn applied_versions(connection: &Connection) -> Result<Vec<String>, ::duckdb::Error> {
    let mut statement =
        connection.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let rows = statement.query_map([], |row| row.get(0))?;
    rows.collect()
}
