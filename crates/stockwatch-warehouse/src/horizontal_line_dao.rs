use ::duckdb::types::Value;
use ::duckdb::{params, params_from_iter, Connection, OptionalExt, Row};
use stockwatch_core::{
    ensure_changed, Dao, Entity, HorizontalLine, HorizontalLineFilter, PersistenceError,
};
use tracing::{debug, info};

use crate::{parse_optional_code, parse_price, storage, Warehouse, WarehouseError};

const TABLE: &str = "horizontal_lines";

const SELECT_COLUMNS: &str = "SELECT id, symbol, stock_exchange, price FROM horizontal_lines";

struct HorizontalLineRow {
    id: i64,
    symbol: String,
    stock_exchange: Option<String>,
    price: String,
}

impl HorizontalLineRow {
    fn read(row: &Row<'_>) -> Result<Self, ::duckdb::Error> {
        Ok(Self {
            id: row.get(0)?,
            symbol: row.get(1)?,
            stock_exchange: row.get(2)?,
            price: row.get(3)?,
        })
    }

    fn into_line(self) -> Result<HorizontalLine, WarehouseError> {
        Ok(HorizontalLine {
            id: Some(self.id),
            symbol: self.symbol,
            stock_exchange: parse_optional_code(TABLE, self.stock_exchange.as_deref())?,
            price: parse_price(TABLE, &self.price)?,
        })
    }
}

fn select_by_id(
    connection: &Connection,
    id: i64,
) -> Result<Option<HorizontalLine>, PersistenceError> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = connection
        .query_row(&sql, params![id], HorizontalLineRow::read)
        .optional()
        .map_err(storage)?;
    Ok(row.map(HorizontalLineRow::into_line).transpose()?)
}

fn required_id(value: &HorizontalLine) -> Result<i64, PersistenceError> {
    value.id.ok_or(PersistenceError::MissingKey {
        entity: Entity::HorizontalLine,
    })
}

impl Dao<HorizontalLine> for Warehouse {
    fn insert(&self, value: &HorizontalLine) -> Result<HorizontalLine, PersistenceError> {
        let connection = self.connection()?;
        let id: i64 = connection
            .query_row("SELECT nextval('horizontal_line_ids')", [], |row| row.get(0))
            .map_err(storage)?;
        connection
            .execute(
                r#"
INSERT INTO horizontal_lines (id, symbol, stock_exchange, price, updated_at)
VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
"#,
                params![
                    id,
                    value.symbol,
                    value.stock_exchange.map(|exchange| exchange.as_str()),
                    value.price.to_string(),
                ],
            )
            .map_err(storage)?;
        debug!(id, symbol = %value.symbol, "horizontal line inserted");

        Ok(HorizontalLine {
            id: Some(id),
            ..value.clone()
        })
    }

    fn update(&self, value: &HorizontalLine) -> Result<(), PersistenceError> {
        let id = required_id(value)?;
        self.in_transaction(|connection| {
            let stored = select_by_id(connection, id)?.ok_or_else(|| {
                info!(id, "horizontal line to update was not found");
                PersistenceError::not_found(Entity::HorizontalLine, id)
            })?;
            let changed = ensure_changed(value, &stored).inspect_err(|_| {
                info!(id, "horizontal line unchanged, skipping update");
            })?;

            connection
                .execute(
                    r#"
UPDATE horizontal_lines SET
    symbol = ?, stock_exchange = ?, price = ?, updated_at = CURRENT_TIMESTAMP
WHERE id = ?
"#,
                    params![
                        value.symbol,
                        value.stock_exchange.map(|exchange| exchange.as_str()),
                        value.price.to_string(),
                        id,
                    ],
                )
                .map_err(storage)?;
            debug!(id, ?changed, "horizontal line updated");
            Ok(())
        })
    }

    fn delete(&self, value: &HorizontalLine) -> Result<(), PersistenceError> {
        let id = required_id(value)?;
        let connection = self.connection()?;
        let deleted = connection
            .execute("DELETE FROM horizontal_lines WHERE id = ?", params![id])
            .map_err(storage)?;
        if deleted == 0 {
            info!(id, "horizontal line to delete was not found");
            return Err(PersistenceError::not_found(Entity::HorizontalLine, id));
        }
        debug!(id, "horizontal line deleted");
        Ok(())
    }

    fn get(&self, id: &i64) -> Result<HorizontalLine, PersistenceError> {
        let connection = self.connection()?;
        select_by_id(&connection, *id)?
            .ok_or_else(|| PersistenceError::not_found(Entity::HorizontalLine, id))
    }

    fn list(&self, filter: &HorizontalLineFilter) -> Result<Vec<HorizontalLine>, PersistenceError> {
        let mut predicates = Vec::new();
        let mut values = Vec::new();
        if let Some(symbol) = &filter.symbol {
            predicates.push("upper(symbol) = upper(?)");
            values.push(Value::Text(symbol.clone()));
        }
        if let Some(exchange) = filter.stock_exchange {
            predicates.push("stock_exchange = ?");
            values.push(Value::Text(exchange.as_str().to_owned()));
        }

        let mut sql = String::from(SELECT_COLUMNS);
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let connection = self.connection()?;
        let mut statement = connection.prepare(&sql).map_err(storage)?;
        let rows = statement
            .query_map(params_from_iter(values), HorizontalLineRow::read)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        debug!(?filter, rows = rows.len(), "horizontal lines listed");

        Ok(rows
            .into_iter()
            .map(HorizontalLineRow::into_line)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
