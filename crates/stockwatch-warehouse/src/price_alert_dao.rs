use ::duckdb::types::Value;
use ::duckdb::{params, params_from_iter, Connection, OptionalExt, Row};
use stockwatch_core::{ensure_changed, Dao, Entity, PersistenceError, PriceAlert, PriceAlertFilter};
use tracing::{debug, info};

use crate::{parse_optional_code, parse_price, storage, Warehouse, WarehouseError};

const TABLE: &str = "price_alerts";

const SELECT_COLUMNS: &str =
    "SELECT id, symbol, stock_exchange, alert_type, price FROM price_alerts";

struct PriceAlertRow {
    id: i64,
    symbol: String,
    stock_exchange: Option<String>,
    alert_type: Option<String>,
    price: String,
}

impl PriceAlertRow {
    fn read(row: &Row<'_>) -> Result<Self, ::duckdb::Error> {
        Ok(Self {
            id: row.get(0)?,
            symbol: row.get(1)?,
            stock_exchange: row.get(2)?,
            alert_type: row.get(3)?,
            price: row.get(4)?,
        })
    }

    fn into_alert(self) -> Result<PriceAlert, WarehouseError> {
        Ok(PriceAlert {
            id: Some(self.id),
            symbol: self.symbol,
            stock_exchange: parse_optional_code(TABLE, self.stock_exchange.as_deref())?,
            alert_type: parse_optional_code(TABLE, self.alert_type.as_deref())?,
            price: parse_price(TABLE, &self.price)?,
        })
    }
}

fn select_by_id(connection: &Connection, id: i64) -> Result<Option<PriceAlert>, PersistenceError> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = connection
        .query_row(&sql, params![id], PriceAlertRow::read)
        .optional()
        .map_err(storage)?;
    Ok(row.map(PriceAlertRow::into_alert).transpose()?)
}

fn required_id(value: &PriceAlert) -> Result<i64, PersistenceError> {
    value.id.ok_or(PersistenceError::MissingKey {
        entity: Entity::PriceAlert,
    })
}

impl Dao<PriceAlert> for Warehouse {
    fn insert(&self, value: &PriceAlert) -> Result<PriceAlert, PersistenceError> {
        let connection = self.connection()?;
        let id: i64 = connection
            .query_row("SELECT nextval('price_alert_ids')", [], |row| row.get(0))
            .map_err(storage)?;
        connection
            .execute(
                r#"
INSERT INTO price_alerts (id, symbol, stock_exchange, alert_type, price, updated_at)
VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
"#,
                params![
                    id,
                    value.symbol,
                    value.stock_exchange.map(|exchange| exchange.as_str()),
                    value.alert_type.map(|alert_type| alert_type.as_str()),
                    value.price.to_string(),
                ],
            )
            .map_err(storage)?;
        debug!(id, symbol = %value.symbol, "price alert inserted");

        Ok(PriceAlert {
            id: Some(id),
            ..value.clone()
        })
    }

    fn update(&self, value: &PriceAlert) -> Result<(), PersistenceError> {
        let id = required_id(value)?;
        self.in_transaction(|connection| {
            let stored = select_by_id(connection, id)?.ok_or_else(|| {
                info!(id, "price alert to update was not found");
                PersistenceError::not_found(Entity::PriceAlert, id)
            })?;
            let changed = ensure_changed(value, &stored).inspect_err(|_| {
                info!(id, "price alert unchanged, skipping update");
            })?;

            connection
                .execute(
                    r#"
UPDATE price_alerts SET
    symbol = ?, stock_exchange = ?, alert_type = ?, price = ?, updated_at = CURRENT_TIMESTAMP
WHERE id = ?
"#,
                    params![
                        value.symbol,
                        value.stock_exchange.map(|exchange| exchange.as_str()),
                        value.alert_type.map(|alert_type| alert_type.as_str()),
                        value.price.to_string(),
                        id,
                    ],
                )
                .map_err(storage)?;
            debug!(id, ?changed, "price alert updated");
            Ok(())
        })
    }

    fn delete(&self, value: &PriceAlert) -> Result<(), PersistenceError> {
        let id = required_id(value)?;
        let connection = self.connection()?;
        let deleted = connection
            .execute("DELETE FROM price_alerts WHERE id = ?", params![id])
            .map_err(storage)?;
        if deleted == 0 {
            info!(id, "price alert to delete was not found");
            return Err(PersistenceError::not_found(Entity::PriceAlert, id));
        }
        debug!(id, "price alert deleted");
        Ok(())
    }

    fn get(&self, id: &i64) -> Result<PriceAlert, PersistenceError> {
        let connection = self.connection()?;
        select_by_id(&connection, *id)?
            .ok_or_else(|| PersistenceError::not_found(Entity::PriceAlert, id))
    }

    fn list(&self, filter: &PriceAlertFilter) -> Result<Vec<PriceAlert>, PersistenceError> {
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
            .query_map(params_from_iter(values), PriceAlertRow::read)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        debug!(?filter, rows = rows.len(), "price alerts listed");

        Ok(rows
            .into_iter()
            .map(PriceAlertRow::into_alert)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use stockwatch_core::{AlertType, StockExchange};

    use super::*;

    fn alert(symbol: &str, exchange: StockExchange) -> PriceAlert {
        PriceAlert::new(
            symbol,
            exchange,
            AlertType::GreaterOrEqual,
            Decimal::new(12_345, 3),
        )
    }

    #[test]
    fn insert_assigns_ids_from_sequence() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let first = warehouse.insert(&alert("RY", StockExchange::Tsx)).expect("insert");
        let second = warehouse.insert(&alert("TD", StockExchange::Tsx)).expect("insert");
        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
    }

    #[test]
    fn insert_replaces_caller_supplied_id() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let explicit = PriceAlert {
            id: Some(1),
            ..alert("RY", StockExchange::Tsx)
        };
        let first = warehouse.insert(&explicit).expect("explicit id");
        let second = warehouse.insert(&alert("TD", StockExchange::Tsx)).expect("generated id");

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert_eq!(
            Dao::<PriceAlert>::list(&warehouse, &Default::default())
                .expect("list")
                .len(),
            2
        );
    }

    #[test]
    fn keeps_price_scale() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let stored = warehouse.insert(&alert("ABC", StockExchange::Tsxv)).expect("insert");
        let loaded = Dao::<PriceAlert>::get(&warehouse, &1).expect("get");
        assert_eq!(loaded, stored);
        assert_eq!(loaded.price.to_string(), "12.345");
    }

    #[test]
    fn update_writes_only_changed_alerts() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let stored = warehouse.insert(&alert("RY", StockExchange::Tsx)).expect("insert");
        assert!(warehouse.update(&stored).expect_err("unchanged").is_unchanged());

        let lowered = PriceAlert {
            alert_type: Some(AlertType::LessOrEqual),
            ..stored.clone()
        };
        warehouse.update(&lowered).expect("update");
        assert_eq!(
            Dao::<PriceAlert>::get(&warehouse, &1).expect("get").alert_type,
            Some(AlertType::LessOrEqual)
        );
    }

    #[test]
    fn delete_twice_reports_not_found() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let stored = warehouse.insert(&alert("RY", StockExchange::Tsx)).expect("insert");
        Dao::<PriceAlert>::delete(&warehouse, &stored).expect("delete");
        assert!(matches!(
            Dao::<PriceAlert>::delete(&warehouse, &stored),
            Err(PersistenceError::NotFound { .. })
        ));
        assert!(matches!(
            Dao::<PriceAlert>::delete(&warehouse, &alert("RY", StockExchange::Tsx)),
            Err(PersistenceError::MissingKey { .. })
        ));
    }

    #[test]
    fn list_matches_symbol_case_insensitively() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        warehouse.insert(&alert("RY", StockExchange::Tsx)).expect("insert");
        warehouse.insert(&alert("RY", StockExchange::Nyse)).expect("insert");
        warehouse.insert(&alert("TD", StockExchange::Tsx)).expect("insert");

        let filter = PriceAlertFilter {
            symbol: Some(String::from("ry")),
            stock_exchange: Some(StockExchange::Nyse),
        };
        let alerts = Dao::<PriceAlert>::list(&warehouse, &filter).expect("list");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, Some(2));
    }
}
