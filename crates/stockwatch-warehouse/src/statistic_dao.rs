use ::duckdb::types::Value;
use ::duckdb::{params, params_from_iter, Connection, OptionalExt, Row};
use stockwatch_core::{
    ensure_changed, Dao, Entity, PersistenceError, Statistic, StatisticFilter, StatisticKey,
    StatisticScope,
};
use tracing::{debug, info};

use crate::{parse_code, parse_date, storage, Warehouse, WarehouseError};

const TABLE: &str = "statistics";

const SELECT_COLUMNS: &str = r#"
SELECT
    CAST(stat_date AS VARCHAR), instrument_type, scope_kind, scope_id,
    number_advance, number_decline,
    number_above_sma50, number_at_or_below_sma50,
    number_above_sma200, number_at_or_below_sma200,
    advance_decline_sum
FROM statistics
"#;

const KEY_PREDICATE: &str =
    "stat_date = CAST(? AS DATE) AND instrument_type = ? AND scope_kind = ? AND scope_id = ?";

struct StatisticRow {
    date: String,
    instrument_type: String,
    scope_kind: String,
    scope_id: i64,
    counts: [i64; 7],
}

impl StatisticRow {
    fn read(row: &Row<'_>) -> Result<Self, ::duckdb::Error> {
        Ok(Self {
            date: row.get(0)?,
            instrument_type: row.get(1)?,
            scope_kind: row.get(2)?,
            scope_id: row.get(3)?,
            counts: [
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
                row.get(9)?,
                row.get(10)?,
            ],
        })
    }

    fn into_statistic(self) -> Result<Statistic, WarehouseError> {
        let reference_id = (self.scope_kind != "all").then_some(self.scope_id);
        let scope = StatisticScope::from_parts(&self.scope_kind, reference_id).ok_or_else(|| {
            WarehouseError::CorruptRow {
                table: TABLE,
                detail: format!("scope '{}:{}'", self.scope_kind, self.scope_id),
            }
        })?;
        let [advance, decline, above50, below50, above200, below200, sum] = self.counts;

        Ok(Statistic::new(
            parse_date(TABLE, &self.date)?,
            parse_code(TABLE, &self.instrument_type)?,
            scope,
        )
        .with_advances(advance, decline)
        .with_sma50(above50, below50)
        .with_sma200(above200, below200)
        .with_advance_decline_sum(sum))
    }
}

/// Key columns as bound parameters. `scope_id` is 0 for the unscoped statistic.
fn key_values(key: &StatisticKey) -> [Value; 4] {
    [
        Value::Text(key.date.to_string()),
        Value::Text(key.instrument_type.as_str().to_owned()),
        Value::Text(key.scope.kind().to_owned()),
        Value::BigInt(key.scope.reference_id().unwrap_or_default()),
    ]
}

fn select_by_key(
    connection: &Connection,
    key: &StatisticKey,
) -> Result<Option<Statistic>, PersistenceError> {
    let sql = format!("{SELECT_COLUMNS} WHERE {KEY_PREDICATE}");
    let row = connection
        .query_row(&sql, params_from_iter(key_values(key)), StatisticRow::read)
        .optional()
        .map_err(storage)?;
    Ok(row.map(StatisticRow::into_statistic).transpose()?)
}

impl Dao<Statistic> for Warehouse {
    fn insert(&self, value: &Statistic) -> Result<Statistic, PersistenceError> {
        let key = value.key_parts();
        let connection = self.connection()?;
        let [date, instrument_type, scope_kind, scope_id] = key_values(&key);
        connection
            .execute(
                r#"
INSERT INTO statistics (
    stat_date, instrument_type, scope_kind, scope_id,
    number_advance, number_decline,
    number_above_sma50, number_at_or_below_sma50,
    number_above_sma200, number_at_or_below_sma200,
    advance_decline_sum, updated_at
) VALUES (CAST(? AS DATE), ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
"#,
                params![
                    date,
                    instrument_type,
                    scope_kind,
                    scope_id,
                    value.number_advance,
                    value.number_decline,
                    value.number_above_sma50,
                    value.number_at_or_below_sma50,
                    value.number_above_sma200,
                    value.number_at_or_below_sma200,
                    value.advance_decline_sum,
                ],
            )
            .map_err(storage)?;
        debug!(%key, "statistic inserted");
        Ok(value.clone())
    }

    fn update(&self, value: &Statistic) -> Result<(), PersistenceError> {
        let key = value.key_parts();
        self.in_transaction(|connection| {
            let stored = select_by_key(connection, &key)?.ok_or_else(|| {
                info!(%key, "statistic to update was not found");
                PersistenceError::not_found(Entity::Statistic, key)
            })?;
            let changed = ensure_changed(value, &stored).inspect_err(|_| {
                info!(%key, "statistic unchanged, skipping update");
            })?;

            let [date, instrument_type, scope_kind, scope_id] = key_values(&key);
            let sql = format!(
                r#"
UPDATE statistics SET
    number_advance = ?, number_decline = ?,
    number_above_sma50 = ?, number_at_or_below_sma50 = ?,
    number_above_sma200 = ?, number_at_or_below_sma200 = ?,
    advance_decline_sum = ?, updated_at = CURRENT_TIMESTAMP
WHERE {KEY_PREDICATE}
"#
            );
            connection
                .execute(
                    &sql,
                    params![
                        value.number_advance,
                        value.number_decline,
                        value.number_above_sma50,
                        value.number_at_or_below_sma50,
                        value.number_above_sma200,
                        value.number_at_or_below_sma200,
                        value.advance_decline_sum,
                        date,
                        instrument_type,
                        scope_kind,
                        scope_id,
                    ],
                )
                .map_err(storage)?;
            debug!(%key, ?changed, "statistic updated");
            Ok(())
        })
    }

    fn delete(&self, value: &Statistic) -> Result<(), PersistenceError> {
        let key = value.key_parts();
        let connection = self.connection()?;
        let sql = format!("DELETE FROM statistics WHERE {KEY_PREDICATE}");
        let deleted = connection
            .execute(&sql, params_from_iter(key_values(&key)))
            .map_err(storage)?;
        if deleted == 0 {
            info!(%key, "statistic to delete was not found");
            return Err(PersistenceError::not_found(Entity::Statistic, key));
        }
        debug!(%key, "statistic deleted");
        Ok(())
    }

    fn get(&self, key: &StatisticKey) -> Result<Statistic, PersistenceError> {
        let connection = self.connection()?;
        select_by_key(&connection, key)?
            .ok_or_else(|| PersistenceError::not_found(Entity::Statistic, key))
    }

    fn list(&self, filter: &StatisticFilter) -> Result<Vec<Statistic>, PersistenceError> {
        let mut predicates = Vec::new();
        let mut values = Vec::new();
        if let Some(instrument_type) = filter.instrument_type {
            predicates.push("instrument_type = ?");
            values.push(Value::Text(instrument_type.as_str().to_owned()));
        }
        if let Some(scope) = filter.scope {
            predicates.push("scope_kind = ? AND scope_id = ?");
            values.push(Value::Text(scope.kind().to_owned()));
            values.push(Value::BigInt(scope.reference_id().unwrap_or_default()));
        }
        if let Some(from) = filter.from {
            predicates.push("stat_date >= CAST(? AS DATE)");
            values.push(Value::Text(from.to_string()));
        }
        if let Some(to) = filter.to {
            predicates.push("stat_date <= CAST(? AS DATE)");
            values.push(Value::Text(to.to_string()));
        }

        let mut sql = String::from(SELECT_COLUMNS);
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        sql.push_str(" ORDER BY stat_date, instrument_type, scope_kind, scope_id");

        let connection = self.connection()?;
        let mut statement = connection.prepare(&sql).map_err(storage)?;
        let rows = statement
            .query_map(params_from_iter(values), StatisticRow::read)
            .map_err(storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage)?;
        debug!(?filter, rows = rows.len(), "statistics listed");

        Ok(rows
            .into_iter()
            .map(StatisticRow::into_statistic)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
mod tests {
    use stockwatch_core::InstrumentType;
    use time::macros::date;

    use super::*;

    fn statistic(scope: StatisticScope) -> Statistic {
        Statistic::new(date!(2024 - 01 - 15), InstrumentType::Stock, scope)
            .with_advances(4, 1)
            .with_sma50(3, 2)
            .with_sma200(2, 3)
            .with_advance_decline_sum(57)
    }

    #[test]
    fn round_trips_every_scope() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        for scope in [
            StatisticScope::All,
            StatisticScope::Sector(3),
            StatisticScope::IndustryGroup(3),
        ] {
            let value = statistic(scope);
            warehouse.insert(&value).expect("insert");
            assert_eq!(
                Dao::<Statistic>::get(&warehouse, &value.key_parts()).expect("get"),
                value
            );
        }
        assert_eq!(
            Dao::<Statistic>::list(&warehouse, &StatisticFilter::default())
                .expect("list")
                .len(),
            3
        );
    }

    #[test]
    fn update_compares_against_stored_row() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let stored = statistic(StatisticScope::Sector(3));
        warehouse.insert(&stored).expect("insert");

        let err = warehouse.update(&stored).expect_err("unchanged");
        assert!(err.is_unchanged());

        let corrected = stored.clone().with_advances(5, 1);
        warehouse.update(&corrected).expect("update");
        assert_eq!(
            Dao::<Statistic>::get(&warehouse, &stored.key_parts())
                .expect("get")
                .number_advance,
            5
        );
    }

    #[test]
    fn missing_rows_are_not_found() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let ghost = statistic(StatisticScope::All);
        assert!(matches!(
            warehouse.update(&ghost),
            Err(PersistenceError::NotFound { .. })
        ));
        assert!(matches!(
            Dao::<Statistic>::delete(&warehouse, &ghost),
            Err(PersistenceError::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_key_is_a_storage_failure() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let value = statistic(StatisticScope::All);
        warehouse.insert(&value).expect("insert");
        assert!(matches!(
            warehouse.insert(&value),
            Err(PersistenceError::Storage(_))
        ));
    }

    #[test]
    fn list_filters_by_scope_and_date_range() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let january = statistic(StatisticScope::Sector(3));
        let february = Statistic {
            date: date!(2024 - 02 - 15),
            ..january.clone()
        };
        let other_sector = statistic(StatisticScope::Sector(4));
        for value in [&january, &february, &other_sector] {
            warehouse.insert(value).expect("insert");
        }

        let filter = StatisticFilter {
            scope: Some(StatisticScope::Sector(3)),
            from: Some(date!(2024 - 02 - 01)),
            ..StatisticFilter::default()
        };
        assert_eq!(
            Dao::<Statistic>::list(&warehouse, &filter).expect("list"),
            vec![february]
        );
    }
}
