use serde::Serialize;
use stockwatch_core::{
    Action, Breadth, EntityService, ServiceError, Statistic, StatisticFilter, StatisticInput,
    StatisticKey, StatisticScope,
};
use stockwatch_warehouse::Warehouse;
use tracing::debug;

use super::{read_json, CommandResult};
use crate::cli::{StatisticCommand, StatisticKeyArgs, StatisticListArgs};
use crate::error::CliError;

type StatisticService = EntityService<Statistic, Warehouse>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BreadthReport {
    key: StatisticKey,
    #[serde(flatten)]
    breadth: Breadth,
}

pub fn run(command: &StatisticCommand, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let service = StatisticService::new(warehouse.clone());
    match command {
        StatisticCommand::Insert(args) => {
            let input: StatisticInput = read_json(&args.input)?;
            let outcome = input
                .into_statistic()
                .map_err(ServiceError::from)
                .and_then(|statistic| service.create(&statistic));
            CommandResult::from_outcome(outcome, |stored| Action::Created.describe(stored))
        }
        StatisticCommand::Update(args) => {
            let input: StatisticInput = read_json(&args.input)?;
            let outcome = input
                .into_statistic()
                .map_err(ServiceError::from)
                .and_then(|statistic| service.modify(&statistic).map(|()| statistic));
            CommandResult::from_outcome(outcome, |stored| Action::Updated.describe(stored))
        }
        StatisticCommand::Delete(args) => {
            let outcome = key_of(args)
                .and_then(|key| service.find(&key))
                .and_then(|stored| service.remove(&stored).map(|()| stored));
            CommandResult::from_outcome(outcome, |removed| Action::Deleted.describe(removed))
        }
        StatisticCommand::Get(args) => {
            CommandResult::from_lookup(key_of(args).and_then(|key| service.find(&key)))
        }
        StatisticCommand::Breadth(args) => {
            let outcome = key_of(args)
                .and_then(|key| service.find(&key))
                .map(|statistic| BreadthReport {
                    key: statistic.key_parts(),
                    breadth: statistic.breadth(),
                });
            CommandResult::from_lookup(outcome)
        }
        StatisticCommand::List(args) => {
            let outcome = filter_of(args).and_then(|filter| {
                debug!(?filter, "listing statistics");
                service.list(&filter)
            });
            CommandResult::from_lookup(outcome)
        }
    }
}

fn key_of(args: &StatisticKeyArgs) -> Result<StatisticKey, ServiceError> {
    Ok(StatisticKey {
        date: args.date,
        instrument_type: args.instrument_type,
        scope: StatisticScope::from_references(args.sector, args.industry_group)?,
    })
}

fn filter_of(args: &StatisticListArgs) -> Result<StatisticFilter, ServiceError> {
    let scope = if args.unscoped {
        Some(StatisticScope::All)
    } else if args.sector.is_some() || args.industry_group.is_some() {
        Some(StatisticScope::from_references(args.sector, args.industry_group)?)
    } else {
        None
    };

    Ok(StatisticFilter {
        instrument_type: args.instrument_type,
        scope,
        from: args.from,
        to: args.to,
    })
}
