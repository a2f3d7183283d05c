use stockwatch_core::{Action, EntityService, HorizontalLine, HorizontalLineFilter};
use stockwatch_warehouse::Warehouse;

use super::CommandResult;
use crate::cli::{IdArgs, LineArgs, LineCommand, LineUpdateArgs, ListingArgs};
use crate::error::CliError;

pub fn run(command: &LineCommand, warehouse: &Warehouse) -> Result<CommandResult, CliError> {
    let service = EntityService::<HorizontalLine, Warehouse>::new(warehouse.clone());
    match command {
        LineCommand::Insert(args) => {
            let outcome = service.create(&line_of(None, args));
            CommandResult::from_outcome(outcome, |stored| Action::Created.describe(stored))
        }
        LineCommand::Update(LineUpdateArgs { id, line }) => {
            let line = line_of(Some(*id), line);
            let outcome = service.modify(&line).map(|()| line);
            CommandResult::from_outcome(outcome, |stored| Action::Updated.describe(stored))
        }
        LineCommand::Delete(IdArgs { id }) => {
            let outcome = service
                .find(id)
                .and_then(|stored| service.remove(&stored).map(|()| stored));
            CommandResult::from_outcome(outcome, |removed| Action::Deleted.describe(removed))
        }
        LineCommand::Get(IdArgs { id }) => CommandResult::from_lookup(service.find(id)),
        LineCommand::List(ListingArgs { symbol, exchange }) => {
            let filter = HorizontalLineFilter {
                symbol: symbol.clone(),
                stock_exchange: *exchange,
            };
            CommandResult::from_lookup(service.list(&filter))
        }
    }
}

fn line_of(id: Option<i64>, args: &LineArgs) -> HorizontalLine {
    HorizontalLine {
        id,
        symbol: args.symbol.clone(),
        stock_exchange: args.exchange,
        price: args.price,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use stockwatch_core::{MessageType, StockExchange};

    use super::*;
    use crate::error::{EXIT_INVALID, EXIT_OK};

    #[test]
    fn moving_a_line_updates_it_once() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let line = LineArgs {
            symbol: String::from("SHOP"),
            exchange: Some(StockExchange::Tsx),
            price: Decimal::new(9_850, 2),
        };
        let created = run(&LineCommand::Insert(line), &warehouse).expect("insert");
        assert_eq!(created.result.data().expect("data")["id"], 1);

        let moved = LineUpdateArgs {
            id: 1,
            line: LineArgs {
                symbol: String::from("SHOP"),
                exchange: Some(StockExchange::Tsx),
                price: Decimal::new(101, 0),
            },
        };
        let updated = run(&LineCommand::Update(moved), &warehouse).expect("update");
        assert_eq!(updated.result.messages()[0].message_type, MessageType::Success);

        let again = LineUpdateArgs {
            id: 1,
            line: LineArgs {
                symbol: String::from("SHOP"),
                exchange: Some(StockExchange::Tsx),
                price: Decimal::new(10_100, 2),
            },
        };
        let unchanged = run(&LineCommand::Update(again), &warehouse).expect("update");
        assert_eq!(unchanged.exit_code, EXIT_OK);
        assert_eq!(unchanged.result.messages()[0].message_type, MessageType::Info);
    }

    #[test]
    fn line_without_exchange_is_invalid() {
        let warehouse = Warehouse::open_in_memory().expect("warehouse");
        let line = LineArgs {
            symbol: String::from("SHOP"),
            exchange: None,
            price: Decimal::ONE,
        };
        let outcome = run(&LineCommand::Insert(line), &warehouse).expect("insert");
        assert_eq!(outcome.exit_code, EXIT_INVALID);
    }
}
