//! Command execution
//!
//! Every argument is checked (output format, filter, host data) before the
//! store is opened, so bad input never costs a round trip.

use std::slice;

use eyre::Result;
use hostinv_core::{AttributeValue, Attributes, Filter, HostRecord, parse_host_data};
use hostinv_format::{FormatRequest, FormatterRegistry, OutputFormatter};
use hostinv_store::{HostStore, Inventory};
use tracing::debug;

use crate::cli::Commands;

/// A command with its arguments parsed and validated
#[derive(Debug)]
enum Action {
    Create {
        host: String,
        attributes: Attributes,
    },
    Update {
        host: String,
        field: String,
        value: AttributeValue,
    },
    Unset {
        host: String,
        field: String,
    },
    Remove {
        host: String,
    },
    Show {
        host: String,
        fields: Option<Vec<String>>,
    },
    List {
        filter: Option<Filter>,
        fields: Option<Vec<String>>,
    },
}

impl Action {
    fn prepare(command: Commands) -> Result<Self> {
        let action = match command {
            Commands::Create { host, data } => Action::Create {
                host,
                attributes: parse_host_data(&data.join(" "))?,
            },
            Commands::Update {
                host,
                field,
                value,
                string,
            } => Action::Update {
                host,
                field,
                value: if string {
                    AttributeValue::String(value)
                } else {
                    AttributeValue::infer(&value)
                },
            },
            Commands::Unset { host, field } => Action::Unset { host, field },
            Commands::Remove { host } => Action::Remove { host },
            Commands::Show { host, fields } => Action::Show { host, fields },
            Commands::List { filter, fields } => Action::List {
                filter: filter.as_deref().map(Filter::compile).transpose()?,
                fields,
            },
        };
        Ok(action)
    }

    async fn execute<S: HostStore>(
        self,
        inventory: &Inventory<S>,
        formatter: &dyn OutputFormatter,
    ) -> Result<String> {
        match self {
            Action::Create { host, attributes } => {
                inventory.create_host(&host, attributes).await?;
                Ok(String::new())
            }
            Action::Update { host, field, value } => {
                inventory.update_field(&host, &field, value).await?;
                Ok(String::new())
            }
            Action::Unset { host, field } => {
                inventory.unset_field(&host, &field).await?;
                Ok(String::new())
            }
            Action::Remove { host } => {
                inventory.remove_host(&host).await?;
                Ok(String::new())
            }
            Action::Show { host, fields } => {
                let record = inventory.show_host(&host).await?;
                render(formatter, slice::from_ref(&record), fields)
            }
            Action::List { filter, fields } => {
                let hosts = inventory.list_hosts(filter.as_ref()).await?;
                render(formatter, &hosts, fields)
            }
        }
    }
}

fn render(
    formatter: &dyn OutputFormatter,
    hosts: &[HostRecord],
    fields: Option<Vec<String>>,
) -> Result<String> {
    let mut request = FormatRequest::new(hosts);
    if let Some(fields) = fields {
        request = request.with_fields(fields);
    }
    debug!(format = formatter.name(), hosts = hosts.len(), "rendering");
    Ok(formatter.format(&request)?)
}

/// Run `command`, returning what should be written to stdout
///
/// `open` is called only after the format, filter and host data have been
/// validated. The store it returns lives until the command finishes.
///
/// # Errors
/// Returns the first validation, store or formatting error.
pub async fn run<S, F>(
    command: Commands,
    registry: &FormatterRegistry,
    format: &str,
    open: F,
) -> Result<String>
where
    S: HostStore,
    F: FnOnce() -> Result<S>,
{
    let formatter = registry.get(format)?;
    let action = Action::prepare(command)?;

    let inventory = Inventory::new(open()?);
    debug!(store = inventory.store().store_type(), "store opened");
    action.execute(&inventory, formatter).await
}
