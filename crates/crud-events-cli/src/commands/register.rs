use std::sync::Arc;

use anyhow::{Context, Result};

use crud_events::{
    CrudEventsConfig, DaprBus, DescriptorKey, DescriptorStore, EventBus, Publisher,
    RegistryClient,
};

use crate::cli::{OutputFormat, RegisterArgs};
use crate::output;

pub async fn register(
    cfg: &CrudEventsConfig,
    args: &RegisterArgs,
    format: OutputFormat,
) -> Result<()> {
    let application_id = cfg.events.application_id.as_str();
    let store = DescriptorStore::new_shared();

    let mut client = RegistryClient::new(&cfg.registry, store)
        .context("Failed to create registry client")?;
    if let Some(topic) = &cfg.registry.schema_topic {
        let bus: Arc<dyn EventBus> =
            Arc::new(DaprBus::from_config(&cfg.broker).context("Invalid broker configuration")?);
        client = client.with_announcements(
            Publisher::with_client(bus),
            cfg.events.bus_name.clone(),
            topic.clone(),
        );
    }

    let descriptor = client
        .register_message(application_id, &args.package, &args.message, &args.file)
        .await
        .with_context(|| {
            format!(
                "Failed to register {}.{} from {}",
                args.package,
                args.message,
                args.file.display()
            )
        })?;

    let key = DescriptorKey::for_message(application_id, &args.package, &args.message);
    output::print_descriptor(&key, &descriptor, format);
    Ok(())
}
