use colored::Colorize;
use serde_json::json;

use crud_events::{CrudEventsConfig, DescriptorKey, MessageDescriptor};

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_descriptor(key: &DescriptorKey, descriptor: &MessageDescriptor, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "key": key,
                "message_id": descriptor.message_id,
                "message_reference": descriptor.message_reference,
                "version": descriptor.version,
            });
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        OutputFormat::Text => {
            print_success(&format!("Registered {key}"));
            println!("{}: {}", "Message ID".cyan(), descriptor.message_id);
            println!("{}: {}", "Reference".cyan(), descriptor.message_reference);
            println!("{}: {}", "Version".cyan(), descriptor.version);
        }
    }
}

pub fn print_config(cfg: &CrudEventsConfig, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(cfg).unwrap_or_default());
        }
        OutputFormat::Text => {
            let or_unset = |s: &str| {
                if s.is_empty() {
                    "(not set)".to_string()
                } else {
                    s.to_string()
                }
            };
            println!("{}: {}", "Application".cyan(), or_unset(&cfg.events.application_id));
            println!("{}: {}", "Bus".cyan(), cfg.events.bus_name);
            println!("{}: {}", "Topic".cyan(), cfg.events.topic);
            println!(
                "{}: {}",
                "Only successful".cyan(),
                cfg.events.handle_only_successful
            );
            println!("{}: {:?}", "Dispatch".cyan(), cfg.events.dispatch);
            println!("{}: {}", "Registry".cyan(), or_unset(&cfg.registry.address));
            println!("{}: ${}", "Registry token".cyan(), cfg.registry.token_env);
            println!(
                "{}: {}",
                "Schema topic".cyan(),
                cfg.registry.schema_topic.as_deref().unwrap_or("(not set)")
            );
            println!("{}: {}", "Dapr".cyan(), cfg.broker.dapr_url);
            println!("{}: {}", "Log level".cyan(), cfg.logging.level);
        }
    }
}
