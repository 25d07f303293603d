use crud_events::CrudEventsConfig;

use crate::cli::OutputFormat;
use crate::output;

pub fn show(cfg: &CrudEventsConfig, format: OutputFormat) {
    output::print_config(cfg, format);
}
