pub mod codes_loader;
pub mod scenario_loader;

pub use codes_loader::{load_access_codes, parse_access_codes};
pub use scenario_loader::{load_scenario_store, parse_scenarios, ScenarioEntry};
