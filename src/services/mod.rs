pub mod executor;
pub mod matcher;
pub mod navigator;
pub mod normalizer;
pub mod page_identifier;
pub mod report_writer;
pub mod strategies;

pub use executor::ActionExecutor;
pub use matcher::{MatchOutcome, ScenarioMatcher};
pub use navigator::{NavigationOutcome, Navigator};
pub use normalizer::normalize;
pub use page_identifier::{suggest_action, PageIdentifier};
pub use report_writer::ReportWriter;
pub use strategies::{MatrixMode, Strategy, StrategyFactory};
