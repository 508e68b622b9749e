pub mod execution;
pub mod loaders;
pub mod page;
pub mod profile;
pub mod record;
pub mod scenario;
pub mod store;

pub use execution::ExecutionResult;
pub use loaders::{load_access_codes, load_scenario_store};
pub use page::{PageSignal, PageText};
pub use profile::UserProfile;
pub use record::{BatchReport, FailureInfo, FuzzyAudit, SessionOutcome, SessionRecord};
pub use scenario::{ActionType, Parameters, StrategyDescriptor};
pub use store::ScenarioStore;
