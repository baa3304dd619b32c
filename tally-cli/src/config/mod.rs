mod loader;
mod types;

pub use loader::{ConfigLoader, ConfigOverrides};
pub use types::{ModelSection, StoreSection, TallyConfig};
