pub mod project;
pub mod session;

pub use project::{InvoiceSummary, Project, ProjectDataset, ProjectUpdate, ProjectView};
pub use session::WorkSession;
