pub mod history;
pub mod record;
pub mod snapshot;
pub mod source;

pub use history::*;
pub use record::*;
pub use snapshot::*;
pub use source::*;
