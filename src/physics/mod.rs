mod record;
mod value_set;

pub use record::{CellRun, RecordFormat};
pub use value_set::CellValueSet;
