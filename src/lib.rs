pub mod commit;
pub mod import;
pub mod model;
pub mod roster;
pub mod util;

pub use import::{StaffImportParser, parse_staff_import};
