pub mod clear;
pub mod commit;
pub mod preview;
pub mod status;
