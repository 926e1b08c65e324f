pub mod log;
pub mod wav;
