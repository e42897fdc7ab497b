pub mod ip;
pub mod size;
