pub mod discovery;
pub mod ssdp;
