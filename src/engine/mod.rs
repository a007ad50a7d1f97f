pub mod errors;
pub mod provisioner;
pub mod settlement;
