pub mod consistency;
pub mod generate;
pub mod ident;
pub mod model;
pub mod report;
pub mod resolve;
pub mod schema;
pub mod severity;
pub mod tables;
