pub mod annotation;
pub mod cli;
pub mod consensus;
pub mod ctx;
pub mod decoded;
pub mod identity;
pub mod io;
pub mod ledger;
pub mod math;
pub mod merge;
pub mod pipeline;
pub mod plates;
pub mod schema;
pub mod session;
