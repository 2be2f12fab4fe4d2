pub mod discovery;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod plot;
pub mod table;
pub mod tsv;
