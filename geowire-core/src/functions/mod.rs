pub mod accessors;
pub mod io;
pub mod measurement;
pub mod operations;
pub mod predicates;
