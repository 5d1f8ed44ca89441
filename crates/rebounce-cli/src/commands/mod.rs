pub mod restart;
pub mod run;
pub mod schedule;
pub mod status;
