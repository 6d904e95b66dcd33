pub mod run;
pub mod teardown;
pub mod validate;
