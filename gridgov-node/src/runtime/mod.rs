pub mod builder;
pub mod dispatch_driver;
pub mod script;
