pub mod controller;

pub use controller::DataController;
