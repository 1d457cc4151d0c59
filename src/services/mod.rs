pub mod catalog;
pub mod report_service;
pub mod solar_calculator;
