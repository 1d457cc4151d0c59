pub mod calculation_controller;
