pub mod calculation_routes;
