// Vitalis data layer
// This crate handles database access for patients and measurements

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
