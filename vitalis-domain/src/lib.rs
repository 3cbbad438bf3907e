// Vitalis domain layer
//
// Query services and the bulk importer, built on top of the repository
// traits from vitalis_data.

pub mod cpf;
pub mod entities;
pub mod importer;
pub mod services;
pub mod timefmt;
