// Vitalis API
//
// Public HTTP layer: axum handlers, router and response entities over the
// domain services.

pub mod api;
pub mod entities;
pub mod openapi;
