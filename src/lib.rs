//! Registro de vehículos
//!
//! API HTTP de alta, consulta, actualización y baja de vehículos con
//! importación masiva desde planillas Excel a través de una cola Redis.

pub mod config;
pub mod database;
pub mod dto;
pub mod mappers;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
