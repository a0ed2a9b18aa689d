//! Configuración del proyecto
//! 
//! Este módulo contiene la configuración de base de datos, variables de entorno,
//! la cola de importación y otras configuraciones del sistema.

pub mod database;
pub mod environment;
pub mod queue;

pub use database::DatabaseConfig;
pub use environment::*;
pub use queue::QueueConfig;
