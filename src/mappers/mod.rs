//! Mappers entre el modelo persistido y las respuestas de la API

pub mod vehicle_mapper;

pub use vehicle_mapper::VehicleMapper;
