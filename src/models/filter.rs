//! Filtros de búsqueda de vehículos
//!
//! Vocabulario estructurado (campo, operador, valor) que el servicio construye
//! y que cada adaptador de persistencia traduce a su propio lenguaje de consulta.

use uuid::Uuid;

use super::vehicle::{UniqueField, Vehicle};

/// Campos filtrables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Id,
    Plate,
    Chassis,
    RegistrationNumber,
    Model,
    Make,
    Year,
}

impl FilterField {
    /// Campos de texto recorridos por la búsqueda libre
    pub const SEARCHABLE_TEXT: [FilterField; 5] = [
        FilterField::Plate,
        FilterField::Chassis,
        FilterField::RegistrationNumber,
        FilterField::Model,
        FilterField::Make,
    ];

    fn text_of(self, vehicle: &Vehicle) -> Option<&str> {
        match self {
            FilterField::Plate => Some(&vehicle.plate),
            FilterField::Chassis => Some(&vehicle.chassis),
            FilterField::RegistrationNumber => Some(&vehicle.registration_number),
            FilterField::Model => Some(&vehicle.model),
            FilterField::Make => Some(&vehicle.make),
            FilterField::Id | FilterField::Year => None,
        }
    }
}

impl From<UniqueField> for FilterField {
    fn from(field: UniqueField) -> Self {
        match field {
            UniqueField::Plate => FilterField::Plate,
            UniqueField::Chassis => FilterField::Chassis,
            UniqueField::RegistrationNumber => FilterField::RegistrationNumber,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Id(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { field: FilterField, value: FilterValue },
    ContainsIgnoreCase { field: FilterField, value: String },
    NotEquals { field: FilterField, value: FilterValue },
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        match self {
            Predicate::Equals { field, value } => value_matches(*field, value, vehicle),
            Predicate::NotEquals { field, value } => !value_matches(*field, value, vehicle),
            Predicate::ContainsIgnoreCase { field, value } => field
                .text_of(vehicle)
                .map(|text| text.to_lowercase().contains(&value.to_lowercase()))
                .unwrap_or(false),
            Predicate::AnyOf(branches) => branches.iter().any(|p| p.matches(vehicle)),
        }
    }
}

fn value_matches(field: FilterField, value: &FilterValue, vehicle: &Vehicle) -> bool {
    match (field, value) {
        (FilterField::Id, FilterValue::Id(id)) => vehicle.id == *id,
        (FilterField::Year, FilterValue::Integer(year)) => i64::from(vehicle.year) == *year,
        (field, FilterValue::Text(text)) => field.text_of(vehicle) == Some(text.as_str()),
        _ => false,
    }
}

/// Conjunción de predicados (AND). Un filtro vacío acepta todo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    predicates: Vec<Predicate>,
}

impl VehicleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn equals_text(self, field: FilterField, value: impl Into<String>) -> Self {
        self.and(Predicate::Equals {
            field,
            value: FilterValue::Text(value.into()),
        })
    }

    pub fn contains(self, field: FilterField, value: impl Into<String>) -> Self {
        self.and(Predicate::ContainsIgnoreCase {
            field,
            value: value.into(),
        })
    }

    pub fn year(self, year: i64) -> Self {
        self.and(Predicate::Equals {
            field: FilterField::Year,
            value: FilterValue::Integer(year),
        })
    }

    pub fn excluding_id(self, id: Uuid) -> Self {
        self.and(Predicate::NotEquals {
            field: FilterField::Id,
            value: FilterValue::Id(id),
        })
    }

    /// Búsqueda libre: OR de substrings sin distinguir mayúsculas sobre los
    /// campos de texto, más igualdad de año si el término es un entero.
    pub fn search(self, term: &str) -> Self {
        let mut branches: Vec<Predicate> = FilterField::SEARCHABLE_TEXT
            .iter()
            .map(|field| Predicate::ContainsIgnoreCase {
                field: *field,
                value: term.to_string(),
            })
            .collect();

        if let Ok(year) = term.trim().parse::<i64>() {
            branches.push(Predicate::Equals {
                field: FilterField::Year,
                value: FilterValue::Integer(year),
            });
        }

        self.and(Predicate::AnyOf(branches))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.predicates.iter().all(|p| p.matches(vehicle))
    }

    /// ¿Contiene una rama `year == n` dentro de algún OR?
    pub fn has_year_branch(&self, year: i64) -> bool {
        let target = Predicate::Equals {
            field: FilterField::Year,
            value: FilterValue::Integer(year),
        };
        self.predicates.iter().any(|p| match p {
            Predicate::AnyOf(branches) => branches.contains(&target),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn civic() -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            plate: "ABC1D23".to_string(),
            chassis: "9BWZZZ377VT004251".to_string(),
            registration_number: "12345678900".to_string(),
            model: "Civic".to_string(),
            make: "Honda".to_string(),
            year: 2020,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_numeric_search_adds_year_branch() {
        let filter = VehicleFilter::new().search("2020");
        assert!(filter.has_year_branch(2020));

        match &filter.predicates()[0] {
            Predicate::AnyOf(branches) => assert_eq!(branches.len(), 6),
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn test_text_search_has_no_year_branch() {
        let filter = VehicleFilter::new().search("civic");
        match &filter.predicates()[0] {
            Predicate::AnyOf(branches) => {
                assert_eq!(branches.len(), 5);
                assert!(branches
                    .iter()
                    .all(|b| matches!(b, Predicate::ContainsIgnoreCase { .. })));
            }
            other => panic!("unexpected predicate {:?}", other),
        }
    }

    #[test]
    fn test_search_matches_case_insensitive_substring() {
        let vehicle = civic();
        assert!(VehicleFilter::new().search("civ").matches(&vehicle));
        assert!(VehicleFilter::new().search("hon").matches(&vehicle));
        assert!(VehicleFilter::new().search("2020").matches(&vehicle));
        assert!(!VehicleFilter::new().search("corolla").matches(&vehicle));
    }

    #[test]
    fn test_excluding_id() {
        let vehicle = civic();
        let filter = VehicleFilter::new()
            .equals_text(FilterField::Plate, "ABC1D23")
            .excluding_id(vehicle.id);
        assert!(!filter.matches(&vehicle));

        let filter = VehicleFilter::new()
            .equals_text(FilterField::Plate, "ABC1D23")
            .excluding_id(Uuid::new_v4());
        assert!(filter.matches(&vehicle));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        assert!(VehicleFilter::new().matches(&civic()));
    }
}
