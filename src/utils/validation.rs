//! Utilidades de validación
//!
//! Validadores sueltos usados por los DTOs (`#[validate(custom = ...)]`) y por
//! los controllers antes de tocar el repositorio.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

/// Rango permitido para la puntuación de un rating
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Límites de las columnas `NUMERIC(10, 2)`
pub const MONEY_SCALE: u32 = 2;
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Límites de las columnas `VARCHAR(20)` de teléfono y matrícula
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_PLATE_LEN: usize = 20;

fn phone_digits() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("static phone regex"))
}

/// Validar longitud mínima y máxima
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        let mut error = ValidationError::new("length");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &len);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Puntuación de un rating: entero entre 1 y 5
pub fn validate_rating_score(score: i32) -> Result<(), ValidationError> {
    validate_range(score, MIN_RATING, MAX_RATING)
}

/// Validar formato de teléfono: 10 a 15 dígitos, `+` opcional
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    validate_length(value, 1, MAX_PHONE_LEN)?;
    let compact: String = value.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !phone_digits().is_match(&compact) {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de coordenadas GPS
pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&lat) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &lat);
        error.add_param("range".into(), &"-90.0 to 90.0".to_string());
        return Err(error);
    }

    if !(-180.0..=180.0).contains(&lng) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &lng);
        error.add_param("range".into(), &"-180.0 to 180.0".to_string());
        return Err(error);
    }

    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Importe monetario: no negativo, como mucho 2 decimales y por debajo de 10^8
pub fn validate_money(value: Decimal) -> Result<(), ValidationError> {
    validate_non_negative(value)?;
    if value.normalize().scale() > MONEY_SCALE || value >= MONEY_LIMIT {
        let mut error = ValidationError::new("money");
        error.add_param("value".into(), &value);
        error.add_param("max".into(), &MONEY_LIMIT);
        error.add_param("scale".into(), &MONEY_SCALE);
        return Err(error);
    }
    Ok(())
}

/// Forma en que se guarda una matrícula
pub fn normalize_license_plate(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Validar formato de matrícula de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    let clean_plate = value.replace([' ', '-', '_'], "");
    if clean_plate.chars().count() < 2 {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    validate_length(&normalize_license_plate(value), 2, MAX_PLATE_LEN)
}
